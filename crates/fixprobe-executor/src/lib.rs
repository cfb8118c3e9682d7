//! Outbound side of fixprobe.
//!
//! # Key Components
//!
//! - [`LogonSigner`]: HMAC-SHA512 handshake signature injected into Logon
//! - [`OrderBuilder`]: NewOrderSingle / OrderCancelRequest / OrderStatusRequest construction
//! - [`SendQueue`]: single-worker paced dispatch to the session engine
//! - [`ClOrdIdGenerator`]: strictly increasing timestamp-based client order ids

pub mod clock;
pub mod error;
pub mod order_builder;
pub mod send_queue;
pub mod signer;

// Error types
pub use error::{ExecutorError, ExecutorResult};

// Clock and ids
pub use clock::{ClOrdIdGenerator, Clock, ManualClock, SystemClock, WorkflowIds};

// Order construction
pub use order_builder::{OrderBuilder, OrderParams};

// Dispatch
pub use send_queue::{OutboundRequest, RequestKind, SendOutcome, SendQueue, DEFAULT_QUEUE_CAPACITY};

// Signing
pub use signer::{sign_message, verify_message, LogonSigner, SignerError};
