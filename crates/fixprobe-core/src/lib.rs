//! Core message model and protocol types for the fixprobe gateway client.
//!
//! This crate provides the types shared by every other crate in the workspace:
//! - `Message`: tag/value message with separate header and body field maps
//! - `MsgType`, `ExecType`, `OrdStatus`: inbound/outbound message classification
//! - `Price`, `Quantity`: precision-safe order fields
//! - `Side`, `OrdType`, `TimeInForce`: order enums with their wire codes
//! - `ClOrdId`: client order identifier, including the invalid-probe tags
//! - `SessionId`: identity of one gateway session
//! - `time`: sending-time formatting and epoch-millisecond normalization

pub mod decimal;
pub mod error;
pub mod message;
pub mod order;
pub mod session;
pub mod time;

pub use decimal::{Price, Quantity};
pub use error::{CoreError, Result};
pub use message::{tags, FieldMap, Message, MsgType};
pub use order::{ClOrdId, ExecType, OrdStatus, OrdType, ProbeKind, Side, TimeInForce};
pub use session::SessionId;
