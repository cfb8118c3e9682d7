//! Single-worker outbound queue.
//!
//! Every outbound order-entry request goes through one worker task that
//! waits the pacing delay and then hands the message to the session engine.
//! Callbacks never block: they enqueue and return.
//!
//! Send failures are logged and counted here and never propagate back to
//! the caller. The workflow stalls until its next trigger.

use std::fmt;
use std::time::Duration;

use fixprobe_core::{ClOrdId, Message, SessionId};
use fixprobe_session::{DynSessionSender, SessionError};
use fixprobe_telemetry::Metrics;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{ExecutorError, ExecutorResult};

/// Requests that may wait for the worker at once.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// What an outbound request is for. Used for logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    NewOrder,
    StatusRequest,
    CancelRequest,
    InvalidCreate,
    InvalidCancel,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::NewOrder => "new_order",
            RequestKind::StatusRequest => "status",
            RequestKind::CancelRequest => "cancel",
            RequestKind::InvalidCreate => "invalid_create",
            RequestKind::InvalidCancel => "invalid_cancel",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built message waiting for its turn on the worker.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub session: SessionId,
    pub kind: RequestKind,
    /// Id the request is logged under.
    pub cl_ord_id: ClOrdId,
    pub message: Message,
}

impl OutboundRequest {
    pub fn new(
        session: SessionId,
        kind: RequestKind,
        cl_ord_id: ClOrdId,
        message: Message,
    ) -> Self {
        Self {
            session,
            kind,
            cl_ord_id,
            message,
        }
    }
}

/// Send outcome, mirrored in `fixprobe_outbound_requests_total{outcome}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    NotSent,
    SessionNotFound,
    NotLoggedOn,
}

impl SendOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendOutcome::Sent => "sent",
            SendOutcome::NotSent => "not_sent",
            SendOutcome::SessionNotFound => "session_not_found",
            SendOutcome::NotLoggedOn => "not_logged_on",
        }
    }
}

/// Bounded FIFO queue drained by one worker task.
///
/// # Lifecycle
/// 1. `spawn()` starts the worker (requires a Tokio runtime)
/// 2. `enqueue()` from any thread; never blocks, fails when the queue is full
/// 3. `close()` stops intake; already queued requests are still sent
/// 4. `drain().await` waits for the worker to finish the backlog
pub struct SendQueue {
    tx: Mutex<Option<mpsc::Sender<OutboundRequest>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    pacing: Duration,
}

impl SendQueue {
    /// Start the worker. Each request waits `pacing` before it is sent.
    pub fn spawn(sender: DynSessionSender, pacing: Duration) -> Self {
        Self::with_capacity(sender, pacing, DEFAULT_QUEUE_CAPACITY)
    }

    /// Start the worker with room for `capacity` waiting requests.
    pub fn with_capacity(sender: DynSessionSender, pacing: Duration, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(rx, sender, pacing));
        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            pacing,
        }
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Hand a request to the worker.
    ///
    /// # Errors
    /// - `ExecutorError::QueueClosed` after `close()`
    /// - `ExecutorError::QueueFull` when `capacity` requests are already waiting
    pub fn enqueue(&self, request: OutboundRequest) -> ExecutorResult<()> {
        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(ExecutorError::QueueClosed)?;
        let kind = request.kind;
        let cl_ord_id = request.cl_ord_id.clone();

        match tx.try_send(request) {
            Ok(()) => {
                debug!(kind = %kind, cl_ord_id = %cl_ord_id, "Request queued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(kind = %kind, cl_ord_id = %cl_ord_id, "Send queue full, request dropped");
                Metrics::outbound_request(kind.as_str(), "queue_full");
                Err(ExecutorError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ExecutorError::QueueClosed),
        }
    }

    /// Stop accepting requests. Idempotent.
    pub fn close(&self) {
        if self.tx.lock().take().is_some() {
            debug!("Send queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }

    /// Close the queue and wait for the worker to send everything queued.
    pub async fn drain(&self) {
        self.close();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, "Send queue worker terminated abnormally");
            }
        }
    }
}

impl Drop for SendQueue {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.abort();
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<OutboundRequest>,
    sender: DynSessionSender,
    pacing: Duration,
) {
    while let Some(request) = rx.recv().await {
        if !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
        let outcome = dispatch(&sender, request);
        debug!(outcome = outcome.as_str(), "Request dispatched");
    }
    debug!("Send queue worker stopped");
}

/// Send one request and log the outcome. Never fails.
pub fn dispatch(sender: &DynSessionSender, request: OutboundRequest) -> SendOutcome {
    let OutboundRequest {
        session,
        kind,
        cl_ord_id,
        message,
    } = request;

    let outcome = match sender.send_to_target(message, &session) {
        Ok(true) => {
            info!(kind = %kind, cl_ord_id = %cl_ord_id, session = %session, "Request sent");
            SendOutcome::Sent
        }
        Ok(false) => {
            warn!(kind = %kind, cl_ord_id = %cl_ord_id, session = %session, "Request not sent");
            SendOutcome::NotSent
        }
        Err(e) => {
            if e.is_send_failure() {
                error!(
                    kind = %kind,
                    cl_ord_id = %cl_ord_id,
                    session = %session,
                    error = %e,
                    "Failed to send request"
                );
            } else {
                warn!(
                    kind = %kind,
                    cl_ord_id = %cl_ord_id,
                    session = %session,
                    error = %e,
                    "Request refused by engine"
                );
            }
            match e {
                SessionError::SessionNotFound(_) => SendOutcome::SessionNotFound,
                SessionError::NotLoggedOn(_) => SendOutcome::NotLoggedOn,
                _ => SendOutcome::NotSent,
            }
        }
    };

    Metrics::outbound_request(kind.as_str(), outcome.as_str());
    outcome
}
