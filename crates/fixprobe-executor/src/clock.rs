//! Clock and client order ID generation.
//!
//! Ids are derived from wall-clock milliseconds. The generator guarantees
//! strictly increasing timestamps even when the clock stalls or steps back,
//! so two ids issued within the same millisecond never collide.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use fixprobe_core::{ClOrdId, ProbeKind};

/// Trait for obtaining current time, enabling testability.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Identifiers for one workflow run, all derived from the same timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowIds {
    /// The order that is created, queried and cancelled.
    pub primary: ClOrdId,
    /// Id of the new order the gateway must reject.
    pub invalid_create: ClOrdId,
    /// Id referenced by the cancel the gateway must reject.
    pub invalid_cancel: ClOrdId,
}

impl WorkflowIds {
    pub fn from_timestamp(timestamp_ms: u64) -> Self {
        Self {
            primary: ClOrdId::primary(timestamp_ms),
            invalid_create: ClOrdId::probe(timestamp_ms, ProbeKind::InvalidCreate),
            invalid_cancel: ClOrdId::probe(timestamp_ms, ProbeKind::InvalidCancel),
        }
    }

    pub fn probe(&self, kind: ProbeKind) -> &ClOrdId {
        match kind {
            ProbeKind::InvalidCreate => &self.invalid_create,
            ProbeKind::InvalidCancel => &self.invalid_cancel,
        }
    }
}

/// Issues client order ids from strictly increasing millisecond timestamps.
///
/// # Guarantees
/// - `next_timestamp_ms()` returns `max(last + 1, now)`
/// - Thread-safe for concurrent access
pub struct ClOrdIdGenerator<C: Clock> {
    last_ms: AtomicU64,
    clock: C,
}

impl<C: Clock> ClOrdIdGenerator<C> {
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            last_ms: AtomicU64::new(0),
            clock,
        }
    }

    /// Next unique timestamp. Thread-safe via CAS loop.
    pub fn next_timestamp_ms(&self) -> u64 {
        let now = self.clock.now_ms();

        loop {
            let current = self.last_ms.load(Ordering::Acquire);
            let next_val = current.saturating_add(1).max(now);

            match self.last_ms.compare_exchange_weak(
                current,
                next_val,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next_val,
                Err(_) => continue,
            }
        }
    }

    /// Fresh `ID-{ts}` request id (e.g. for a cancel request).
    pub fn next_request_id(&self) -> ClOrdId {
        ClOrdId::primary(self.next_timestamp_ms())
    }

    /// Fresh set of workflow ids sharing one timestamp.
    pub fn next_workflow_ids(&self) -> WorkflowIds {
        WorkflowIds::from_timestamp(self.next_timestamp_ms())
    }
}

impl ClOrdIdGenerator<SystemClock> {
    #[must_use]
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock)
    }
}
