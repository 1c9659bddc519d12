//! # Runtime events emitted by the controller and its workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Worker lifecycle**: created, heartbeat, exited, removed
//! - **Control**: stop requested, stop timed out
//! - **Drain/shutdown**: drain started/finished, shutdown requested
//! - **Subscriber health**: overflow, panic
//!
//! The [`Event`] struct carries metadata such as timestamps, worker name,
//! iteration counters and completion states.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use workerctl::{CompletionState, Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkerExited)
//!     .with_worker("ticker")
//!     .with_state(CompletionState::CompletedByStop);
//!
//! assert_eq!(ev.kind, EventKind::WorkerExited);
//! assert_eq!(ev.worker.as_deref(), Some("ticker"));
//! assert_eq!(ev.state, Some(CompletionState::CompletedByStop));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::workers::CompletionState;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `worker`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `worker`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Worker lifecycle ===
    /// Worker inserted into the registry and its task spawned.
    ///
    /// Sets:
    /// - `worker`: worker name
    /// - `reason`: kind description (e.g. "fixed 30s")
    WorkerCreated,

    /// Creation refused because the name is taken.
    ///
    /// Sets:
    /// - `worker`: worker name
    WorkerRejected,

    /// One iteration of a periodic worker.
    ///
    /// Sets:
    /// - `worker`: worker name
    /// - `iteration`: 1-based, strictly increasing per worker
    Heartbeat,

    /// Worker body returned; completion state recorded.
    ///
    /// Sets:
    /// - `worker`: worker name
    /// - `state`: terminal completion state
    /// - `reason`: failure message (only for `Failed`)
    WorkerExited,

    /// Worker entry removed from the registry.
    ///
    /// Sets:
    /// - `worker`: worker name
    /// - `reason`: "self" (worker exit) or "drain" (stop-all)
    WorkerRemoved,

    // === Control ===
    /// Cancellation signalled for a worker (first request only).
    ///
    /// Sets:
    /// - `worker`: worker name
    StopRequested,

    /// Worker did not exit within the stop grace period; entry kept.
    ///
    /// Sets:
    /// - `worker`: worker name
    /// - `grace_ms`: the grace period (ms)
    StopTimedOut,

    // === Drain / shutdown ===
    /// Stop-all started.
    ///
    /// Sets:
    /// - `iteration`: number of workers being drained
    DrainStarted,

    /// Stop-all finished and drained entries were removed.
    ///
    /// Sets:
    /// - `iteration`: number of workers that exceeded the grace period
    /// - `grace_ms`: the per-worker grace period (ms)
    DrainFinished,

    /// Shutdown coordinator fired (signal observed or host finished).
    ///
    /// Sets:
    /// - `reason`: trigger ("signal" or "exit")
    ShutdownRequested,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the worker (or subscriber), if applicable.
    pub worker: Option<Arc<str>>,
    /// Counter payload (heartbeat iteration, drain sizes).
    pub iteration: Option<u64>,
    /// Terminal completion state.
    pub state: Option<CompletionState>,
    /// Grace period in milliseconds (compact).
    pub grace_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            iteration: None,
            state: None,
            grace_ms: None,
            reason: None,
        }
    }

    /// Attaches a worker name.
    #[inline]
    pub fn with_worker(mut self, worker: impl Into<Arc<str>>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_iteration(mut self, n: u64) -> Self {
        self.iteration = Some(n);
        self
    }

    /// Attaches a completion state.
    #[inline]
    pub fn with_state(mut self, state: CompletionState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a grace period (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_worker(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_worker(subscriber)
            .with_reason(info)
    }

    /// True if the event concerns the named worker.
    #[inline]
    pub fn is_for(&self, worker: &str) -> bool {
        self.worker.as_deref() == Some(worker)
    }
}
