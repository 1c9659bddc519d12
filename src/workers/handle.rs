//! # Worker handle: the registry entry of one worker.
//!
//! A [`WorkerHandle`] is shared (`Arc`) between the registry, the controller
//! and the worker's own task. It owns:
//! - the single-use cancellation token (`cancel`),
//! - the completion state (a `watch` cell, readable without waiting),
//! - the "finished" latch fired after the worker removed itself.
//!
//! ## Lifecycle
//! ```text
//! create ─► Running ──request_stop()──► (stopping) ──┐
//!              │                                     ▼
//!              └── body returns / expires ──► complete(state) ─► registry.remove_if(id) ─► mark_finished()
//! ```
//!
//! ## Rules
//! - `request_stop` flips the stop flag at most once; later calls return `false`
//! - `complete` is called exactly once, by the worker's runner
//! - `mark_finished` happens **after** the self-removal, so a waiter that wakes
//!   on it observes the registry without this entry

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::workers::WorkerSpec;

/// Process-wide handle id counter; ids are never reused.
static HANDLE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Observable state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// Body still executing.
    Running,
    /// Custom body returned `Ok`.
    CompletedNormally,
    /// Exited because cancellation was requested.
    CompletedByStop,
    /// Exited because its lifetime elapsed.
    CompletedByTimeout,
    /// Custom body returned an error or panicked.
    Failed,
}

impl CompletionState {
    /// True for every state except `Running`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, CompletionState::Running)
    }

    /// Short lowercase label used in listings.
    pub fn as_label(self) -> &'static str {
        match self {
            CompletionState::Running => "running",
            CompletionState::CompletedNormally => "completed",
            CompletionState::CompletedByStop => "stopped",
            CompletionState::CompletedByTimeout => "expired",
            CompletionState::Failed => "failed",
        }
    }
}

impl fmt::Display for CompletionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Shared state of one running or finishing worker.
pub struct WorkerHandle {
    id: u64,
    spec: WorkerSpec,
    started_at: Instant,
    cancel: CancellationToken,
    stop_requested: AtomicBool,
    state: watch::Sender<CompletionState>,
    finished: CancellationToken,
}

impl WorkerHandle {
    /// Creates a handle in the `Running` state with a fresh id.
    pub(crate) fn new(spec: WorkerSpec) -> Self {
        let (state, _) = watch::channel(CompletionState::Running);
        Self {
            id: HANDLE_SEQ.fetch_add(1, Ordering::Relaxed),
            spec,
            started_at: Instant::now(),
            cancel: CancellationToken::new(),
            stop_requested: AtomicBool::new(false),
            state,
            finished: CancellationToken::new(),
        }
    }

    /// Registry-unique generation id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Worker name.
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Advisory daemon flag.
    pub fn daemon(&self) -> bool {
        self.spec.daemon()
    }

    /// The specification the worker was created from.
    pub fn spec(&self) -> &WorkerSpec {
        &self.spec
    }

    /// Current completion state.
    pub fn state(&self) -> CompletionState {
        *self.state.borrow()
    }

    /// True until the worker's task has exited and removed itself.
    pub fn is_alive(&self) -> bool {
        !self.finished.is_cancelled()
    }

    /// True once cancellation has been requested.
    pub fn is_stopping(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Time since creation.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Signals cancellation.
    ///
    /// Returns `true` for the request that actually set the signal and `false`
    /// for every later one.
    pub fn request_stop(&self) -> bool {
        if self.stop_requested.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.cancel.cancel();
        true
    }

    /// Waits until the worker has exited and removed itself.
    pub async fn finished(&self) {
        self.finished.cancelled().await
    }

    /// Waits up to `grace` for the worker to finish; `true` if it did.
    pub async fn wait_finished(&self, grace: Duration) -> bool {
        tokio::time::timeout(grace, self.finished()).await.is_ok()
    }

    /// Point-in-time description for listings.
    pub fn info(&self) -> WorkerInfo {
        WorkerInfo {
            name: self.name().to_string(),
            daemon: self.daemon(),
            kind: self.spec.kind().label(),
            interval: self.spec.kind().interval(),
            lifetime: self.spec.lifetime(),
            state: self.state(),
            alive: self.is_alive(),
            stopping: self.is_stopping(),
            uptime: self.uptime(),
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Records the terminal state. Called once, by the runner.
    pub(crate) fn complete(&self, state: CompletionState) {
        self.state.send_replace(state);
    }

    /// Fires the "finished" latch. Called once, by the runner, after self-removal.
    pub(crate) fn mark_finished(&self) {
        self.finished.cancel();
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("daemon", &self.daemon())
            .field("state", &self.state())
            .field("stopping", &self.is_stopping())
            .finish()
    }
}

/// Snapshot of one worker, as returned by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInfo {
    /// Worker name.
    pub name: String,
    /// Advisory daemon flag.
    pub daemon: bool,
    /// Kind label (`fixed`, `periodic`, `custom`).
    pub kind: &'static str,
    /// Repetition period (zero for non-periodic kinds).
    pub interval: Duration,
    /// Configured lifetime, if any.
    pub lifetime: Option<Duration>,
    /// Completion state at snapshot time.
    pub state: CompletionState,
    /// False once the worker's task has fully exited.
    pub alive: bool,
    /// True once cancellation has been requested.
    pub stopping: bool,
    /// Time since creation.
    pub uptime: Duration,
}

impl fmt::Display for WorkerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.stopping && !self.state.is_terminal() {
            "stopping"
        } else {
            self.state.as_label()
        };
        write!(
            f,
            "{:<20} {:<9} {:<7} {:<10} {:<6} {:>8}",
            self.name,
            self.kind,
            self.daemon,
            state,
            self.alive,
            format!("{}s", self.uptime.as_secs()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_signal_is_set_once() {
        let h = WorkerHandle::new(WorkerSpec::fixed("w", Duration::from_secs(1)));
        assert!(!h.is_stopping());
        assert!(h.request_stop());
        assert!(!h.request_stop());
        assert!(h.is_stopping());
        assert!(h.cancel_token().is_cancelled());
    }

    #[test]
    fn ids_are_unique() {
        let a = WorkerHandle::new(WorkerSpec::fixed("w", Duration::from_secs(1)));
        let b = WorkerHandle::new(WorkerSpec::fixed("w", Duration::from_secs(1)));
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn finished_latch_wakes_waiters() {
        let h = WorkerHandle::new(WorkerSpec::periodic("p", true, Duration::from_millis(5)));
        assert!(h.is_alive());
        assert!(!h.wait_finished(Duration::from_millis(10)).await);

        h.complete(CompletionState::CompletedByStop);
        h.mark_finished();

        assert!(h.wait_finished(Duration::from_millis(10)).await);
        assert!(!h.is_alive());
        assert_eq!(h.info().state, CompletionState::CompletedByStop);
    }
}
