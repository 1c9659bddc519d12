//! # Worker specification.
//!
//! [`WorkerSpec`] describes a worker before it exists: its name, daemon flag,
//! body kind and optional lifetime. The controller turns it into a registered
//! [`WorkerHandle`](crate::WorkerHandle) plus a spawned task.
//!
//! ## Kinds
//! - **Fixed**: sleeps for its lifetime, exits early on cancellation.
//! - **Periodic**: heartbeat, sleep `interval`, repeat until cancelled (or expired).
//! - **Custom**: runs a caller-supplied [`Work`](crate::Work) body.

use std::fmt;
use std::time::Duration;

use crate::workers::WorkRef;

/// What a worker does between creation and exit.
#[derive(Clone)]
pub enum WorkerKind {
    /// Sleep for the lifetime; exit early on cancellation.
    Fixed,
    /// Emit a heartbeat then sleep `interval`, until cancelled.
    Periodic {
        /// Sleep between iterations.
        interval: Duration,
    },
    /// Run a caller-supplied body with the worker's cancellation token.
    Custom(WorkRef),
}

impl WorkerKind {
    /// Short label used in listings and logs.
    pub fn label(&self) -> &'static str {
        match self {
            WorkerKind::Fixed => "fixed",
            WorkerKind::Periodic { .. } => "periodic",
            WorkerKind::Custom(_) => "custom",
        }
    }

    /// Repetition period; zero for non-periodic kinds.
    pub fn interval(&self) -> Duration {
        match self {
            WorkerKind::Periodic { interval } => *interval,
            _ => Duration::ZERO,
        }
    }
}

impl fmt::Debug for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKind::Fixed => f.write_str("Fixed"),
            WorkerKind::Periodic { interval } => f
                .debug_struct("Periodic")
                .field("interval", interval)
                .finish(),
            WorkerKind::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Specification for a named worker.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use workerctl::WorkerSpec;
///
/// let once = WorkerSpec::fixed("sleeper", Duration::from_secs(30));
/// assert!(!once.daemon());
/// assert_eq!(once.lifetime(), Some(Duration::from_secs(30)));
///
/// let tick = WorkerSpec::periodic("ticker", true, Duration::from_millis(500));
/// assert_eq!(tick.kind().interval(), Duration::from_millis(500));
/// assert_eq!(tick.lifetime(), None);
/// ```
#[derive(Clone, Debug)]
pub struct WorkerSpec {
    name: String,
    daemon: bool,
    kind: WorkerKind,
    lifetime: Option<Duration>,
}

impl WorkerSpec {
    /// Creates a specification with explicit parameters.
    pub fn new(
        name: impl Into<String>,
        daemon: bool,
        kind: WorkerKind,
        lifetime: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            daemon,
            kind,
            lifetime,
        }
    }

    /// Non-daemon worker that sleeps for `lifetime` then exits.
    pub fn fixed(name: impl Into<String>, lifetime: Duration) -> Self {
        Self::new(name, false, WorkerKind::Fixed, Some(lifetime))
    }

    /// Worker that heartbeats every `interval` until stopped.
    pub fn periodic(name: impl Into<String>, daemon: bool, interval: Duration) -> Self {
        Self::new(name, daemon, WorkerKind::Periodic { interval }, None)
    }

    /// Non-daemon worker running a custom body until it returns or is stopped.
    pub fn custom(name: impl Into<String>, work: WorkRef) -> Self {
        Self::new(name, false, WorkerKind::Custom(work), None)
    }

    /// Returns a new spec with updated lifetime.
    pub fn with_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Returns a new spec with updated daemon flag.
    pub fn with_daemon(mut self, daemon: bool) -> Self {
        self.daemon = daemon;
        self
    }

    /// Worker name (registry key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Advisory daemon flag.
    pub fn daemon(&self) -> bool {
        self.daemon
    }

    /// Body kind.
    pub fn kind(&self) -> &WorkerKind {
        &self.kind
    }

    /// Self-termination deadline, measured from start.
    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime
    }

    /// Human-readable one-liner, e.g. `periodic 500ms` or `fixed 30s`.
    pub fn describe(&self) -> String {
        match (&self.kind, self.lifetime) {
            (WorkerKind::Periodic { interval }, None) => format!("periodic {interval:?}"),
            (WorkerKind::Periodic { interval }, Some(l)) => {
                format!("periodic {interval:?} for {l:?}")
            }
            (kind, Some(l)) => format!("{} {l:?}", kind.label()),
            (kind, None) => kind.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkError;
    use crate::workers::WorkFn;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn describe_covers_every_kind() {
        assert_eq!(
            WorkerSpec::fixed("a", Duration::from_secs(30)).describe(),
            "fixed 30s"
        );
        assert_eq!(
            WorkerSpec::periodic("b", true, Duration::from_millis(250)).describe(),
            "periodic 250ms"
        );
        let body = WorkFn::arc(|_ctx: CancellationToken| async { Ok::<_, WorkError>(()) });
        assert_eq!(WorkerSpec::custom("c", body).describe(), "custom");
    }

    #[test]
    fn builders_override_defaults() {
        let spec = WorkerSpec::periodic("p", true, Duration::from_millis(10))
            .with_daemon(false)
            .with_lifetime(Some(Duration::from_secs(2)));
        assert!(!spec.daemon());
        assert_eq!(spec.lifetime(), Some(Duration::from_secs(2)));
        assert_eq!(spec.kind().label(), "periodic");
    }
}
