//! # Process-exit hook: drain every worker exactly once.
//!
//! [`ShutdownCoordinator`] wraps a [`Controller`] with a run-once finalizer.
//! The host registers it (once; later registrations are no-ops) and it fires
//! on the first of:
//! - a termination signal (see [`wait_for_shutdown_signal`]),
//! - an explicit [`ShutdownCoordinator::run`] by the host on natural exit.
//!
//! Firing publishes `ShutdownRequested` and runs [`Controller::stop_all`].
//! It never panics and never returns an error; later invocations are no-ops.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::{controller::Controller, report::DrainReport};
use crate::{
    events::{Event, EventKind},
    subscribers::panic_message,
};

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when Ctrl-C is received, or `Err` if registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Run-once drain hook for a controller.
pub struct ShutdownCoordinator {
    controller: Arc<Controller>,
    registered: AtomicBool,
    fired: AtomicBool,
    done: CancellationToken,
}

impl ShutdownCoordinator {
    /// Creates an unregistered coordinator.
    pub fn new(controller: Arc<Controller>) -> Self {
        Self {
            controller,
            registered: AtomicBool::new(false),
            fired: AtomicBool::new(false),
            done: CancellationToken::new(),
        }
    }

    /// Installs the signal hook.
    ///
    /// Returns `true` for the call that installed it, `false` for duplicates.
    /// Must be called inside a tokio runtime.
    pub fn register(self: &Arc<Self>) -> bool {
        if self.registered.swap(true, Ordering::AcqRel) {
            return false;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                res = wait_for_shutdown_signal() => match res {
                    Ok(()) => { this.run("signal").await; }
                    Err(e) => tracing::warn!(
                        target: "workerctl",
                        error = %e,
                        "cannot install signal handlers; drain only on explicit shutdown"
                    ),
                },
                _ = this.done.cancelled() => {}
            }
        });
        true
    }

    /// Drains every worker, once.
    ///
    /// Returns the report for the invocation that performed the drain and
    /// `None` for every later one.
    pub async fn run(&self, trigger: &str) -> Option<DrainReport> {
        if self.fired.swap(true, Ordering::AcqRel) {
            return None;
        }
        self.controller
            .bus()
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(trigger));

        let drained = std::panic::AssertUnwindSafe(self.controller.stop_all())
            .catch_unwind()
            .await;
        let report = match drained {
            Ok(report) => report,
            Err(panic) => {
                tracing::error!(
                    target: "workerctl",
                    panic = %panic_message(panic.as_ref()),
                    "drain panicked"
                );
                DrainReport::default()
            }
        };
        self.done.cancel();
        Some(report)
    }

    /// True once [`ShutdownCoordinator::register`] has installed the hook.
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// True once the drain has fired (it may still be in progress).
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Resolves once the drain has finished.
    pub async fn completed(&self) {
        self.done.cancelled().await
    }

    /// The controller this hook drains.
    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::workers::WorkerSpec;
    use std::time::Duration;

    #[tokio::test]
    async fn registers_once_and_drains_once() {
        let ctl = Arc::new(Controller::new(ControllerConfig::default()));
        let coord = Arc::new(ShutdownCoordinator::new(Arc::clone(&ctl)));

        assert!(!coord.is_registered());
        assert!(coord.register());
        assert!(!coord.register());
        assert!(coord.is_registered());

        ctl.create(WorkerSpec::periodic("p", true, Duration::from_millis(10)))
            .await
            .unwrap();

        let first = coord.run("test").await.unwrap();
        assert_eq!(first.stopped, vec!["p".to_string()]);
        assert!(coord.run("test").await.is_none());
        assert!(ctl.list().await.is_empty());

        tokio::time::timeout(Duration::from_millis(100), coord.completed())
            .await
            .unwrap();
    }
}
