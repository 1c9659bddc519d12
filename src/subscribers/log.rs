//! # LogWriter: forwards events to `tracing`.
//!
//! A small subscriber that turns every [`Event`] into a structured `tracing`
//! record. Problems are logged at `warn`/`error`, registry removals at
//! `debug`, everything else (heartbeats included) at `info`.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO workerctl: worker created worker="ticker" kind="periodic 500ms"
//! INFO workerctl: heartbeat worker="ticker" iteration=3
//! INFO workerctl: stop requested worker="ticker"
//! INFO workerctl: worker exited worker="ticker" state=CompletedByStop
//! WARN workerctl: drain finished stuck=1 grace_ms=3000
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use crate::workers::CompletionState;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let worker = e.worker.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::WorkerCreated => {
                tracing::info!(target: "workerctl", worker, kind = reason, "worker created");
            }
            EventKind::WorkerRejected => {
                tracing::warn!(target: "workerctl", worker, "worker name already taken");
            }
            EventKind::Heartbeat => {
                tracing::info!(target: "workerctl", worker, iteration = e.iteration, "heartbeat");
            }
            EventKind::WorkerExited => match e.state {
                Some(CompletionState::Failed) => {
                    tracing::error!(target: "workerctl", worker, error = reason, "worker failed");
                }
                state => {
                    tracing::info!(target: "workerctl", worker, state = ?state, "worker exited");
                }
            },
            EventKind::WorkerRemoved => {
                tracing::debug!(target: "workerctl", worker, by = reason, "worker removed");
            }
            EventKind::StopRequested => {
                tracing::info!(target: "workerctl", worker, "stop requested");
            }
            EventKind::StopTimedOut => {
                tracing::warn!(target: "workerctl", worker, grace_ms = e.grace_ms, "worker did not stop in time");
            }
            EventKind::DrainStarted => {
                tracing::info!(target: "workerctl", workers = e.iteration, "stopping all workers");
            }
            EventKind::DrainFinished => match e.iteration {
                Some(stuck) if stuck > 0 => {
                    tracing::warn!(target: "workerctl", stuck, grace_ms = e.grace_ms, "drain finished with stuck workers");
                }
                _ => tracing::info!(target: "workerctl", "all workers stopped"),
            },
            EventKind::ShutdownRequested => {
                tracing::info!(target: "workerctl", trigger = reason, "shutdown requested");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "workerctl", subscriber = worker, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "workerctl", subscriber = worker, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn heartbeats_visible_at_default_info_level() {
        let out = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(out.clone())
            .finish();

        let ev = Event::new(EventKind::Heartbeat)
            .with_worker("tick")
            .with_iteration(3);
        tracing::subscriber::with_default(subscriber, || {
            futures::executor::block_on(LogWriter::new().on_event(&ev));
        });

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("heartbeat"), "{text}");
        assert!(text.contains("tick"), "{text}");
        assert!(text.contains("iteration=3"), "{text}");
    }
}
