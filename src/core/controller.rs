//! # Controller: create, stop, list and drain named workers.
//!
//! The [`Controller`] owns the event bus, the injected [`WorkerRegistry`] and
//! the controller configuration. Every operation takes `&self`, so one
//! controller may be shared (`Arc`) between any number of concurrent callers.
//!
//! ## High-level architecture
//! ```text
//! create(spec) ──► normalize (trim name, clamp interval)
//!                    └─► registry.insert_if_absent(handle)
//!                          ├─ taken → publish WorkerRejected → DuplicateName
//!                          └─ ok    → publish WorkerCreated → tokio::spawn(run_worker)
//!
//! stop(name)   ──► registry.get(name) ── none → NotFound
//!                    └─► handle.request_stop()        (signals once)
//!                    └─► wait_finished(stop_grace)
//!                          ├─ exited  → Ok            (entry already self-removed)
//!                          └─ timeout → StopTimedOut → TimedOut (entry kept)
//!
//! stop_all()   ──► snapshot ─► request_stop() on each
//!                    └─► join_all(wait_finished(drain_grace))   (concurrent, not cumulative)
//!                    └─► registry.remove(handle) for every drained entry
//!                    └─► DrainReport { stopped, timed_out }
//!
//! Event flow:
//!   run_worker / Controller ── publish(Event) ──► Bus ──► fan-out listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - At most one live worker per name; a rejected `create` leaves the existing one untouched
//! - Every wait is bounded (`stop_grace`, `drain_grace`); `list` never waits on a worker
//! - `stop_all` only touches the workers in its snapshot; a worker created
//!   concurrently survives the drain

use std::sync::Arc;

use futures::future::join_all;
use tokio::{
    sync::{Mutex, broadcast},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    command::Command,
    config::ControllerConfig,
    core::{
        builder::ControllerBuilder,
        registry::WorkerRegistry,
        report::{DrainReport, Reply},
        runner::run_worker,
    },
    error::ControlError,
    events::{Bus, Event, EventKind},
    subscribers::SubscriberSet,
    workers::{WorkerHandle, WorkerInfo, WorkerKind, WorkerSpec},
};

/// Bus → subscriber fan-out task owned by a controller.
pub(crate) struct Fanout {
    token: CancellationToken,
    listener: JoinHandle<()>,
    subs: Arc<SubscriberSet>,
}

impl Fanout {
    /// Subscribes to `bus` and spawns the forwarding listener.
    ///
    /// Must be called inside a tokio runtime.
    pub(crate) fn spawn(bus: &Bus, subs: SubscriberSet) -> Self {
        let subs = Arc::new(subs);
        let token = CancellationToken::new();
        let listener = tokio::spawn(forward(bus.subscribe(), Arc::clone(&subs), token.clone()));
        Self {
            token,
            listener,
            subs,
        }
    }

    async fn close(self) {
        self.token.cancel();
        let _ = self.listener.await;
        if let Ok(subs) = Arc::try_unwrap(self.subs) {
            subs.shutdown().await;
        }
    }
}

/// Forwards bus events to the subscriber set until `token` fires, then
/// flushes whatever is still buffered.
async fn forward(
    mut rx: broadcast::Receiver<Event>,
    subs: Arc<SubscriberSet>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            msg = rx.recv() => match msg {
                Ok(ev) => subs.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return,
            },
        }
    }
    loop {
        match rx.try_recv() {
            Ok(ev) => subs.emit(&ev),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return,
        }
    }
}

/// Named-worker lifecycle controller.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use workerctl::{Controller, ControllerConfig, ControlError, WorkerSpec};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let ctl = Controller::new(ControllerConfig::default());
///
///     ctl.create(WorkerSpec::periodic("ticker", true, Duration::from_millis(50)))
///         .await
///         .unwrap();
///     let dup = ctl
///         .create(WorkerSpec::fixed("ticker", Duration::from_secs(1)))
///         .await;
///     assert!(matches!(dup, Err(ControlError::DuplicateName { .. })));
///
///     ctl.stop("ticker").await.unwrap();
///     assert!(ctl.list().await.is_empty());
/// }
/// ```
pub struct Controller {
    cfg: ControllerConfig,
    registry: Arc<WorkerRegistry>,
    bus: Bus,
    fanout: Mutex<Option<Fanout>>,
}

impl Controller {
    /// Creates a controller with a fresh registry and no subscribers.
    pub fn new(cfg: ControllerConfig) -> Self {
        Self::with_registry(cfg, Arc::new(WorkerRegistry::new()))
    }

    /// Creates a controller over an explicitly constructed registry.
    pub fn with_registry(cfg: ControllerConfig, registry: Arc<WorkerRegistry>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self::new_internal(cfg, registry, bus, None)
    }

    /// Returns a builder for wiring subscribers and a shared registry.
    pub fn builder(cfg: ControllerConfig) -> ControllerBuilder {
        ControllerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: ControllerConfig,
        registry: Arc<WorkerRegistry>,
        bus: Bus,
        fanout: Option<Fanout>,
    ) -> Self {
        Self {
            cfg,
            registry,
            bus,
            fanout: Mutex::new(fanout),
        }
    }

    /// Controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    /// The registry this controller operates on.
    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Event bus shared with every worker.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Subscribes directly to the event bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Registers and starts a worker.
    ///
    /// The name is trimmed; an empty name is rejected with
    /// [`ControlError::MissingArgument`]. Periodic intervals are raised to
    /// [`ControllerConfig::min_interval`].
    pub async fn create(&self, spec: WorkerSpec) -> Result<WorkerInfo, ControlError> {
        let spec = self.normalize(spec)?;
        let handle = Arc::new(WorkerHandle::new(spec));

        if let Err(existing) = self.registry.insert_if_absent(Arc::clone(&handle)).await {
            self.bus.publish(
                Event::new(EventKind::WorkerRejected)
                    .with_worker(existing.name())
                    .with_reason("name already taken"),
            );
            return Err(ControlError::DuplicateName {
                name: existing.name().to_string(),
            });
        }

        self.bus.publish(
            Event::new(EventKind::WorkerCreated)
                .with_worker(handle.name())
                .with_reason(handle.spec().describe()),
        );
        let info = handle.info();
        tokio::spawn(run_worker(
            handle,
            Arc::clone(&self.registry),
            self.bus.clone(),
        ));
        Ok(info)
    }

    fn normalize(&self, spec: WorkerSpec) -> Result<WorkerSpec, ControlError> {
        let name = spec.name().trim();
        if name.is_empty() {
            return Err(ControlError::MissingArgument { field: "name" });
        }
        let kind = match spec.kind() {
            WorkerKind::Periodic { interval } => WorkerKind::Periodic {
                interval: self.cfg.clamp_interval(*interval),
            },
            other => other.clone(),
        };
        Ok(WorkerSpec::new(name, spec.daemon(), kind, spec.lifetime()))
    }

    /// Signals the named worker and waits up to `stop_grace` for it to exit.
    ///
    /// A second `stop` on a worker that is already stopping does not signal
    /// again but still waits, so it can be used to retry after `TimedOut`.
    pub async fn stop(&self, name: &str) -> Result<(), ControlError> {
        let name = name.trim();
        let Some(handle) = self.registry.get(name).await else {
            return Err(ControlError::NotFound {
                name: name.to_string(),
            });
        };

        if handle.request_stop() {
            self.bus
                .publish(Event::new(EventKind::StopRequested).with_worker(handle.name()));
        }

        let grace = self.cfg.stop_grace;
        if handle.wait_finished(grace).await {
            return Ok(());
        }
        self.bus.publish(
            Event::new(EventKind::StopTimedOut)
                .with_worker(handle.name())
                .with_grace(grace),
        );
        Err(ControlError::TimedOut {
            name: handle.name().to_string(),
            grace,
        })
    }

    /// Snapshot of every registered worker, sorted by name.
    pub async fn list(&self) -> Vec<WorkerInfo> {
        self.registry
            .snapshot()
            .await
            .iter()
            .map(|h| h.info())
            .collect()
    }

    /// Signals every registered worker, waits up to `drain_grace` for each
    /// (concurrently), then removes every drained entry.
    pub async fn stop_all(&self) -> DrainReport {
        let handles = self.registry.snapshot().await;
        if handles.is_empty() {
            return DrainReport::default();
        }

        let grace = self.cfg.drain_grace;
        self.bus.publish(
            Event::new(EventKind::DrainStarted)
                .with_grace(grace)
                .with_iteration(handles.len() as u64),
        );

        for h in &handles {
            if h.request_stop() {
                self.bus
                    .publish(Event::new(EventKind::StopRequested).with_worker(h.name()));
            }
        }

        let exited = join_all(handles.iter().map(|h| h.wait_finished(grace))).await;

        let mut report = DrainReport::default();
        for (h, in_time) in handles.iter().zip(exited) {
            if self.registry.remove(h).await {
                self.bus.publish(
                    Event::new(EventKind::WorkerRemoved)
                        .with_worker(h.name())
                        .with_reason("drain"),
                );
            }
            if in_time {
                report.stopped.push(h.name().to_string());
            } else {
                self.bus.publish(
                    Event::new(EventKind::StopTimedOut)
                        .with_worker(h.name())
                        .with_grace(grace),
                );
                report.timed_out.push(h.name().to_string());
            }
        }

        self.bus.publish(
            Event::new(EventKind::DrainFinished)
                .with_grace(grace)
                .with_iteration(report.timed_out.len() as u64),
        );
        report
    }

    /// Dispatches a parsed command.
    pub async fn execute(&self, command: Command) -> Result<Reply, ControlError> {
        match command {
            Command::Create { name, lifetime } => {
                let lifetime = lifetime.unwrap_or(self.cfg.default_lifetime);
                self.create(WorkerSpec::fixed(name, lifetime))
                    .await
                    .map(Reply::Created)
            }
            Command::Add {
                name,
                daemon,
                interval,
            } => {
                let daemon = daemon.unwrap_or(self.cfg.default_daemon);
                let interval = interval.unwrap_or(self.cfg.default_interval);
                self.create(WorkerSpec::periodic(name, daemon, interval))
                    .await
                    .map(Reply::Created)
            }
            Command::Stop { name } => {
                self.stop(&name).await?;
                Ok(Reply::Stopped {
                    name: name.trim().to_string(),
                })
            }
            Command::List => Ok(Reply::Workers(self.list().await)),
            Command::StopAll => Ok(Reply::Drained(self.stop_all().await)),
        }
    }

    /// Waits until no non-daemon worker is registered.
    ///
    /// Unbounded: used by the host on natural exit only.
    pub async fn wait_non_daemon(&self) {
        loop {
            let pending: Vec<Arc<WorkerHandle>> = self
                .registry
                .snapshot()
                .await
                .into_iter()
                .filter(|h| !h.daemon())
                .collect();
            if pending.is_empty() {
                return;
            }
            join_all(pending.iter().map(|h| h.finished())).await;
        }
    }

    /// Stops the subscriber fan-out after delivering buffered events.
    ///
    /// Workers are not touched; call [`Controller::stop_all`] first.
    pub async fn close(&self) {
        let fanout = self.fanout.lock().await.take();
        if let Some(fanout) = fanout {
            fanout.close().await;
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(fanout) = self.fanout.get_mut().take() {
            fanout.token.cancel();
        }
    }
}
