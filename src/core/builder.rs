use std::sync::Arc;

use super::controller::{Controller, Fanout};
use super::registry::WorkerRegistry;
use crate::{
    config::ControllerConfig,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Controller`] with optional features.
pub struct ControllerBuilder {
    cfg: ControllerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    registry: Option<Arc<WorkerRegistry>>,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ControllerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            registry: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events (created, heartbeat, exited, drain)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses an externally constructed registry instead of a fresh one.
    pub fn with_registry(mut self, registry: Arc<WorkerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the controller.
    ///
    /// With subscribers configured this spawns the fan-out listener and must be
    /// called inside a tokio runtime.
    pub fn build(self) -> Arc<Controller> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(WorkerRegistry::new()));

        let fanout = if self.subscribers.is_empty() {
            None
        } else {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            Some(Fanout::spawn(&bus, subs))
        };

        Arc::new(Controller::new_internal(self.cfg, registry, bus, fanout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind};
    use crate::workers::WorkerSpec;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().await.push(ev.kind);
        }
    }

    #[tokio::test]
    async fn subscribers_see_lifecycle_after_close() {
        let collect = Arc::new(Collect::default());
        let ctl = Controller::builder(ControllerConfig::default())
            .with_subscribers(vec![collect.clone() as Arc<dyn Subscribe>])
            .build();

        ctl.create(WorkerSpec::fixed("w", Duration::from_millis(10)))
            .await
            .unwrap();
        ctl.wait_non_daemon().await;
        ctl.close().await;

        let seen = collect.0.lock().await.clone();
        assert_eq!(
            seen,
            vec![
                EventKind::WorkerCreated,
                EventKind::WorkerExited,
                EventKind::WorkerRemoved
            ]
        );
    }

    #[tokio::test]
    async fn shared_registry_is_used() {
        let registry = Arc::new(WorkerRegistry::new());
        let ctl = Controller::builder(ControllerConfig::default())
            .with_registry(Arc::clone(&registry))
            .build();
        ctl.create(WorkerSpec::periodic("p", true, Duration::from_millis(10)))
            .await
            .unwrap();
        assert_eq!(registry.names().await, vec!["p".to_string()]);
        ctl.stop_all().await;
        assert!(registry.is_empty().await);
    }
}
