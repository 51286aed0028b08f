use std::sync::Arc;

use tokio::sync::mpsc;

use crate::correlator::AsyncCallCorrelator;
use crate::dispatch::Dispatcher;
use crate::downstream::{Downstream, SystemClock};
use crate::events::Bus;
use crate::heartbeat::HeartbeatScheduler;
use crate::methods::MethodTable;
use crate::observers::Observe;
use crate::subscriptions::SubscriptionRegistry;

use super::config::Config;
use super::handle::ServiceHandle;
use super::service::{Service, ServiceParts};

/// Builder wiring a [`Service`] and its first [`ServiceHandle`].
///
/// ```rust
/// use std::sync::Arc;
/// use tickrelay::{Config, LogWriter, Observe, ServiceBuilder};
///
/// let observers: Vec<Arc<dyn Observe>> = vec![Arc::new(LogWriter::new())];
/// let (service, handle) = ServiceBuilder::new(Config::default())
///     .with_observers(observers)
///     .build();
/// # drop((service, handle));
/// ```
pub struct ServiceBuilder {
    cfg: Config,
    observers: Vec<Arc<dyn Observe>>,
    downstream: Option<Arc<dyn Downstream>>,
    methods: Option<MethodTable>,
}

impl ServiceBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
            downstream: None,
            methods: None,
        }
    }

    /// Sets event observers.
    ///
    /// Observers receive runtime events through dedicated workers with bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Sets the dependency answering forwarded calls (default: [`SystemClock`]).
    pub fn with_downstream(mut self, downstream: Arc<dyn Downstream>) -> Self {
        self.downstream = Some(downstream);
        self
    }

    /// Replaces the method table (default: [`MethodTable::standard`]).
    pub fn with_methods(mut self, methods: MethodTable) -> Self {
        self.methods = Some(methods);
        self
    }

    /// Builds the service; nothing runs until [`Service::run`] is awaited.
    pub fn build(self) -> (Service, ServiceHandle) {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let (tx, rx) = mpsc::channel(self.cfg.command_capacity_clamped());

        let registry = SubscriptionRegistry::new(bus.clone());
        let dispatcher = Dispatcher::new(Arc::clone(&registry), self.cfg.routes.clone(), bus.clone());
        let heartbeat = HeartbeatScheduler::new(
            self.cfg.heartbeat_topic.as_str(),
            self.cfg.heartbeat_period,
            bus.clone(),
        );
        let methods = self
            .methods
            .unwrap_or_else(|| MethodTable::standard(&self.cfg));
        let downstream = self
            .downstream
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Downstream>);

        let service = Service::from_parts(ServiceParts {
            methods,
            registry,
            dispatcher,
            correlator: AsyncCallCorrelator::new(bus.clone()),
            heartbeat,
            downstream,
            observers: self.observers,
            bus: bus.clone(),
            rx,
            tx: tx.downgrade(),
        });
        (service, ServiceHandle::new(tx, bus))
    }
}
