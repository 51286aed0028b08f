//! # Dispatcher: fan-out of one value to every subscriber of a topic.
//!
//! ## Architecture
//! ```text
//! broadcast(topic, value)
//!     │
//!     ├─► snapshot = registry.subscribers_of(topic)      (taken once)
//!     │
//!     ├─► route Public  ──► sub1.handle.send(value)
//!     │                 └─► sub3.handle.send(value) ──✗──► DeliveryFailed (continue)
//!     └─► route Private ──► sub2.handle.send(value)
//! ```
//!
//! ## Rules
//! - **Snapshot**: callers subscribing while a broadcast runs are not visited by it.
//! - **Fixed routes**: every configured route is walked, in configuration order.
//! - **Partial failure**: a failed delivery is reported and skipped; nothing aborts
//!   the remaining recipients or routes, and the subscriber stays registered.

use std::sync::Arc;

use serde_json::Value;

use crate::events::{Bus, Event, EventKind};
use crate::subscriptions::{Route, SubscriptionRegistry};

/// Outcome counters of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Successful deliveries.
    pub delivered: u32,
    /// Failed deliveries (reported as [`EventKind::DeliveryFailed`]).
    pub failed: u32,
}

/// Sends values to topic subscribers over the configured routes.
pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    routes: Vec<Route>,
    bus: Bus,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry` delivering on `routes`.
    pub fn new(registry: Arc<SubscriptionRegistry>, routes: Vec<Route>, bus: Bus) -> Self {
        Self {
            registry,
            routes,
            bus,
        }
    }

    /// Delivers `value` to every current subscriber of `topic` on every route.
    pub async fn broadcast(&self, topic: &str, value: &Value) -> BroadcastReport {
        let snapshot = self.registry.subscribers_of(topic).await;
        let mut report = BroadcastReport::default();

        for route in &self.routes {
            for sub in snapshot.iter().filter(|s| s.route() == *route) {
                match sub.handle().send(value).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        report.failed += 1;
                        self.bus.publish(
                            Event::new(EventKind::DeliveryFailed)
                                .with_topic(topic)
                                .with_identity(sub.identity())
                                .with_route(*route)
                                .with_reason(e.as_label()),
                        );
                    }
                }
            }
        }
        report
    }

    /// Routes walked by [`broadcast`](Self::broadcast), in order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use crate::reply::{Outbox, ReplyHandle};
    use crate::subscriptions::Identity;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::{Mutex, mpsc};

    fn setup(routes: Vec<Route>) -> (Arc<SubscriptionRegistry>, Dispatcher, Bus) {
        let bus = Bus::new(64);
        let registry = SubscriptionRegistry::new(bus.clone());
        let dispatcher = Dispatcher::new(Arc::clone(&registry), routes, bus.clone());
        (registry, dispatcher, bus)
    }

    /// Forwards to a channel and, on its first delivery, subscribes a late joiner.
    struct JoinOnDeliver {
        tx: mpsc::UnboundedSender<Value>,
        registry: Arc<SubscriptionRegistry>,
        joiner: Mutex<Option<ReplyHandle>>,
    }

    #[async_trait]
    impl Outbox for JoinOnDeliver {
        async fn deliver(&self, payload: &Value) -> Result<(), DeliveryError> {
            if let Some(handle) = self.joiner.lock().await.take() {
                self.registry
                    .subscribe("t", Identity::from("C"), Route::Public, handle)
                    .await;
            }
            self.tx.send(payload.clone()).map_err(|_| DeliveryError::Closed)
        }
    }

    #[tokio::test]
    async fn test_snapshot_excludes_mid_broadcast_subscriber() {
        let (registry, dispatcher, _bus) = setup(vec![Route::Public, Route::Private]);

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (h_c, mut rx_c) = ReplyHandle::channel();
        let a = ReplyHandle::new(JoinOnDeliver {
            tx: tx_a,
            registry: Arc::clone(&registry),
            joiner: Mutex::new(Some(h_c)),
        });
        let (b, mut rx_b) = ReplyHandle::channel();

        registry.subscribe("t", "A".into(), Route::Public, a).await;
        registry.subscribe("t", "B".into(), Route::Public, b).await;

        let first = dispatcher.broadcast("t", &json!({"n": 1})).await;
        assert_eq!(first, BroadcastReport { delivered: 2, failed: 0 });
        assert_eq!(rx_a.try_recv().ok(), Some(json!({"n": 1})));
        assert_eq!(rx_b.try_recv().ok(), Some(json!({"n": 1})));
        assert!(rx_c.try_recv().is_err());

        let second = dispatcher.broadcast("t", &json!({"n": 2})).await;
        assert_eq!(second.delivered, 3);
        assert_eq!(rx_a.try_recv().ok(), Some(json!({"n": 2})));
        assert_eq!(rx_b.try_recv().ok(), Some(json!({"n": 2})));
        assert_eq!(rx_c.try_recv().ok(), Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_other_recipients() {
        let (registry, dispatcher, bus) = setup(vec![Route::Public, Route::Private]);
        let mut events = bus.subscribe();

        let (dead, dead_rx) = ReplyHandle::channel();
        drop(dead_rx);
        let (public, mut public_rx) = ReplyHandle::channel();
        let (private, mut private_rx) = ReplyHandle::channel();

        registry.subscribe("t", "dead".into(), Route::Public, dead).await;
        registry.subscribe("t", "pub".into(), Route::Public, public).await;
        registry.subscribe("t", "prv".into(), Route::Private, private).await;

        let report = dispatcher.broadcast("t", &json!(1)).await;
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
        assert_eq!(public_rx.try_recv().ok(), Some(json!(1)));
        assert_eq!(private_rx.try_recv().ok(), Some(json!(1)));

        // Failed recipient is reported but stays registered.
        assert_eq!(registry.len("t").await, 3);
        let failed = loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::DeliveryFailed {
                break ev;
            }
        };
        assert_eq!(failed.identity.as_deref(), Some("dead"));
        assert_eq!(failed.route, Some(Route::Public));
    }

    #[tokio::test]
    async fn test_unconfigured_route_is_skipped() {
        let (registry, dispatcher, _bus) = setup(vec![Route::Public]);
        let (private, mut private_rx) = ReplyHandle::channel();
        registry.subscribe("t", "prv".into(), Route::Private, private).await;

        let report = dispatcher.broadcast("t", &json!(1)).await;
        assert_eq!(report, BroadcastReport::default());
        assert!(private_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_topic_delivers_nothing() {
        let (_registry, dispatcher, _bus) = setup(vec![Route::Public, Route::Private]);
        assert_eq!(
            dispatcher.broadcast("nobody", &json!(1)).await,
            BroadcastReport::default()
        );
        assert_eq!(dispatcher.routes(), &[Route::Public, Route::Private]);
    }
}
