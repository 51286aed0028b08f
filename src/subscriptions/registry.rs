//! # Subscription registry - topic → interested callers.
//!
//! Keeps, per topic, the ordered list of callers that asked to be notified.
//!
//! ## Architecture
//! ```text
//! startHeartBeat{subscribe} ──► subscribe(topic, identity, route, handle)
//! stopHeartBeat             ──► unsubscribe(topic, identity)
//! transport disconnect      ──► disconnect(identity)
//! Dispatcher::broadcast     ──► subscribers_of(topic)  (snapshot)
//!
//! HashMap<topic, Vec<Arc<Subscriber>>>   (insertion order per topic)
//! ```
//!
//! ## Rules
//! - At most one entry per `(topic, identity)`; identities compare by value.
//! - A second subscribe for the same pair **refreshes** the entry: new handle and
//!   route, same position, old handle released.
//! - Removing an unknown entry or reading an unknown topic is not an error.
//! - `subscribers_of` returns a snapshot; the lock is released before any delivery,
//!   so subscriptions made during a broadcast are seen by the next one only.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::events::{Bus, Event, EventKind};
use crate::reply::ReplyHandle;

use super::subscriber::{Identity, Route, Subscriber};

/// Result of [`SubscriptionRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// A new entry was created.
    Added,
    /// An entry for the same identity existed; its handle was replaced.
    Refreshed,
}

impl SubscribeOutcome {
    fn as_label(&self) -> &'static str {
        match self {
            SubscribeOutcome::Added => "added",
            SubscribeOutcome::Refreshed => "refreshed",
        }
    }
}

/// Thread-safe registry of topic subscribers.
pub struct SubscriptionRegistry {
    topics: RwLock<HashMap<Arc<str>, Vec<Arc<Subscriber>>>>,
    bus: Bus,
}

impl SubscriptionRegistry {
    /// Creates a new empty registry.
    pub fn new(bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            topics: RwLock::new(HashMap::new()),
            bus,
        })
    }

    /// Registers `identity` as interested in `topic`.
    pub async fn subscribe(
        &self,
        topic: &str,
        identity: Identity,
        route: Route,
        handle: ReplyHandle,
    ) -> SubscribeOutcome {
        let outcome = {
            let mut topics = self.topics.write().await;
            let key: Arc<str> = match topics.get_key_value(topic) {
                Some((k, _)) => Arc::clone(k),
                None => Arc::from(topic),
            };
            let subs = topics.entry(Arc::clone(&key)).or_default();
            let entry = Arc::new(Subscriber::new(key, identity.clone(), route, handle));

            match subs.iter().position(|s| s.identity() == &identity) {
                Some(idx) => {
                    subs[idx] = entry;
                    SubscribeOutcome::Refreshed
                }
                None => {
                    subs.push(entry);
                    SubscribeOutcome::Added
                }
            }
        };

        self.bus.publish(
            Event::new(EventKind::Subscribed)
                .with_topic(topic)
                .with_identity(&identity)
                .with_route(route)
                .with_reason(outcome.as_label()),
        );
        outcome
    }

    /// Removes the entry matching `topic` and `identity`.
    ///
    /// Returns `false` if there was nothing to remove.
    pub async fn unsubscribe(&self, topic: &str, identity: &Identity) -> bool {
        let removed = {
            let mut topics = self.topics.write().await;
            let Some(subs) = topics.get_mut(topic) else {
                return false;
            };
            let before = subs.len();
            subs.retain(|s| s.identity() != identity);
            let removed = subs.len() != before;
            if subs.is_empty() {
                topics.remove(topic);
            }
            removed
        };

        if removed {
            self.bus.publish(
                Event::new(EventKind::Unsubscribed)
                    .with_topic(topic)
                    .with_identity(identity),
            );
        }
        removed
    }

    /// Removes `identity` from every topic (its connection is gone).
    ///
    /// Returns the number of removed subscriptions.
    pub async fn disconnect(&self, identity: &Identity) -> usize {
        let removed = {
            let mut topics = self.topics.write().await;
            let mut removed = 0;
            topics.retain(|_, subs| {
                let before = subs.len();
                subs.retain(|s| s.identity() != identity);
                removed += before - subs.len();
                !subs.is_empty()
            });
            removed
        };

        if removed > 0 {
            self.bus.publish(
                Event::new(EventKind::Disconnected)
                    .with_identity(identity)
                    .with_count(removed as u64),
            );
        }
        removed
    }

    /// Returns the current subscribers of `topic` in subscription order.
    pub async fn subscribers_of(&self, topic: &str) -> Vec<Arc<Subscriber>> {
        self.topics
            .read()
            .await
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns true if `identity` is subscribed to `topic`.
    pub async fn contains(&self, topic: &str, identity: &Identity) -> bool {
        self.topics
            .read()
            .await
            .get(topic)
            .is_some_and(|subs| subs.iter().any(|s| s.identity() == identity))
    }

    /// Number of subscribers of `topic`.
    pub async fn len(&self, topic: &str) -> usize {
        self.topics.read().await.get(topic).map_or(0, Vec::len)
    }

    /// Returns sorted list of topics with at least one subscriber.
    pub async fn topics(&self) -> Vec<String> {
        let topics = self.topics.read().await;
        let mut names: Vec<String> = topics.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }
}
