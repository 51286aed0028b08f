//! # Runtime events emitted by the service core.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Subscription events**: registry bookkeeping (subscribed, unsubscribed, disconnected)
//! - **Call events**: correlation of downstream calls (issued, abandoned, resolved, discarded)
//! - **Heartbeat events**: scheduler transitions and ticks
//! - **Failure events**: delivery, downstream and request failures
//!
//! The [`Event`] struct carries additional metadata such as timestamps, topic,
//! caller identity, operation key and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use tickrelay::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DeliveryFailed)
//!     .with_topic("heartbeat")
//!     .with_identity("com.example.app")
//!     .with_reason("recipient closed");
//!
//! assert_eq!(ev.kind, EventKind::DeliveryFailed);
//! assert_eq!(ev.topic.as_deref(), Some("heartbeat"));
//! assert_eq!(ev.reason.as_deref(), Some("recipient closed"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::subscriptions::Route;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Observer events ===
    /// Observer panicked during event processing.
    ///
    /// Sets:
    /// - `identity`: observer name
    /// - `reason`: panic info/message
    ObserverPanicked,

    /// Observer dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `identity`: observer name
    /// - `reason`: reason string (e.g., "full", "closed")
    ObserverOverflow,

    // === Subscription events ===
    /// Caller registered (or refreshed) interest in a topic.
    ///
    /// Sets:
    /// - `topic`, `identity`, `route`
    /// - `reason`: `"added"` or `"refreshed"`
    Subscribed,

    /// Caller's subscription removed by an explicit request.
    ///
    /// Sets:
    /// - `topic`, `identity`
    Unsubscribed,

    /// Transport reported the caller's connection as gone.
    ///
    /// Sets:
    /// - `identity`
    /// - `count`: number of subscriptions removed
    Disconnected,

    // === Call correlation events ===
    /// Downstream call handed to the dependency.
    ///
    /// Sets:
    /// - `operation`, `call`
    CallIssued,

    /// A pending caller was superseded by a newer call for the same operation,
    /// or released after a downstream failure or a malformed reply. It never
    /// gets a reply.
    ///
    /// Sets:
    /// - `operation`, `call`
    /// - `reason`
    CallAbandoned,

    /// Downstream reply relayed to the original caller.
    ///
    /// Sets:
    /// - `operation`, `call`
    CallResolved,

    /// Downstream reply arrived with no matching pending call and was dropped.
    ///
    /// Sets:
    /// - `operation`, `call`
    CallDiscarded,

    // === Heartbeat events ===
    /// Scheduler went Idle → Running.
    ///
    /// Sets:
    /// - `topic`
    HeartbeatStarted,

    /// Scheduler went Running → Idle.
    ///
    /// Sets:
    /// - `topic`
    /// - `count`: ticks fired before the stop
    HeartbeatStopped,

    /// One timer tick was broadcast.
    ///
    /// Sets:
    /// - `topic`
    /// - `count`: tick counter value
    /// - `delivered`: number of successful deliveries
    HeartbeatTick,

    // === Failure events ===
    /// Pushing a broadcast value to one subscriber failed.
    ///
    /// Sets:
    /// - `topic`, `identity`, `route`
    /// - `reason`
    DeliveryFailed,

    /// Pushing a reply to a caller failed.
    ///
    /// Sets:
    /// - `identity` (if known), `operation` (for relayed replies)
    /// - `reason`
    ReplyFailed,

    /// A downstream call could not be issued or was failed by the dependency.
    ///
    /// Sets:
    /// - `operation`, `call`
    /// - `reason`
    DownstreamFailed,

    /// An inbound request was dropped without reply (malformed, unknown method).
    ///
    /// Sets:
    /// - `identity`
    /// - `method`
    /// - `reason`
    RequestRejected,

    // === Lifecycle events ===
    /// The service loop was asked to stop.
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

    /// Topic key, if applicable.
    pub topic: Option<Arc<str>>,
    /// Caller identity (or observer name for observer events).
    pub identity: Option<Arc<str>>,
    /// Delivery route of the subscriber involved.
    pub route: Option<Route>,
    /// Operation key of a correlated call.
    pub operation: Option<Arc<str>>,
    /// Call ticket id of a correlated call.
    pub call: Option<u64>,
    /// Method name of an inbound request.
    pub method: Option<Arc<str>>,
    /// Counter value (tick count, removed subscriptions, ...).
    pub count: Option<u64>,
    /// Number of successful deliveries.
    pub delivered: Option<u32>,
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
            topic: None,
            identity: None,
            route: None,
            operation: None,
            call: None,
            method: None,
            count: None,
            delivered: None,
            reason: None,
        }
    }

    /// Attaches a topic key.
    #[inline]
    pub fn with_topic(mut self, topic: impl Into<Arc<str>>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Attaches a caller identity.
    #[inline]
    pub fn with_identity(mut self, identity: impl Into<Arc<str>>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Attaches a delivery route.
    #[inline]
    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    /// Attaches an operation key and call ticket id.
    #[inline]
    pub fn with_call(mut self, operation: impl Into<Arc<str>>, call: u64) -> Self {
        self.operation = Some(operation.into());
        self.call = Some(call);
        self
    }

    /// Attaches a method name.
    #[inline]
    pub fn with_method(mut self, method: impl Into<Arc<str>>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Attaches a counter value.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a successful delivery count.
    #[inline]
    pub fn with_delivered(mut self, n: u32) -> Self {
        self.delivered = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_identity(observer)
            .with_reason(format!("observer={observer} reason={reason}"))
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_identity(observer)
            .with_reason(info)
    }

    #[inline]
    pub fn is_observer_overflow(&self) -> bool {
        matches!(self.kind, EventKind::ObserverOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::HeartbeatTick);
        let b = Event::new(EventKind::HeartbeatTick);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_fill_fields() {
        let ev = Event::new(EventKind::CallResolved)
            .with_call("time", 7)
            .with_identity("com.example.app");
        assert_eq!(ev.operation.as_deref(), Some("time"));
        assert_eq!(ev.call, Some(7));
        assert_eq!(ev.identity.as_deref(), Some("com.example.app"));
        assert!(ev.topic.is_none());
    }

    #[test]
    fn test_observer_overflow_helper() {
        let ev = Event::observer_overflow("log", "full");
        assert!(ev.is_observer_overflow());
        assert_eq!(ev.identity.as_deref(), Some("log"));
    }
}
