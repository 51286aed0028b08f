//! # AsyncCallCorrelator - downstream reply → original caller.
//!
//! Keeps one slot per [`OperationKey`]. Issuing a call stores the caller under a
//! fresh [`CallTicket`]; the downstream completion carries that ticket back and
//! is matched against the slot.
//!
//! ## Lifecycle
//! ```text
//! issue(op, caller, relay, dispatch)
//!   ├─► slot[op] = PendingCall{ id: n, caller }   (previous occupant abandoned)
//!   ├─► dispatch(ticket{op, n})
//!   │     ├─ Ok  ──► CallIssued
//!   │     └─ Err ──► DownstreamFailed, slot cleared, caller dropped unanswered
//!   ...
//! resolve(ticket{op, n}, reply)       (later loop turn)
//!   ├─ slot empty / id != n ──► Discarded
//!   ├─ relay fails          ──► Err(MissingField), slot cleared, caller dropped unanswered
//!   └─ relay ok             ──► caller.finish(result), slot cleared, Resolved
//! ```
//!
//! ## Rules
//! - At most one pending call per operation key; a newer call **overwrites** the
//!   slot and the older caller never gets a reply.
//! - Resolution is at-most-once: the slot is removed before the reply is sent.
//! - A failed final reply is reported ([`EventKind::ReplyFailed`]) and never retried.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{DownstreamError, ServiceError};
use crate::events::{Bus, Event, EventKind};
use crate::reply::ReplyHandle;

use super::relay::FieldRelay;

/// Name of one logical kind of outbound call (e.g. `"time"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OperationKey(Arc<str>);

impl OperationKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Key of the time-provider call.
    pub fn time() -> Self {
        Self::new("time")
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one issued call; handed to the downstream and returned with its reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallTicket {
    operation: OperationKey,
    id: u64,
}

impl CallTicket {
    /// Operation this call belongs to.
    pub fn operation(&self) -> &OperationKey {
        &self.operation
    }

    /// Per-correlator call number (starts at 1).
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Outcome of [`AsyncCallCorrelator::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Reply relayed to the waiting caller (or the attempt was reported as failed).
    Resolved,
    /// No matching pending call; the reply was dropped.
    Discarded,
}

/// Caller waiting for a downstream reply.
struct PendingCall {
    id: u64,
    caller: ReplyHandle,
    relay: FieldRelay,
}

/// Keyed table of in-flight downstream calls.
pub struct AsyncCallCorrelator {
    pending: HashMap<OperationKey, PendingCall>,
    next_id: u64,
    bus: Bus,
}

impl AsyncCallCorrelator {
    /// Creates an empty correlator.
    pub fn new(bus: Bus) -> Self {
        Self {
            pending: HashMap::new(),
            next_id: 0,
            bus,
        }
    }

    /// Records `caller` under `operation`, then runs `dispatch` to hand the request downstream.
    ///
    /// `dispatch` receives the ticket the downstream must complete with.
    pub fn issue<F>(
        &mut self,
        operation: OperationKey,
        caller: ReplyHandle,
        relay: FieldRelay,
        dispatch: F,
    ) -> Result<CallTicket, DownstreamError>
    where
        F: FnOnce(CallTicket) -> Result<(), DownstreamError>,
    {
        self.next_id += 1;
        let ticket = CallTicket {
            operation: operation.clone(),
            id: self.next_id,
        };

        let previous = self.pending.insert(
            operation.clone(),
            PendingCall {
                id: ticket.id,
                caller,
                relay,
            },
        );
        if let Some(prev) = previous {
            self.bus.publish(
                Event::new(EventKind::CallAbandoned)
                    .with_call(operation.as_str(), prev.id)
                    .with_reason("superseded"),
            );
        }

        match dispatch(ticket.clone()) {
            Ok(()) => {
                self.bus.publish(
                    Event::new(EventKind::CallIssued).with_call(operation.as_str(), ticket.id),
                );
                Ok(ticket)
            }
            Err(e) => {
                self.pending.remove(&operation);
                self.bus.publish(
                    Event::new(EventKind::DownstreamFailed)
                        .with_call(operation.as_str(), ticket.id)
                        .with_reason(e.as_message()),
                );
                Err(e)
            }
        }
    }

    /// Matches a downstream reply to its pending caller and relays the result.
    pub async fn resolve(
        &mut self,
        ticket: &CallTicket,
        reply: &Value,
    ) -> Result<Resolution, ServiceError> {
        let op = ticket.operation.as_str();

        let result = match self.pending.get(&ticket.operation) {
            Some(p) if p.id == ticket.id => p.relay.apply(reply),
            _ => {
                self.bus
                    .publish(Event::new(EventKind::CallDiscarded).with_call(op, ticket.id));
                return Ok(Resolution::Discarded);
            }
        };

        let result = match result {
            Ok(v) => v,
            Err(e) => {
                // The completion was consumed by this reply; no other can follow.
                self.pending.remove(&ticket.operation);
                self.bus.publish(
                    Event::new(EventKind::CallAbandoned)
                        .with_call(op, ticket.id)
                        .with_reason("malformed_reply"),
                );
                return Err(e);
            }
        };

        let Some(pending) = self.pending.remove(&ticket.operation) else {
            return Ok(Resolution::Discarded);
        };
        if let Err(e) = pending.caller.finish(&result).await {
            self.bus.publish(
                Event::new(EventKind::ReplyFailed)
                    .with_call(op, ticket.id)
                    .with_reason(e.as_label()),
            );
        }
        self.bus
            .publish(Event::new(EventKind::CallResolved).with_call(op, ticket.id));
        Ok(Resolution::Resolved)
    }

    /// Releases the caller of `ticket` without a reply (the dependency failed the call).
    ///
    /// Returns `false` if the ticket no longer owns its slot.
    pub fn abandon(&mut self, ticket: &CallTicket, reason: &str) -> bool {
        let owns_slot = self
            .pending
            .get(&ticket.operation)
            .is_some_and(|p| p.id == ticket.id);
        if !owns_slot {
            return false;
        }

        self.pending.remove(&ticket.operation);
        self.bus.publish(
            Event::new(EventKind::CallAbandoned)
                .with_call(ticket.operation.as_str(), ticket.id)
                .with_reason(reason.to_string()),
        );
        true
    }

    /// Returns true if a call for `operation` is in flight.
    pub fn is_pending(&self, operation: &OperationKey) -> bool {
        self.pending.contains_key(operation)
    }

    /// Number of in-flight calls.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if no call is in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue_ok(c: &mut AsyncCallCorrelator, caller: ReplyHandle) -> CallTicket {
        c.issue(OperationKey::time(), caller, FieldRelay::utc_time(), |_| Ok(()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_relays_to_caller_once() {
        let mut c = AsyncCallCorrelator::new(Bus::new(64));
        let (caller, mut rx) = ReplyHandle::channel();
        let ticket = issue_ok(&mut c, caller);
        assert!(c.is_pending(&OperationKey::time()));

        let reply = json!({"utc": "2026-10-19T08:00:00Z"});
        assert_eq!(c.resolve(&ticket, &reply).await, Ok(Resolution::Resolved));
        assert_eq!(rx.recv().await, Some(json!({"utcTime": "2026-10-19T08:00:00Z"})));
        // Handle released after the single reply.
        assert_eq!(rx.recv().await, None);

        assert_eq!(c.resolve(&ticket, &reply).await, Ok(Resolution::Discarded));
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_discards_superseded_reply() {
        let mut c = AsyncCallCorrelator::new(Bus::new(64));
        let (x, mut rx_x) = ReplyHandle::channel();
        let (y, mut rx_y) = ReplyHandle::channel();

        let tx = issue_ok(&mut c, x);
        let ty = issue_ok(&mut c, y);
        assert_eq!(c.len(), 1);

        let reply = json!({"utc": "x"});
        assert_eq!(c.resolve(&tx, &reply).await, Ok(Resolution::Discarded));
        // X was abandoned: its handle is gone and nothing was sent.
        assert_eq!(rx_x.recv().await, None);

        let reply = json!({"utc": "y"});
        assert_eq!(c.resolve(&ty, &reply).await, Ok(Resolution::Resolved));
        assert_eq!(rx_y.recv().await, Some(json!({"utcTime": "y"})));
    }

    #[tokio::test]
    async fn test_dispatch_failure_abandons_caller() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let mut c = AsyncCallCorrelator::new(bus);
        let (caller, mut rx) = ReplyHandle::channel();

        let res = c.issue(OperationKey::time(), caller, FieldRelay::utc_time(), |_| {
            Err(DownstreamError::Unavailable {
                reason: "bus down".into(),
            })
        });
        assert!(res.is_err());
        assert!(c.is_empty());
        assert_eq!(rx.recv().await, None);

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::DownstreamFailed);
        assert_eq!(ev.operation.as_deref(), Some("time"));
    }

    #[tokio::test]
    async fn test_malformed_reply_abandons_caller() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let mut c = AsyncCallCorrelator::new(bus);
        let (caller, mut rx) = ReplyHandle::channel();
        let ticket = issue_ok(&mut c, caller);

        let res = c.resolve(&ticket, &json!({"returnValue": false})).await;
        assert!(matches!(res, Err(ServiceError::MissingField { .. })));
        assert!(c.is_empty());
        assert_eq!(rx.recv().await, None);

        let mut abandoned = None;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::CallAbandoned {
                abandoned = Some(ev);
            }
        }
        let ev = abandoned.expect("abandon event");
        assert_eq!(ev.reason.as_deref(), Some("malformed_reply"));
        assert_eq!(ev.call, Some(ticket.id()));
    }

    #[tokio::test]
    async fn test_reply_to_gone_caller_is_swallowed() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let mut c = AsyncCallCorrelator::new(bus);
        let (caller, rx) = ReplyHandle::channel();
        let ticket = issue_ok(&mut c, caller);
        drop(rx);

        let res = c.resolve(&ticket, &json!({"utc": "t"})).await;
        assert_eq!(res, Ok(Resolution::Resolved));
        assert!(c.is_empty());

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::ReplyFailed));
    }

    #[tokio::test]
    async fn test_abandon_only_current_ticket() {
        let mut c = AsyncCallCorrelator::new(Bus::new(64));
        let (x, _rx_x) = ReplyHandle::channel();
        let (y, _rx_y) = ReplyHandle::channel();
        let tx = issue_ok(&mut c, x);
        let ty = issue_ok(&mut c, y);

        assert!(!c.abandon(&tx, "failed"));
        assert!(c.is_pending(&OperationKey::time()));
        assert!(c.abandon(&ty, "failed"));
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn test_operations_are_independent() {
        let mut c = AsyncCallCorrelator::new(Bus::new(64));
        let (a, mut rx_a) = ReplyHandle::channel();
        let (b, mut rx_b) = ReplyHandle::channel();
        let ta = c
            .issue(OperationKey::new("a"), a, FieldRelay::new("v", "a"), |_| Ok(()))
            .unwrap();
        let tb = c
            .issue(OperationKey::new("b"), b, FieldRelay::new("v", "b"), |_| Ok(()))
            .unwrap();
        assert_eq!(c.len(), 2);

        c.resolve(&tb, &json!({"v": "2"})).await.unwrap();
        c.resolve(&ta, &json!({"v": "1"})).await.unwrap();
        assert_eq!(rx_a.recv().await, Some(json!({"a": "1"})));
        assert_eq!(rx_b.recv().await, Some(json!({"b": "2"})));
    }
}
