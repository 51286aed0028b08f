//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/observe runtime events emitted by the registry, the correlator,
//! the heartbeat scheduler, the dispatcher and the service loop.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `SubscriptionRegistry`, `AsyncCallCorrelator`, `HeartbeatScheduler`,
//!   `Dispatcher`, `Service`, `ObserverSet` workers (overflow/panic).
//! - **Consumers**: `Service::observer_listener()` (fans out to `ObserverSet`)
//!   and any receiver obtained from `ServiceHandle::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
