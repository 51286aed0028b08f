//! # Observers: user-facing event handlers
//!
//! All runtime [`Event`](crate::Event)s flow through the bus into the
//! [`ObserverSet`], which feeds every [`Observe`] implementation on its own
//! worker.
//!
//! ```text
//! publishers ──► Bus ──► observer_listener ──► ObserverSet::emit
//!                                                   │
//!                              ┌────────────────────┼──────────────┐
//!                              ▼                    ▼              ▼
//!                          LogWriter            CustomA         CustomB
//! ```
//!
//! Provided implementations:
//! - [`LogWriter`] writes events as `tracing` records.

mod log;
mod observe;
mod set;

pub use log::LogWriter;
pub use observe::Observe;
pub use set::ObserverSet;
