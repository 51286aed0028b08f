//! Periodic heartbeat.
//!
//! [`HeartbeatScheduler`] owns the single timer and the tick counter; the
//! service loop awaits its ticks and hands each counter value to the dispatcher.

mod scheduler;

pub use scheduler::{HeartbeatScheduler, HeartbeatStatus};
