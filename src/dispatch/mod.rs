//! Topic broadcast.
//!
//! [`Dispatcher`] sends one value to every subscriber of a topic across all
//! configured routes and reports per-recipient failures without aborting.

mod dispatcher;

pub use dispatcher::{BroadcastReport, Dispatcher};
