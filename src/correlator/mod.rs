//! Correlation of asynchronous downstream calls.
//!
//! - [`AsyncCallCorrelator`] keyed table of pending calls;
//! - [`CallTicket`] / [`OperationKey`] identify a call;
//! - [`FieldRelay`] turns a downstream reply into the caller-facing result.

mod table;
mod relay;

pub use table::{AsyncCallCorrelator, CallTicket, OperationKey, Resolution};
pub use relay::FieldRelay;
