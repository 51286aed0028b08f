//! Callable methods.
//!
//! - [`MethodTable`] / [`Handler`] map method names to handler kinds;
//! - [`params`] holds the typed request/reply payloads.

pub mod params;
mod table;

pub use table::{ForwardSpec, Handler, MethodTable, SubscriptionAction, SyncFn};
