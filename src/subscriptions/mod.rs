//! Topic subscriptions.
//!
//! - [`SubscriptionRegistry`] maps topics to ordered subscriber lists;
//! - [`Subscriber`] / [`Identity`] / [`Route`] describe one entry.

mod registry;
mod subscriber;

pub use registry::{SubscribeOutcome, SubscriptionRegistry};
pub use subscriber::{Identity, Route, Subscriber};
