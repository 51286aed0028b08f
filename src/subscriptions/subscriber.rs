//! # Subscriber record and its keys
//!
//! - [`Identity`] names the caller's connection; compared **by value**.
//! - [`Route`] is the delivery channel a request arrived on.
//! - [`Subscriber`] ties both to a topic and owns the caller's [`ReplyHandle`].

use std::fmt;
use std::sync::Arc;

use crate::reply::ReplyHandle;

/// Opaque caller identity (e.g. the sender's service name or connection id).
///
/// Cheap to clone; equality and hashing use the string value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Arc<str>);

impl Identity {
    /// Creates an identity from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Identity> for Arc<str> {
    fn from(id: &Identity) -> Self {
        Arc::clone(&id.0)
    }
}

/// Delivery channel a caller is reachable on.
///
/// A service is usually exposed on a public and a private bus connection;
/// broadcasts go out on every route configured in [`Config::routes`](crate::Config::routes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Connection reachable by any client.
    Public,
    /// Connection reserved for privileged clients.
    Private,
}

impl Route {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Route::Public => "public",
            Route::Private => "private",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One caller's interest in one topic.
#[derive(Debug)]
pub struct Subscriber {
    topic: Arc<str>,
    identity: Identity,
    route: Route,
    handle: ReplyHandle,
}

impl Subscriber {
    pub(crate) fn new(topic: Arc<str>, identity: Identity, route: Route, handle: ReplyHandle) -> Self {
        Self {
            topic,
            identity,
            route,
            handle,
        }
    }

    /// Topic key this subscriber listens on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Caller identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Route the subscription arrived on.
    pub fn route(&self) -> Route {
        self.route
    }

    /// Handle used to push broadcasts to this caller.
    pub fn handle(&self) -> &ReplyHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_compares_by_value() {
        let a = Identity::from(String::from("com.example.app"));
        let b = Identity::from("com.example.app");
        assert_eq!(a, b);
        assert_ne!(a, Identity::from("com.example.other"));
    }
}
