//! # Method table: method name → capability-typed handler.
//!
//! ```text
//! "echo"           ──► Handler::Sync(echo)
//! "getUTCTime"     ──► Handler::Forward{ op="time", uri, relay utc→utcTime }
//! "startHeartBeat" ──► Handler::Subscription(StartHeartbeat)
//! "stopHeartBeat"  ──► Handler::Subscription(StopHeartbeat)
//! ```
//!
//! The service matches on the handler kind: sync handlers answer at once,
//! forward handlers go through the correlator, subscription handlers touch the
//! registry and the heartbeat scheduler.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::core::Config;
use crate::correlator::{FieldRelay, OperationKey};
use crate::error::ServiceError;

use super::params::{self, EchoParams};

/// Handler answering from the payload alone.
pub type SyncFn = fn(&Value) -> Result<Value, ServiceError>;

/// Call-forwarding handler description.
#[derive(Clone, Debug)]
pub struct ForwardSpec {
    /// Correlation slot of the call.
    pub operation: OperationKey,
    /// Downstream method address.
    pub uri: Arc<str>,
    /// Reply transformation.
    pub relay: FieldRelay,
}

/// Subscription-aware actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionAction {
    /// Optionally subscribe the caller, then start the heartbeat.
    StartHeartbeat,
    /// Stop the heartbeat and unsubscribe the caller.
    StopHeartbeat,
}

/// What a method does, by capability.
#[derive(Clone, Debug)]
pub enum Handler {
    Sync(SyncFn),
    Forward(ForwardSpec),
    Subscription(SubscriptionAction),
}

/// Registry of callable methods.
#[derive(Clone, Debug, Default)]
pub struct MethodTable {
    handlers: HashMap<String, Handler>,
}

impl MethodTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The service's built-in methods.
    pub fn standard(cfg: &Config) -> Self {
        let mut table = Self::new();
        table.register("echo", Handler::Sync(echo));
        table.register(
            "getUTCTime",
            Handler::Forward(ForwardSpec {
                operation: OperationKey::time(),
                uri: Arc::from(cfg.time_service_uri.as_str()),
                relay: FieldRelay::utc_time(),
            }),
        );
        table.register(
            "startHeartBeat",
            Handler::Subscription(SubscriptionAction::StartHeartbeat),
        );
        table.register(
            "stopHeartBeat",
            Handler::Subscription(SubscriptionAction::StopHeartbeat),
        );
        table
    }

    /// Adds or replaces a method; returns the previous handler.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) -> Option<Handler> {
        self.handlers.insert(name.into(), handler)
    }

    /// Looks up a method.
    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    /// Returns sorted list of method names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Replies with the `input` string unchanged.
pub fn echo(payload: &Value) -> Result<Value, ServiceError> {
    let p: EchoParams = params::parse(payload)?;
    Ok(Value::String(p.input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_echo_round_trip() {
        for input in ["x", "", "héllo wörld", "{\"nested\":true}"] {
            assert_eq!(echo(&json!({"input": input})), Ok(json!(input)));
        }
    }

    #[test]
    fn test_echo_requires_string_input() {
        assert!(echo(&json!({})).is_err());
        assert!(echo(&json!({"input": 5})).is_err());
    }

    #[test]
    fn test_standard_table() {
        let table = MethodTable::standard(&Config::default());
        assert_eq!(
            table.names(),
            vec!["echo", "getUTCTime", "startHeartBeat", "stopHeartBeat"]
        );
        match table.get("getUTCTime") {
            Some(Handler::Forward(spec)) => {
                assert_eq!(spec.operation, OperationKey::time());
                assert_eq!(spec.relay, FieldRelay::utc_time());
            }
            other => panic!("unexpected handler: {other:?}"),
        }
        assert!(table.get("nope").is_none());
    }
}
