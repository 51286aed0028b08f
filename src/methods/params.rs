//! Request parameters and reply payloads of the built-in methods.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ServiceError;

/// `echo` parameters.
#[derive(Debug, Deserialize)]
pub struct EchoParams {
    /// Text sent back verbatim.
    pub input: String,
}

/// `startHeartBeat` parameters.
///
/// Only the presence of `subscribe` matters; `false` and `null` count as present.
#[derive(Debug, Default, Deserialize)]
pub struct StartParams {
    /// `None` when the key is absent, `Some(None)` when it is `null`.
    #[serde(default, deserialize_with = "present")]
    pub subscribe: Option<Option<bool>>,
}

/// Maps any present value (including `null`) to `Some`.
fn present<'de, D>(de: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(de).map(Some)
}

impl StartParams {
    /// True if the caller asked to receive heartbeats.
    pub fn wants_subscription(&self) -> bool {
        self.subscribe.is_some()
    }
}

/// Parameters of methods that take none (`getUTCTime`, `stopHeartBeat`).
///
/// Any JSON object is accepted; unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct NoParams {}

/// Acknowledgement sent by the heartbeat control methods.
#[derive(Debug, Serialize)]
pub struct ReturnValue {
    #[serde(rename = "returnValue")]
    pub return_value: bool,
}

impl ReturnValue {
    pub fn ok() -> Value {
        serde_json::to_value(ReturnValue { return_value: true })
            .unwrap_or_else(|_| serde_json::json!({ "returnValue": true }))
    }
}

/// Value pushed to heartbeat subscribers on every tick.
#[derive(Debug, Serialize)]
pub struct HeartbeatPayload {
    pub heartbeat: u64,
}

impl HeartbeatPayload {
    pub fn to_value(count: u64) -> Value {
        serde_json::to_value(HeartbeatPayload { heartbeat: count })
            .unwrap_or_else(|_| serde_json::json!({ "heartbeat": count }))
    }
}

/// Extracts typed parameters from a parsed payload.
pub fn parse<T: DeserializeOwned>(payload: &Value) -> Result<T, ServiceError> {
    T::deserialize(payload).map_err(ServiceError::malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_presence_is_enough() {
        let p: StartParams = parse(&json!({"subscribe": false})).unwrap();
        assert!(p.wants_subscription());
        let p: StartParams = parse(&json!({"subscribe": null})).unwrap();
        assert!(p.wants_subscription());
        let p: StartParams = parse(&json!({})).unwrap();
        assert!(!p.wants_subscription());
    }

    #[test]
    fn test_ill_typed_subscribe_is_malformed() {
        let err = parse::<StartParams>(&json!({"subscribe": "yes"})).unwrap_err();
        assert_eq!(err.as_label(), "malformed_payload");
    }

    #[test]
    fn test_no_params_accepts_objects_only() {
        assert!(parse::<NoParams>(&json!({"anything": 1})).is_ok());
        assert!(parse::<NoParams>(&json!("text")).is_err());
    }

    #[test]
    fn test_payload_shapes() {
        assert_eq!(HeartbeatPayload::to_value(3), json!({"heartbeat": 3}));
        assert_eq!(ReturnValue::ok(), json!({"returnValue": true}));
    }
}
