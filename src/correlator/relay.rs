//! # FieldRelay: downstream reply → caller-facing result
//!
//! Pure transformation: take the string field `from` out of the downstream
//! payload and wrap it as the only field `to` of the reply.
//!
//! ```text
//! {"utc": "2026-10-19T08:00:00Z", ...}  ──► {"utcTime": "2026-10-19T08:00:00Z"}
//! ```

use serde_json::{Map, Value};

use crate::error::ServiceError;

/// Field-extracting reply transformation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRelay {
    from: &'static str,
    to: &'static str,
}

impl FieldRelay {
    /// Creates a relay that moves `from` in the downstream reply to `to` in the caller reply.
    pub const fn new(from: &'static str, to: &'static str) -> Self {
        Self { from, to }
    }

    /// The relay used for the time operation (`utc` → `utcTime`).
    pub const fn utc_time() -> Self {
        Self::new("utc", "utcTime")
    }

    /// Applies the transformation.
    ///
    /// Fails with [`ServiceError::MissingField`] when the field is absent or not a string.
    pub fn apply(&self, reply: &Value) -> Result<Value, ServiceError> {
        let value = reply
            .get(self.from)
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::MissingField {
                field: self.from.to_string(),
            })?;

        let mut out = Map::with_capacity(1);
        out.insert(self.to.to_string(), Value::String(value.to_string()));
        Ok(Value::Object(out))
    }
}
