use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::debug;

use crate::error::DownstreamError;

use super::{Downstream, DownstreamCall};

/// Time provider answering every call with the current UTC time.
///
/// The reply is produced on a spawned task so the caller sees a real
/// asynchronous round trip. Requires a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Downstream for SystemClock {
    fn call(&self, call: DownstreamCall) -> Result<(), DownstreamError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|e| {
            DownstreamError::Unavailable {
                reason: e.to_string(),
            }
        })?;

        rt.spawn(async move {
            let reply = json!({
                "returnValue": true,
                "utc": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            });
            if let Err(e) = call.completion.succeed(reply).await {
                debug!(uri = %call.uri, "time reply dropped: {e}");
            }
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "system_clock"
    }
}
