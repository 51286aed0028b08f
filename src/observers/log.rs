//! # LogWriter: events as `tracing` records
//!
//! Failures are logged at `warn`, lifecycle transitions at `info`, and
//! per-message traffic (ticks, call bookkeeping) at `debug`.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};

use super::Observe;

/// Observer writing every event through `tracing`.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let topic = e.topic.as_deref().unwrap_or("-");
        let identity = e.identity.as_deref().unwrap_or("-");
        let operation = e.operation.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::Subscribed => {
                info!(seq = e.seq, topic, identity, route = ?e.route, reason, "subscribed");
            }
            EventKind::Unsubscribed => {
                info!(seq = e.seq, topic, identity, "unsubscribed");
            }
            EventKind::Disconnected => {
                info!(seq = e.seq, identity, removed = ?e.count, "caller disconnected");
            }
            EventKind::HeartbeatStarted => {
                info!(seq = e.seq, topic, "heartbeat started");
            }
            EventKind::HeartbeatStopped => {
                info!(seq = e.seq, topic, ticks = ?e.count, "heartbeat stopped");
            }
            EventKind::ShutdownRequested => {
                info!(seq = e.seq, "shutdown requested");
            }
            EventKind::HeartbeatTick => {
                debug!(seq = e.seq, topic, tick = ?e.count, delivered = ?e.delivered, "heartbeat tick");
            }
            EventKind::CallIssued | EventKind::CallResolved => {
                debug!(seq = e.seq, kind = ?e.kind, operation, call = ?e.call, "call");
            }
            EventKind::CallAbandoned | EventKind::CallDiscarded => {
                debug!(seq = e.seq, kind = ?e.kind, operation, call = ?e.call, reason, "call dropped");
            }
            EventKind::DeliveryFailed => {
                warn!(seq = e.seq, topic, identity, route = ?e.route, reason, "delivery failed");
            }
            EventKind::ReplyFailed => {
                warn!(seq = e.seq, identity, operation, reason, "reply failed");
            }
            EventKind::DownstreamFailed => {
                warn!(seq = e.seq, operation, call = ?e.call, reason, "downstream failed");
            }
            EventKind::RequestRejected => {
                warn!(seq = e.seq, identity, method = e.method.as_deref().unwrap_or("-"), reason, "request rejected");
            }
            EventKind::ObserverOverflow => {
                warn!(seq = e.seq, observer = identity, reason, "observer overflow");
            }
            EventKind::ObserverPanicked => {
                warn!(seq = e.seq, observer = identity, reason, "observer panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
