//! # Outbox: where a caller's replies go
//!
//! `Outbox` is the seam between the core and the transport. A transport hands
//! the core one outbox per inbound request; the core pushes the immediate reply
//! and, for subscriptions, every later broadcast through it.
//!
//! Implementations are provided for tokio mpsc senders:
//! - `UnboundedSender<Value>`: never full, fails only when the receiver is dropped;
//! - `Sender<Value>`: bounded, uses `try_send` so a slow caller never stalls the loop.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::DeliveryError;

/// Contract for reply sinks.
///
/// Called from the service loop. Implementations must not wait on the
/// recipient; report [`DeliveryError::Full`] instead.
#[async_trait]
pub trait Outbox: Send + Sync + 'static {
    /// Push one payload to the recipient.
    async fn deliver(&self, payload: &Value) -> Result<(), DeliveryError>;
}

#[async_trait]
impl Outbox for mpsc::UnboundedSender<Value> {
    async fn deliver(&self, payload: &Value) -> Result<(), DeliveryError> {
        self.send(payload.clone()).map_err(|_| DeliveryError::Closed)
    }
}

#[async_trait]
impl Outbox for mpsc::Sender<Value> {
    async fn deliver(&self, payload: &Value) -> Result<(), DeliveryError> {
        self.try_send(payload.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
