//! # ReplyHandle: single-owner reference to a waiting caller
//!
//! Every inbound request carries exactly one [`ReplyHandle`]. It is not
//! `Clone`: the handle is moved into a [`Subscriber`](crate::Subscriber) or a
//! pending call and released (dropped) exactly once, when the subscription is
//! removed or the call is resolved/abandoned.
//!
//! ```text
//! Request ──► reply.send({returnValue})  (borrow)
//!        └──► registry.subscribe(.., reply)   (move, owned by Subscriber)
//!        └──► correlator.issue(.., reply)     (move, owned by PendingCall)
//!                    └──► resolve → reply.finish(result)  (consume)
//! ```

use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::DeliveryError;

use super::Outbox;

/// Move-only handle used to reply to one caller, possibly many times.
pub struct ReplyHandle {
    outbox: Box<dyn Outbox>,
}

impl ReplyHandle {
    /// Wraps a transport-provided outbox.
    pub fn new(outbox: impl Outbox) -> Self {
        Self {
            outbox: Box::new(outbox),
        }
    }

    /// Creates a handle backed by an unbounded channel and returns the receiving end.
    ///
    /// ## Example
    /// ```rust
    /// use tickrelay::ReplyHandle;
    ///
    /// let (reply, mut rx) = ReplyHandle::channel();
    /// drop(reply);
    /// assert!(rx.try_recv().is_err());
    /// ```
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Pushes a payload and keeps the handle.
    pub async fn send(&self, payload: &Value) -> Result<(), DeliveryError> {
        self.outbox.deliver(payload).await
    }

    /// Pushes the final payload and releases the handle.
    pub async fn finish(self, payload: &Value) -> Result<(), DeliveryError> {
        self.outbox.deliver(payload).await
    }
}

impl fmt::Debug for ReplyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_then_finish() {
        let (reply, mut rx) = ReplyHandle::channel();
        reply.send(&json!({"a": 1})).await.unwrap();
        reply.finish(&json!({"a": 2})).await.unwrap();

        assert_eq!(rx.recv().await, Some(json!({"a": 1})));
        assert_eq!(rx.recv().await, Some(json!({"a": 2})));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_closed_receiver_reports_closed() {
        let (reply, rx) = ReplyHandle::channel();
        drop(rx);
        assert_eq!(
            reply.send(&json!(1)).await,
            Err(DeliveryError::Closed)
        );
    }

    #[tokio::test]
    async fn test_bounded_sender_reports_full() {
        let (tx, _rx) = mpsc::channel::<Value>(1);
        let reply = ReplyHandle::new(tx);
        reply.send(&json!(1)).await.unwrap();
        assert_eq!(reply.send(&json!(2)).await, Err(DeliveryError::Full));
    }
}
