use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::ServiceError;
use crate::events::{Bus, Event};
use crate::heartbeat::HeartbeatStatus;
use crate::reply::ReplyHandle;
use crate::subscriptions::Identity;

use super::command::{Command, Request};

/// Handle for talking to a running [`Service`](crate::Service).
///
/// Cloneable; the service loop ends once every handle (and every outstanding
/// downstream completion) is dropped.
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Command>,
    bus: Bus,
}

impl ServiceHandle {
    pub(crate) fn new(tx: mpsc::Sender<Command>, bus: Bus) -> Self {
        Self { tx, bus }
    }

    /// Submits a request (waits if the queue is full).
    pub async fn submit(&self, request: Request) -> Result<(), ServiceError> {
        self.send(Command::Request(request)).await
    }

    /// Submits a request without waiting (fails if the queue is full).
    pub fn try_submit(&self, request: Request) -> Result<(), ServiceError> {
        self.tx
            .try_send(Command::Request(request))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => ServiceError::Full,
                mpsc::error::TrySendError::Closed(_) => ServiceError::Closed,
            })
    }

    /// Submits a request on the public route and returns the caller's reply stream.
    ///
    /// The stream ends when the service drops the caller's handle: after a
    /// final reply, when a request is rejected, or when a subscription ends.
    pub async fn request(
        &self,
        method: impl Into<String>,
        payload: impl Into<String>,
        sender: impl Into<Identity>,
    ) -> Result<mpsc::UnboundedReceiver<Value>, ServiceError> {
        let (reply, rx) = ReplyHandle::channel();
        self.submit(Request::new(method, payload, sender, reply)).await?;
        Ok(rx)
    }

    /// Reports that a caller's connection is gone; all its subscriptions are removed.
    pub async fn disconnect(&self, identity: impl Into<Identity>) -> Result<(), ServiceError> {
        self.send(Command::Disconnect(identity.into())).await
    }

    /// Returns the heartbeat state as seen by the service loop.
    ///
    /// The answer reflects every command submitted before this call.
    pub async fn heartbeat_status(&self) -> Result<HeartbeatStatus, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Status(tx)).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    /// Subscribes to runtime events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    async fn send(&self, command: Command) -> Result<(), ServiceError> {
        self.tx.send(command).await.map_err(|_| ServiceError::Closed)
    }
}
