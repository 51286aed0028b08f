//! # Downstream dependencies called by the service.
//!
//! A [`Downstream`] accepts a [`DownstreamCall`] and returns immediately; the
//! reply comes back later through the call's [`Completion`], which posts it to
//! the service loop as its own command.
//!
//! ```text
//! Service ── call(DownstreamCall{uri, payload, completion}) ──► Downstream
//!    ▲                                                              │ (later)
//!    └──────────── Command::Complete{ticket, reply} ◄── completion.succeed(reply)
//! ```
//!
//! ## Contents
//! - [`Downstream`] trait implemented by transports/clients;
//! - [`SystemClock`] built-in time provider answering `{"utc": <RFC 3339>}`.

mod clock;

pub use clock::SystemClock;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::Command;
use crate::correlator::CallTicket;
use crate::error::{DownstreamError, ServiceError};

/// Contract for outbound dependencies.
///
/// `call` must not wait for the reply. Returning `Err` means the call was not
/// issued; the waiting caller is then abandoned.
pub trait Downstream: Send + Sync + 'static {
    /// Issues one call.
    fn call(&self, call: DownstreamCall) -> Result<(), DownstreamError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// One outbound call.
pub struct DownstreamCall {
    /// Address of the remote method.
    pub uri: Arc<str>,
    /// Request payload.
    pub payload: Value,
    /// Where the reply must be delivered.
    pub completion: Completion,
}

/// Single-use reply path from a downstream back into the service loop.
pub struct Completion {
    ticket: CallTicket,
    tx: mpsc::Sender<Command>,
}

impl Completion {
    pub(crate) fn new(ticket: CallTicket, tx: mpsc::Sender<Command>) -> Self {
        Self { ticket, tx }
    }

    /// Ticket of the call being completed.
    pub fn ticket(&self) -> &CallTicket {
        &self.ticket
    }

    /// Delivers the downstream reply.
    pub async fn succeed(self, reply: Value) -> Result<(), ServiceError> {
        self.send(Ok(reply)).await
    }

    /// Reports that the dependency failed the call.
    pub async fn fail(self, error: DownstreamError) -> Result<(), ServiceError> {
        self.send(Err(error)).await
    }

    async fn send(self, outcome: Result<Value, DownstreamError>) -> Result<(), ServiceError> {
        self.tx
            .send(Command::Complete {
                ticket: self.ticket,
                outcome,
            })
            .await
            .map_err(|_| ServiceError::Closed)
    }
}
