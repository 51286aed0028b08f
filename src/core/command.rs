use std::fmt;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::correlator::CallTicket;
use crate::error::DownstreamError;
use crate::heartbeat::HeartbeatStatus;
use crate::reply::ReplyHandle;
use crate::subscriptions::{Identity, Route};

/// One inbound method call.
///
/// `payload` is the raw JSON text as received; it is parsed by the service,
/// and a payload that does not parse is dropped without reply.
pub struct Request {
    /// Method name (`echo`, `getUTCTime`, ...).
    pub method: String,
    /// Raw JSON parameters.
    pub payload: String,
    /// Caller identity; keys subscriptions and disconnects.
    pub sender: Identity,
    /// Route the request arrived on.
    pub route: Route,
    /// Where replies for this call go.
    pub reply: ReplyHandle,
}

impl Request {
    /// Creates a request arriving on [`Route::Public`].
    pub fn new(
        method: impl Into<String>,
        payload: impl Into<String>,
        sender: impl Into<Identity>,
        reply: ReplyHandle,
    ) -> Self {
        Self {
            method: method.into(),
            payload: payload.into(),
            sender: sender.into(),
            route: Route::Public,
            reply,
        }
    }

    /// Sets the route the request arrived on.
    pub fn with_route(mut self, route: Route) -> Self {
        self.route = route;
        self
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("sender", &self.sender)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

/// Work item of the service loop.
pub(crate) enum Command {
    Request(Request),
    Complete {
        ticket: CallTicket,
        outcome: Result<Value, DownstreamError>,
    },
    Disconnect(Identity),
    Status(oneshot::Sender<HeartbeatStatus>),
}
