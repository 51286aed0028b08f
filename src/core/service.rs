//! # Service: the single command loop owning all state.
//!
//! ```text
//! ServiceHandle ──submit──┐
//! Completion ──complete───┼──► [command queue] ──► Service::run
//! ServiceHandle ──ctl─────┘                           │
//!                                                     ├─ Request  ─► MethodTable ─┬─ Sync         → reply
//!                                                     │                           ├─ Forward      → AsyncCallCorrelator::issue ─► Downstream
//!                                                     │                           └─ Subscription → SubscriptionRegistry + HeartbeatScheduler
//!                                                     ├─ Complete ─► AsyncCallCorrelator::resolve / abandon
//!                                                     ├─ Disconnect ─► SubscriptionRegistry::disconnect
//!                                                     └─ HeartbeatScheduler::tick ─► Dispatcher::broadcast({"heartbeat": n})
//! ```
//!
//! ## Rules
//! - Every command is handled to completion before the next one is taken, so
//!   handlers observe and mutate state atomically.
//! - The `select!` is biased: cancellation first, then commands, then the
//!   heartbeat. A `stopHeartBeat` queued before a due tick wins. The cost is
//!   that a queue that never empties postpones ticks, and with
//!   `MissedTickBehavior::Delay` the schedule shifts by the delay.
//! - Bad input is dropped without reply and reported as `RequestRejected`;
//!   nothing a caller sends can end the loop.
//! - The loop holds only a weak sender; it ends when every [`ServiceHandle`]
//!   and outstanding [`Completion`] is gone, or when the token is cancelled.
//!
//! [`ServiceHandle`]: crate::ServiceHandle

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::correlator::{AsyncCallCorrelator, CallTicket};
use crate::dispatch::Dispatcher;
use crate::downstream::{Completion, Downstream, DownstreamCall};
use crate::error::{DownstreamError, ServiceError};
use crate::events::{Bus, Event, EventKind};
use crate::heartbeat::HeartbeatScheduler;
use crate::methods::params::{self, HeartbeatPayload, NoParams, ReturnValue, StartParams};
use crate::methods::{ForwardSpec, Handler, MethodTable, SubscriptionAction};
use crate::observers::{Observe, ObserverSet};
use crate::reply::ReplyHandle;
use crate::subscriptions::{Identity, Route, SubscriptionRegistry};

use super::command::{Command, Request};

/// Owner of the registry, correlator, scheduler and dispatcher.
///
/// Built by [`ServiceBuilder`](crate::ServiceBuilder); driven by [`Service::run`].
pub struct Service {
    methods: MethodTable,
    registry: Arc<SubscriptionRegistry>,
    dispatcher: Dispatcher,
    correlator: AsyncCallCorrelator,
    heartbeat: HeartbeatScheduler,
    downstream: Arc<dyn Downstream>,
    observers: Vec<Arc<dyn Observe>>,
    bus: Bus,
    rx: mpsc::Receiver<Command>,
    tx: mpsc::WeakSender<Command>,
}

pub(crate) struct ServiceParts {
    pub methods: MethodTable,
    pub registry: Arc<SubscriptionRegistry>,
    pub dispatcher: Dispatcher,
    pub correlator: AsyncCallCorrelator,
    pub heartbeat: HeartbeatScheduler,
    pub downstream: Arc<dyn Downstream>,
    pub observers: Vec<Arc<dyn Observe>>,
    pub bus: Bus,
    pub rx: mpsc::Receiver<Command>,
    pub tx: mpsc::WeakSender<Command>,
}

impl Service {
    pub(crate) fn from_parts(parts: ServiceParts) -> Self {
        Self {
            methods: parts.methods,
            registry: parts.registry,
            dispatcher: parts.dispatcher,
            correlator: parts.correlator,
            heartbeat: parts.heartbeat,
            downstream: parts.downstream,
            observers: parts.observers,
            bus: parts.bus,
            rx: parts.rx,
            tx: parts.tx,
        }
    }

    /// Shared subscription registry.
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Runs the command loop until `token` is cancelled or every sender is dropped.
    pub async fn run(mut self, token: CancellationToken) {
        let done = CancellationToken::new();
        let listener = self.observer_listener(done.clone());
        debug!(downstream = self.downstream.name(), "service loop started");

        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    self.bus.publish(Event::new(EventKind::ShutdownRequested));
                    break;
                }
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
                n = self.heartbeat.tick() => self.on_tick(n).await,
            }
        }

        self.heartbeat.stop();
        debug!("service loop stopped");

        done.cancel();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
    }

    /// Forwards bus events to the observers until `done` fires, then drains them.
    fn observer_listener(&mut self, done: CancellationToken) -> Option<JoinHandle<()>> {
        if self.observers.is_empty() {
            return None;
        }
        let set = ObserverSet::new(std::mem::take(&mut self.observers), self.bus.clone());
        let mut rx = self.bus.subscribe();

        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(ev),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "observer listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = done.cancelled() => break,
                }
            }
            set.shutdown().await;
        }))
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Request(req) => self.on_request(req).await,
            Command::Complete { ticket, outcome } => self.on_complete(ticket, outcome).await,
            Command::Disconnect(identity) => {
                self.registry.disconnect(&identity).await;
            }
            Command::Status(tx) => {
                let _ = tx.send(self.heartbeat.status());
            }
        }
    }

    async fn on_request(&mut self, req: Request) {
        let Request {
            method,
            payload,
            sender,
            route,
            reply,
        } = req;

        let params: Value = match serde_json::from_str(&payload) {
            Ok(v) => v,
            Err(e) => return self.reject(&sender, &method, ServiceError::malformed(e)),
        };
        let Some(handler) = self.methods.get(&method).cloned() else {
            let err = ServiceError::UnknownMethod {
                method: method.clone(),
            };
            return self.reject(&sender, &method, err);
        };

        let result = match handler {
            Handler::Sync(f) => match f(&params) {
                Ok(value) => {
                    self.respond(&sender, &method, reply, &value).await;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Handler::Forward(spec) => self.forward(spec, &params, reply),
            Handler::Subscription(action) => {
                self.subscription(action, &params, &sender, route, reply)
                    .await
            }
        };
        if let Err(e) = result {
            self.reject(&sender, &method, e);
        }
    }

    /// Hands the call to the downstream; the caller waits in the correlator.
    fn forward(
        &mut self,
        spec: ForwardSpec,
        params: &Value,
        caller: ReplyHandle,
    ) -> Result<(), ServiceError> {
        params::parse::<NoParams>(params)?;
        let tx = self.tx.upgrade().ok_or(ServiceError::Closed)?;

        let downstream = Arc::clone(&self.downstream);
        let ForwardSpec {
            operation,
            uri,
            relay,
        } = spec;

        let issued = self.correlator.issue(operation, caller, relay, |ticket| {
            downstream.call(DownstreamCall {
                uri,
                payload: json!({}),
                completion: Completion::new(ticket, tx),
            })
        });
        if let Err(e) = issued {
            debug!(downstream = self.downstream.name(), "call not issued: {e}");
        }
        Ok(())
    }

    async fn subscription(
        &mut self,
        action: SubscriptionAction,
        params: &Value,
        sender: &Identity,
        route: Route,
        reply: ReplyHandle,
    ) -> Result<(), ServiceError> {
        match action {
            SubscriptionAction::StartHeartbeat => {
                let p: StartParams = params::parse(params)?;
                if let Err(e) = reply.send(&ReturnValue::ok()).await {
                    self.reply_failed(sender, "startHeartBeat", e.as_message());
                }
                if p.wants_subscription() {
                    self.registry
                        .subscribe(self.heartbeat.topic(), sender.clone(), route, reply)
                        .await;
                }
                self.heartbeat.start();
            }
            SubscriptionAction::StopHeartbeat => {
                params::parse::<NoParams>(params)?;
                self.heartbeat.stop();
                self.registry
                    .unsubscribe(self.heartbeat.topic(), sender)
                    .await;
                self.respond(sender, "stopHeartBeat", reply, &ReturnValue::ok())
                    .await;
            }
        }
        Ok(())
    }

    async fn on_complete(&mut self, ticket: CallTicket, outcome: Result<Value, DownstreamError>) {
        match outcome {
            Ok(reply) => {
                if let Err(e) = self.correlator.resolve(&ticket, &reply).await {
                    debug!(operation = %ticket.operation(), call = ticket.id(), "reply not relayed: {e}");
                }
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::DownstreamFailed)
                        .with_call(ticket.operation().as_str(), ticket.id())
                        .with_reason(e.as_message()),
                );
                self.correlator.abandon(&ticket, e.as_label());
            }
        }
    }

    async fn on_tick(&self, n: u64) {
        let topic = self.heartbeat.topic();
        let report = self
            .dispatcher
            .broadcast(topic, &HeartbeatPayload::to_value(n))
            .await;
        self.bus.publish(
            Event::new(EventKind::HeartbeatTick)
                .with_topic(topic)
                .with_count(n)
                .with_delivered(report.delivered),
        );
    }

    async fn respond(&self, sender: &Identity, method: &str, reply: ReplyHandle, value: &Value) {
        if let Err(e) = reply.finish(value).await {
            self.reply_failed(sender, method, e.as_message());
        }
    }

    fn reply_failed(&self, sender: &Identity, method: &str, reason: String) {
        self.bus.publish(
            Event::new(EventKind::ReplyFailed)
                .with_identity(sender)
                .with_method(method)
                .with_reason(reason),
        );
    }

    fn reject(&self, sender: &Identity, method: &str, err: ServiceError) {
        self.bus.publish(
            Event::new(EventKind::RequestRejected)
                .with_identity(sender)
                .with_method(method)
                .with_reason(err.as_message()),
        );
    }
}
