//! # tickrelay
//!
//! **tickrelay** is the core of a small bus-attached service: callers subscribe
//! to topics, ask for values that come from another service, and receive a
//! periodic heartbeat broadcast.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   transport (stdio driver, IPC bridge, tests)
//!        │ Request{method, payload, sender, route, reply}
//!        ▼
//!   ┌───────────────────────┐
//!   │    ServiceHandle      │──── disconnect / heartbeat_status / events
//!   └──────────┬────────────┘
//!              ▼  (bounded command queue)
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  Service (single command loop, owns all state)                     │
//! │  - MethodTable          (method name → Sync / Forward / Subscription)│
//! │  - SubscriptionRegistry (topic → subscribers with reply handles)   │
//! │  - AsyncCallCorrelator  (operation → one pending caller)           │
//! │  - HeartbeatScheduler   (Idle / Running{timer, ticks})             │
//! │  - Dispatcher           (snapshot fan-out over Public, Private)    │
//! └──────┬──────────────────────────┬──────────────────────────────┬───┘
//!        │ DownstreamCall           │ publish(Event)               │ ReplyHandle::send
//!        ▼                          ▼                              ▼
//!   Downstream (SystemClock)   Bus (broadcast) ──► ObserverSet   callers
//!        │                                          └─► LogWriter (tracing)
//!        └── Completion::succeed(reply) ──► Command::Complete (back into the loop)
//! ```
//!
//! ### Heartbeat lifecycle
//! ```text
//! startHeartBeat{subscribe} ──► reply {returnValue:true}
//!                           ├─► subscribe caller to "heartbeat" (if `subscribe` present)
//!                           └─► scheduler.start()       (no-op when running)
//!
//! every period ──► tick n ──► Dispatcher::broadcast("heartbeat", {heartbeat: n})
//!
//! stopHeartBeat ──► scheduler.stop() (counter back to 0)
//!               ├─► unsubscribe caller
//!               └─► reply {returnValue:true}
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                                  |
//! |-------------------|--------------------------------------------------------------|-----------------------------------------------------|
//! | **Service**       | Command loop, builder and submission handle.                 | [`Service`], [`ServiceBuilder`], [`ServiceHandle`]  |
//! | **Subscriptions** | Topic registry keyed by caller identity.                     | [`SubscriptionRegistry`], [`Identity`], [`Route`]   |
//! | **Relaying**      | One pending caller per operation, reply field renaming.      | [`AsyncCallCorrelator`], [`FieldRelay`]             |
//! | **Heartbeat**     | Periodic tick source with an Idle/Running state machine.     | [`HeartbeatScheduler`]                              |
//! | **Dispatch**      | Snapshot broadcast to every subscriber on every route.       | [`Dispatcher`]                                      |
//! | **Downstream**    | Outbound dependencies completing calls asynchronously.       | [`Downstream`], [`Completion`], [`SystemClock`]     |
//! | **Observers**     | Hook into runtime events (logging, metrics).                 | [`Observe`], [`ObserverSet`], [`LogWriter`]         |
//! | **Errors**        | Typed errors for requests, deliveries and dependencies.      | [`ServiceError`], [`DeliveryError`], [`DownstreamError`] |
//! | **Configuration** | Centralize runtime settings.                                 | [`Config`]                                          |
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use tickrelay::{Config, ServiceBuilder};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (service, handle) = ServiceBuilder::new(Config::default()).build();
//!     let token = CancellationToken::new();
//!     let task = tokio::spawn(service.run(token.clone()));
//!
//!     let mut reply = handle.request("echo", r#"{"input": "hi"}"#, "com.example.app").await?;
//!     assert_eq!(reply.recv().await, Some(json!("hi")));
//!
//!     token.cancel();
//!     task.await?;
//!     Ok(())
//! }
//! ```
mod core;
mod correlator;
mod dispatch;
mod downstream;
mod error;
mod events;
mod heartbeat;
mod methods;
mod observers;
mod reply;
mod subscriptions;

// ---- Public re-exports ----

pub use core::{Config, Request, Service, ServiceBuilder, ServiceHandle, shutdown_signal};
pub use correlator::{AsyncCallCorrelator, CallTicket, FieldRelay, OperationKey, Resolution};
pub use dispatch::{BroadcastReport, Dispatcher};
pub use downstream::{Completion, Downstream, DownstreamCall, SystemClock};
pub use error::{DeliveryError, DownstreamError, ServiceError};
pub use events::{Bus, Event, EventKind};
pub use heartbeat::{HeartbeatScheduler, HeartbeatStatus};
pub use methods::{ForwardSpec, Handler, MethodTable, SubscriptionAction, SyncFn, params};
pub use observers::{LogWriter, Observe, ObserverSet};
pub use reply::{Outbox, ReplyHandle};
pub use subscriptions::{Identity, Route, SubscribeOutcome, Subscriber, SubscriptionRegistry};
