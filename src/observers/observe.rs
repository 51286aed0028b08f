//! # Observer trait
//!
//! `Observe` is the extension point for plugging custom event handlers into the
//! service. Each observer is driven by a dedicated worker loop fed by a bounded
//! queue owned by the [`ObserverSet`](crate::observers::ObserverSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   service loop nor other observers.
//! - Each observer declares its queue capacity via [`Observe::queue_capacity`].
//!   On overflow, events for that observer are **dropped**.
//!
//! ## Example
//! ```rust
//! use tickrelay::{Event, EventKind, Observe};
//!
//! struct CountTicks(std::sync::atomic::AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Observe for CountTicks {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::HeartbeatTick {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "count_ticks" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event observers.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
