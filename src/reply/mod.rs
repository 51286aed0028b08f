//! Reply sinks: the transport-facing half of every request.
//!
//! - [`Outbox`] trait implemented by transports (and by tokio mpsc senders);
//! - [`ReplyHandle`] move-only wrapper the core stores in subscribers and pending calls.

mod handle;
mod outbox;

pub use handle::ReplyHandle;
pub use outbox::Outbox;
