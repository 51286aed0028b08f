//! Service core: configuration, the command loop and its handles.
//!
//! Internal modules:
//! - [`service`]: the single-consumer loop owning all state;
//! - [`builder`]: wires the loop, the bus and the default dependencies;
//! - [`handle`]: cloneable submission side of the loop;
//! - [`command`]: inbound requests and internal work items;
//! - [`shutdown`]: cross-platform termination signal helper.

mod builder;
mod command;
mod config;
mod handle;
mod service;
mod shutdown;

pub use builder::ServiceBuilder;
pub(crate) use command::Command;
pub use command::Request;
pub use config::Config;
pub use handle::ServiceHandle;
pub use service::Service;
pub use shutdown::shutdown_signal;
