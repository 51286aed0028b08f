//! # Service configuration.
//!
//! Provides [`Config`], the settings consumed by
//! [`ServiceBuilder`](crate::ServiceBuilder) when wiring the service.
//!
//! ## Clamped values
//! - `command_capacity = 0` → 1 (a tokio channel cannot be empty)
//! - `bus_capacity = 0` → 1
//! - `heartbeat_period < 1ms` → 1ms (enforced by the scheduler)

use std::time::Duration;

use crate::subscriptions::Route;

/// Runtime settings of the service.
///
/// ## Field semantics
/// - `heartbeat_period`: interval between heartbeat broadcasts
/// - `heartbeat_topic`: topic key heartbeat subscribers register under
/// - `routes`: delivery routes walked by every broadcast, in order
/// - `time_service_uri`: downstream address used by `getUTCTime`
/// - `command_capacity`: bound of the inbound command queue
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug)]
pub struct Config {
    /// Interval between heartbeat broadcasts; the first tick fires one period
    /// after `startHeartBeat`.
    pub heartbeat_period: Duration,

    /// Topic key of the heartbeat broadcast.
    pub heartbeat_topic: String,

    /// Routes a broadcast is delivered on.
    ///
    /// A subscriber registered on a route missing from this list never
    /// receives broadcasts.
    pub routes: Vec<Route>,

    /// Address of the downstream time method.
    pub time_service_uri: String,

    /// Capacity of the command queue shared by requests, downstream
    /// completions and control commands.
    ///
    /// When full, [`ServiceHandle::submit`](crate::ServiceHandle::submit) waits and
    /// [`ServiceHandle::try_submit`](crate::ServiceHandle::try_submit) fails with `Full`.
    pub command_capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Event receivers lagging more than `bus_capacity` messages skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a command queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `heartbeat_period = 1s`
    /// - `heartbeat_topic = "heartbeat"`
    /// - `routes = [Public, Private]`
    /// - `time_service_uri = "luna://com.palm.systemservice/time/getSystemTime"`
    /// - `command_capacity = 1024`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            heartbeat_period: Duration::from_millis(1000),
            heartbeat_topic: "heartbeat".to_string(),
            routes: vec![Route::Public, Route::Private],
            time_service_uri: "luna://com.palm.systemservice/time/getSystemTime".to_string(),
            command_capacity: 1024,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.heartbeat_period, Duration::from_secs(1));
        assert_eq!(cfg.heartbeat_topic, "heartbeat");
        assert_eq!(cfg.routes, vec![Route::Public, Route::Private]);
    }

    #[test]
    fn test_capacities_are_clamped() {
        let cfg = Config {
            command_capacity: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.command_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
