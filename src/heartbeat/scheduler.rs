//! # HeartbeatScheduler: Idle/Running state machine around one periodic timer.
//!
//! ## States
//! ```text
//!            start()                     stop()
//!   Idle ─────────────► Running{ticks=0} ─────────► Idle
//!    ▲  stop(): no-op      │   ▲  start(): no-op
//!    │                     └───┘  tick(): ticks += 1
//! ```
//!
//! ## Rules
//! - Running owns exactly one [`Interval`]; a second `start()` never creates another.
//! - The first tick fires one period after `start()`.
//! - `stop()` drops the timer immediately; no tick can complete afterwards.
//! - The counter lives in the Running state, so it is 0 after a stop and restarts at 0.
//! - `tick()` is cancel-safe and never completes while Idle, so it can sit in a
//!   `select!` next to the command queue.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::events::{Bus, Event, EventKind};

/// Snapshot of the scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatStatus {
    /// True iff a timer is scheduled.
    pub running: bool,
    /// Ticks fired since the last start (0 while idle).
    pub tick_count: u64,
}

enum State {
    Idle,
    Running {
        timer: Interval,
        ticks: u64,
    },
}

/// Periodic tick source for one topic.
pub struct HeartbeatScheduler {
    topic: Arc<str>,
    period: Duration,
    state: State,
    bus: Bus,
}

impl HeartbeatScheduler {
    /// Creates an idle scheduler firing every `period` (at least 1ms).
    pub fn new(topic: impl Into<Arc<str>>, period: Duration, bus: Bus) -> Self {
        Self {
            topic: topic.into(),
            period: period.max(Duration::from_millis(1)),
            state: State::Idle,
            bus,
        }
    }

    /// Schedules the timer if idle.
    ///
    /// Returns `true` if this call started it, `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if matches!(self.state, State::Running { .. }) {
            return false;
        }

        let mut timer = time::interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.state = State::Running { timer, ticks: 0 };

        self.bus
            .publish(Event::new(EventKind::HeartbeatStarted).with_topic(Arc::clone(&self.topic)));
        true
    }

    /// Cancels the timer and resets the counter if running.
    ///
    /// Returns `true` if this call stopped it, `false` if it was idle.
    pub fn stop(&mut self) -> bool {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => false,
            State::Running { ticks, .. } => {
                self.bus.publish(
                    Event::new(EventKind::HeartbeatStopped)
                        .with_topic(Arc::clone(&self.topic))
                        .with_count(ticks),
                );
                true
            }
        }
    }

    /// Waits for the next tick and returns the incremented counter.
    ///
    /// Pending forever while idle.
    pub async fn tick(&mut self) -> u64 {
        let State::Running { timer, ticks } = &mut self.state else {
            return future::pending().await;
        };
        timer.tick().await;
        *ticks += 1;
        *ticks
    }

    /// Returns the current state.
    pub fn status(&self) -> HeartbeatStatus {
        match &self.state {
            State::Idle => HeartbeatStatus {
                running: false,
                tick_count: 0,
            },
            State::Running { ticks, .. } => HeartbeatStatus {
                running: true,
                tick_count: *ticks,
            },
        }
    }

    /// True while a timer is scheduled.
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Topic the ticks are broadcast on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(1000);

    fn scheduler() -> HeartbeatScheduler {
        HeartbeatScheduler::new("heartbeat", PERIOD, Bus::new(64))
    }

    /// Counts ticks until `window` elapses.
    async fn count_ticks(s: &mut HeartbeatScheduler, window: Duration) -> Vec<u64> {
        let deadline = time::sleep(window);
        tokio::pin!(deadline);
        let mut seen = Vec::new();
        loop {
            tokio::select! {
                n = s.tick() => seen.push(n),
                _ = &mut deadline => break,
            }
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_yields_single_tick_stream() {
        let mut s = scheduler();
        assert!(s.start());
        assert!(!s.start());

        let seen = count_ticks(&mut s, PERIOD * 3 + PERIOD / 2).await;
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(
            s.status(),
            HeartbeatStatus {
                running: true,
                tick_count: 3
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_is_safe() {
        let mut s = scheduler();
        assert!(!s.stop());
        assert_eq!(s.status().tick_count, 0);
        assert!(!s.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets_and_restart_counts_from_zero() {
        let mut s = scheduler();
        s.start();
        let seen = count_ticks(&mut s, PERIOD * 2 + PERIOD / 2).await;
        assert_eq!(seen, vec![1, 2]);

        assert!(s.stop());
        assert_eq!(s.status().tick_count, 0);
        let seen = count_ticks(&mut s, PERIOD * 3).await;
        assert!(seen.is_empty());

        s.start();
        let seen = count_ticks(&mut s, PERIOD + PERIOD / 2).await;
        assert_eq!(seen, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_events() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let mut s = HeartbeatScheduler::new("heartbeat", PERIOD, bus);

        s.start();
        s.start();
        s.stop();
        s.stop();

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::HeartbeatStarted);
        let stopped = rx.recv().await.unwrap();
        assert_eq!(stopped.kind, EventKind::HeartbeatStopped);
        assert_eq!(stopped.count, Some(0));
        assert!(rx.try_recv().is_err());
    }
}
