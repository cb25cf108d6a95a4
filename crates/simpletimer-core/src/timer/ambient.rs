//! Ambient-mode wake scheduling.
//!
//! In ambient mode the display only needs a refresh when the shown minute
//! changes, so instead of ticking every second the host sleeps until the
//! next minute boundary of the remaining time.

use serde::{Deserialize, Serialize};

use super::model::{TimerModel, MINUTE_MS};
use crate::clock::Clock;

/// Buffer added past the boundary so the wake never lands just before it.
pub const DEFAULT_WAKE_SKEW_MS: u64 = 100;
/// Refresh cadence while interactive.
pub const DEFAULT_TICK_MS: u64 = 1_000;

/// Which refresh cadence the host is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Interactive,
    Ambient,
}

/// What the host should do before re-querying the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    /// Fixed-rate refresh.
    Tick { interval_ms: u64 },
    /// Single wake at an absolute epoch-millisecond instant.
    WakeAt { at_ms: u64 },
    /// Nothing to refresh until the user interacts.
    Idle,
}

/// Stateless wake-delay calculator; every call recomputes from the model.
#[derive(Debug, Clone, Copy)]
pub struct AmbientScheduler {
    skew_ms: u64,
}

impl Default for AmbientScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_WAKE_SKEW_MS)
    }
}

impl AmbientScheduler {
    pub fn new(skew_ms: u64) -> Self {
        Self { skew_ms }
    }

    pub fn skew_ms(&self) -> u64 {
        self.skew_ms
    }

    /// Delay until the next minute boundary plus skew, or `None` when the
    /// timer is paused and no wake is needed.
    pub fn next_wake_delay<C: Clock>(&self, model: &mut TimerModel<C>) -> Option<u64> {
        let delay = model.millis_until_next_minute()?;
        Some(delay.saturating_add(self.skew_ms))
    }

    /// Wake delay for a running countdown with `remaining_ms` left.
    pub fn delay_for_remaining(&self, remaining_ms: u64) -> u64 {
        (remaining_ms % MINUTE_MS).saturating_add(self.skew_ms)
    }

    /// Absolute instant (on the model's clock) for the next wake.
    pub fn next_wake_at<C: Clock>(&self, model: &mut TimerModel<C>) -> Option<u64> {
        let delay = self.next_wake_delay(model)?;
        Some(model.now_ms().saturating_add(delay))
    }
}
