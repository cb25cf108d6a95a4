use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, TimerState};

/// Every state change in the core produces an Event.
/// Hosts drain them from the session; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Timer forced back to PAUSED with a full countdown.
    TimerReset {
        total_ms: u64,
        at: DateTime<Utc>,
    },
    /// The countdown duration was set or adjusted.
    TotalTimeChanged {
        total_ms: u64,
        at: DateTime<Utc>,
    },
    /// Remaining time reached zero while running; the model has been rearmed.
    TimerExpired {
        total_ms: u64,
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: Mode,
        at: DateTime<Utc>,
    },
    WakeScheduled {
        wake_at_ms: u64,
        delay_ms: u64,
        at: DateTime<Utc>,
    },
    WakeCancelled {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Timestamp carried by every variant.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerResumed { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at, .. }
            | Event::TotalTimeChanged { at, .. }
            | Event::TimerExpired { at, .. }
            | Event::ModeChanged { at, .. }
            | Event::WakeScheduled { at, .. }
            | Event::WakeCancelled { at } => *at,
        }
    }
}

/// Convert an epoch-millisecond reading from a [`crate::Clock`] into a UTC timestamp.
pub(crate) fn timestamp(now_ms: u64) -> DateTime<Utc> {
    i64::try_from(now_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
