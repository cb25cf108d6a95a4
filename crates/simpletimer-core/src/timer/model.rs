//! Countdown model.
//!
//! The model never polls. Elapsed time is derived lazily from the start
//! timestamp whenever the remaining time is read, and a read that finds the
//! countdown exhausted performs the timeout transition itself.
//!
//! ## State Transitions
//!
//! ```text
//! Paused --resume--> Running --pause--> Paused
//! Running --poll (remaining <= 0)--> Paused (rearmed to total)
//! any --reset--> Paused (rearmed to total)
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::events::{timestamp, Event};

pub const MINUTE_MS: u64 = 60_000;
/// Duration a fresh session counts down from.
pub const DEFAULT_TOTAL_MS: u64 = 5 * MINUTE_MS;
/// Finer adjustment step used for short countdowns.
pub const FINE_GRANULARITY_MS: u64 = 10_000;
/// Totals at or below this use [`FINE_GRANULARITY_MS`].
pub const FINE_THRESHOLD_MS: u64 = 3 * MINUTE_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Paused,
    Running,
}

/// Direction of a duration adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Direction for a signed step; `None` for zero.
    pub fn from_sign(step: i64) -> Option<Self> {
        match step.signum() {
            1 => Some(Direction::Up),
            -1 => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn sign(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// Result of the authoritative remaining-time read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// Countdown still in progress (or paused) with this many ms left.
    Ongoing(u64),
    /// The countdown just ran out. Carries the remaining time after the
    /// model rearmed itself, which equals the total.
    Expired(u64),
}

impl Remaining {
    pub fn ms(self) -> u64 {
        match self {
            Remaining::Ongoing(ms) | Remaining::Expired(ms) => ms,
        }
    }

    pub fn is_expired(self) -> bool {
        matches!(self, Remaining::Expired(_))
    }
}

/// Remaining time at `now_ms`, with no mutation.
///
/// `snapshot_ms` is only consulted while paused. While running, a clock
/// that reads earlier than `start_ms` counts as zero elapsed time.
pub fn remaining_at(
    state: TimerState,
    now_ms: u64,
    start_ms: u64,
    total_ms: u64,
    snapshot_ms: u64,
) -> Remaining {
    match state {
        TimerState::Paused => Remaining::Ongoing(snapshot_ms),
        TimerState::Running => {
            let elapsed = now_ms.saturating_sub(start_ms);
            if elapsed >= total_ms {
                Remaining::Expired(total_ms)
            } else {
                Remaining::Ongoing(total_ms - elapsed)
            }
        }
    }
}

/// Adjustment unit for moving `total_ms` one step in `direction`.
///
/// The fine unit applies when the total nudged by one millisecond in the
/// direction of travel is at most three minutes.
pub fn granularity_for(total_ms: u64, direction: Direction) -> u64 {
    let nudged = i128::from(total_ms) + i128::from(direction.sign());
    if nudged <= i128::from(FINE_THRESHOLD_MS) {
        FINE_GRANULARITY_MS
    } else {
        MINUTE_MS
    }
}

/// Total after one adjustment step, floored at one unit and rounded down
/// to a multiple of the unit.
pub fn adjusted_total(total_ms: u64, direction: Direction) -> u64 {
    let unit = granularity_for(total_ms, direction);
    let next = match direction {
        Direction::Up => total_ms.saturating_add(unit),
        Direction::Down => total_ms.saturating_sub(unit),
    };
    (next.max(unit) / unit) * unit
}

/// Serializable capture of a [`TimerModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub total_ms: u64,
    /// Only meaningful while paused.
    pub remaining_ms: u64,
    /// Only meaningful while running.
    #[serde(default)]
    pub start_ms: u64,
}

/// The countdown state machine.
#[derive(Debug, Clone)]
pub struct TimerModel<C> {
    clock: C,
    state: TimerState,
    total_ms: u64,
    remaining_ms: u64,
    start_ms: u64,
}

impl<C: Clock> TimerModel<C> {
    /// A paused model counting down from [`DEFAULT_TOTAL_MS`].
    pub fn new(clock: C) -> Self {
        Self::with_total(clock, DEFAULT_TOTAL_MS)
    }

    pub fn with_total(clock: C, total_ms: u64) -> Self {
        Self {
            clock,
            state: TimerState::Paused,
            total_ms,
            remaining_ms: total_ms,
            start_ms: 0,
        }
    }

    /// Rebuild a model from a snapshot, clamping the stored remaining time
    /// to the total.
    pub fn restore(snapshot: TimerSnapshot, clock: C) -> Self {
        let mut model = Self::with_total(clock, snapshot.total_ms);
        model.apply_snapshot(snapshot);
        model
    }

    /// Replace the countdown state with `snapshot`, keeping the clock.
    pub fn apply_snapshot(&mut self, snapshot: TimerSnapshot) {
        self.state = snapshot.state;
        self.total_ms = snapshot.total_ms;
        self.remaining_ms = snapshot.remaining_ms.min(snapshot.total_ms);
        self.start_ms = snapshot.start_ms;
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            total_ms: self.total_ms,
            remaining_ms: self.remaining_ms,
            start_ms: self.start_ms,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Authoritative remaining-time read.
    ///
    /// A running countdown found exhausted is reset here, so `Expired` is
    /// reported exactly once per expiry. Timeouts are only observed by this
    /// read: hosts must poll at least once per second while running.
    pub fn poll(&mut self) -> Remaining {
        let now = self.clock.now_ms();
        match remaining_at(self.state, now, self.start_ms, self.total_ms, self.remaining_ms) {
            Remaining::Expired(_) => {
                tracing::info!(total_ms = self.total_ms, "countdown expired");
                self.reset();
                Remaining::Expired(self.remaining_ms)
            }
            ongoing => ongoing,
        }
    }

    /// Remaining time in ms; see [`TimerModel::poll`].
    pub fn remaining_time(&mut self) -> u64 {
        self.poll().ms()
    }

    /// Time until the displayed minute changes, or `None` while paused.
    pub fn millis_until_next_minute(&mut self) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        match self.poll() {
            Remaining::Ongoing(ms) => Some(ms % MINUTE_MS),
            Remaining::Expired(_) => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or continue counting down, keeping progress from earlier runs.
    pub fn resume(&mut self) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        let now = self.clock.now_ms();
        self.start_ms = now.saturating_sub(self.total_ms - self.remaining_ms);
        self.state = TimerState::Running;
        Some(Event::TimerResumed {
            remaining_ms: self.remaining_ms,
            at: timestamp(now),
        })
    }

    /// Freeze the countdown. Returns `TimerExpired` instead of `TimerPaused`
    /// when the countdown had already run out at the moment of pausing.
    pub fn pause(&mut self) -> Option<Event> {
        if self.is_paused() {
            return None;
        }
        let remaining = self.poll();
        let at = timestamp(self.clock.now_ms());
        self.remaining_ms = remaining.ms();
        self.state = TimerState::Paused;
        match remaining {
            Remaining::Ongoing(remaining_ms) => Some(Event::TimerPaused { remaining_ms, at }),
            Remaining::Expired(_) => Some(Event::TimerExpired {
                total_ms: self.total_ms,
                at,
            }),
        }
    }

    pub fn flip(&mut self) -> Option<Event> {
        if self.is_running() {
            self.pause()
        } else {
            self.resume()
        }
    }

    pub fn reset(&mut self) -> Event {
        self.state = TimerState::Paused;
        self.remaining_ms = self.total_ms;
        Event::TimerReset {
            total_ms: self.total_ms,
            at: timestamp(self.clock.now_ms()),
        }
    }

    pub fn set_total_time(&mut self, total_ms: u64) -> Event {
        self.total_ms = total_ms;
        self.remaining_ms = total_ms;
        Event::TotalTimeChanged {
            total_ms,
            at: timestamp(self.clock.now_ms()),
        }
    }

    /// Step the total by one granularity unit. Ignored while running.
    pub fn increment(&mut self, direction: Direction) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        let total = adjusted_total(self.total_ms, direction);
        Some(self.set_total_time(total))
    }
}
