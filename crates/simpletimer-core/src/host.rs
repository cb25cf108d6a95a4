//! Collaborators supplied by the host platform.
//!
//! The core only calls these; it never observes whether they succeed.

use serde::{Deserialize, Serialize};

/// Long pattern played when the countdown runs out (off/on pairs in ms).
pub const FINISH_PATTERN: [u64; 11] = [0, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vibration {
    /// Single buzz of this many ms.
    Pulse(u64),
    /// Alternating off/on durations in ms, starting with a delay.
    Pattern(Vec<u64>),
}

impl Vibration {
    pub fn finish() -> Self {
        Vibration::Pattern(FINISH_PATTERN.to_vec())
    }

    /// Total time the pattern occupies.
    pub fn duration_ms(&self) -> u64 {
        match self {
            Vibration::Pulse(ms) => *ms,
            Vibration::Pattern(steps) => steps.iter().sum(),
        }
    }
}

/// Fire-and-forget haptic feedback.
pub trait Haptics {
    fn vibrate(&mut self, vibration: Vibration);
}

/// Host alarm facility used while in ambient mode.
pub trait WakeScheduler {
    /// Replace any pending wake with one at `at_ms` (epoch ms).
    fn schedule_wake_at(&mut self, at_ms: u64);
    fn cancel_scheduled_wake(&mut self);
}

/// Haptics sink for hosts without a vibrator, or with vibration disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Haptics for Silent {
    fn vibrate(&mut self, _vibration: Vibration) {}
}

impl<H: Haptics + ?Sized> Haptics for &mut H {
    fn vibrate(&mut self, vibration: Vibration) {
        (**self).vibrate(vibration);
    }
}

impl<H: Haptics + ?Sized> Haptics for Box<H> {
    fn vibrate(&mut self, vibration: Vibration) {
        (**self).vibrate(vibration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_pattern_lasts_two_and_a_half_seconds() {
        assert_eq!(Vibration::finish().duration_ms(), 2_500);
        assert_eq!(Vibration::Pulse(80).duration_ms(), 80);
    }
}
