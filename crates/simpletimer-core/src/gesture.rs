//! Touch gesture decoding.
//!
//! One touch sequence (`Down` … `Up`) becomes exactly one of:
//!
//! - a vertical drag, adjusting the countdown total one notch at a time
//!   (only while paused),
//! - a tap, toggling run/pause,
//! - a long press, resetting the countdown.
//!
//! ## Drag policy
//!
//! Adjustment is edge-triggered. The first notch crossed on either side of
//! the press point only turns the touch into a drag; each further notch
//! crossed applies one increment in the direction of travel. Moving back
//! over notches already applied undoes them one by one, so returning to the
//! press point restores the starting total. Dragging up adds time, dragging
//! down removes it. Displacement is capped at [`MAX_DRAG_NOTCHES`] either way.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::events::{timestamp, Event};
use crate::host::{Haptics, Vibration};
use crate::storage::GestureConfig;
use crate::timer::{Direction, Remaining, TimerModel, TimerState};

/// Largest displacement, in notches, a single touch can register.
pub const MAX_DRAG_NOTCHES: i64 = 1_000;

/// Increments owed at `notches` of displacement, one notch of slop per side.
fn applied_notches(notches: i64) -> i64 {
    notches - notches.signum()
}

/// Raw touch input, already marshalled onto the UI context by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TouchEvent {
    /// `y` in screen pixels, growing downward.
    Down { y: f32 },
    Move { y: f32 },
    /// Host-detected long press, delivered before the matching `Up`.
    LongPress,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureOutcome {
    /// Touch in progress, nothing changed.
    Tracking,
    /// Drag applied `steps` increments (negative = down) while paused.
    Adjusted { steps: i64, total_ms: u64 },
    /// Tap flipped the timer into this state.
    Toggled { state: TimerState },
    /// Long press reset the countdown.
    Reset,
    /// Release ending a drag or long press.
    Consumed,
    /// Input outside a touch sequence, or a long press after a drag.
    Ignored,
}

/// Outcome plus the model events it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub outcome: GestureOutcome,
    pub events: Vec<Event>,
}

impl Handled {
    fn quiet(outcome: GestureOutcome) -> Self {
        Self {
            outcome,
            events: Vec::new(),
        }
    }
}

/// Per-touch tracking state, reset at every `Down`.
#[derive(Debug, Clone, Copy)]
struct Touch {
    start_y: f32,
    press_remaining_ms: u64,
    /// Displacement seen by the last move, in notches.
    last_notch: i64,
    has_moved: bool,
    has_long_pressed: bool,
}

#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    config: GestureConfig,
    touch: Option<Touch>,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            touch: None,
        }
    }

    /// Whether a touch sequence is in progress.
    pub fn is_tracking(&self) -> bool {
        self.touch.is_some()
    }

    /// Remaining time captured when the current touch went down.
    pub fn press_remaining_ms(&self) -> Option<u64> {
        self.touch.map(|t| t.press_remaining_ms)
    }

    pub fn handle<C: Clock, H: Haptics>(
        &mut self,
        event: TouchEvent,
        model: &mut TimerModel<C>,
        haptics: &mut H,
    ) -> Handled {
        match event {
            TouchEvent::Down { y } => self.down(y, model),
            TouchEvent::Move { y } => self.drag(y, model),
            TouchEvent::LongPress => self.long_press(model, haptics),
            TouchEvent::Up => self.release(model, haptics),
        }
    }

    fn down<C: Clock>(&mut self, y: f32, model: &mut TimerModel<C>) -> Handled {
        let mut events = Vec::new();
        let remaining = model.poll();
        if let Remaining::Expired(total_ms) = remaining {
            events.push(Event::TimerExpired {
                total_ms,
                at: timestamp(model.now_ms()),
            });
        }
        self.touch = Some(Touch {
            start_y: y,
            press_remaining_ms: remaining.ms(),
            last_notch: 0,
            has_moved: false,
            has_long_pressed: false,
        });
        Handled {
            outcome: GestureOutcome::Tracking,
            events,
        }
    }

    fn drag<C: Clock>(&mut self, y: f32, model: &mut TimerModel<C>) -> Handled {
        let px_per_notch = self.config.px_per_notch;
        let Some(touch) = self.touch.as_mut() else {
            return Handled::quiet(GestureOutcome::Ignored);
        };

        // NaN reads as 0 and infinities saturate before the clamp.
        let notches = (((touch.start_y - y) / px_per_notch).trunc() as i64)
            .clamp(-MAX_DRAG_NOTCHES, MAX_DRAG_NOTCHES);
        if notches != 0 && !touch.has_moved {
            tracing::trace!(notches, "drag started");
            touch.has_moved = true;
        }

        let steps = applied_notches(notches) - applied_notches(touch.last_notch);
        touch.last_notch = notches;

        let Some(direction) = Direction::from_sign(steps) else {
            return Handled::quiet(GestureOutcome::Tracking);
        };
        if model.is_running() {
            return Handled::quiet(GestureOutcome::Tracking);
        }

        let mut events = Vec::new();
        for _ in 0..steps.unsigned_abs() {
            let before = model.total_ms();
            let Some(event) = model.increment(direction) else {
                break;
            };
            if model.total_ms() == before {
                break;
            }
            events.push(event);
        }
        tracing::trace!(steps, total_ms = model.total_ms(), "drag adjusted total");
        Handled {
            outcome: GestureOutcome::Adjusted {
                steps,
                total_ms: model.total_ms(),
            },
            events,
        }
    }

    fn long_press<C: Clock, H: Haptics>(
        &mut self,
        model: &mut TimerModel<C>,
        haptics: &mut H,
    ) -> Handled {
        let Some(touch) = self.touch.as_mut() else {
            return Handled::quiet(GestureOutcome::Ignored);
        };
        if touch.has_moved {
            return Handled::quiet(GestureOutcome::Ignored);
        }
        touch.has_long_pressed = true;
        let event = model.reset();
        haptics.vibrate(Vibration::Pulse(self.config.long_press_pulse_ms));
        Handled {
            outcome: GestureOutcome::Reset,
            events: vec![event],
        }
    }

    fn release<C: Clock, H: Haptics>(
        &mut self,
        model: &mut TimerModel<C>,
        haptics: &mut H,
    ) -> Handled {
        let Some(touch) = self.touch.take() else {
            return Handled::quiet(GestureOutcome::Ignored);
        };
        if touch.has_moved || touch.has_long_pressed {
            return Handled::quiet(GestureOutcome::Consumed);
        }
        let events: Vec<Event> = model.flip().into_iter().collect();
        haptics.vibrate(Vibration::Pulse(self.config.tap_pulse_ms));
        Handled {
            outcome: GestureOutcome::Toggled {
                state: model.state(),
            },
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[derive(Default)]
    struct Recorder(Vec<Vibration>);

    impl Haptics for Recorder {
        fn vibrate(&mut self, vibration: Vibration) {
            self.0.push(vibration);
        }
    }

    fn setup(total_ms: u64) -> (ManualClock, TimerModel<ManualClock>, GestureInterpreter, Recorder) {
        let clock = ManualClock::new(0);
        let model = TimerModel::with_total(clock.clone(), total_ms);
        (clock, model, GestureInterpreter::default(), Recorder::default())
    }

    #[test]
    fn tap_toggles_and_pulses() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(60_000);
        gestures.handle(TouchEvent::Down { y: 100.0 }, &mut model, &mut haptics);
        let handled = gestures.handle(TouchEvent::Up, &mut model, &mut haptics);
        assert_eq!(
            handled.outcome,
            GestureOutcome::Toggled {
                state: TimerState::Running
            }
        );
        assert_eq!(haptics.0, vec![Vibration::Pulse(80)]);
        assert!(!gestures.is_tracking());
    }

    #[test]
    fn small_wiggle_is_still_a_tap() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(60_000);
        gestures.handle(TouchEvent::Down { y: 100.0 }, &mut model, &mut haptics);
        let handled = gestures.handle(TouchEvent::Move { y: 112.0 }, &mut model, &mut haptics);
        assert_eq!(handled.outcome, GestureOutcome::Tracking);
        let handled = gestures.handle(TouchEvent::Up, &mut model, &mut haptics);
        assert!(matches!(handled.outcome, GestureOutcome::Toggled { .. }));
    }

    #[test]
    fn three_notch_downward_drag_removes_two_minutes() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        gestures.handle(TouchEvent::Down { y: 50.0 }, &mut model, &mut haptics);
        for y in [70.0, 90.0, 110.0] {
            gestures.handle(TouchEvent::Move { y }, &mut model, &mut haptics);
        }
        assert_eq!(model.total_ms(), 180_000);
        let handled = gestures.handle(TouchEvent::Up, &mut model, &mut haptics);
        assert_eq!(handled.outcome, GestureOutcome::Consumed);
        assert!(model.is_paused());
        assert!(haptics.0.is_empty());
    }

    #[test]
    fn repeated_moves_within_a_notch_apply_once() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        gestures.handle(TouchEvent::Down { y: 200.0 }, &mut model, &mut haptics);
        gestures.handle(TouchEvent::Move { y: 180.0 }, &mut model, &mut haptics);
        for y in [160.0, 158.0, 155.0, 150.0] {
            gestures.handle(TouchEvent::Move { y }, &mut model, &mut haptics);
        }
        assert_eq!(model.total_ms(), 360_000);
    }

    #[test]
    fn fast_drag_applies_one_increment_per_notch() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        gestures.handle(TouchEvent::Down { y: 0.0 }, &mut model, &mut haptics);
        let handled = gestures.handle(TouchEvent::Move { y: 80.0 }, &mut model, &mut haptics);
        assert_eq!(
            handled.outcome,
            GestureOutcome::Adjusted {
                steps: -3,
                total_ms: 170_000
            }
        );
        assert_eq!(handled.events.len(), 3);
    }

    #[test]
    fn reversing_drag_undoes_notches() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(600_000);
        gestures.handle(TouchEvent::Down { y: 0.0 }, &mut model, &mut haptics);
        gestures.handle(TouchEvent::Move { y: 60.0 }, &mut model, &mut haptics);
        assert_eq!(model.total_ms(), 480_000);
        gestures.handle(TouchEvent::Move { y: 40.0 }, &mut model, &mut haptics);
        assert_eq!(model.total_ms(), 540_000);
    }

    #[test]
    fn returning_to_press_point_restores_total() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        gestures.handle(TouchEvent::Down { y: 100.0 }, &mut model, &mut haptics);
        gestures.handle(TouchEvent::Move { y: 60.0 }, &mut model, &mut haptics);
        assert_eq!(model.total_ms(), 360_000);
        let handled = gestures.handle(TouchEvent::Move { y: 100.0 }, &mut model, &mut haptics);
        assert_eq!(
            handled.outcome,
            GestureOutcome::Adjusted {
                steps: -1,
                total_ms: 300_000
            }
        );
        let handled = gestures.handle(TouchEvent::Up, &mut model, &mut haptics);
        assert_eq!(handled.outcome, GestureOutcome::Consumed);
        assert_eq!(model.total_ms(), 300_000);
    }

    #[test]
    fn extreme_drag_swings_stay_bounded() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        model.resume();
        gestures.handle(TouchEvent::Down { y: 0.0 }, &mut model, &mut haptics);
        for y in [1e30, -1e30, f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            let handled = gestures.handle(TouchEvent::Move { y }, &mut model, &mut haptics);
            assert_eq!(handled.outcome, GestureOutcome::Tracking);
        }
        assert_eq!(model.total_ms(), 300_000);
    }

    #[test]
    fn long_downward_drag_stops_at_floor() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        gestures.handle(TouchEvent::Down { y: 0.0 }, &mut model, &mut haptics);
        let handled = gestures.handle(TouchEvent::Move { y: 2e8 }, &mut model, &mut haptics);
        assert_eq!(model.total_ms(), 10_000);
        // 300 -> 240 -> 180, then 17 fine steps down to 10 s.
        assert_eq!(handled.events.len(), 19);
        assert!(matches!(
            handled.outcome,
            GestureOutcome::Adjusted { total_ms: 10_000, .. }
        ));
    }

    #[test]
    fn drag_while_running_leaves_total_alone() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        model.resume();
        gestures.handle(TouchEvent::Down { y: 0.0 }, &mut model, &mut haptics);
        let handled = gestures.handle(TouchEvent::Move { y: 100.0 }, &mut model, &mut haptics);
        assert_eq!(handled.outcome, GestureOutcome::Tracking);
        assert_eq!(model.total_ms(), 300_000);
        let handled = gestures.handle(TouchEvent::Up, &mut model, &mut haptics);
        assert_eq!(handled.outcome, GestureOutcome::Consumed);
        assert!(model.is_running());
    }

    #[test]
    fn long_press_resets_and_suppresses_tap() {
        let (clock, mut model, mut gestures, mut haptics) = setup(120_000);
        model.resume();
        clock.advance(30_000);
        gestures.handle(TouchEvent::Down { y: 10.0 }, &mut model, &mut haptics);
        assert_eq!(gestures.press_remaining_ms(), Some(90_000));
        let handled = gestures.handle(TouchEvent::LongPress, &mut model, &mut haptics);
        assert_eq!(handled.outcome, GestureOutcome::Reset);
        let handled = gestures.handle(TouchEvent::Up, &mut model, &mut haptics);
        assert_eq!(handled.outcome, GestureOutcome::Consumed);
        assert!(model.is_paused());
        assert_eq!(model.remaining_time(), 120_000);
        assert_eq!(haptics.0, vec![Vibration::Pulse(250)]);
    }

    #[test]
    fn long_press_after_drag_is_ignored() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        gestures.handle(TouchEvent::Down { y: 0.0 }, &mut model, &mut haptics);
        gestures.handle(TouchEvent::Move { y: -25.0 }, &mut model, &mut haptics);
        let handled = gestures.handle(TouchEvent::LongPress, &mut model, &mut haptics);
        assert_eq!(handled.outcome, GestureOutcome::Ignored);
        assert!(haptics.0.is_empty());
    }

    #[test]
    fn events_without_down_are_ignored() {
        let (_clock, mut model, mut gestures, mut haptics) = setup(300_000);
        for event in [TouchEvent::Move { y: 500.0 }, TouchEvent::LongPress, TouchEvent::Up] {
            let handled = gestures.handle(event, &mut model, &mut haptics);
            assert_eq!(handled.outcome, GestureOutcome::Ignored);
        }
        assert_eq!(model.total_ms(), 300_000);
        assert!(model.is_paused());
    }

    #[test]
    fn down_observes_pending_expiry() {
        let (clock, mut model, mut gestures, mut haptics) = setup(10_000);
        model.resume();
        clock.advance(11_000);
        let handled = gestures.handle(TouchEvent::Down { y: 0.0 }, &mut model, &mut haptics);
        assert!(matches!(handled.events.as_slice(), [Event::TimerExpired { .. }]));
        assert_eq!(gestures.press_remaining_ms(), Some(10_000));
    }
}
