//! Host-facing driver for one countdown session.
//!
//! A `Session` owns the single [`TimerModel`] of the process together with
//! the gesture decoder and the ambient scheduler. The host feeds it lifecycle
//! signals, ticks, wakes and touches, and follows the [`Cadence`] it reports:
//!
//! ```text
//! Interactive --enter_ambient--> Ambient --exit_ambient--> Interactive
//!  tick every interval_ms         wake at next minute boundary (or idle)
//! ```
//!
//! All calls must be made from one serialized context. A multi-threaded host
//! can wrap the whole session in a single mutex; no call blocks.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::events::{timestamp, Event};
use crate::gesture::{GestureInterpreter, GestureOutcome, TouchEvent};
use crate::host::{Haptics, Silent, Vibration, WakeScheduler};
use crate::storage::Config;
use crate::timer::{
    AmbientScheduler, Cadence, Direction, Mode, Remaining, TimerModel, TimerSnapshot, TimerState,
};

/// What a renderer needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readout {
    pub state: TimerState,
    pub mode: Mode,
    pub remaining_ms: u64,
    pub total_ms: u64,
}

pub struct Session<C, H, W> {
    model: TimerModel<C>,
    gestures: GestureInterpreter,
    scheduler: AmbientScheduler,
    haptics: H,
    wake: W,
    mode: Mode,
    foreground: bool,
    tick_ms: u64,
    haptics_enabled: bool,
    expiry_vibration: Vibration,
    pending_wake_ms: Option<u64>,
    events: Vec<Event>,
}

impl<C: Clock, H: Haptics, W: WakeScheduler> Session<C, H, W> {
    /// Interactive, foreground session counting down from the configured default.
    pub fn new(clock: C, config: &Config, haptics: H, wake: W) -> Self {
        Self {
            model: TimerModel::with_total(clock, config.timer.default_total_ms),
            gestures: GestureInterpreter::new(config.gesture.clone()),
            scheduler: AmbientScheduler::new(config.ambient.wake_skew_ms),
            haptics,
            wake,
            mode: Mode::Interactive,
            foreground: true,
            tick_ms: config.ambient.interactive_tick_ms,
            haptics_enabled: config.haptics.enabled,
            expiry_vibration: Vibration::Pattern(config.haptics.expiry_pattern.clone()),
            pending_wake_ms: None,
            events: Vec::new(),
        }
    }

    /// Start from a total persisted by an earlier session.
    pub fn with_total_time(mut self, total_ms: u64) -> Self {
        self.model.set_total_time(total_ms);
        self
    }

    /// Continue a countdown captured with [`Session::snapshot`].
    pub fn with_snapshot(mut self, snapshot: TimerSnapshot) -> Self {
        self.model.apply_snapshot(snapshot);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> TimerState {
        self.model.state()
    }

    /// Value the host persists when the session ends.
    pub fn total_time(&self) -> u64 {
        self.model.total_ms()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.model.snapshot()
    }

    pub fn haptics(&self) -> &H {
        &self.haptics
    }

    pub fn wake_scheduler(&self) -> &W {
        &self.wake
    }

    /// How the host should schedule its next call into the session.
    pub fn cadence(&self) -> Cadence {
        match self.mode {
            Mode::Interactive if self.foreground => Cadence::Tick {
                interval_ms: self.tick_ms,
            },
            Mode::Interactive => Cadence::Idle,
            Mode::Ambient => match self.pending_wake_ms {
                Some(at_ms) => Cadence::WakeAt { at_ms },
                None => Cadence::Idle,
            },
        }
    }

    /// Current frame, observing a pending expiry if there is one.
    pub fn readout(&mut self) -> Readout {
        let remaining = self.refresh();
        self.frame(remaining.ms())
    }

    /// Ambient wake delay the countdown would need right now, or `None`
    /// while paused.
    pub fn next_wake_delay(&mut self) -> Option<u64> {
        match self.refresh() {
            Remaining::Ongoing(remaining_ms) if self.model.is_running() => {
                Some(self.scheduler.delay_for_remaining(remaining_ms))
            }
            _ => None,
        }
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Host re-entry ────────────────────────────────────────────────

    /// Interactive refresh.
    pub fn tick(&mut self) -> Readout {
        let remaining = self.refresh();
        if self.mode == Mode::Ambient {
            self.reschedule(remaining);
        }
        self.frame(remaining.ms())
    }

    /// Ambient wake fired.
    pub fn wake(&mut self) -> Readout {
        self.pending_wake_ms = None;
        self.tick()
    }

    pub fn enter_ambient(&mut self) -> Cadence {
        if self.mode != Mode::Ambient {
            tracing::info!("entering ambient mode");
            self.mode = Mode::Ambient;
            self.push_mode_change();
        }
        let remaining = self.refresh();
        self.reschedule(remaining);
        self.cadence()
    }

    pub fn exit_ambient(&mut self) -> Cadence {
        self.wake.cancel_scheduled_wake();
        if self.pending_wake_ms.take().is_some() {
            let at = self.now();
            self.events.push(Event::WakeCancelled { at });
        }
        if self.mode != Mode::Interactive {
            tracing::info!("leaving ambient mode");
            self.mode = Mode::Interactive;
            self.push_mode_change();
        }
        self.refresh();
        self.cadence()
    }

    pub fn foreground(&mut self) -> Cadence {
        self.foreground = true;
        self.refresh();
        self.cadence()
    }

    pub fn background(&mut self) -> Cadence {
        self.foreground = false;
        self.cadence()
    }

    // ── User intents ─────────────────────────────────────────────────

    pub fn touch(&mut self, event: TouchEvent) -> GestureOutcome {
        let handled = if self.haptics_enabled {
            self.gestures.handle(event, &mut self.model, &mut self.haptics)
        } else {
            self.gestures.handle(event, &mut self.model, &mut Silent)
        };
        self.record_all(handled.events);
        if !matches!(handled.outcome, GestureOutcome::Tracking | GestureOutcome::Ignored) {
            self.after_change();
        }
        handled.outcome
    }

    /// Platform "set timer" request: count down `seconds` starting now.
    /// A negative length is ignored.
    pub fn set_timer(&mut self, seconds: i64) -> bool {
        let Ok(seconds) = u64::try_from(seconds) else {
            tracing::debug!(seconds, "ignoring negative timer length");
            return false;
        };
        if self.model.is_running() {
            let event = self.model.reset();
            self.record(event);
        }
        let event = self.model.set_total_time(seconds.saturating_mul(1_000));
        self.record(event);
        if let Some(event) = self.model.resume() {
            self.record(event);
        }
        self.after_change();
        true
    }

    pub fn flip(&mut self) {
        let event = self.model.flip();
        self.record_all(event);
        self.after_change();
    }

    pub fn resume(&mut self) {
        let event = self.model.resume();
        self.record_all(event);
        self.after_change();
    }

    pub fn pause(&mut self) {
        let event = self.model.pause();
        self.record_all(event);
        self.after_change();
    }

    pub fn reset(&mut self) {
        let event = self.model.reset();
        self.record(event);
        self.after_change();
    }

    pub fn increment(&mut self, direction: Direction) {
        let event = self.model.increment(direction);
        self.record_all(event);
    }

    pub fn set_total_time(&mut self, total_ms: u64) {
        let event = self.model.set_total_time(total_ms);
        self.record(event);
        self.after_change();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        timestamp(self.model.now_ms())
    }

    fn frame(&self, remaining_ms: u64) -> Readout {
        Readout {
            state: self.model.state(),
            mode: self.mode,
            remaining_ms,
            total_ms: self.model.total_ms(),
        }
    }

    fn push_mode_change(&mut self) {
        let at = self.now();
        self.events.push(Event::ModeChanged {
            mode: self.mode,
            at,
        });
    }

    /// Read the model once, turning an observed expiry into an event.
    fn refresh(&mut self) -> Remaining {
        let remaining = self.model.poll();
        if remaining.is_expired() {
            let at = self.now();
            self.record(Event::TimerExpired {
                total_ms: self.model.total_ms(),
                at,
            });
        }
        remaining
    }

    /// Re-plan the ambient wake after a user-visible state change.
    fn after_change(&mut self) {
        if self.mode == Mode::Ambient {
            let remaining = self.refresh();
            self.reschedule(remaining);
        }
    }

    fn reschedule(&mut self, remaining: Remaining) {
        match remaining {
            Remaining::Ongoing(remaining_ms) if self.model.is_running() => {
                let delay_ms = self.scheduler.delay_for_remaining(remaining_ms);
                let now_ms = self.model.now_ms();
                let wake_at_ms = now_ms.saturating_add(delay_ms);
                tracing::debug!(
                    delay_ms,
                    minutes = delay_ms as f64 / 60_000.0,
                    "sleeping until next minute boundary"
                );
                self.wake.schedule_wake_at(wake_at_ms);
                self.pending_wake_ms = Some(wake_at_ms);
                self.events.push(Event::WakeScheduled {
                    wake_at_ms,
                    delay_ms,
                    at: timestamp(now_ms),
                });
            }
            _ => {
                if self.pending_wake_ms.take().is_some() {
                    self.wake.cancel_scheduled_wake();
                    let at = self.now();
                    self.events.push(Event::WakeCancelled { at });
                }
            }
        }
    }

    fn record_all(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.record(event);
        }
    }

    fn record(&mut self, event: Event) {
        if let Event::TimerExpired { total_ms, .. } = event {
            tracing::info!(total_ms, "timer expired");
            if self.haptics_enabled {
                self.haptics.vibrate(self.expiry_vibration.clone());
            }
        }
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[derive(Default)]
    struct Buzz(Vec<Vibration>);

    impl Haptics for Buzz {
        fn vibrate(&mut self, vibration: Vibration) {
            self.0.push(vibration);
        }
    }

    #[derive(Default)]
    struct Alarm {
        at: Option<u64>,
        cancels: usize,
    }

    impl WakeScheduler for Alarm {
        fn schedule_wake_at(&mut self, at_ms: u64) {
            self.at = Some(at_ms);
        }

        fn cancel_scheduled_wake(&mut self) {
            self.at = None;
            self.cancels += 1;
        }
    }

    fn session() -> (ManualClock, Session<ManualClock, Buzz, Alarm>) {
        let clock = ManualClock::new(0);
        let session = Session::new(
            clock.clone(),
            &Config::default(),
            Buzz::default(),
            Alarm::default(),
        );
        (clock, session)
    }

    #[test]
    fn interactive_session_ticks_every_second() {
        let (_clock, session) = session();
        assert_eq!(session.cadence(), Cadence::Tick { interval_ms: 1_000 });
    }

    #[test]
    fn paused_ambient_session_idles() {
        let (_clock, mut session) = session();
        assert_eq!(session.enter_ambient(), Cadence::Idle);
        assert_eq!(session.wake_scheduler().at, None);
    }

    #[test]
    fn ambient_wake_tracks_minute_boundaries() {
        let (clock, mut session) = session();
        session.resume();
        clock.set(15_000);
        assert_eq!(session.enter_ambient(), Cadence::WakeAt { at_ms: 60_100 });
        assert_eq!(session.wake_scheduler().at, Some(60_100));

        clock.set(60_100);
        let frame = session.wake();
        assert_eq!(frame.remaining_ms, 239_900);
        assert_eq!(session.cadence(), Cadence::WakeAt { at_ms: 120_100 });
    }

    #[test]
    fn exit_ambient_cancels_pending_wake() {
        let (_clock, mut session) = session();
        session.resume();
        session.enter_ambient();
        session.drain_events();
        assert_eq!(session.exit_ambient(), Cadence::Tick { interval_ms: 1_000 });
        assert_eq!(session.wake_scheduler().at, None);
        let events = session.drain_events();
        assert!(matches!(events[0], Event::WakeCancelled { .. }));
        assert!(matches!(events[1], Event::ModeChanged { mode: Mode::Interactive, .. }));
    }

    #[test]
    fn expiry_buzzes_once_and_rearms() {
        let (clock, mut session) = session();
        session.set_total_time(60_000);
        session.resume();
        clock.set(61_000);
        let frame = session.tick();
        assert_eq!(frame.state, TimerState::Paused);
        assert_eq!(frame.remaining_ms, 60_000);
        session.tick();
        assert_eq!(session.haptics().0, vec![Vibration::finish()]);
        let expiries = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, Event::TimerExpired { .. }))
            .count();
        assert_eq!(expiries, 1);
    }

    #[test]
    fn disabled_haptics_stay_silent() {
        let clock = ManualClock::new(0);
        let mut config = Config::default();
        config.haptics.enabled = false;
        let mut session = Session::new(clock.clone(), &config, Buzz::default(), Alarm::default());
        session.touch(TouchEvent::Down { y: 0.0 });
        session.touch(TouchEvent::Up);
        clock.advance(400_000);
        session.tick();
        assert!(session.haptics().0.is_empty());
    }

    #[test]
    fn set_timer_intent_starts_countdown() {
        let (clock, mut session) = session();
        assert!(!session.set_timer(-1));
        assert!(session.set_timer(90));
        clock.advance(30_000);
        let frame = session.readout();
        assert_eq!(frame.state, TimerState::Running);
        assert_eq!(frame.remaining_ms, 60_000);
        assert_eq!(session.total_time(), 90_000);
    }

    #[test]
    fn next_wake_delay_only_while_running() {
        let (clock, mut session) = session();
        assert_eq!(session.next_wake_delay(), None);
        session.resume();
        clock.advance(30_000);
        assert_eq!(session.next_wake_delay(), Some(30_100));
    }

    #[test]
    fn background_idles_until_foreground() {
        let (_clock, mut session) = session();
        assert_eq!(session.background(), Cadence::Idle);
        assert_eq!(session.foreground(), Cadence::Tick { interval_ms: 1_000 });
    }

    #[test]
    fn pausing_in_ambient_cancels_wake() {
        let (clock, mut session) = session();
        session.resume();
        session.enter_ambient();
        clock.advance(5_000);
        session.pause();
        assert_eq!(session.cadence(), Cadence::Idle);
        assert_eq!(session.wake_scheduler().at, None);
        assert_eq!(session.wake_scheduler().cancels, 1);
    }

    #[test]
    fn snapshot_restores_running_countdown() {
        let (clock, mut session) = session();
        session.resume();
        let snapshot = session.snapshot();
        clock.advance(10_000);
        let mut restored = Session::new(clock, &Config::default(), Buzz::default(), Alarm::default())
            .with_snapshot(snapshot);
        assert_eq!(restored.readout().remaining_ms, 290_000);
    }
}
