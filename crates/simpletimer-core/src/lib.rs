//! # SimpleTimer Core Library
//!
//! Countdown logic for a single-purpose timer on a small always-on display.
//! The host platform renders, vibrates, and sets alarms; this crate decides
//! what the timer is doing and when the host next needs to look at it.
//!
//! ## Architecture
//!
//! - **Clock**: injected timestamp source, so all time math is testable
//! - **Timer Model**: lazy wall-clock countdown with query-time expiry
//! - **Ambient Scheduler**: wakes the host only at minute boundaries
//!   while the display is in low-power mode
//! - **Gestures**: drag / tap / long-press decoding into timer intents
//! - **Session**: host driver tying the above to haptics and wake alarms
//! - **Storage**: TOML configuration and a SQLite key-value store for the
//!   persisted countdown total
//!
//! ## Threading
//!
//! Nothing in the core locks or blocks. Every call into a [`Session`] (or a
//! bare [`TimerModel`]) must come from one serialized context; a
//! multi-threaded host wraps the session in a single mutex.
//!
//! ## Key Components
//!
//! - [`TimerModel`]: Countdown state machine
//! - [`AmbientScheduler`]: Minute-boundary wake calculator
//! - [`GestureInterpreter`]: Touch sequence decoder
//! - [`Session`]: Host-facing driver
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod gesture;
pub mod host;
pub mod session;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use gesture::{GestureInterpreter, GestureOutcome, TouchEvent, MAX_DRAG_NOTCHES};
pub use host::{Haptics, Silent, Vibration, WakeScheduler};
pub use session::{Readout, Session};
pub use storage::{Config, Database};
pub use timer::{
    AmbientScheduler, Cadence, Direction, Mode, Remaining, TimerModel, TimerSnapshot, TimerState,
};
