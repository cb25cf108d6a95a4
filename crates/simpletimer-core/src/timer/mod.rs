mod ambient;
mod model;

pub use ambient::{AmbientScheduler, Cadence, Mode, DEFAULT_TICK_MS, DEFAULT_WAKE_SKEW_MS};
pub use model::{
    adjusted_total, granularity_for, remaining_at, Direction, Remaining, TimerModel,
    TimerSnapshot, TimerState, DEFAULT_TOTAL_MS, FINE_GRANULARITY_MS, FINE_THRESHOLD_MS,
    MINUTE_MS,
};
