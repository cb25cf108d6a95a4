//! Terminal stand-ins for the wearable's vibrator and alarm manager.

use simpletimer_core::{Haptics, Vibration, WakeScheduler};

/// Reports vibrations on stderr instead of buzzing.
#[derive(Debug, Default)]
pub struct TerminalHaptics;

impl Haptics for TerminalHaptics {
    fn vibrate(&mut self, vibration: Vibration) {
        tracing::debug!(?vibration, "vibrate");
        eprintln!("*bzz* ({} ms)", vibration.duration_ms());
    }
}

/// Remembers the requested wake; the watch loop sleeps until it.
#[derive(Debug, Default)]
pub struct PendingWake {
    at_ms: Option<u64>,
}

impl PendingWake {
    pub fn deadline(&self) -> Option<u64> {
        self.at_ms
    }
}

impl WakeScheduler for PendingWake {
    fn schedule_wake_at(&mut self, at_ms: u64) {
        tracing::debug!(at_ms, "wake scheduled");
        self.at_ms = Some(at_ms);
    }

    fn cancel_scheduled_wake(&mut self) {
        if self.at_ms.take().is_some() {
            tracing::debug!("wake cancelled");
        }
    }
}
