pub mod config;
pub mod timer;
pub mod watch;

use simpletimer_core::{Config, Database, Mode, Readout, Session, SystemClock};

use crate::host::{PendingWake, TerminalHaptics};

pub type CliSession = Session<SystemClock, TerminalHaptics, PendingWake>;

/// Rebuild the session left behind by the previous invocation.
pub fn open_session(config: &Config, db: &Database) -> Result<CliSession, Box<dyn std::error::Error>> {
    let mut session = Session::new(SystemClock, config, TerminalHaptics, PendingWake::default());
    if let Some(total_ms) = db.load_total_time()? {
        session = session.with_total_time(total_ms);
    }
    if let Some(snapshot) = db.load_snapshot()? {
        session = session.with_snapshot(snapshot);
    }
    Ok(session)
}

pub fn save_session(db: &Database, session: &CliSession) -> Result<(), Box<dyn std::error::Error>> {
    db.save_snapshot(&session.snapshot())?;
    db.save_total_time(session.total_time())?;
    Ok(())
}

/// Watch-face text: `M:SS` when interactive, whole minutes (rounded up)
/// when ambient.
pub fn format_readout(readout: &Readout) -> String {
    match readout.mode {
        Mode::Interactive => {
            let secs = readout.remaining_ms / 1_000;
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        Mode::Ambient => {
            let minutes = readout.remaining_ms.div_ceil(60_000);
            let unit = if minutes == 1 { "minute" } else { "minutes" };
            format!("{minutes} {unit}")
        }
    }
}
