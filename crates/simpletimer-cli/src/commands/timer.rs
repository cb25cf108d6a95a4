use clap::Subcommand;
use simpletimer_core::{Config, Database, Direction};

use super::{format_readout, open_session, save_session, CliSession};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Start or continue the countdown
    Resume,
    /// Pause the countdown
    Pause,
    /// Toggle between running and paused (a tap)
    Flip,
    /// Stop and re-arm with the full total (a long press)
    Reset,
    /// Raise the total by one step (paused only)
    Up,
    /// Lower the total by one step (paused only)
    Down,
    /// Set the countdown total without starting it
    Set {
        /// Total in seconds
        seconds: u64,
    },
    /// Count down the given number of seconds starting now
    Start {
        /// Length in seconds; negative lengths are ignored
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },
    /// Print the ambient wake delay the countdown needs right now
    NextWake,
}

fn print_state(session: &mut CliSession) -> Result<(), Box<dyn std::error::Error>> {
    let readout = session.readout();
    let events = session.drain_events();
    let json = serde_json::json!({
        "readout": readout,
        "display": format_readout(&readout),
        "events": events,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut session = open_session(&config, &db)?;

    match action {
        TimerAction::Status => {}
        TimerAction::Resume => session.resume(),
        TimerAction::Pause => session.pause(),
        TimerAction::Flip => session.flip(),
        TimerAction::Reset => session.reset(),
        TimerAction::Up => session.increment(Direction::Up),
        TimerAction::Down => session.increment(Direction::Down),
        TimerAction::Set { seconds } => session.set_total_time(seconds.saturating_mul(1_000)),
        TimerAction::Start { seconds } => {
            if !session.set_timer(seconds) {
                eprintln!("ignoring negative length: {seconds}");
            }
        }
        TimerAction::NextWake => {
            let delay_ms = session.next_wake_delay();
            println!("{}", serde_json::json!({ "delay_ms": delay_ms }));
            save_session(&db, &session)?;
            return Ok(());
        }
    }

    print_state(&mut session)?;
    save_session(&db, &session)?;
    Ok(())
}
