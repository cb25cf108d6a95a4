use std::time::Duration;

use clap::Args;
use simpletimer_core::{Cadence, Clock, Config, Database, Readout, SystemClock, TimerState};

use super::{format_readout, open_session, save_session, CliSession};

#[derive(Args)]
pub struct WatchArgs {
    /// Refresh only at minute boundaries, like the always-on display
    #[arg(long)]
    pub ambient: bool,
    /// Stop after this many refreshes
    #[arg(long)]
    pub ticks: Option<u64>,
}

fn print_frame(session: &mut CliSession, readout: &Readout) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", format_readout(readout));
    for event in session.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

/// How long to sleep before calling back into the session, or `None` to stop.
fn sleep_for(cadence: Cadence, now_ms: u64) -> Option<Duration> {
    match cadence {
        Cadence::Tick { interval_ms } => Some(Duration::from_millis(interval_ms)),
        Cadence::WakeAt { at_ms } => Some(Duration::from_millis(at_ms.saturating_sub(now_ms))),
        Cadence::Idle => None,
    }
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut session = open_session(&config, &db)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(watch(&mut session, &args, interrupted()));

    if args.ambient {
        session.exit_ambient();
    }
    save_session(&db, &session)?;
    result.map(|refreshes| tracing::debug!(refreshes, "watch finished"))
}

/// Resolves on the first Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Drive the session until it pauses, the refresh limit is hit or `shutdown`
/// resolves. Returns the number of refreshes made.
async fn watch<F>(
    session: &mut CliSession,
    args: &WatchArgs,
    shutdown: F,
) -> Result<u64, Box<dyn std::error::Error>>
where
    F: std::future::Future<Output = ()>,
{
    tokio::pin!(shutdown);

    if args.ambient {
        session.enter_ambient();
    }
    let readout = session.readout();
    print_frame(session, &readout)?;

    let mut refreshes = 0u64;
    loop {
        if args.ticks.is_some_and(|limit| refreshes >= limit) {
            break;
        }
        if session.state() == TimerState::Paused {
            tracing::info!("timer paused, nothing to refresh");
            break;
        }
        let cadence = session.cadence();
        let Some(delay) = sleep_for(cadence, SystemClock.now_ms()) else {
            break;
        };
        tracing::debug!(
            ?delay,
            deadline = ?session.wake_scheduler().deadline(),
            "sleeping"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut shutdown => {
                tracing::debug!("interrupted");
                break;
            }
        }

        let readout = match cadence {
            Cadence::WakeAt { .. } => session.wake(),
            _ => session.tick(),
        };
        print_frame(session, &readout)?;
        refreshes += 1;
    }
    Ok(refreshes)
}
