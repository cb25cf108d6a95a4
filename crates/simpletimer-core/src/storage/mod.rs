mod config;
pub mod database;

pub use config::{AmbientConfig, Config, GestureConfig, HapticsConfig, TimerConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/simpletimer[-dev]/` based on SIMPLETIMER_ENV.
///
/// Set SIMPLETIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SIMPLETIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("simpletimer-dev")
    } else {
        base_dir.join("simpletimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
