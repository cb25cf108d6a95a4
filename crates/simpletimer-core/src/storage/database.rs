//! SQLite-backed key-value storage.
//!
//! Persists the state that outlives a single session:
//! - The countdown total the user last picked (`initial_time`)
//! - A full timer snapshot for hosts that restart between events (`timer_model`)

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::timer::TimerSnapshot;

const INITIAL_TIME_KEY: &str = "initial_time";
const TIMER_MODEL_KEY: &str = "timer_model";

/// SQLite database holding the persisted timer state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/simpletimer/simpletimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("simpletimer.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> std::result::Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> std::result::Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> std::result::Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Persisted countdown total, if any. A corrupt value reads as absent.
    pub fn load_total_time(&self) -> Result<Option<u64>> {
        let value = self.kv_get(INITIAL_TIME_KEY)?;
        Ok(value.and_then(|v| match v.parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                tracing::warn!(value = %v, "ignoring unreadable persisted total");
                None
            }
        }))
    }

    pub fn save_total_time(&self, total_ms: u64) -> Result<()> {
        self.kv_set(INITIAL_TIME_KEY, &total_ms.to_string())?;
        Ok(())
    }

    /// Stored timer snapshot, if any. A corrupt snapshot reads as absent.
    pub fn load_snapshot(&self) -> Result<Option<TimerSnapshot>> {
        let Some(json) = self.kv_get(TIMER_MODEL_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<TimerSnapshot>(&json) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable timer snapshot");
                Ok(None)
            }
        }
    }

    pub fn save_snapshot(&self, snapshot: &TimerSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.kv_set(TIMER_MODEL_KEY, &json)?;
        Ok(())
    }
}
