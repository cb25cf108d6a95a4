//! TOML-based application configuration.
//!
//! Stores the tunables of the countdown host:
//! - Default countdown duration for a fresh install
//! - Drag sensitivity and haptic pulse lengths
//! - Ambient wake skew and interactive tick interval
//!
//! Configuration is stored at `~/.config/simpletimer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::host::FINISH_PATTERN;
use crate::timer::{DEFAULT_TICK_MS, DEFAULT_TOTAL_MS, DEFAULT_WAKE_SKEW_MS};

const DEFAULT_PX_PER_NOTCH: f32 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Countdown used when no total has been persisted yet.
    #[serde(default = "default_total_ms")]
    pub default_total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Vertical drag distance that counts as one notch.
    #[serde(default = "default_px_per_notch")]
    pub px_per_notch: f32,
    #[serde(default = "default_tap_pulse_ms")]
    pub tap_pulse_ms: u64,
    #[serde(default = "default_long_press_pulse_ms")]
    pub long_press_pulse_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientConfig {
    #[serde(default = "default_wake_skew_ms")]
    pub wake_skew_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub interactive_tick_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HapticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_expiry_pattern")]
    pub expiry_pattern: Vec<u64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/simpletimer/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
    #[serde(default)]
    pub haptics: HapticsConfig,
}

fn default_total_ms() -> u64 {
    DEFAULT_TOTAL_MS
}
fn default_px_per_notch() -> f32 {
    DEFAULT_PX_PER_NOTCH
}
fn default_tap_pulse_ms() -> u64 {
    80
}
fn default_long_press_pulse_ms() -> u64 {
    250
}
fn default_wake_skew_ms() -> u64 {
    DEFAULT_WAKE_SKEW_MS
}
fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}
fn default_true() -> bool {
    true
}
fn default_expiry_pattern() -> Vec<u64> {
    FINISH_PATTERN.to_vec()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_total_ms: default_total_ms(),
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            px_per_notch: DEFAULT_PX_PER_NOTCH,
            tap_pulse_ms: default_tap_pulse_ms(),
            long_press_pulse_ms: default_long_press_pulse_ms(),
        }
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            wake_skew_ms: DEFAULT_WAKE_SKEW_MS,
            interactive_tick_ms: DEFAULT_TICK_MS,
        }
    }
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expiry_pattern: default_expiry_pattern(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `~/.config/simpletimer/config.toml`, writing the defaults
    /// there on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing the defaults there when missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(format!("{}: {e}", path.display())))?;
                Ok(cfg.validated())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "writing default config");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, keeping the value's type.
    /// The change is in memory only; call [`Config::save`] to persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated.validated();
        Ok(())
    }

    /// Replace values the host cannot work with by their defaults.
    pub fn validated(mut self) -> Self {
        if !self.gesture.px_per_notch.is_finite() || self.gesture.px_per_notch <= 0.0 {
            tracing::warn!(
                px_per_notch = self.gesture.px_per_notch,
                "invalid drag sensitivity, using default"
            );
            self.gesture.px_per_notch = DEFAULT_PX_PER_NOTCH;
        }
        if self.ambient.interactive_tick_ms == 0 {
            tracing::warn!("interactive tick of 0 ms, using default");
            self.ambient.interactive_tick_ms = DEFAULT_TICK_MS;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[gesture]\npx_per_notch = 32.0\n").unwrap();
        assert_eq!(parsed.gesture.px_per_notch, 32.0);
        assert_eq!(parsed.gesture.tap_pulse_ms, 80);
        assert_eq!(parsed.timer.default_total_ms, DEFAULT_TOTAL_MS);
        assert_eq!(parsed.haptics.expiry_pattern, FINISH_PATTERN.to_vec());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.default_total_ms").as_deref(), Some("300000"));
        assert_eq!(cfg.get("haptics.enabled").as_deref(), Some("true"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("ambient.wake_skew_ms", "250").unwrap();
        cfg.set("haptics.enabled", "false").unwrap();
        cfg.set("gesture.px_per_notch", "12.5").unwrap();
        cfg.set("haptics.expiry_pattern", "[0, 500]").unwrap();
        assert_eq!(cfg.ambient.wake_skew_ms, 250);
        assert!(!cfg.haptics.enabled);
        assert_eq!(cfg.gesture.px_per_notch, 12.5);
        assert_eq!(cfg.haptics.expiry_pattern, vec![0, 500]);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set("timer.nonexistent", "1");
        assert!(matches!(
            result,
            Err(crate::error::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("haptics.enabled", "not_a_bool").is_err());
        assert!(cfg.set("timer.default_total_ms", "five").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn validated_restores_unusable_values() {
        let mut cfg = Config::default();
        cfg.gesture.px_per_notch = 0.0;
        cfg.ambient.interactive_tick_ms = 0;
        let cfg = cfg.validated();
        assert_eq!(cfg.gesture.px_per_notch, DEFAULT_PX_PER_NOTCH);
        assert_eq!(cfg.ambient.interactive_tick_ms, DEFAULT_TICK_MS);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.timer.default_total_ms = 90_000;
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().timer.default_total_ms, 90_000);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = 5").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn load_from_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::LoadFailed { .. })
        ));
    }
}
