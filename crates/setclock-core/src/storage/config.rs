//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Sound settings (mute, countdown beep window)
//! - Playback settings (tick length, lookahead, default manual break)
//! - Defaults for newly created rounds
//!
//! Configuration is stored at `~/.config/setclock/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::routine::Round;
use crate::timer::{SessionOptions, DEFAULT_COUNTDOWN_SECS};

/// Sound configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default)]
    pub muted: bool,
    /// Work phases beep during their last this-many seconds.
    #[serde(default = "default_countdown_cue_secs")]
    pub countdown_cue_secs: u64,
}

/// Playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Upcoming phases shown next to the current one.
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Manual break length when none is given.
    #[serde(default = "default_break_secs")]
    pub break_secs: u64,
}

/// Values used for fields left out when creating a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundDefaults {
    #[serde(default = "default_sets")]
    pub sets: u32,
    #[serde(default = "default_work")]
    pub work: u64,
    #[serde(default = "default_rest")]
    pub rest: u64,
    #[serde(default)]
    pub extra_break: u64,
    #[serde(default)]
    pub round_rest: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub defaults: RoundDefaults,
}

// Default functions
fn default_countdown_cue_secs() -> u64 {
    DEFAULT_COUNTDOWN_SECS
}
fn default_lookahead() -> usize {
    9
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_break_secs() -> u64 {
    30
}
fn default_sets() -> u32 {
    1
}
fn default_work() -> u64 {
    30
}
fn default_rest() -> u64 {
    25
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            muted: false,
            countdown_cue_secs: default_countdown_cue_secs(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            lookahead: default_lookahead(),
            tick_interval_ms: default_tick_interval_ms(),
            break_secs: default_break_secs(),
        }
    }
}

impl Default for RoundDefaults {
    fn default() -> Self {
        Self {
            sets: default_sets(),
            work: default_work(),
            rest: default_rest(),
            extra_break: 0,
            round_rest: 0,
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
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults first if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from disk, falling back to defaults on any failure.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory. Call [`Config::save`] to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Dotted keys of every leaf value, sorted.
    pub fn keys(&self) -> Vec<String> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<String>) {
            if let serde_json::Value::Object(map) = value {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    walk(&key, v, out);
                }
            } else {
                out.push(prefix.to_string());
            }
        }

        let mut keys = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut keys);
        }
        keys
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            tick_period: Duration::from_millis(self.playback.tick_interval_ms.max(1)),
            lookahead: self.playback.lookahead,
        }
    }

    /// A round with every field taken from `[defaults]`.
    pub fn default_round(&self, name: impl Into<String>) -> Round {
        Round::new(
            name,
            self.defaults.sets,
            self.defaults.work,
            self.defaults.rest,
        )
        .with_extra_break(self.defaults.extra_break)
    }
}
