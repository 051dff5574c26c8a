//! Core error types for setclock-core.
//!
//! This module defines the error hierarchy using thiserror. Every error is
//! local and recoverable: the worst outcome is refusing to start a session
//! or ignoring a malformed command.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for setclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Routine is missing or cannot produce a timeline
    #[error("Invalid routine: {0}")]
    Routine(#[from] RoutineError),

    /// Rejected playback command
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Storage-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a routine is refused before a timeline is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutineError {
    #[error("routine '{0}' not found")]
    NotFound(String),

    #[error("routine has no rounds")]
    NoRounds,

    /// `round` is zero-based.
    #[error("round {} has {sets} sets; at least 1 is required", round + 1)]
    InvalidSets { round: usize, sets: u32 },

    #[error("malformed routine: {0}")]
    Malformed(String),
}

/// Playback commands that were rejected without touching session state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("break duration must be positive, got {0}s")]
    InvalidDuration(i64),

    #[error("workout session is no longer running")]
    SessionClosed,
}

/// A tick that arrived after the engine was paused, reset, finished or
/// disposed. Callers drop it; it is never shown to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("stale tick (generation {token}, engine at {current})")]
pub struct StaleTick {
    pub token: u64,
    pub current: u64,
}

/// Routine store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored routine is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored routine '{id}' is invalid: {source}")]
    Invalid {
        id: String,
        #[source]
        source: RoutineError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Routine store lock poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not name a config value
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
