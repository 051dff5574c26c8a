mod config;
pub mod database;
mod memory;
mod recorder;
mod store;

pub use config::{Config, PlaybackConfig, RoundDefaults, SoundConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use recorder::{RecorderWriter, SessionRecorder};
pub use store::{RoutineStore, TouchMark};

use std::path::PathBuf;

/// Returns `~/.config/setclock[-dev]/` based on SETCLOCK_ENV.
///
/// Set SETCLOCK_ENV=dev to use the development data directory, or
/// SETCLOCK_HOME to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("SETCLOCK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SETCLOCK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("setclock-dev")
            } else {
                base_dir.join("setclock")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
