//! `setclock config`: inspect and edit `config.toml` by dotted key.

use clap::Subcommand;
use setclock_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the value stored under each key, one per line
    Get {
        /// Dotted keys such as "playback.break_secs" or "sound.muted"
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Change one value and write the file back
    Set {
        /// Dotted key naming a leaf value
        key: String,
        /// Parsed with the type of the current value
        value: String,
    },
    /// Show every leaf value
    List {
        /// Only keys under this section, e.g. "defaults"
        section: Option<String>,
        /// Emit the whole config as JSON
        #[arg(long, conflicts_with = "section")]
        json: bool,
    },
    /// Overwrite config.toml with the built-in defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    if let ConfigAction::Reset = action {
        Config::default().save()?;
        println!("config reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;
    match action {
        ConfigAction::Get { keys } => {
            let values = lookup(&config, &keys)?;
            for value in values {
                println!("{value}");
            }
        }
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            let stored = config.get(&key).unwrap_or(value);
            tracing::debug!(%key, %stored, "config updated");
            println!("{key} = {stored}");
        }
        ConfigAction::List { json: true, .. } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::List { section, .. } => {
            let prefix = section.map(|s| format!("{}.", s.trim_end_matches('.')));
            let keys = config
                .keys()
                .into_iter()
                .filter(|k| prefix.as_deref().map_or(true, |p| k.starts_with(p)));
            for key in keys {
                if let Some(value) = config.get(&key) {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {}
    }
    Ok(())
}

/// Resolve every key or fail on the first unknown one, printing nothing.
fn lookup(config: &Config, keys: &[String]) -> Result<Vec<String>, ConfigError> {
    keys.iter()
        .map(|key| {
            config
                .get(key)
                .ok_or_else(|| ConfigError::UnknownKey(key.clone()))
        })
        .collect()
}
