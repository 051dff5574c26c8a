//! Routine management commands for CLI.

use std::io::Read;

use clap::Subcommand;
use setclock_core::storage::Database;
use setclock_core::timer::format_minutes;
use setclock_core::{estimate_total_seconds, Config, Round, Routine, RoutineError, RoutineStore};

#[derive(Subcommand)]
pub enum RoutineAction {
    /// List routines
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one routine as JSON
    Show {
        /// Routine ID
        id: String,
    },
    /// Insert or replace a routine from a JSON document ("-" reads stdin)
    Add {
        /// Routine JSON
        json: String,
    },
    /// Create a routine from round specs
    New {
        /// Routine name
        name: String,
        /// Round as "name:sets:work:rest[:extra]"; empty fields use [defaults]
        #[arg(long = "round", required = true)]
        rounds: Vec<String>,
        /// Seconds of rest between rounds
        #[arg(long)]
        round_rest: Option<u64>,
        /// Wait for an explicit start instead of starting on load
        #[arg(long)]
        no_auto_start: bool,
    },
    /// Delete a routine
    Delete {
        /// Routine ID
        id: String,
    },
}

pub fn run(action: RoutineAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        RoutineAction::List { json } => {
            let routines = db.list_all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&routines)?);
            } else if routines.is_empty() {
                println!("No routines.");
            } else {
                for routine in &routines {
                    println!(
                        "{}  {}  ({} rounds, {})",
                        routine.id,
                        routine.name,
                        routine.rounds.len(),
                        format_minutes(estimate_total_seconds(routine))
                    );
                }
            }
        }
        RoutineAction::Show { id } => {
            let routine = db
                .load(&id)?
                .ok_or_else(|| RoutineError::NotFound(id.clone()))?;
            println!("{}", serde_json::to_string_pretty(&routine)?);
        }
        RoutineAction::Add { json } => {
            let text = if json == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                json
            };
            let routine = Routine::from_json(&text)?;
            routine.validate()?;
            db.save(&routine)?;
            println!("Routine saved: {}", routine.id);
        }
        RoutineAction::New {
            name,
            rounds,
            round_rest,
            no_auto_start,
        } => {
            let config = Config::load_or_default();
            let mut routine = Routine::new(name)
                .with_round_rest(round_rest.unwrap_or(config.defaults.round_rest))
                .with_auto_start(!no_auto_start);
            for spec in &rounds {
                routine = routine.with_round(parse_round(spec, &config)?);
            }
            routine.validate()?;
            db.save(&routine)?;
            println!("Routine created: {}", routine.id);
            println!("{}", serde_json::to_string_pretty(&routine)?);
        }
        RoutineAction::Delete { id } => {
            db.delete(&id)?;
            println!("Routine deleted: {id}");
        }
    }

    Ok(())
}

/// Parse `name:sets:work:rest[:extra]`. Missing or empty numeric fields
/// come from the `[defaults]` config section.
fn parse_round(spec: &str, config: &Config) -> Result<Round, String> {
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(format!("round '{spec}' has no name"));
    }

    let mut round = config.default_round(name);
    let mut next = |field: &str| -> Result<Option<u64>, String> {
        match parts.next().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<u64>()
                .map(Some)
                .map_err(|_| format!("round '{spec}': {field} must be a whole number, got '{raw}'")),
        }
    };

    if let Some(sets) = next("sets")? {
        round.sets = u32::try_from(sets).map_err(|_| format!("round '{spec}': too many sets"))?;
    }
    if let Some(work) = next("work")? {
        round.work = work;
    }
    if let Some(rest) = next("rest")? {
        round.rest = rest;
    }
    if let Some(extra) = next("extra")? {
        round.extra_break = extra;
    }
    if parts.next().is_some() {
        return Err(format!("round '{spec}' has too many fields"));
    }
    Ok(round)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_round() {
        let round = parse_round("Squats:3:40:20:10", &Config::default()).unwrap();
        assert_eq!(round, Round::new("Squats", 3, 40, 20).with_extra_break(10));
    }

    #[test]
    fn parse_round_fills_defaults() {
        let config = Config::default();
        let round = parse_round("Plank::60", &config).unwrap();
        assert_eq!(round.sets, config.defaults.sets);
        assert_eq!(round.work, 60);
        assert_eq!(round.rest, config.defaults.rest);
        assert_eq!(round.extra_break, config.defaults.extra_break);
    }

    #[test]
    fn parse_round_rejects_garbage() {
        let config = Config::default();
        assert!(parse_round(":3:40:20", &config).is_err());
        assert!(parse_round("Squats:three", &config).is_err());
        assert!(parse_round("Squats:1:2:3:4:5", &config).is_err());
    }
}
