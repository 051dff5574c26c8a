use clap::Args;
use setclock_core::storage::Database;
use setclock_core::timer::{format_clock, format_minutes};
use setclock_core::{estimate_total_seconds, RoutineError, RoutineStore, Timeline};

#[derive(Args)]
pub struct TimelineArgs {
    /// Routine ID
    id: String,
    /// Print phases as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: TimelineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let routine = db
        .load(&args.id)?
        .ok_or_else(|| RoutineError::NotFound(args.id.clone()))?;
    let timeline = Timeline::build(&routine)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(timeline.phases())?);
        return Ok(());
    }

    println!("{} ({} phases)", routine.name, timeline.len());
    for (i, phase) in timeline.phases().iter().enumerate() {
        let position = match (phase.round_index, phase.set_number) {
            (Some(r), Some(s)) => format!("r{} s{}", r + 1, s),
            (Some(r), None) => format!("r{}", r + 1),
            _ => String::new(),
        };
        println!(
            "{:>3}  {:<12} {:<20} {:>6}  {}",
            i + 1,
            phase.kind.as_str(),
            phase.label,
            format_clock(phase.duration_secs),
            position
        );
    }
    let total = timeline.total_seconds();
    println!(
        "total {} ({}), estimate {}",
        format_clock(total),
        format_minutes(total),
        format_clock(estimate_total_seconds(&routine))
    );
    Ok(())
}
