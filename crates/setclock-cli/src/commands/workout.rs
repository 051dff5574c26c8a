//! Interactive workout runner.
//!
//! The session ticks on its own task; this loop reads one-letter commands
//! from stdin and renders state changes to the terminal.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::Args;
use setclock_core::storage::Database;
use setclock_core::timer::format_clock;
use setclock_core::{
    set_muted, AudioCues, Config, Cue, CuePlayer, Event, Fanout, NotificationSink,
    PlaybackSnapshot, SessionHandle, SessionOptions, SessionRecorder, Workout,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args)]
pub struct WorkoutArgs {
    /// Routine ID
    id: String,
    /// Milliseconds per countdown second (defaults to playback.tick_interval_ms)
    #[arg(long)]
    tick_ms: Option<u64>,
}

pub fn run(args: WorkoutArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    set_muted(config.sound.muted);

    let db = Database::open()?;
    let workout = Workout::load(&db, &args.id, &config)?;

    let mut options = config.session_options();
    if let Some(ms) = args.tick_ms {
        options.tick_period = Duration::from_millis(ms.max(1));
    }

    let (recorder, writer) = SessionRecorder::spawn(db, args.id)?;
    let sink = Fanout::new()
        .with(recorder)
        .with(AudioCues::new(TerminalBell))
        .with(announce);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(
        workout,
        Box::new(sink),
        options,
        config.playback.break_secs,
    ));
    // A pending stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_background();
    // The session (and with it the recorder) is gone; flush queued stamps.
    if writer.finish().is_none() {
        tracing::warn!("session recorder exited abnormally");
    }
    result
}

async fn drive(
    workout: Workout,
    sink: Box<dyn NotificationSink>,
    options: SessionOptions,
    break_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = workout.routine.name.clone();
    let auto_start = workout.routine.auto_start;
    let handle = workout.begin(sink, options).await?;

    println!("{name}: p pause/resume, r reset, b [secs] break, B [secs] break and replay, s status, q quit");
    if !auto_start {
        println!("press p to start");
    }

    let live = std::io::stderr().is_terminal();
    let mut status = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line? {
                    None => {
                        stdin_open = false;
                        if !handle.snapshot().running {
                            break;
                        }
                    }
                    Some(line) => match Input::parse(&line, break_secs) {
                        Ok(Some(Input::Quit)) => break,
                        Ok(Some(input)) => apply(&handle, input).await,
                        Ok(None) => {}
                        Err(msg) => eprintln!("{msg}"),
                    },
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = status.borrow_and_update().clone();
                if snapshot.finished {
                    break;
                }
                if live {
                    eprint!("\r{:<72}", snapshot.status_line());
                    let _ = std::io::stderr().flush();
                }
            }
        }
    }

    if live {
        eprintln!();
    }
    let last = handle.stop().await?;
    tracing::info!(routine = %name, finished = last.finished, "workout ended");
    println!("{}", last.status_line());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Toggle,
    Reset,
    Break { after_current: bool, secs: i64 },
    Status,
    Quit,
}

impl Input {
    /// `Ok(None)` for a blank line.
    fn parse(line: &str, break_secs: u64) -> Result<Option<Input>, String> {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return Ok(None);
        };
        let input = match cmd {
            "p" => Input::Toggle,
            "r" => Input::Reset,
            "s" => Input::Status,
            "q" => Input::Quit,
            "b" | "B" => {
                let secs = match words.next() {
                    Some(raw) => raw
                        .parse::<i64>()
                        .map_err(|_| format!("break length must be whole seconds, got '{raw}'"))?,
                    None => i64::try_from(break_secs).unwrap_or(i64::MAX),
                };
                Input::Break {
                    after_current: cmd == "b",
                    secs,
                }
            }
            other => return Err(format!("unknown command '{other}'")),
        };
        Ok(Some(input))
    }
}

async fn apply(handle: &SessionHandle, input: Input) {
    let result = match input {
        Input::Toggle => handle.toggle().await,
        Input::Reset => handle.reset().await,
        Input::Break {
            after_current,
            secs,
        } => handle.insert_break(after_current, secs).await,
        Input::Status => Ok(handle.snapshot()),
        Input::Quit => return,
    };
    match result {
        Ok(snapshot) => print_status(&snapshot),
        Err(e) => eprintln!("error: {e}"),
    }
}

fn print_status(snapshot: &PlaybackSnapshot) {
    println!("{}", snapshot.status_line());
    if !snapshot.upcoming.is_empty() {
        let next: Vec<&str> = snapshot.upcoming.iter().map(|p| p.label.as_str()).collect();
        println!("  next: {}", next.join(", "));
    }
}

fn announce(event: &Event) {
    match event {
        Event::PhaseStarted { phase, .. } => println!(
            "▶ {} [{}] {}",
            phase.label,
            phase.kind,
            format_clock(phase.duration_secs)
        ),
        Event::SessionFinished { .. } => println!("Workout complete."),
        _ => {}
    }
}

/// Renders cues as a terminal bell plus a short label on stderr.
struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play(&mut self, cue: Cue) {
        let label = match cue {
            Cue::Start => "go",
            Cue::Beep => "beep",
            Cue::Rest => "rest",
            Cue::Finish => "done",
        };
        eprintln!("\x07({label})");
    }
}
