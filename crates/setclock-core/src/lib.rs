//! # setclock Core Library
//!
//! This library provides the core logic for the setclock interval-workout
//! timer. All operations are available through the standalone CLI binary,
//! which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Routine model**: rounds of sets with work, rest and extra-break
//!   durations, normalized from loosely-typed JSON
//! - **Timeline builder**: deterministic expansion of a routine into phases
//! - **Playback engine**: a one-second tick state machine with pause, reset
//!   and manual break insertion; stale ticks are rejected by generation
//! - **Session runner**: a tokio task that owns the engine and its interval
//! - **Storage**: SQLite routine store and TOML configuration
//!
//! ## Key Components
//!
//! - [`Timeline`]: ordered phases of one session
//! - [`PlaybackEngine`]: core state machine
//! - [`WorkoutSession`]: real-time driver
//! - [`NotificationSink`]: where events go (cues, timestamps)
//! - [`Database`]: routine persistence

pub mod error;
pub mod events;
pub mod notify;
pub mod routine;
pub mod storage;
pub mod timer;
pub mod workout;

pub use error::{ConfigError, CoreError, PlaybackError, RoutineError, StaleTick, StoreError};
pub use events::Event;
pub use notify::{is_muted, set_muted, AudioCues, Cue, CuePlayer, Fanout, NotificationSink, NullSink};
pub use routine::{Round, Routine};
pub use storage::{
    Config, Database, MemoryStore, RecorderWriter, RoutineStore, SessionRecorder, TouchMark,
};
pub use timer::{
    estimate_total_seconds, PlaybackEngine, PlaybackSnapshot, Phase, PhaseKind, SessionHandle,
    SessionOptions, TickToken, Timeline, WorkoutSession,
};
pub use workout::Workout;
