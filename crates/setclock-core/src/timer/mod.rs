mod engine;
mod session;
mod snapshot;
mod timeline;

pub use engine::{PlaybackEngine, TickToken, DEFAULT_COUNTDOWN_SECS};
pub use session::{SessionHandle, SessionOptions, WorkoutSession};
pub use snapshot::{format_clock, PlaybackSnapshot};
pub use timeline::{
    estimate_total_seconds, format_minutes, Phase, PhaseKind, Timeline, EXTRA_BREAK_LABEL,
    MANUAL_BREAK_LABEL, REST_LABEL, ROUND_REST_LABEL,
};
