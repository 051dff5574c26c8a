use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change of a workout session produces an Event.
/// Notification sinks map them to cues; the session recorder persists
/// timestamps from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A phase became current: first start, natural advance, or a spliced break.
    PhaseStarted {
        index: usize,
        phase: Phase,
        at: DateTime<Utc>,
    },
    /// One of the last seconds of a work phase elapsed.
    CountdownTick {
        index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The last phase ran out.
    SessionFinished {
        at: DateTime<Utc>,
    },
    SessionResumed {
        index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::PhaseStarted { at, .. }
            | Event::CountdownTick { at, .. }
            | Event::SessionFinished { at }
            | Event::SessionResumed { at, .. }
            | Event::SessionPaused { at, .. }
            | Event::SessionReset { at } => *at,
        }
    }

    /// The phase that just started, if this is a `PhaseStarted`.
    pub fn started_phase(&self) -> Option<(usize, &Phase)> {
        match self {
            Event::PhaseStarted { index, phase, .. } => Some((*index, phase)),
            _ => None,
        }
    }
}
