//! Playback engine implementation.
//!
//! The engine is a one-second-granularity state machine over a [`Timeline`].
//! It does not own a clock: the caller invokes `tick()` once per elapsed
//! second while the engine is running, passing the [`TickToken`] it obtained
//! when the ticking started.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           +-> Finished -> (reset) -> Idle
//! ```
//!
//! ## Stale ticks
//!
//! Every transition to "not running" (pause, reset, finish, dispose) bumps a
//! generation counter. Tokens carry the generation they were issued under,
//! so a tick scheduled before a pause is rejected with [`StaleTick`] even if
//! it fires after a later resume.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PlaybackEngine::from_routine(&routine)?;
//! engine.start();
//! let token = engine.tick_token();
//! // Once per second:
//! let events = engine.tick(token)?;
//! ```

use chrono::Utc;
use tracing::{debug, info};

use super::snapshot::PlaybackSnapshot;
use super::timeline::{Phase, Timeline};
use crate::error::{PlaybackError, RoutineError, StaleTick};
use crate::events::Event;
use crate::routine::Routine;

/// Work phases emit a `CountdownTick` for each of their last this-many seconds.
pub const DEFAULT_COUNTDOWN_SECS: u64 = 5;

/// Proof that a tick belongs to the current running stretch of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken {
    generation: u64,
}

impl TickToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Core playback state machine.
///
/// Owns its timeline exclusively; manual breaks are spliced into this copy
/// and never leak to other sessions.
#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    timeline: Timeline,
    current_index: usize,
    remaining_secs: u64,
    running: bool,
    /// Natural completion reached; only `reset()` or a manual break leaves it.
    finished: bool,
    /// Set by the first start after construction or reset.
    started: bool,
    generation: u64,
    countdown_secs: u64,
}

impl PlaybackEngine {
    /// Create an engine positioned on the first phase, not running.
    pub fn new(timeline: Timeline) -> Self {
        let remaining_secs = timeline.first().map(|p| p.duration_secs).unwrap_or(0);
        Self {
            timeline,
            current_index: 0,
            remaining_secs,
            running: false,
            finished: false,
            started: false,
            generation: 0,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
        }
    }

    /// Validate the routine and build its timeline.
    ///
    /// # Errors
    /// Returns the routine's validation error; no engine is created for it.
    pub fn from_routine(routine: &Routine) -> Result<Self, RoutineError> {
        Ok(Self::new(Timeline::build(routine)?))
    }

    pub fn with_countdown_secs(mut self, secs: u64) -> Self {
        self.countdown_secs = secs;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.timeline.get(self.current_index)
    }

    /// Position within the timeline as a whole percentage, 0..=100.
    pub fn percent_complete(&self) -> u8 {
        let last = self.timeline.len().saturating_sub(1).max(1);
        let pct = (self.current_index as f64 / last as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    /// Up to `n` phases following the current one.
    pub fn upcoming(&self, n: usize) -> &[Phase] {
        let phases = self.timeline.phases();
        let start = (self.current_index + 1).min(phases.len());
        let end = start.saturating_add(n).min(phases.len());
        &phases[start..end]
    }

    /// Seconds left in the whole session, current phase included.
    pub fn session_remaining_secs(&self) -> u64 {
        self.remaining_secs
            .saturating_add(self.timeline.seconds_after(self.current_index))
    }

    /// Display state with a lookahead of `lookahead` phases.
    pub fn snapshot(&self, lookahead: usize) -> PlaybackSnapshot {
        PlaybackSnapshot::capture(self, lookahead)
    }

    /// Token for ticks issued from now on. Invalidated by the next
    /// transition to "not running".
    pub fn tick_token(&self) -> TickToken {
        TickToken {
            generation: self.generation,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume playback.
    ///
    /// The first start after construction or reset announces the first
    /// phase with `PhaseStarted`; later starts emit `SessionResumed`. Leading
    /// zero-length phases are passed through immediately. No-op while
    /// running, on an empty timeline, or once finished.
    pub fn start(&mut self) -> Vec<Event> {
        if self.running || self.timeline.is_empty() || self.finished {
            return Vec::new();
        }
        self.running = true;

        let mut events = Vec::with_capacity(1);
        if self.started {
            events.push(Event::SessionResumed {
                index: self.current_index,
                remaining_secs: self.remaining_secs,
                at: Utc::now(),
            });
        } else {
            self.started = true;
            info!(phases = self.timeline.len(), "workout session started");
            if let Some(phase) = self.current_phase() {
                events.push(Event::PhaseStarted {
                    index: self.current_index,
                    phase: phase.clone(),
                    at: Utc::now(),
                });
            }
        }

        if self.remaining_secs == 0 {
            self.advance(&mut events);
        }
        events
    }

    /// Freeze playback exactly where it is.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.stop_running();
        Some(Event::SessionPaused {
            index: self.current_index,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Pause when running, start otherwise.
    pub fn toggle(&mut self) -> Vec<Event> {
        if self.running {
            self.pause().into_iter().collect()
        } else {
            self.start()
        }
    }

    /// Return to the first phase, stopped. The timeline (including spliced
    /// breaks) is kept.
    pub fn reset(&mut self) -> Event {
        self.stop_running();
        self.current_index = 0;
        self.remaining_secs = self.timeline.first().map(|p| p.duration_secs).unwrap_or(0);
        self.finished = false;
        self.started = false;
        Event::SessionReset { at: Utc::now() }
    }

    /// Splice a manual break into the session and jump to it.
    ///
    /// With `after_current` the break goes right after the interrupted
    /// phase, whose remaining time is abandoned: once the break ends,
    /// playback continues with the phase that originally followed it.
    /// Without it the break goes in front of the interrupted phase, which
    /// then replays from its full duration.
    ///
    /// Playback is forced to running either way.
    ///
    /// # Errors
    /// [`PlaybackError::InvalidDuration`] for a non-positive duration; the
    /// engine is left untouched.
    pub fn insert_break(
        &mut self,
        after_current: bool,
        duration_secs: i64,
    ) -> Result<Event, PlaybackError> {
        if duration_secs <= 0 {
            return Err(PlaybackError::InvalidDuration(duration_secs));
        }
        let secs = duration_secs as u64;

        let phase = Phase::manual_break(self.current_phase(), secs);
        let index = if after_current && !self.timeline.is_empty() {
            self.current_index + 1
        } else {
            self.current_index
        };

        self.timeline.insert(index, phase.clone());
        self.current_index = index;
        self.remaining_secs = secs;
        self.running = true;
        self.finished = false;
        self.started = true;

        info!(index, secs, after_current, "manual break inserted");
        Ok(Event::PhaseStarted {
            index,
            phase,
            at: Utc::now(),
        })
    }

    /// Stop for good: the session is being discarded. Outstanding tokens die.
    pub fn dispose(&mut self) {
        self.stop_running();
    }

    /// Advance by one elapsed second.
    ///
    /// # Errors
    /// [`StaleTick`] when the token predates the latest stop or the engine
    /// is not running. State is untouched in that case.
    pub fn tick(&mut self, token: TickToken) -> Result<Vec<Event>, StaleTick> {
        if token.generation != self.generation || !self.running {
            debug!(
                token = token.generation,
                current = self.generation,
                "ignoring stale tick"
            );
            return Err(StaleTick {
                token: token.generation,
                current: self.generation,
            });
        }

        let mut events = Vec::new();
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
            let in_countdown = (1..=self.countdown_secs).contains(&self.remaining_secs);
            if in_countdown && self.current_phase().is_some_and(|p| p.kind.is_work()) {
                events.push(Event::CountdownTick {
                    index: self.current_index,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                });
            }
        }

        if self.remaining_secs == 0 {
            self.advance(&mut events);
        }
        Ok(events)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Move past the exhausted current phase, skipping zero-length phases,
    /// until a phase with time on it is current or the session ends.
    fn advance(&mut self, events: &mut Vec<Event>) {
        loop {
            if self.current_index + 1 >= self.timeline.len() {
                self.remaining_secs = 0;
                self.finished = true;
                self.stop_running();
                info!("workout session finished");
                events.push(Event::SessionFinished { at: Utc::now() });
                return;
            }

            self.current_index += 1;
            let Some(phase) = self.timeline.get(self.current_index) else {
                return;
            };
            self.remaining_secs = phase.duration_secs;
            debug!(index = self.current_index, kind = %phase.kind, "phase started");
            events.push(Event::PhaseStarted {
                index: self.current_index,
                phase: phase.clone(),
                at: Utc::now(),
            });

            if self.remaining_secs > 0 {
                return;
            }
        }
    }

    fn stop_running(&mut self) {
        self.running = false;
        self.generation = self.generation.wrapping_add(1);
    }
}
