use serde::{Deserialize, Serialize};

use super::engine::PlaybackEngine;
use super::timeline::{Phase, PhaseKind};

/// Everything a display needs, derived from playback state alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub index: usize,
    pub total_phases: usize,
    pub kind: Option<PhaseKind>,
    pub label: String,
    pub round_index: Option<usize>,
    pub set_number: Option<u32>,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub session_remaining_secs: u64,
    pub percent_complete: u8,
    pub running: bool,
    pub finished: bool,
    pub upcoming: Vec<Phase>,
}

impl PlaybackSnapshot {
    pub(crate) fn capture(engine: &PlaybackEngine, lookahead: usize) -> Self {
        let phase = engine.current_phase();
        Self {
            index: engine.current_index(),
            total_phases: engine.timeline().len(),
            kind: phase.map(|p| p.kind),
            label: phase.map(|p| p.label.clone()).unwrap_or_default(),
            round_index: phase.and_then(|p| p.round_index),
            set_number: phase.and_then(|p| p.set_number),
            duration_secs: phase.map(|p| p.duration_secs).unwrap_or(0),
            remaining_secs: engine.remaining_secs(),
            session_remaining_secs: engine.session_remaining_secs(),
            percent_complete: engine.percent_complete(),
            running: engine.is_running(),
            finished: engine.is_finished(),
            upcoming: engine.upcoming(lookahead).to_vec(),
        }
    }

    /// One-line status, e.g. `Squats [work] 0:25 / 0:30 · round 1 set 2 · 40%`.
    pub fn status_line(&self) -> String {
        if self.finished {
            return "finished".into();
        }
        let kind = self.kind.map(PhaseKind::as_str).unwrap_or("-");
        let mut line = format!(
            "{} [{}] {} / {}",
            self.label,
            kind,
            format_clock(self.remaining_secs),
            format_clock(self.duration_secs)
        );
        if let Some(round) = self.round_index {
            line.push_str(&format!(" · round {}", round + 1));
        }
        if let Some(set) = self.set_number {
            line.push_str(&format!(" set {set}"));
        }
        line.push_str(&format!(" · {}%", self.percent_complete));
        if !self.running {
            line.push_str(" (paused)");
        }
        line
    }
}

/// `M:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::{Round, Routine};

    #[test]
    fn snapshot_of_fresh_engine() {
        let routine = Routine::new("R").with_round(Round::new("Squats", 2, 30, 10));
        let engine = PlaybackEngine::from_routine(&routine).unwrap();
        let snap = engine.snapshot(9);

        assert_eq!(snap.index, 0);
        assert_eq!(snap.total_phases, 4);
        assert_eq!(snap.kind, Some(PhaseKind::Work));
        assert_eq!(snap.label, "Squats");
        assert_eq!(snap.round_index, Some(0));
        assert_eq!(snap.set_number, Some(1));
        assert_eq!(snap.duration_secs, 30);
        assert_eq!(snap.remaining_secs, 30);
        assert_eq!(snap.session_remaining_secs, 80);
        assert_eq!(snap.percent_complete, 0);
        assert!(!snap.running);
        assert_eq!(snap.upcoming.len(), 3);
    }

    #[test]
    fn status_line_mentions_context() {
        let routine = Routine::new("R").with_round(Round::new("Squats", 2, 75, 10));
        let engine = PlaybackEngine::from_routine(&routine).unwrap();
        let line = engine.snapshot(0).status_line();
        assert!(line.starts_with("Squats [work] 1:15 / 1:15"));
        assert!(line.contains("round 1 set 1"));
        assert!(line.ends_with("(paused)"));
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(125), "2:05");
    }
}
