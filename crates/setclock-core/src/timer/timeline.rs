use serde::{Deserialize, Serialize};

use crate::error::RoutineError;
use crate::routine::Routine;

pub const REST_LABEL: &str = "Break";
pub const EXTRA_BREAK_LABEL: &str = "Extra Break";
pub const ROUND_REST_LABEL: &str = "Round Rest";
pub const MANUAL_BREAK_LABEL: &str = "Manual Break";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Work,
    Rest,
    ExtraBreak,
    RoundRest,
    ManualBreak,
}

impl PhaseKind {
    pub fn is_work(self) -> bool {
        self == PhaseKind::Work
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Work => "work",
            PhaseKind::Rest => "rest",
            PhaseKind::ExtraBreak => "extra_break",
            PhaseKind::RoundRest => "round_rest",
            PhaseKind::ManualBreak => "manual_break",
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timed segment of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    /// Zero-based round the phase belongs to.
    pub round_index: Option<usize>,
    /// One-based set number; `None` for round rests.
    pub set_number: Option<u32>,
    pub label: String,
    pub duration_secs: u64,
}

impl Phase {
    /// A manual break that keeps the display context of the phase it interrupts.
    pub fn manual_break(interrupted: Option<&Phase>, duration_secs: u64) -> Self {
        Self {
            kind: PhaseKind::ManualBreak,
            round_index: interrupted.and_then(|p| p.round_index),
            set_number: interrupted.and_then(|p| p.set_number),
            label: MANUAL_BREAK_LABEL.into(),
            duration_secs,
        }
    }
}

/// The ordered phases of one workout session.
///
/// Built once from a [`Routine`]; the playback engine may splice manual
/// breaks into its own copy but nothing else changes the order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timeline {
    phases: Vec<Phase>,
}

impl Timeline {
    /// Expand a routine into its phase sequence.
    ///
    /// Per round, each set emits `Work` then `Rest`, plus an `ExtraBreak`
    /// between sets when the round has one. A `RoundRest` separates
    /// consecutive rounds.
    ///
    /// # Errors
    /// Returns the validation error of an invalid routine; no timeline is
    /// produced for it.
    pub fn build(routine: &Routine) -> Result<Self, RoutineError> {
        routine.validate()?;

        let mut phases = Vec::new();
        let last_round = routine.rounds.len() - 1;

        for (ri, round) in routine.rounds.iter().enumerate() {
            for set in 1..=round.sets {
                phases.push(Phase {
                    kind: PhaseKind::Work,
                    round_index: Some(ri),
                    set_number: Some(set),
                    label: round.name.clone(),
                    duration_secs: round.work,
                });
                phases.push(Phase {
                    kind: PhaseKind::Rest,
                    round_index: Some(ri),
                    set_number: Some(set),
                    label: REST_LABEL.into(),
                    duration_secs: round.rest,
                });
                if set < round.sets && round.extra_break > 0 {
                    phases.push(Phase {
                        kind: PhaseKind::ExtraBreak,
                        round_index: Some(ri),
                        set_number: Some(set),
                        label: EXTRA_BREAK_LABEL.into(),
                        duration_secs: round.extra_break,
                    });
                }
            }

            if ri < last_round {
                phases.push(Phase {
                    kind: PhaseKind::RoundRest,
                    round_index: Some(ri),
                    set_number: None,
                    label: ROUND_REST_LABEL.into(),
                    duration_secs: routine.round_rest,
                });
            }
        }

        Ok(Self { phases })
    }

    /// Wrap an explicit phase list.
    pub fn from_phases(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn first(&self) -> Option<&Phase> {
        self.phases.first()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Sum of all phase durations, saturating at `u64::MAX`.
    pub fn total_seconds(&self) -> u64 {
        saturating_total(&self.phases)
    }

    /// Seconds planned strictly after `index`.
    pub fn seconds_after(&self, index: usize) -> u64 {
        saturating_total(self.phases.get(index.saturating_add(1)..).unwrap_or_default())
    }

    pub fn count(&self, kind: PhaseKind) -> usize {
        self.phases.iter().filter(|p| p.kind == kind).count()
    }

    pub(crate) fn insert(&mut self, index: usize, phase: Phase) {
        self.phases.insert(index, phase);
    }
}

fn saturating_total(phases: &[Phase]) -> u64 {
    phases
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.duration_secs))
}

/// Planned length of a routine in seconds, computed from the routine itself.
///
/// Always equals `Timeline::build(routine)?.total_seconds()` for a valid
/// routine. Both saturate at `u64::MAX`.
pub fn estimate_total_seconds(routine: &Routine) -> u64 {
    let rounds = routine.rounds.len();
    let mut total = 0u64;

    for (ri, round) in routine.rounds.iter().enumerate() {
        let sets = u64::from(round.sets);
        let per_set = round.work.saturating_add(round.rest);
        total = total.saturating_add(sets.saturating_mul(per_set));
        if round.extra_break > 0 {
            let breaks = sets.saturating_sub(1).saturating_mul(round.extra_break);
            total = total.saturating_add(breaks);
        }
        if ri + 1 < rounds {
            total = total.saturating_add(routine.round_rest);
        }
    }

    total
}

/// `"N min"`, rounding up to whole minutes.
pub fn format_minutes(seconds: u64) -> String {
    if seconds == 0 {
        return "0 min".into();
    }
    format!("{} min", seconds.div_ceil(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::Round;

    fn kinds_and_durations(timeline: &Timeline) -> Vec<(PhaseKind, u64)> {
        timeline
            .phases()
            .iter()
            .map(|p| (p.kind, p.duration_secs))
            .collect()
    }

    #[test]
    fn single_round_with_extra_break() {
        let routine = Routine::new("Legs")
            .with_round(Round::new("Squats", 2, 30, 10).with_extra_break(5));
        let timeline = Timeline::build(&routine).unwrap();

        assert_eq!(
            kinds_and_durations(&timeline),
            vec![
                (PhaseKind::Work, 30),
                (PhaseKind::Rest, 10),
                (PhaseKind::ExtraBreak, 5),
                (PhaseKind::Work, 30),
                (PhaseKind::Rest, 10),
            ]
        );
        assert_eq!(timeline.total_seconds(), 85);
        assert_eq!(estimate_total_seconds(&routine), 85);
    }

    #[test]
    fn two_rounds_separated_by_round_rest() {
        let routine = Routine::new("Upper")
            .with_round(Round::new("Push", 1, 20, 10))
            .with_round(Round::new("Pull", 1, 20, 10))
            .with_round_rest(15);
        let timeline = Timeline::build(&routine).unwrap();

        assert_eq!(
            kinds_and_durations(&timeline),
            vec![
                (PhaseKind::Work, 20),
                (PhaseKind::Rest, 10),
                (PhaseKind::RoundRest, 15),
                (PhaseKind::Work, 20),
                (PhaseKind::Rest, 10),
            ]
        );
        assert_eq!(timeline.total_seconds(), 75);
        assert_eq!(estimate_total_seconds(&routine), 75);
    }

    #[test]
    fn labels_and_context() {
        let routine = Routine::new("Upper")
            .with_round(Round::new("Push", 2, 20, 10).with_extra_break(3))
            .with_round(Round::new("Pull", 1, 20, 10));
        let timeline = Timeline::build(&routine).unwrap();
        let phases = timeline.phases();

        assert_eq!(phases[0].label, "Push");
        assert_eq!(phases[0].set_number, Some(1));
        assert_eq!(phases[1].label, REST_LABEL);
        assert_eq!(phases[2].label, EXTRA_BREAK_LABEL);
        assert_eq!(phases[3].set_number, Some(2));

        let round_rest = &phases[5];
        assert_eq!(round_rest.kind, PhaseKind::RoundRest);
        assert_eq!(round_rest.round_index, Some(0));
        assert_eq!(round_rest.set_number, None);
        assert_eq!(round_rest.duration_secs, 0);

        assert_eq!(phases[6].label, "Pull");
        assert_eq!(phases[6].round_index, Some(1));
    }

    #[test]
    fn invalid_routines_do_not_build() {
        assert_eq!(
            Timeline::build(&Routine::new("Empty")),
            Err(RoutineError::NoRounds)
        );
        let routine = Routine::new("Zero").with_round(Round::new("A", 0, 10, 10));
        assert!(matches!(
            Timeline::build(&routine),
            Err(RoutineError::InvalidSets { round: 0, sets: 0 })
        ));
    }

    #[test]
    fn seconds_after_excludes_the_given_index() {
        let routine = Routine::new("R").with_round(Round::new("A", 2, 30, 10));
        let timeline = Timeline::build(&routine).unwrap();
        assert_eq!(timeline.seconds_after(0), 50);
        assert_eq!(timeline.seconds_after(3), 0);
    }

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let routine = Routine::new("Endless")
            .with_round(Round::new("Hold", 3, u64::MAX / 2, 1).with_extra_break(u64::MAX))
            .with_round(Round::new("Again", 1, u64::MAX, 0))
            .with_round_rest(u64::MAX);
        let timeline = Timeline::build(&routine).unwrap();

        assert_eq!(timeline.total_seconds(), u64::MAX);
        assert_eq!(estimate_total_seconds(&routine), u64::MAX);
        assert_eq!(timeline.seconds_after(0), u64::MAX);
        assert_eq!(timeline.seconds_after(usize::MAX), 0);
    }

    #[test]
    fn minutes_round_up() {
        assert_eq!(format_minutes(0), "0 min");
        assert_eq!(format_minutes(1), "1 min");
        assert_eq!(format_minutes(60), "1 min");
        assert_eq!(format_minutes(85), "2 min");
    }
}
