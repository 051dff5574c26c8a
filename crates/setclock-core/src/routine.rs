//! Routine definitions and the construction boundary for loosely-typed input.
//!
//! Routines arrive as JSON documents written by hand or by older clients, so
//! numeric fields may be missing, `null`, strings or floats. Deserialization
//! always goes through [`Routine::from_value`], which normalizes every field
//! into plain integers:
//!
//! - `work`, `rest`, `extraBreak`, `roundRest`: missing or non-numeric -> 0,
//!   negative values clamp to 0, floats truncate, anything above
//!   [`MAX_FIELD_SECS`] clamps to it.
//! - `sets`: missing or non-numeric -> 1, capped at [`MAX_SETS`]. A numeric
//!   value below 1 is kept so that [`Routine::validate`] can reject it.
//!
//! The timeline builder relies on these guarantees and never re-checks types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RoutineError;

/// Upper bound for any single duration read from a document: one day.
pub const MAX_FIELD_SECS: u64 = 24 * 60 * 60;

/// Upper bound for `sets` read from a document.
pub const MAX_SETS: u32 = 999;

/// One named exercise block with repeated sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Value")]
pub struct Round {
    pub name: String,
    pub sets: u32,
    /// Work duration per set, seconds.
    pub work: u64,
    /// Rest after every set, seconds.
    pub rest: u64,
    /// Additional break between sets (never after the last one), seconds.
    pub extra_break: u64,
}

impl Round {
    pub fn new(name: impl Into<String>, sets: u32, work: u64, rest: u64) -> Self {
        Self {
            name: name.into(),
            sets,
            work,
            rest,
            extra_break: 0,
        }
    }

    pub fn with_extra_break(mut self, secs: u64) -> Self {
        self.extra_break = secs;
        self
    }

    /// Normalize a JSON object into a round.
    pub fn from_value(value: &Value) -> Result<Self, RoutineError> {
        let obj = value
            .as_object()
            .ok_or_else(|| RoutineError::Malformed(format!("round must be an object, got {value}")))?;

        Ok(Self {
            name: text_field(obj.get("name")).unwrap_or_default(),
            sets: sets_field(obj.get("sets")),
            work: seconds_field(obj.get("work")),
            rest: seconds_field(obj.get("rest")),
            extra_break: seconds_field(obj.get("extraBreak")),
        })
    }
}

impl TryFrom<Value> for Round {
    type Error = RoutineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

/// A user-authored workout definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Value")]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub rounds: Vec<Round>,
    /// Rest between consecutive rounds, seconds.
    pub round_rest: u64,
    pub auto_start: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_started: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_finished: Option<DateTime<Utc>>,
}

impl Routine {
    /// Create an empty routine with a fresh id. Add rounds before using it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            rounds: Vec::new(),
            round_rest: 0,
            auto_start: true,
            last_started: None,
            last_finished: None,
        }
    }

    pub fn with_round(mut self, round: Round) -> Self {
        self.rounds.push(round);
        self
    }

    pub fn with_round_rest(mut self, secs: u64) -> Self {
        self.round_rest = secs;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Parse and normalize a routine document.
    ///
    /// # Errors
    /// Returns [`RoutineError::Malformed`] if the text is not JSON or the
    /// document (or one of its rounds) is not an object.
    pub fn from_json(json: &str) -> Result<Self, RoutineError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| RoutineError::Malformed(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Normalize a routine document. Does not validate; see [`Routine::validate`].
    pub fn from_value(value: &Value) -> Result<Self, RoutineError> {
        let obj = value.as_object().ok_or_else(|| {
            RoutineError::Malformed(format!("routine must be an object, got {value}"))
        })?;

        let rounds = match obj.get("rounds") {
            Some(Value::Array(items)) => items
                .iter()
                .map(Round::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        Ok(Self {
            id: text_field(obj.get("id")).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: text_field(obj.get("name")).unwrap_or_default(),
            rounds,
            round_rest: seconds_field(obj.get("roundRest")),
            auto_start: obj
                .get("autoStart")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            last_started: timestamp_field(obj.get("lastStarted")),
            last_finished: timestamp_field(obj.get("lastFinished")),
        })
    }

    /// Reject routines that cannot produce a timeline.
    ///
    /// # Errors
    /// [`RoutineError::NoRounds`] for an empty routine,
    /// [`RoutineError::InvalidSets`] for the first round with fewer than one set.
    pub fn validate(&self) -> Result<(), RoutineError> {
        if self.rounds.is_empty() {
            return Err(RoutineError::NoRounds);
        }
        if let Some((round, r)) = self.rounds.iter().enumerate().find(|(_, r)| r.sets < 1) {
            return Err(RoutineError::InvalidSets {
                round,
                sets: r.sets,
            });
        }
        Ok(())
    }

    pub fn total_sets(&self) -> u64 {
        self.rounds.iter().map(|r| u64::from(r.sets)).sum()
    }
}

impl TryFrom<Value> for Routine {
    type Error = RoutineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

// ── Field normalization ──────────────────────────────────────────────

fn int_field(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn seconds_field(value: Option<&Value>) -> u64 {
    int_field(value)
        .map(|n| n.clamp(0, MAX_FIELD_SECS as i64) as u64)
        .unwrap_or(0)
}

fn sets_field(value: Option<&Value>) -> u32 {
    match int_field(value) {
        Some(n) => n.clamp(0, i64::from(MAX_SETS)) as u32,
        None => 1,
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn timestamp_field(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_numbers_default_to_zero_and_one_set() {
        let round = Round::from_value(&json!({ "name": "Squats" })).unwrap();
        assert_eq!(round, Round::new("Squats", 1, 0, 0));
    }

    #[test]
    fn numeric_strings_and_floats_are_accepted() {
        let round = Round::from_value(&json!({
            "name": "Row",
            "sets": "3",
            "work": 45.9,
            "rest": " 15 ",
            "extraBreak": "abc"
        }))
        .unwrap();
        assert_eq!(round.sets, 3);
        assert_eq!(round.work, 45);
        assert_eq!(round.rest, 15);
        assert_eq!(round.extra_break, 0);
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        let round = Round::from_value(&json!({ "sets": 2, "work": -10, "rest": -1 })).unwrap();
        assert_eq!(round.work, 0);
        assert_eq!(round.rest, 0);
    }

    #[test]
    fn oversized_numbers_clamp_to_limits() {
        let routine = Routine::from_json(
            r#"{ "rounds": [{ "sets": 3, "work": 9000000000000000000, "rest": 0 }], "roundRest": 1e300 }"#,
        )
        .unwrap();
        routine.validate().unwrap();
        assert_eq!(routine.rounds[0].work, MAX_FIELD_SECS);
        assert_eq!(routine.round_rest, MAX_FIELD_SECS);

        let round = Round::from_value(&json!({ "sets": 4_000_000_000u64 })).unwrap();
        assert_eq!(round.sets, MAX_SETS);
    }

    #[test]
    fn non_numeric_sets_become_one() {
        let round = Round::from_value(&json!({ "sets": "many" })).unwrap();
        assert_eq!(round.sets, 1);
        let round = Round::from_value(&json!({ "sets": null })).unwrap();
        assert_eq!(round.sets, 1);
    }

    #[test]
    fn zero_sets_survive_normalization_and_fail_validation() {
        let routine = Routine::from_value(&json!({
            "id": "r1",
            "name": "Broken",
            "rounds": [{ "name": "A", "sets": 2 }, { "name": "B", "sets": 0 }]
        }))
        .unwrap();
        assert_eq!(
            routine.validate(),
            Err(RoutineError::InvalidSets { round: 1, sets: 0 })
        );
    }

    #[test]
    fn routine_without_rounds_is_rejected() {
        let routine = Routine::from_json(r#"{ "id": "x", "name": "Empty" }"#).unwrap();
        assert_eq!(routine.validate(), Err(RoutineError::NoRounds));
    }

    #[test]
    fn non_object_round_is_malformed() {
        let err = Routine::from_json(r#"{ "rounds": [42] }"#).unwrap_err();
        assert!(matches!(err, RoutineError::Malformed(_)));
    }

    #[test]
    fn auto_start_defaults_to_true() {
        let routine = Routine::from_json(r#"{ "rounds": [{}] }"#).unwrap();
        assert!(routine.auto_start);
        assert!(!routine.id.is_empty());
        let routine = Routine::from_json(r#"{ "rounds": [{}], "autoStart": false }"#).unwrap();
        assert!(!routine.auto_start);
    }

    #[test]
    fn serializes_camel_case_and_reads_back() {
        let routine = Routine::new("Circuit")
            .with_round(Round::new("Push", 2, 30, 10).with_extra_break(5))
            .with_round_rest(60);
        let json = serde_json::to_value(&routine).unwrap();
        assert_eq!(json["roundRest"], 60);
        assert_eq!(json["rounds"][0]["extraBreak"], 5);
        assert!(json.get("lastStarted").is_none());

        let back: Routine = serde_json::from_value(json).unwrap();
        assert_eq!(back, routine);
    }

    #[test]
    fn timestamps_parse_from_iso_strings() {
        let routine = Routine::from_json(
            r#"{ "rounds": [{}], "lastStarted": "2024-03-01T10:00:00.000Z", "lastFinished": "garbage" }"#,
        )
        .unwrap();
        assert!(routine.last_started.is_some());
        assert!(routine.last_finished.is_none());
    }
}
