//! Session orchestration: load a routine, build its engine, hand it to the
//! real-time runner.

use tracing::info;

use crate::error::{CoreError, PlaybackError, RoutineError};
use crate::notify::NotificationSink;
use crate::routine::Routine;
use crate::storage::{Config, RoutineStore};
use crate::timer::{PlaybackEngine, SessionHandle, SessionOptions, WorkoutSession};

/// A routine loaded into a session, not yet running.
#[derive(Debug, Clone)]
pub struct Workout {
    pub routine: Routine,
    pub engine: PlaybackEngine,
}

impl Workout {
    /// Load a routine by id and prepare its engine.
    ///
    /// # Errors
    /// [`RoutineError::NotFound`] for an unknown id, the routine's validation
    /// error if it cannot produce a timeline, or the store's error.
    pub fn load<S>(store: &S, id: &str, config: &Config) -> Result<Self, CoreError>
    where
        S: RoutineStore + ?Sized,
    {
        let routine = store
            .load(id)?
            .ok_or_else(|| RoutineError::NotFound(id.to_string()))?;
        Ok(Self::from_routine(routine, config)?)
    }

    /// # Errors
    /// The routine's validation error.
    pub fn from_routine(routine: Routine, config: &Config) -> Result<Self, RoutineError> {
        let engine = PlaybackEngine::from_routine(&routine)?
            .with_countdown_secs(config.sound.countdown_cue_secs);
        Ok(Self { routine, engine })
    }

    /// Spawn the session and, when the routine asks for it, start playback.
    ///
    /// # Errors
    /// [`PlaybackError::SessionClosed`] if the session task died before
    /// accepting the start command.
    pub async fn begin(
        self,
        sink: Box<dyn NotificationSink>,
        options: SessionOptions,
    ) -> Result<SessionHandle, PlaybackError> {
        info!(
            routine = %self.routine.id,
            phases = self.engine.timeline().len(),
            auto_start = self.routine.auto_start,
            "beginning workout"
        );
        let handle = WorkoutSession::spawn(self.engine, sink, options);
        if self.routine.auto_start {
            handle.start().await?;
        }
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::Round;
    use crate::storage::MemoryStore;

    #[test]
    fn load_missing_routine() {
        let store = MemoryStore::new();
        let err = Workout::load(&store, "nope", &Config::default()).unwrap_err();
        assert!(matches!(err, CoreError::Routine(RoutineError::NotFound(id)) if id == "nope"));
    }

    #[test]
    fn load_rejects_invalid_routine() {
        let routine = Routine::new("Empty");
        let id = routine.id.clone();
        let store = MemoryStore::with_routines([routine]);
        let err = Workout::load(&store, &id, &Config::default()).unwrap_err();
        assert!(matches!(err, CoreError::Routine(RoutineError::NoRounds)));
    }

    #[test]
    fn load_applies_countdown_config() {
        let routine = Routine::new("R").with_round(Round::new("A", 1, 10, 5));
        let id = routine.id.clone();
        let store = MemoryStore::with_routines([routine]);
        let mut config = Config::default();
        config.sound.countdown_cue_secs = 0;

        let mut workout = Workout::load(&store, &id, &config).unwrap();
        workout.engine.start();
        let token = workout.engine.tick_token();
        let events = workout.engine.tick(token).unwrap();
        assert!(events.is_empty());
    }
}
