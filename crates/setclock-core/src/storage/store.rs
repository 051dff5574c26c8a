use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::routine::Routine;

/// Which session timestamp to stamp on a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchMark {
    Started,
    Finished,
}

/// CRUD persistence for routines, keyed by id.
///
/// Stored documents are normalized on the way out; callers still run
/// [`Routine::validate`] (or build a timeline) before starting a session.
pub trait RoutineStore: Send {
    fn load(&self, id: &str) -> Result<Option<Routine>, StoreError>;

    /// Insert or replace by id. New routines go to the end of the listing.
    fn save(&self, routine: &Routine) -> Result<(), StoreError>;

    /// Deleting an unknown id is not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Every decodable routine, in insertion order.
    fn list_all(&self) -> Result<Vec<Routine>, StoreError>;

    /// Stamp `lastStarted`/`lastFinished`. Returns `false` if the routine is gone.
    fn touch(&self, id: &str, mark: TouchMark, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let Some(mut routine) = self.load(id)? else {
            return Ok(false);
        };
        match mark {
            TouchMark::Started => routine.last_started = Some(at),
            TouchMark::Finished => routine.last_finished = Some(at),
        }
        self.save(&routine)?;
        Ok(true)
    }
}
