use std::sync::Mutex;

use super::store::RoutineStore;
use crate::error::StoreError;
use crate::routine::Routine;

/// Routine store kept in process memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    routines: Mutex<Vec<Routine>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routines(routines: impl IntoIterator<Item = Routine>) -> Self {
        Self {
            routines: Mutex::new(routines.into_iter().collect()),
        }
    }
}

impl RoutineStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Option<Routine>, StoreError> {
        let routines = self.routines.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(routines.iter().find(|r| r.id == id).cloned())
    }

    fn save(&self, routine: &Routine) -> Result<(), StoreError> {
        let mut routines = self.routines.lock().map_err(|_| StoreError::Poisoned)?;
        match routines.iter_mut().find(|r| r.id == routine.id) {
            Some(existing) => *existing = routine.clone(),
            None => routines.push(routine.clone()),
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut routines = self.routines.lock().map_err(|_| StoreError::Poisoned)?;
        routines.retain(|r| r.id != id);
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Routine>, StoreError> {
        let routines = self.routines.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(routines.clone())
    }
}
