//! SQLite-based routine storage.
//!
//! Routines are stored as their JSON documents, one row per id, so older or
//! hand-edited documents survive until they are read back through the
//! normalizing [`Routine::from_json`] boundary.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use super::data_dir;
use super::store::RoutineStore;
use crate::error::StoreError;
use crate::routine::Routine;

/// SQLite database for routine storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/setclock.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join("setclock.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS routines (
                id          TEXT PRIMARY KEY,
                position    INTEGER NOT NULL,
                body        TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_routines_position ON routines(position);",
        )?;
        Ok(())
    }

    /// Raw stored document for an id.
    pub fn body(&self, id: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT body FROM routines WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()
    }

    /// Store a raw document under `id` without normalizing it.
    pub fn save_body(&self, id: &str, body: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO routines (id, position, body, updated_at)
             VALUES (?1, (SELECT COALESCE(MAX(position), 0) + 1 FROM routines), ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![id, body, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<i64, rusqlite::Error> {
        self.conn
            .query_row("SELECT COUNT(*) FROM routines", [], |row| row.get(0))
    }
}

fn decode(id: &str, body: &str) -> Result<Routine, StoreError> {
    Routine::from_json(body).map_err(|source| StoreError::Invalid {
        id: id.to_string(),
        source,
    })
}

impl RoutineStore for Database {
    fn load(&self, id: &str) -> Result<Option<Routine>, StoreError> {
        match self.body(id)? {
            Some(body) => decode(id, &body).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, routine: &Routine) -> Result<(), StoreError> {
        let body = serde_json::to_string(routine)?;
        self.save_body(&routine.id, &body)?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM routines WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Routine>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM routines ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut routines = Vec::new();
        for row in rows {
            let (id, body) = row?;
            match decode(&id, &body) {
                Ok(routine) => routines.push(routine),
                Err(e) => warn!(%id, error = %e, "skipping undecodable routine"),
            }
        }
        Ok(routines)
    }
}
