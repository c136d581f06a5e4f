//! `SQLite` slot backend.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{migrations, open_database, Slot, SlotStorage};
use crate::error::{Error, Result};

/// Stores slots as rows of the `slots` table.
///
/// Each write is a single upsert statement, so a slot is always either the
/// old or the new payload.
#[derive(Debug)]
pub struct SqliteSlots {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqliteSlots {
    /// Open or create a slot database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_database(&path)?;

        info!("Slot database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory slot database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SlotStorage for SqliteSlots {
    fn read(&self, slot: Slot) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.query_row(
            "SELECT payload FROM slots WHERE name = ?1",
            [slot.name()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| Error::slot_read(slot, err.to_string()))
    }

    fn write(&self, slot: Slot, payload: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            r"
            INSERT INTO slots (name, payload, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET payload = excluded.payload,
                                            updated_at = excluded.updated_at
            ",
            params![slot.name(), payload, Utc::now().to_rfc3339()],
        )
        .map_err(|err| Error::slot_write(slot, err.to_string()))?;

        debug!("Stored {} bytes in slot {}", payload.len(), slot);
        Ok(())
    }

    fn remove(&self, slot: Slot) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute("DELETE FROM slots WHERE name = ?1", [slot.name()])
            .map_err(|err| Error::slot_write(slot, err.to_string()))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
