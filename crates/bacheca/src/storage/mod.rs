//! Durable slot storage for bacheca.
//!
//! Every persisted collection lives in a named slot holding its whole
//! serialized text. Backends implement [`SlotStorage`] and are injected into
//! the stores that use them:
//!
//! - [`FileSlots`]: one JSON file per slot in a data directory
//! - [`SqliteSlots`]: a key-value table in a `SQLite` database
//! - [`MemorySlots`]: process memory, for tests and dry runs

mod files;
mod memory;
pub mod migrations;
pub mod schema;
mod sqlite;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Config, StorageBackend};
use crate::error::{Error, Result};

pub use files::FileSlots;
pub use memory::MemorySlots;
pub use sqlite::SqliteSlots;

/// A named storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// The serialized document collection.
    Documents,
    /// The serialized news collection.
    News,
    /// The serialized active session.
    Session,
}

impl Slot {
    /// The slot's storage key.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::News => "news",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A durable key-value backend addressed by [`Slot`].
///
/// Writes replace the whole slot payload. A backend must never leave a slot
/// half-written: either the new payload is stored or the old one remains.
pub trait SlotStorage: Send + Sync + fmt::Debug {
    /// Read a slot. Returns `None` if the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, slot: Slot) -> Result<Option<String>>;

    /// Replace the contents of a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload could not be stored.
    fn write(&self, slot: Slot, payload: &str) -> Result<()>;

    /// Remove a slot. Removing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be modified.
    fn remove(&self, slot: Slot) -> Result<()>;

    /// Short human-readable description of where data lives.
    fn location(&self) -> String;
}

/// Open the slot backend selected by the configuration.
///
/// # Errors
///
/// Returns an error if the backing directory or database cannot be opened.
pub fn open(config: &Config) -> Result<Arc<dyn SlotStorage>> {
    let storage: Arc<dyn SlotStorage> = match config.storage.backend {
        StorageBackend::Files => Arc::new(FileSlots::open(config.data_dir())?),
        StorageBackend::Sqlite => Arc::new(SqliteSlots::open(config.database_path())?),
        StorageBackend::Memory => Arc::new(MemorySlots::new()),
    };
    info!("Slot storage ready at {}", storage.location());
    Ok(storage)
}

/// Create the parent directory of `path` if it does not exist.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Open a `SQLite` connection with the schema initialized.
///
/// Shared by the slot backend and the user table.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub(crate) fn open_database(path: &Path) -> Result<Connection> {
    ensure_parent(path)?;

    debug!("Opening database at {}", path.display());
    let conn = Connection::open(path).map_err(|source| Error::DatabaseOpen {
        path: path.to_path_buf(),
        source,
    })?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    migrations::initialize_schema(&conn)?;

    Ok(conn)
}
