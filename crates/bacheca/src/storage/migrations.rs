//! Schema versioning for the bacheca database.
//!
//! The database records its schema version in the `metadata` table. Opening
//! a database applies every entry of [`MIGRATIONS`] newer than that version,
//! each in its own transaction.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{Error, Result};

use super::schema::{
    CREATE_METADATA_TABLE, CREATE_SLOTS_TABLE, CREATE_USERS_EMAIL_INDEX, CREATE_USERS_TABLE,
};

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// One forward step of the schema.
#[derive(Debug)]
pub struct Migration {
    /// Version the database reaches once this step has run.
    pub version: i32,
    /// Short description for the log.
    pub description: &'static str,
    /// Statements executed in order.
    pub statements: &'static [&'static str],
}

/// Every migration, oldest first. Versions are contiguous from 1.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "slot table",
        statements: &[CREATE_SLOTS_TABLE],
    },
    Migration {
        version: 2,
        description: "user table",
        statements: &[CREATE_USERS_TABLE, CREATE_USERS_EMAIL_INDEX],
    },
];

/// The schema version a fully migrated database has.
#[must_use]
pub fn current_version() -> i32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Bring the database schema up to [`current_version`].
///
/// # Errors
///
/// Returns an error if the stored version is unreadable, newer than this
/// build knows about, or a migration statement fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let stored = schema_version(conn)?;
    if stored > current_version() {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {stored} is newer than supported version {}",
                current_version()
            ),
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > stored) {
        apply(conn, migration)?;
    }
    Ok(())
}

/// The stored schema version; 0 for a fresh database.
///
/// # Errors
///
/// Returns an error if the metadata table cannot be read or holds a
/// non-numeric version.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for statement in migration.statements {
        tx.execute(statement, []).map_err(|e| Error::DatabaseMigration {
            message: format!(
                "migration {} ({}) failed: {e}",
                migration.version, migration.description
            ),
        })?;
    }
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, migration.version.to_string()),
    )?;
    tx.commit()?;

    info!(
        "Database schema migrated to version {} ({})",
        migration.version, migration.description
    );
    Ok(())
}
