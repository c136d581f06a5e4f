//! Error types for bacheca.
//!
//! This module defines all error types used throughout the crate. Record
//! lookups that miss are not errors at the store level (they return `None`);
//! everything else that can fail is described here.

use std::path::PathBuf;
use thiserror::Error;

use crate::storage::Slot;

/// Authentication and authorization failures.
///
/// These are returned as structured values so the caller can show a
/// human-readable message without treating them as faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No user with the given email exists.
    #[error("user not found")]
    UserNotFound,

    /// The email exists but the password does not match.
    #[error("incorrect password")]
    IncorrectPassword,

    /// The operation requires a logged-in session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The session lacks the role or permission the operation requires.
    #[error("not authorized")]
    NotAuthorized,

    /// An administrator tried to delete their own account.
    #[error("cannot delete your own account")]
    SelfDeletion,

    /// A user with this email already exists.
    #[error("a user with email {email} already exists")]
    DuplicateEmail {
        /// The conflicting email.
        email: String,
    },

    /// The user source cannot store account changes.
    #[error("{source_name} user accounts are read-only; set users.source = \"database\" to manage accounts")]
    ReadOnlyUsers {
        /// Name of the read-only source.
        source_name: &'static str,
    },
}

/// The main error type for bacheca operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A required field is missing or empty.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// A record with the given id does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of record ("document", "news item", "user").
        kind: &'static str,
        /// The id that was looked up.
        id: String,
    },

    // === Auth Errors ===
    /// Authentication or authorization failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Hashing or parsing a password hash failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    // === Storage Errors ===
    /// Reading a storage slot failed.
    #[error("failed to read slot '{slot}': {message}")]
    SlotRead {
        /// The slot being read.
        slot: Slot,
        /// Description of what went wrong.
        message: String,
    },

    /// Writing a storage slot failed.
    #[error("failed to write slot '{slot}': {message}")]
    SlotWrite {
        /// The slot being written.
        slot: Slot,
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for bacheca operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for a field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a slot read error.
    #[must_use]
    pub fn slot_read(slot: Slot, message: impl Into<String>) -> Self {
        Self::SlotRead {
            slot,
            message: message.into(),
        }
    }

    /// Create a slot write error.
    #[must_use]
    pub fn slot_write(slot: Slot, message: impl Into<String>) -> Self {
        Self::SlotWrite {
            slot,
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error is an authentication or authorization failure.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// The authentication failure, if this is one.
    #[must_use]
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(err) => Some(err),
            _ => None,
        }
    }

    /// Check if this error came from durable storage.
    ///
    /// Storage failures leave in-memory state untouched, so the same call
    /// can be retried.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::SlotRead { .. }
                | Self::SlotWrite { .. }
                | Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
                | Self::Io(_)
                | Self::DirectoryCreate { .. }
                | Self::Json(_)
        )
    }
}
