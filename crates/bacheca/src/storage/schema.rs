//! `SQLite` schema definitions for bacheca.
//!
//! Table definitions. The order in which they are applied lives in
//! [`super::migrations`].

/// SQL statement to create the slots table.
pub const CREATE_SLOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS slots (
    name TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the users table.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    department TEXT NOT NULL DEFAULT '',
    badge_number TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
)
";

/// SQL statement to enforce one account per email.
pub const CREATE_USERS_EMAIL_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_table_structure() {
        assert!(CREATE_SLOTS_TABLE.contains("name TEXT PRIMARY KEY"));
        assert!(CREATE_SLOTS_TABLE.contains("payload TEXT NOT NULL"));
    }

    #[test]
    fn test_users_table_contains_required_columns() {
        for column in [
            "id TEXT PRIMARY KEY",
            "full_name TEXT NOT NULL",
            "email TEXT NOT NULL",
            "password_hash TEXT NOT NULL",
            "role TEXT NOT NULL",
        ] {
            assert!(CREATE_USERS_TABLE.contains(column), "missing {column}");
        }
        assert!(CREATE_USERS_EMAIL_INDEX.contains("UNIQUE"));
    }
}
