//! User accounts and the sources they are looked up in.
//!
//! Two backends implement [`UserSource`]: [`SqliteUsers`] keeps accounts in
//! the `users` table of a database, [`FixedUsers`] keeps a fixed list in
//! memory. A [`UserDirectory`] puts one in front of the other so the fixed
//! list answers lookups whenever the database cannot.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, types::Type, Connection, ErrorCode, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::password::hash_password;
use super::policy::Role;
use crate::config::{Config, UserSourceKind};
use crate::error::{AuthError, Error, Result};
use crate::storage::open_database;

/// A user account as shown to callers. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Account id.
    pub id: String,
    /// Display name.
    #[serde(alias = "name")]
    pub full_name: String,
    /// Login email, stored lowercase.
    pub email: String,
    /// Role.
    pub role: Role,
    /// Department or office.
    #[serde(default)]
    pub department: String,
    /// Badge number.
    #[serde(default)]
    pub badge_number: String,
    /// When the account was created.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// A user account together with its password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredUser {
    /// The public part of the account.
    pub profile: UserProfile,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredUser")
            .field("profile", &self.profile)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Normalize an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A place user accounts are kept.
#[async_trait]
pub trait UserSource: Send + Sync + fmt::Debug {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Look an account up by (normalized) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>>;

    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<UserProfile>>;

    /// Store a new account.
    ///
    /// Fails with [`AuthError::DuplicateEmail`] if the email is taken.
    async fn insert(&self, user: StoredUser) -> Result<UserProfile>;

    /// Change an account's role. Returns `false` if the id is unknown.
    async fn set_role(&self, id: &str, role: Role) -> Result<bool>;

    /// Delete an account. Returns `false` if the id is unknown.
    async fn delete(&self, id: &str) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// SQLite

const USER_COLUMNS: &str =
    "id, full_name, email, password_hash, role, department, badge_number, created_at";

/// Accounts stored in the `users` table.
#[derive(Debug)]
pub struct SqliteUsers {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteUsers {
    /// Open or create the user database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_database(&path)?;
        info!("User database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory user database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        crate::storage::migrations::initialize_schema(&conn)?;
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

    fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_sync(&self, email: &str) -> Result<Option<StoredUser>> {
        let conn = self.connection();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                [email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn list_sync(&self) -> Result<Vec<UserProfile>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .map(|user| user.map(|u| u.profile))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    fn insert_sync(&self, user: &StoredUser) -> Result<()> {
        let conn = self.connection();
        let p = &user.profile;
        let result = conn.execute(
            &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                p.id,
                p.full_name,
                p.email,
                user.password_hash,
                p.role.as_str(),
                p.department,
                p.badge_number,
                p.created_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(AuthError::DuplicateEmail {
                    email: p.email.clone(),
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_role_sync(&self, id: &str, role: Role) -> Result<bool> {
        let conn = self.connection();
        let changed = conn.execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    fn delete_sync(&self, id: &str) -> Result<bool> {
        let conn = self.connection();
        let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<StoredUser> {
    let role: String = row.get(4)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    let created_at: String = row.get(7)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(StoredUser {
        profile: UserProfile {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            role,
            department: row.get(5)?,
            badge_number: row.get(6)?,
            created_at,
        },
        password_hash: row.get(3)?,
    })
}

#[async_trait]
impl UserSource for SqliteUsers {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>> {
        self.find_sync(email)
    }

    async fn list(&self) -> Result<Vec<UserProfile>> {
        self.list_sync()
    }

    async fn insert(&self, user: StoredUser) -> Result<UserProfile> {
        self.insert_sync(&user)?;
        debug!("Inserted user {} into {}", user.profile.id, self.path.display());
        Ok(user.profile)
    }

    async fn set_role(&self, id: &str, role: Role) -> Result<bool> {
        self.set_role_sync(id, role)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.delete_sync(id)
    }
}

// ---------------------------------------------------------------------------
// Fixed list

/// A fixed list of accounts held in memory.
///
/// The list is read-only: it lives only as long as the process, so
/// account changes are refused rather than silently dropped on exit.
#[derive(Debug, Default)]
pub struct FixedUsers {
    users: Vec<StoredUser>,
}

impl FixedUsers {
    /// Create a list from the given accounts.
    #[must_use]
    pub fn new(users: Vec<StoredUser>) -> Self {
        Self { users }
    }

    /// The three demo accounts, with freshly hashed passwords.
    ///
    /// # Errors
    ///
    /// Returns `PasswordHash` if hashing fails.
    pub fn demo() -> Result<Self> {
        let accounts = [
            ("1", "Amministratore Sistema", "admin@polizialocale.it", "admin123", Role::Admin, "Comando Centrale", "ADM001", 1),
            ("2", "Utente Consultatore", "consultatore@polizialocale.it", "user123", Role::Consultatore, "Pattuglia", "PTG002", 2),
            ("3", "Lucia Verdi", "lucia.verdi@polizialocale.it", "user123", Role::Consultatore, "Ufficio Verbali", "UFF003", 3),
        ];

        let mut users = Vec::with_capacity(accounts.len());
        for (id, full_name, email, password, role, department, badge, day) in accounts {
            users.push(StoredUser {
                profile: UserProfile {
                    id: id.to_string(),
                    full_name: full_name.to_string(),
                    email: email.to_string(),
                    role,
                    department: department.to_string(),
                    badge_number: badge.to_string(),
                    created_at: Utc
                        .with_ymd_and_hms(2023, 1, day, 10, 0, 0)
                        .single()
                        .unwrap_or_default(),
                },
                password_hash: hash_password(password)?,
            });
        }
        Ok(Self::new(users))
    }

    fn read_only(&self) -> Error {
        AuthError::ReadOnlyUsers {
            source_name: self.name(),
        }
        .into()
    }
}

#[async_trait]
impl UserSource for FixedUsers {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>> {
        Ok(self.users.iter().find(|u| u.profile.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<UserProfile>> {
        let mut users: Vec<UserProfile> = self.users.iter().map(|u| u.profile.clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn insert(&self, _user: StoredUser) -> Result<UserProfile> {
        Err(self.read_only())
    }

    async fn set_role(&self, _id: &str, _role: Role) -> Result<bool> {
        Err(self.read_only())
    }

    async fn delete(&self, _id: &str) -> Result<bool> {
        Err(self.read_only())
    }
}

// ---------------------------------------------------------------------------
// Directory

/// The user source the auth gate talks to.
///
/// Lookups and listings go to the primary source; when it fails (or, for
/// lookups, has no such email) the fallback is consulted. Mutations only
/// ever reach the primary source.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    primary: Arc<dyn UserSource>,
    fallback: Option<Arc<dyn UserSource>>,
}

impl UserDirectory {
    /// A directory backed by a single source.
    #[must_use]
    pub fn new(primary: Arc<dyn UserSource>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// A directory that degrades to `fallback` when `primary` fails.
    #[must_use]
    pub fn with_fallback(primary: Arc<dyn UserSource>, fallback: Arc<dyn UserSource>) -> Self {
        Self {
            primary,
            fallback: Some(fallback),
        }
    }

    /// Build the directory selected by the configuration.
    ///
    /// If the database cannot be opened the fixed list is used on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the demo accounts cannot be prepared.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fixed: Arc<dyn UserSource> = if config.users.demo_accounts {
            Arc::new(FixedUsers::demo()?)
        } else {
            Arc::new(FixedUsers::default())
        };

        match config.users.source {
            UserSourceKind::Fixed => Ok(Self::new(fixed)),
            UserSourceKind::Database => {
                let path = config.users_database_path();
                match SqliteUsers::open(&path) {
                    Ok(db) if config.users.demo_accounts => {
                        Ok(Self::with_fallback(Arc::new(db), fixed))
                    }
                    Ok(db) => Ok(Self::new(Arc::new(db))),
                    Err(e) => {
                        warn!(
                            "User database at {} unavailable, using fixed list: {}",
                            path.display(),
                            e
                        );
                        Ok(Self::new(fixed))
                    }
                }
            }
        }
    }

    /// Name of the primary source.
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Look an account up by email, consulting the fallback on a miss or
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns the primary source's error if there is no fallback.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>> {
        let email = normalize_email(email);
        match self.primary.find_by_email(&email).await {
            Ok(Some(user)) => Ok(Some(user)),
            Ok(None) => match &self.fallback {
                Some(fallback) => fallback.find_by_email(&email).await,
                None => Ok(None),
            },
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "Lookup in {} source failed, using {}: {}",
                        self.primary.name(),
                        fallback.name(),
                        e
                    );
                    fallback.find_by_email(&email).await
                }
                None => Err(e),
            },
        }
    }

    /// List accounts, consulting the fallback if the primary source fails.
    ///
    /// # Errors
    ///
    /// Returns the primary source's error if there is no fallback.
    pub async fn list(&self) -> Result<Vec<UserProfile>> {
        match self.primary.list().await {
            Ok(users) => Ok(users),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "Listing {} source failed, using {}: {}",
                        self.primary.name(),
                        fallback.name(),
                        e
                    );
                    fallback.list().await
                }
                None => Err(e),
            },
        }
    }

    /// Store a new account in the primary source.
    ///
    /// # Errors
    ///
    /// Returns the primary source's error.
    pub async fn insert(&self, user: StoredUser) -> Result<UserProfile> {
        self.primary.insert(user).await
    }

    /// Change an account's role in the primary source.
    ///
    /// # Errors
    ///
    /// Returns the primary source's error.
    pub async fn set_role(&self, id: &str, role: Role) -> Result<bool> {
        self.primary.set_role(id, role).await
    }

    /// Delete an account from the primary source.
    ///
    /// # Errors
    ///
    /// Returns the primary source's error.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.primary.delete(id).await
    }
}
