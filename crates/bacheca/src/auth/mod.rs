//! Authentication, sessions, and user administration.
//!
//! The [`AuthGate`] checks credentials against a [`UserDirectory`], keeps the
//! active [`Session`] in the session slot so it survives restarts, and
//! answers permission questions through the role table in [`policy`].

pub mod password;
pub mod policy;
pub mod users;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AuthError, Error, Result};
use crate::record::new_id;
use crate::storage::{Slot, SlotStorage};

pub use password::{hash_password, verify_password};
pub use policy::{Permission, Role};
pub use users::{FixedUsers, SqliteUsers, StoredUser, UserDirectory, UserProfile, UserSource};

/// A logged-in user and what they may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The user's profile.
    #[serde(flatten)]
    pub user: UserProfile,
    /// Permissions derived from the role.
    pub permissions: Vec<Permission>,
}

impl Session {
    /// Open a session for a user, deriving permissions from the role.
    #[must_use]
    pub fn new(user: UserProfile) -> Self {
        let permissions = user.role.permissions().to_vec();
        Self { user, permissions }
    }

    /// Check a permission.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// The session's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// Where the gate is in the login cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Nobody is logged in.
    #[default]
    Anonymous,
    /// A login is being checked.
    Authenticating,
    /// A session is active.
    Authenticated(Session),
}

/// Input for creating a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    /// Display name (required).
    pub full_name: String,
    /// Login email (required).
    pub email: String,
    /// Plaintext password (required); hashed before storage.
    pub password: String,
    /// Role; consultatore if not given.
    pub role: Option<Role>,
    /// Department or office.
    pub department: String,
    /// Badge number.
    pub badge_number: String,
}

impl NewUser {
    /// Check the required fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(Error::validation("full_name", "must not be empty"));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(Error::validation("email", "must not be empty"));
        }
        if !email.contains('@') {
            return Err(Error::validation("email", format!("'{email}' is not an email address")));
        }
        if self.password.is_empty() {
            return Err(Error::validation("password", "must not be empty"));
        }
        Ok(())
    }
}

/// Login gate and session holder.
#[derive(Debug)]
pub struct AuthGate {
    storage: Arc<dyn SlotStorage>,
    users: UserDirectory,
    state: AuthState,
}

impl AuthGate {
    /// Create a gate, restoring any session persisted in storage.
    #[must_use]
    pub fn new(storage: Arc<dyn SlotStorage>, users: UserDirectory) -> Self {
        let state = match storage.read(Slot::Session) {
            Ok(Some(payload)) => match serde_json::from_str::<Session>(&payload) {
                Ok(saved) => {
                    debug!("Restored session for {}", saved.user.email);
                    AuthState::Authenticated(Session::new(saved.user))
                }
                Err(e) => {
                    warn!("Ignoring unreadable session: {}", e);
                    AuthState::Anonymous
                }
            },
            Ok(None) => AuthState::Anonymous,
            Err(e) => {
                warn!("Failed to read session: {}", e);
                AuthState::Anonymous
            }
        };

        Self {
            storage,
            users,
            state,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// The active session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// The user directory.
    #[must_use]
    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Check a permission for the active session. Anonymous has none.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.session()
            .is_some_and(|session| session.has_permission(permission))
    }

    /// Check whether the active session is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(|s| s.role() == Role::Admin)
    }

    /// Check whether the active session is a consultatore.
    #[must_use]
    pub fn is_consultatore(&self) -> bool {
        self.session().is_some_and(|s| s.role() == Role::Consultatore)
    }

    /// Log in with email and password.
    ///
    /// On success the session replaces any previous one and is persisted.
    /// On failure the gate is left anonymous and any persisted session is
    /// removed, so a later restart stays anonymous too.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `IncorrectPassword`, or an error from the
    /// user source or session storage.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session> {
        self.state = AuthState::Authenticating;

        match self.authenticate(email, password).await {
            Ok(session) => {
                info!("Logged in as {} ({})", session.user.email, session.role());
                self.state = AuthState::Authenticated(session.clone());
                Ok(session)
            }
            Err(e) => {
                info!("Login failed for {}: {}", email.trim(), e);
                self.state = AuthState::Anonymous;
                if let Err(remove_err) = self.storage.remove(Slot::Session) {
                    warn!("Failed to clear session after failed login: {}", remove_err);
                }
                Err(e)
            }
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        match verify_password(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::IncorrectPassword.into()),
            Err(e) => {
                warn!("Stored hash for {} is unusable: {}", user.profile.email, e);
                return Err(AuthError::IncorrectPassword.into());
            }
        }

        let session = Session::new(user.profile);
        self.storage
            .write(Slot::Session, &serde_json::to_string(&session)?)?;
        Ok(session)
    }

    /// End the active session.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session could not be removed; the
    /// in-memory session is cleared regardless.
    pub fn logout(&mut self) -> Result<()> {
        if let AuthState::Authenticated(session) = &self.state {
            info!("Logged out {}", session.user.email);
        }
        self.state = AuthState::Anonymous;
        self.storage.remove(Slot::Session)
    }

    /// The active session, or `NotAuthenticated`.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` if nobody is logged in.
    pub fn require_session(&self) -> Result<&Session> {
        self.session()
            .ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    /// The active session if it holds `permission`.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` if nobody is logged in, `NotAuthorized` if
    /// the session lacks the permission.
    pub fn require(&self, permission: Permission) -> Result<&Session> {
        let session = self.require_session()?;
        if session.has_permission(permission) {
            Ok(session)
        } else {
            Err(AuthError::NotAuthorized.into())
        }
    }

    fn require_admin(&self) -> Result<&Session> {
        match self.session() {
            Some(session) if session.role() == Role::Admin => Ok(session),
            _ => Err(AuthError::NotAuthorized.into()),
        }
    }

    /// List every account. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` for non-admins, or a user source error.
    pub async fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.require_admin()?;
        self.users.list().await
    }

    /// Change an account's role. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` for non-admins, `NotFound` for an unknown id,
    /// or a user source error.
    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<()> {
        self.require_admin()?;
        if !self.users.set_role(user_id, role).await? {
            return Err(Error::not_found("user", user_id));
        }
        info!("Set role of user {} to {}", user_id, role);
        Ok(())
    }

    /// Create an account. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` for non-admins, a validation error for
    /// missing fields, `DuplicateEmail` if the email is taken, or a user
    /// source error.
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserProfile> {
        self.require_admin()?;
        new_user.validate()?;

        let email = users::normalize_email(&new_user.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail { email }.into());
        }

        let user = StoredUser {
            profile: UserProfile {
                id: new_id(),
                full_name: new_user.full_name.trim().to_string(),
                email,
                role: new_user.role.unwrap_or(Role::Consultatore),
                department: new_user.department.trim().to_string(),
                badge_number: new_user.badge_number.trim().to_string(),
                created_at: Utc::now(),
            },
            password_hash: hash_password(&new_user.password)?,
        };

        let profile = self.users.insert(user).await?;
        info!("Created user {} ({})", profile.email, profile.role);
        Ok(profile)
    }

    /// Delete an account. Admin only; an admin cannot delete themselves.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorized` for non-admins, `SelfDeletion` for the
    /// caller's own id, `NotFound` for an unknown id, or a user source
    /// error.
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let session = self.require_admin()?;
        if session.user.id == user_id {
            return Err(AuthError::SelfDeletion.into());
        }
        if !self.users.delete(user_id).await? {
            return Err(Error::not_found("user", user_id));
        }
        info!("Deleted user {}", user_id);
        Ok(())
    }
}
