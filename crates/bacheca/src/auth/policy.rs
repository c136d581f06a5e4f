//! Roles, permissions, and the table that maps one to the other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Something a session may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Add documents.
    CreateDocument,
    /// Change documents.
    EditDocument,
    /// Remove documents.
    DeleteDocument,
    /// Add news items.
    CreateNews,
    /// Change news items.
    EditNews,
    /// Remove news items.
    DeleteNews,
    /// Administer user accounts.
    ManageUsers,
    /// Read every collection.
    ViewAll,
    /// Read documents.
    ViewDocuments,
    /// Read news items.
    ViewNews,
}

impl Permission {
    /// The serialized name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateDocument => "create_document",
            Self::EditDocument => "edit_document",
            Self::DeleteDocument => "delete_document",
            Self::CreateNews => "create_news",
            Self::EditNews => "edit_news",
            Self::DeleteNews => "delete_news",
            Self::ManageUsers => "manage_users",
            Self::ViewAll => "view_all",
            Self::ViewDocuments => "view_documents",
            Self::ViewNews => "view_news",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full record management and user administration.
    Admin,
    /// Read-only access.
    Consultatore,
}

/// Role to permission table. Every permission check goes through here.
const POLICY: &[(Role, &[Permission])] = &[
    (
        Role::Admin,
        &[
            Permission::CreateDocument,
            Permission::EditDocument,
            Permission::DeleteDocument,
            Permission::CreateNews,
            Permission::EditNews,
            Permission::DeleteNews,
            Permission::ManageUsers,
            Permission::ViewAll,
        ],
    ),
    (
        Role::Consultatore,
        &[Permission::ViewDocuments, Permission::ViewNews],
    ),
];

impl Role {
    /// The permissions granted to this role.
    #[must_use]
    pub fn permissions(self) -> &'static [Permission] {
        POLICY
            .iter()
            .find(|(role, _)| *role == self)
            .map(|(_, permissions)| *permissions)
            .unwrap_or(&[])
    }

    /// Check whether this role grants a permission.
    #[must_use]
    pub fn grants(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// The serialized name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Consultatore => "consultatore",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "consultatore" => Ok(Self::Consultatore),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
