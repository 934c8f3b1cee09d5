/// Credential record model
///
/// A [`User`] is the persisted identity behind every [`Principal`]. Records are
/// read and written exclusively through the
/// [`CredentialStore`](crate::store::CredentialStore) contract.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     full_name TEXT NOT NULL DEFAULT '',
///     roles TEXT[] NOT NULL DEFAULT ARRAY['USER'],
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Invariants
///
/// - `password_hash` is never serialized; it cannot leak into a response body.
/// - `roles` is never empty; an empty set is replaced by `[USER]` on create.
///
/// [`Principal`]: crate::auth::guard::Principal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role tag attached to a credential record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular account
    User,

    /// Can read user listings
    Moderator,

    /// Administrative override role
    Admin,
}

impl Role {
    /// Gets role as its wire/storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "MODERATOR" => Ok(Role::Moderator),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Persisted credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, trimmed and lower-cased, unique
    pub email: String,

    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Display name
    pub full_name: String,

    /// Role tags (non-empty)
    pub roles: Vec<Role>,

    /// Inactive accounts cannot authenticate
    pub is_active: bool,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Checks if the record holds `role`
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Input for creating a credential record
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Normalized email address
    pub email: String,

    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,

    /// Display name
    pub full_name: String,

    /// Initial roles; empty means `[USER]`
    pub roles: Vec<Role>,
}

/// Input for updating a credential record
///
/// Only `Some` fields are written. `updated_at` is always refreshed.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New normalized email
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New display name
    pub full_name: Option<String>,

    /// Replacement role set
    pub roles: Option<Vec<Role>>,

    /// New active flag
    pub is_active: Option<bool>,
}

/// Filters for listing credential records
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Only records with this active flag
    pub is_active: Option<bool>,

    /// Only records holding this role
    pub role: Option<Role>,

    /// Case-insensitive substring match on email or full name
    pub query: Option<String>,
}

impl UserFilter {
    /// Checks whether `user` passes every set filter
    pub fn matches(&self, user: &User) -> bool {
        if let Some(active) = self.is_active {
            if user.is_active != active {
                return false;
            }
        }

        if let Some(role) = self.role {
            if !user.has_role(role) {
                return false;
            }
        }

        if let Some(ref query) = self.query {
            let needle = query.to_lowercase();
            if !user.email.to_lowercase().contains(&needle)
                && !user.full_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }
}

/// Trims and lower-cases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
