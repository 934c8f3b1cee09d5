/// Document model (owned resource)
///
/// Documents are the owned resource guarded by the ownership check: every
/// read, update and delete goes through
/// [`authorize_owner`](crate::auth::ownership::authorize_owner) after the
/// record has been fetched.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE documents (
///     id UUID PRIMARY KEY,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::ownership::OwnedResource;

/// Document metadata owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,

    /// Owning credential record
    pub owner_id: Uuid,

    /// Title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// When the document was created
    pub created_at: DateTime<Utc>,

    /// When the document was last updated
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for Document {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Input for creating a document
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Input for updating a document; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub description: Option<String>,
}
