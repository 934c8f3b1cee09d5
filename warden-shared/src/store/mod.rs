/// Persistence contracts
///
/// The core never talks to a database directly. It reads and writes
/// credential records through [`CredentialStore`] and owned resources through
/// [`DocumentStore`]. "Not found" is always an absent value (`Ok(None)`,
/// `Ok(false)`), never an error.
///
/// # Adapters
///
/// - [`postgres`]: `sqlx` implementations over the schema in `migrations/`
/// - [`memory`]: `tokio::sync::RwLock` implementations for tests and local runs
///
/// Both adapters enforce email uniqueness and report a violation as
/// [`StoreError::Conflict`], which backs up the check-then-write done by the
/// services.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::document::{CreateDocument, Document, UpdateDocument};
use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};
use crate::models::Pagination;

/// Message used for unique-email violations
pub const EMAIL_IN_USE: &str = "Email already in use";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint violated
    #[error("{0}")]
    Conflict(String),

    /// Stored row could not be mapped to a record
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    /// Backend unreachable or failed
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Credential Store Adapter contract
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds a record by normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Finds a record by ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Creates a record
    ///
    /// An empty role set is stored as `[USER]`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email is taken.
    async fn create(&self, data: CreateUser) -> StoreResult<User>;

    /// Applies the `Some` fields of `data`; `Ok(None)` if the record is absent
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if a new email is taken.
    async fn update(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Swaps the password hash only while it still equals `expected_hash`
    ///
    /// Returns `Ok(false)` if the record is absent or its hash has already
    /// changed. The comparison and the write are a single atomic step.
    async fn replace_password_hash(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> StoreResult<bool>;

    /// Deletes a record; `Ok(false)` if it was absent
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Lists records matching `filter`, newest first
    async fn list(&self, filter: &UserFilter, page: Pagination) -> StoreResult<Vec<User>>;

    /// Counts records matching `filter`
    async fn count(&self, filter: &UserFilter) -> StoreResult<i64>;

    /// Toggles the active flag
    async fn set_active(&self, id: Uuid, active: bool) -> StoreResult<Option<User>> {
        self.update(
            id,
            UpdateUser {
                is_active: Some(active),
                ..Default::default()
            },
        )
        .await
    }
}

/// Store contract for documents (the owned resource)
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document
    async fn create(&self, data: CreateDocument) -> StoreResult<Document>;

    /// Finds a document by ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Document>>;

    /// Finds every document whose ID is in `ids`; absent IDs are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Document>>;

    /// Lists documents owned by `owner_id`, newest first
    async fn list_by_owner(&self, owner_id: Uuid, page: Pagination) -> StoreResult<Vec<Document>>;

    /// Counts documents owned by `owner_id`
    async fn count_by_owner(&self, owner_id: Uuid) -> StoreResult<i64>;

    /// Applies the `Some` fields of `data`; `Ok(None)` if the document is absent
    async fn update(&self, id: Uuid, data: UpdateDocument) -> StoreResult<Option<Document>>;

    /// Deletes every document in `ids` in one atomic step; returns the number removed
    async fn delete_many(&self, ids: &[Uuid]) -> StoreResult<u64>;

    /// Deletes every document owned by `owner_id`; returns the number removed
    async fn delete_by_owner(&self, owner_id: Uuid) -> StoreResult<u64>;
}
