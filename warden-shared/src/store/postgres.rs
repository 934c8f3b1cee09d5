/// PostgreSQL store adapters
///
/// Backed by the `users` and `documents` tables created by the migrations in
/// `warden-shared/migrations`. The unique index on `users.email` is the final
/// arbiter for duplicate emails: a `23505` unique violation comes back as
/// [`StoreError::Conflict`].
///
/// # Example
///
/// ```no_run
/// use warden_shared::db::pool::{create_pool, DatabaseConfig};
/// use warden_shared::store::postgres::PgCredentialStore;
/// use warden_shared::store::CredentialStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgCredentialStore::new(pool);
/// let user = store.find_by_email("ana@example.com").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, DocumentStore, StoreError, StoreResult, EMAIL_IN_USE};
use crate::models::document::{CreateDocument, Document, UpdateDocument};
use crate::models::user::{CreateUser, Role, UpdateUser, User, UserFilter};
use crate::models::Pagination;

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, roles, is_active, created_at, updated_at";

const DOCUMENT_COLUMNS: &str = "id, owner_id, title, description, created_at, updated_at";

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Raw `users` row; roles are stored as `TEXT[]`
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    full_name: String,
    roles: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::InvalidRecord(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            roles,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// Maps a unique violation to `Conflict`, anything else to `Database`
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Conflict(EMAIL_IN_USE.to_string());
        }
    }
    StoreError::Database(err)
}

fn like_pattern(query: &Option<String>) -> Option<String> {
    query.as_ref().map(|q| {
        let escaped = q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

const USER_FILTER: &str = r#"
    ($1::BOOLEAN IS NULL OR is_active = $1)
    AND ($2::TEXT IS NULL OR $2 = ANY(roles))
    AND ($3::TEXT IS NULL OR email ILIKE $3 OR full_name ILIKE $3)
"#;

/// Credential store over PostgreSQL
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let roles = if data.roles.is_empty() {
            vec![Role::User]
        } else {
            data.roles
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, full_name, roles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.full_name)
        .bind(role_names(&roles))
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        User::try_from(row)
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                full_name = COALESCE($4, full_name),
                roles = COALESCE($5, roles),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.full_name)
        .bind(data.roles.as_deref().map(role_names))
        .bind(data.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.map(User::try_from).transpose()
    }

    async fn replace_password_hash(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $3, updated_at = NOW()
            WHERE id = $1 AND password_hash = $2
            "#,
        )
        .bind(id)
        .bind(expected_hash)
        .bind(new_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &UserFilter, page: Pagination) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE {} ORDER BY created_at DESC, id LIMIT $4 OFFSET $5",
            USER_COLUMNS, USER_FILTER
        ))
        .bind(filter.is_active)
        .bind(filter.role.map(|r| r.as_str()))
        .bind(like_pattern(&filter.query))
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn count(&self, filter: &UserFilter) -> StoreResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM users WHERE {}", USER_FILTER))
                .bind(filter.is_active)
                .bind(filter.role.map(|r| r.as_str()))
                .bind(like_pattern(&filter.query))
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Document store over PostgreSQL
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, data: CreateDocument) -> StoreResult<Document> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (id, owner_id, title, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(data.owner_id)
        .bind(&data.title)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {} FROM documents WHERE id = ANY($1)",
            DOCUMENT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn list_by_owner(&self, owner_id: Uuid, page: Pagination) -> StoreResult<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {} FROM documents
            WHERE owner_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(owner_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn count_by_owner(&self, owner_id: Uuid) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn update(&self, id: Uuid, data: UpdateDocument) -> StoreResult<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
