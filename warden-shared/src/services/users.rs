/// User administration
///
/// Administrative operations on credential records (create with roles, list,
/// search, role replacement, activation, deletion) plus the self-service
/// profile update. Role requirements are declared on the routes; this
/// service assumes the caller already passed them.
///
/// Deleting a user removes the documents they own first, so no owned
/// resource is left pointing at a missing record.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::PasswordPolicy;
use crate::auth::password::PasswordHasher;
use crate::error::{AuthError, AuthResult};
use crate::models::user::{normalize_email, CreateUser, Role, UpdateUser, User, UserFilter};
use crate::models::{PageMeta, Paginated, Pagination};
use crate::store::{CredentialStore, DocumentStore, EMAIL_IN_USE};

/// Input for an administrator-created account
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    /// Empty means `[USER]`
    pub roles: Vec<Role>,
}

/// Editable profile fields
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

fn not_found() -> AuthError {
    AuthError::NotFound("User not found".to_string())
}

/// Sorted, de-duplicated copy of a role set; empty becomes `[USER]`
fn normalize_roles(roles: &[Role]) -> Vec<Role> {
    if roles.is_empty() {
        return vec![Role::User];
    }

    let mut roles = roles.to_vec();
    roles.sort();
    roles.dedup();
    roles
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn CredentialStore>,
    documents: Arc<dyn DocumentStore>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl UserService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        documents: Arc<dyn DocumentStore>,
        hasher: PasswordHasher,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            users,
            documents,
            hasher,
            policy,
        }
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> AuthResult<()> {
        match self.users.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(AuthError::Conflict(EMAIL_IN_USE.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Creates an account with explicit roles
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the password violates the length policy
    /// - `Conflict` if the email is already registered
    pub async fn create_user(&self, input: CreateUserInput) -> AuthResult<User> {
        let email = normalize_email(&input.email);
        self.policy.check(&input.password)?;
        self.ensure_email_free(&email, None).await?;

        let user = self
            .users
            .create(CreateUser {
                email,
                password_hash: self.hasher.hash(&input.password)?,
                full_name: input.full_name.unwrap_or_default(),
                roles: normalize_roles(&input.roles),
            })
            .await?;

        info!(user_id = %user.id, roles = ?user.roles, "User created by administrator");
        Ok(user)
    }

    /// Lists accounts matching `filter`
    pub async fn list(&self, filter: UserFilter, page: Pagination) -> AuthResult<Paginated<User>> {
        let total = self.users.count(&filter).await?;
        let data = self.users.list(&filter, page).await?;

        Ok(Paginated {
            data,
            meta: PageMeta::new(page, total),
        })
    }

    /// Case-insensitive search on email and full name
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `query` is blank.
    pub async fn search(&self, query: &str, page: Pagination) -> AuthResult<Paginated<User>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AuthError::InvalidInput("Search query must not be empty".to_string()));
        }

        self.list(
            UserFilter {
                query: Some(query.to_string()),
                ..Default::default()
            },
            page,
        )
        .await
    }

    /// Counts accounts matching `filter`
    pub async fn count(&self, filter: UserFilter) -> AuthResult<i64> {
        Ok(self.users.count(&filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> AuthResult<User> {
        self.users.find_by_id(id).await?.ok_or_else(not_found)
    }

    /// Updates email and/or full name
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `Conflict` if the new email belongs to another account
    pub async fn update(&self, id: Uuid, update: ProfileUpdate) -> AuthResult<User> {
        let email = update.email.as_deref().map(normalize_email);

        if let Some(ref email) = email {
            self.ensure_email_free(email, Some(id)).await?;
        }

        self.users
            .update(
                id,
                UpdateUser {
                    email,
                    full_name: update.full_name,
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(not_found)
    }

    /// Replaces the role set
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `roles` is empty
    /// - `NotFound` if the account does not exist
    pub async fn set_roles(&self, id: Uuid, roles: &[Role]) -> AuthResult<User> {
        if roles.is_empty() {
            return Err(AuthError::InvalidInput("At least one role is required".to_string()));
        }

        let user = self
            .users
            .update(
                id,
                UpdateUser {
                    roles: Some(normalize_roles(roles)),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(not_found)?;

        info!(user_id = %user.id, roles = ?user.roles, "Roles updated");
        Ok(user)
    }

    pub async fn activate(&self, id: Uuid) -> AuthResult<User> {
        let user = self.users.set_active(id, true).await?.ok_or_else(not_found)?;
        info!(user_id = %id, "User activated");
        Ok(user)
    }

    /// Deactivates an account; its outstanding tokens stop working on their next use
    pub async fn deactivate(&self, id: Uuid) -> AuthResult<User> {
        let user = self.users.set_active(id, false).await?.ok_or_else(not_found)?;
        info!(user_id = %id, "User deactivated");
        Ok(user)
    }

    /// Deletes an account together with the documents it owns
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn delete(&self, id: Uuid) -> AuthResult<()> {
        self.get(id).await?;

        let removed = self.documents.delete_by_owner(id).await?;
        if !self.users.delete(id).await? {
            return Err(not_found());
        }

        info!(user_id = %id, documents_removed = removed, "User deleted");
        Ok(())
    }
}
