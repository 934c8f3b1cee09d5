/// In-memory store adapters
///
/// Records live in a `HashMap` behind a `tokio::sync::RwLock`. Every write
/// takes the write lock for its whole duration, so the uniqueness check and
/// the insert are one step, matching the unique index of the PostgreSQL
/// schema.
///
/// # Example
///
/// ```
/// use warden_shared::models::user::{CreateUser, Role};
/// use warden_shared::store::memory::MemoryCredentialStore;
/// use warden_shared::store::CredentialStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryCredentialStore::new();
/// let user = store
///     .create(CreateUser {
///         email: "ana@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         full_name: "Ana".to_string(),
///         roles: vec![],
///     })
///     .await?;
///
/// assert_eq!(user.roles, vec![Role::User]);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, DocumentStore, StoreError, StoreResult, EMAIL_IN_USE};
use crate::models::document::{CreateDocument, Document, UpdateDocument};
use crate::models::user::{CreateUser, Role, UpdateUser, User, UserFilter};
use crate::models::Pagination;

fn page_of<T>(mut items: Vec<T>, page: Pagination) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    if offset >= items.len() {
        return Vec::new();
    }
    items.drain(..offset);
    items.truncate(page.limit as usize);
    items
}

/// Credential store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict(EMAIL_IN_USE.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            full_name: data.full_name,
            roles: if data.roles.is_empty() {
                vec![Role::User]
            } else {
                data.roles
            },
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;

        if let Some(ref email) = data.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict(EMAIL_IN_USE.to_string()));
            }
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(full_name) = data.full_name {
            user.full_name = full_name;
        }
        if let Some(roles) = data.roles {
            user.roles = roles;
        }
        if let Some(is_active) = data.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn replace_password_hash(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> StoreResult<bool> {
        let mut users = self.users.write().await;

        match users.get_mut(&id) {
            Some(user) if user.password_hash == expected_hash => {
                user.password_hash = new_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn list(&self, filter: &UserFilter, page: Pagination) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut matched: Vec<User> = users.values().filter(|u| filter.matches(u)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(page_of(matched, page))
    }

    async fn count(&self, filter: &UserFilter) -> StoreResult<i64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).count() as i64)
    }
}

/// Document store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, data: CreateDocument) -> StoreResult<Document> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            created_at: now,
            updated_at: now,
        };

        self.documents.write().await.insert(document.id, document.clone());
        Ok(document)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Document>> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;
        Ok(ids.iter().filter_map(|id| documents.get(id).cloned()).collect())
    }

    async fn list_by_owner(&self, owner_id: Uuid, page: Pagination) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut owned: Vec<Document> = documents
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(page_of(owned, page))
    }

    async fn count_by_owner(&self, owner_id: Uuid) -> StoreResult<i64> {
        let documents = self.documents.read().await;
        Ok(documents.values().filter(|d| d.owner_id == owner_id).count() as i64)
    }

    async fn update(&self, id: Uuid, data: UpdateDocument) -> StoreResult<Option<Document>> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = data.title {
            document.title = title;
        }
        if let Some(description) = data.description {
            document.description = Some(description);
        }
        document.updated_at = Utc::now();

        Ok(Some(document.clone()))
    }

    async fn delete_many(&self, ids: &[Uuid]) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        Ok(ids.iter().filter(|id| documents.remove(id).is_some()).count() as u64)
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|_, d| d.owner_id != owner_id);
        Ok((before - documents.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: "Test".to_string(),
            roles: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_lookup() {
        let store = MemoryCredentialStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();

        assert_eq!(user.roles, vec![Role::User]);
        assert!(user.is_active);
        assert_eq!(store.find_by_email("a@example.com").await.unwrap().unwrap().id, user.id);
        assert_eq!(store.find_by_id(user.id).await.unwrap().unwrap().email, "a@example.com");
        assert!(store.find_by_email("missing@example.com").await.unwrap().is_none());
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_password_hash_requires_current_hash() {
        let store = MemoryCredentialStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();

        assert!(!store.replace_password_hash(user.id, "stale", "next").await.unwrap());
        assert!(store.replace_password_hash(user.id, "hash", "next").await.unwrap());
        assert!(!store.replace_password_hash(user.id, "hash", "other").await.unwrap());
        assert!(!store.replace_password_hash(Uuid::new_v4(), "next", "other").await.unwrap());

        assert_eq!(store.find_by_id(user.id).await.unwrap().unwrap().password_hash, "next");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryCredentialStore::new();
        store.create(new_user("a@example.com")).await.unwrap();

        let err = store.create(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_email_conflicts_with_other_record() {
        let store = MemoryCredentialStore::new();
        store.create(new_user("a@example.com")).await.unwrap();
        let b = store.create(new_user("b@example.com")).await.unwrap();

        let err = store
            .update(b.id, UpdateUser { email: Some("a@example.com".to_string()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Re-writing its own email is fine
        let same = store
            .update(b.id, UpdateUser { email: Some("b@example.com".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn test_set_active_and_delete() {
        let store = MemoryCredentialStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();

        let updated = store.set_active(user.id, false).await.unwrap().unwrap();
        assert!(!updated.is_active);
        assert!(store.set_active(Uuid::new_v4(), false).await.unwrap().is_none());

        assert!(store.delete(user.id).await.unwrap());
        assert!(!store.delete(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_count_with_filter() {
        let store = MemoryCredentialStore::new();
        for i in 0..5 {
            store.create(new_user(&format!("user{}@example.com", i))).await.unwrap();
        }
        let admin = store
            .create(CreateUser { roles: vec![Role::Admin], ..new_user("admin@example.com") })
            .await
            .unwrap();

        assert_eq!(store.count(&UserFilter::default()).await.unwrap(), 6);

        let admins = UserFilter { role: Some(Role::Admin), ..Default::default() };
        assert_eq!(store.count(&admins).await.unwrap(), 1);
        assert_eq!(store.list(&admins, Pagination::default()).await.unwrap()[0].id, admin.id);

        let page = store.list(&UserFilter::default(), Pagination::new(2, 4).unwrap()).await.unwrap();
        assert_eq!(page.len(), 2);
        let beyond = store.list(&UserFilter::default(), Pagination::new(9, 4).unwrap()).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_document_delete_many_and_by_owner() {
        let store = MemoryDocumentStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            let doc = store
                .create(CreateDocument { owner_id: owner, title: title.to_string(), description: None })
                .await
                .unwrap();
            ids.push(doc.id);
        }
        store
            .create(CreateDocument { owner_id: other, title: "d".to_string(), description: None })
            .await
            .unwrap();

        assert_eq!(store.count_by_owner(owner).await.unwrap(), 3);
        assert_eq!(store.find_by_ids(&[ids[0], Uuid::new_v4()]).await.unwrap().len(), 1);

        assert_eq!(store.delete_many(&ids[..2]).await.unwrap(), 2);
        assert_eq!(store.delete_by_owner(owner).await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_document_update() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .create(CreateDocument { owner_id: Uuid::new_v4(), title: "draft".to_string(), description: None })
            .await
            .unwrap();

        let updated = store
            .update(doc.id, UpdateDocument { title: Some("final".to_string()), description: None })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "final");
        assert!(updated.description.is_none());

        assert!(store.update(Uuid::new_v4(), UpdateDocument::default()).await.unwrap().is_none());
    }
}
