/// Document operations
///
/// Every operation on an existing document fetches it first and then runs
/// the ownership check, so a missing document is `NotFound` regardless of
/// who asks.
///
/// | Operation     | Who may act            |
/// |---------------|------------------------|
/// | `get`         | owner or admin         |
/// | `update`      | owner only             |
/// | `delete`      | owner or admin         |
/// | `delete_many` | owner or admin, per id |

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::guard::Principal;
use crate::auth::ownership::{authorize_batch, authorize_resource};
use crate::error::{AuthError, AuthResult};
use crate::models::document::{CreateDocument, Document, UpdateDocument};
use crate::models::{PageMeta, Paginated, Pagination};
use crate::store::DocumentStore;

/// Largest accepted batch for `delete_many`
pub const MAX_BATCH_SIZE: usize = 100;

const READ_ADMIN_OVERRIDE: bool = true;
const UPDATE_ADMIN_OVERRIDE: bool = false;
const DELETE_ADMIN_OVERRIDE: bool = true;

fn not_found() -> AuthError {
    AuthError::NotFound("Document not found".to_string())
}

#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentStore>,
}

impl DocumentService {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    async fn fetch(&self, id: Uuid) -> AuthResult<Document> {
        self.documents.find_by_id(id).await?.ok_or_else(not_found)
    }

    /// Creates a document owned by the caller
    pub async fn create(
        &self,
        principal: &Principal,
        title: String,
        description: Option<String>,
    ) -> AuthResult<Document> {
        let document = self
            .documents
            .create(CreateDocument {
                owner_id: principal.id,
                title,
                description,
            })
            .await?;

        info!(document_id = %document.id, owner_id = %principal.id, "Document created");
        Ok(document)
    }

    /// Lists the caller's own documents
    pub async fn list_mine(
        &self,
        principal: &Principal,
        page: Pagination,
    ) -> AuthResult<Paginated<Document>> {
        let total = self.documents.count_by_owner(principal.id).await?;
        let data = self.documents.list_by_owner(principal.id, page).await?;

        Ok(Paginated {
            data,
            meta: PageMeta::new(page, total),
        })
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> AuthResult<Document> {
        let document = self.fetch(id).await?;
        authorize_resource(principal, &document, READ_ADMIN_OVERRIDE)?;
        Ok(document)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        update: UpdateDocument,
    ) -> AuthResult<Document> {
        let document = self.fetch(id).await?;
        authorize_resource(principal, &document, UPDATE_ADMIN_OVERRIDE)?;

        self.documents.update(id, update).await?.ok_or_else(not_found)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> AuthResult<()> {
        let document = self.fetch(id).await?;
        authorize_resource(principal, &document, DELETE_ADMIN_OVERRIDE)?;

        self.documents.delete_many(&[id]).await?;
        info!(document_id = %id, user_id = %principal.id, "Document deleted");
        Ok(())
    }

    /// Deletes a batch of documents, all or nothing
    ///
    /// Every id must exist and pass the ownership check before anything is
    /// deleted; the deletion itself is a single store call.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the batch is empty or larger than [`MAX_BATCH_SIZE`]
    /// - `NotFound` if any id does not exist
    /// - `Forbidden` if any member fails the ownership check
    pub async fn delete_many(&self, principal: &Principal, ids: &[Uuid]) -> AuthResult<u64> {
        let unique: Vec<Uuid> = {
            let mut seen = HashSet::new();
            ids.iter().copied().filter(|id| seen.insert(*id)).collect()
        };

        if unique.is_empty() {
            return Err(AuthError::InvalidInput("At least one id is required".to_string()));
        }
        if unique.len() > MAX_BATCH_SIZE {
            return Err(AuthError::InvalidInput(format!(
                "At most {} ids can be deleted at once",
                MAX_BATCH_SIZE
            )));
        }

        let found = self.documents.find_by_ids(&unique).await?;
        if found.len() != unique.len() {
            return Err(not_found());
        }

        if let Err(e) = authorize_batch(principal, &found, DELETE_ADMIN_OVERRIDE) {
            warn!(user_id = %principal.id, batch = unique.len(), "Batch delete rejected");
            return Err(e);
        }

        let deleted = self.documents.delete_many(&unique).await?;
        info!(user_id = %principal.id, deleted, "Documents deleted");
        Ok(deleted)
    }
}
