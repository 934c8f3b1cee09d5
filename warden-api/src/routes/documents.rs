/// Document endpoints
///
/// All routes require authentication. Reads and deletes are allowed for the
/// owner or an administrator; updates for the owner only. A missing document
/// is `404` for every caller.
///
/// # Endpoints
///
/// - `POST /v1/documents` - Create a document owned by the caller
/// - `GET /v1/documents` - List the caller's documents
/// - `GET /v1/documents/:id`
/// - `PUT /v1/documents/:id`
/// - `DELETE /v1/documents/:id`
/// - `DELETE /v1/documents/batch` - All-or-nothing batch delete

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use warden_shared::models::document::{Document, UpdateDocument};
use warden_shared::models::Paginated;

use super::PageQuery;
use crate::{app::AppState, error::ApiResult, middleware::auth::CurrentUser};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDocumentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDeleteResponse {
    pub deleted: u64,
}

pub async fn create_document(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(req): Json<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    req.validate()?;

    let document = state
        .documents
        .create(&principal, req.title, req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn list_documents(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Document>>> {
    let page = query.pagination()?;
    Ok(Json(state.documents.list_mine(&principal, page).await?))
}

pub async fn get_document(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    Ok(Json(state.documents.get(&principal, id).await?))
}

pub async fn update_document(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDocumentRequest>,
) -> ApiResult<Json<Document>> {
    req.validate()?;

    let update = UpdateDocument {
        title: req.title,
        description: req.description,
    };

    Ok(Json(state.documents.update(&principal, id, update).await?))
}

pub async fn delete_document(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.documents.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes every listed document or none of them
///
/// # Errors
///
/// - `400 Bad Request`: Empty batch or more than 100 ids
/// - `403 Forbidden`: Any document belongs to someone else (and the caller is not ADMIN)
/// - `404 Not Found`: Any id does not exist
pub async fn delete_documents(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(req): Json<BatchDeleteRequest>,
) -> ApiResult<Json<BatchDeleteResponse>> {
    let deleted = state.documents.delete_many(&principal, &req.ids).await?;
    Ok(Json(BatchDeleteResponse { deleted }))
}
