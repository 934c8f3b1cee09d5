/// User endpoints
///
/// # Self-service (any authenticated user)
///
/// - `GET /v1/users/profile`
/// - `PATCH /v1/users/profile`
/// - `PUT /v1/users/password`
///
/// # Administration
///
/// | Endpoint                          | Roles            |
/// |-----------------------------------|------------------|
/// | `GET /v1/users`                   | ADMIN, MODERATOR |
/// | `GET /v1/users/search?q=`         | ADMIN, MODERATOR |
/// | `GET /v1/users/count`             | ADMIN, MODERATOR |
/// | `GET /v1/users/:id`               | ADMIN, MODERATOR |
/// | `POST /v1/users`                  | ADMIN            |
/// | `PATCH /v1/users/:id`             | ADMIN            |
/// | `PUT /v1/users/:id/roles`         | ADMIN            |
/// | `PUT /v1/users/:id/activate`      | ADMIN            |
/// | `PUT /v1/users/:id/deactivate`    | ADMIN            |
/// | `DELETE /v1/users/:id`            | ADMIN            |

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use warden_shared::models::user::{Role, User, UserFilter};
use warden_shared::models::Paginated;
use warden_shared::services::users::{CreateUserInput, ProfileUpdate};

use super::auth::{ChangePasswordRequest, MessageResponse};
use super::PageQuery;
use crate::{app::AppState, error::ApiResult, middleware::auth::CurrentUser};

/// Administrator create-user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,

    /// Defaults to `["USER"]`
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub full_name: Option<String>,
}

impl From<UpdateUserRequest> for ProfileUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            email: req.email,
            full_name: req.full_name,
        }
    }
}

/// Role replacement request
#[derive(Debug, Deserialize)]
pub struct SetRolesRequest {
    pub roles: Vec<Role>,
}

/// `GET /v1/users` query
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

/// `GET /v1/users/search` query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `GET /v1/users/count` query
#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub total: i64,
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get(principal.id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    Ok(Json(state.users.update(principal.id, req.into()).await?))
}

/// Same flow as `POST /v1/auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .auth
        .change_password(principal.id, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(message.into()))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Paginated<User>>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .pagination()?;

    let filter = UserFilter {
        is_active: query.is_active,
        role: query.role,
        query: None,
    };

    Ok(Json(state.users.list(filter, page).await?))
}

/// Case-insensitive match on email or full name
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Paginated<User>>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .pagination()?;

    Ok(Json(state.users.search(&query.q, page).await?))
}

pub async fn count_users(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> ApiResult<Json<CountResponse>> {
    let filter = UserFilter {
        is_active: query.is_active,
        role: query.role,
        query: None,
    };

    let total = state.users.count(filter).await?;
    Ok(Json(CountResponse { total }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get(id).await?))
}

/// Creates an account with explicit roles
///
/// # Errors
///
/// - `400 Bad Request`: Password violates the length policy
/// - `409 Conflict`: Email already exists
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;

    let user = state
        .users
        .create_user(CreateUserInput {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            roles: req.roles,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    Ok(Json(state.users.update(id, req.into()).await?))
}

pub async fn set_roles(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetRolesRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.set_roles(id, &req.roles).await?))
}

pub async fn activate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.activate(id).await?))
}

/// Outstanding tokens of the account are rejected from the next request on
pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.deactivate(id).await?))
}

/// Deletes the account and the documents it owns
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
