/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get an access token
/// - `POST /v1/auth/forgot-password` - Request a reset token
/// - `POST /v1/auth/reset-password` - Redeem a reset token
/// - `GET /v1/auth/profile` - Current user (authenticated)
/// - `POST /v1/auth/refresh` - New access token (authenticated)
/// - `POST /v1/auth/change-password` - Change password (authenticated)
///
/// Password length is not checked by the DTOs; the policy lives in the
/// services so every path that sets a password applies the same bounds.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use warden_shared::models::user::User;
use warden_shared::services::auth::{AuthResponse, RegisterInput, TokenResponse};

use crate::{app::AppState, error::ApiResult, middleware::auth::CurrentUser};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,

    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reset password request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    /// Reset token from the forgot-password delivery
    pub token: String,

    /// Replacement password
    pub new_password: String,
}

/// Change password request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl From<&str> for MessageResponse {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "hunter22",
///   "full_name": "Ana Souza"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_in": 86400,
///   "user": { "id": "uuid", "email": "user@example.com", "roles": ["USER"], ... }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Password violates the length policy
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Malformed email or name
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let response = state
        .auth
        .register(RegisterInput {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// Unknown email, inactive account and wrong password are all
/// `401` with the same body.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(response))
}

/// Requests a password reset
///
/// Always answers with the same message, whether or not the email exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let message = state.auth.forgot_password(&req.email).await?;
    Ok(Json(message.into()))
}

/// Redeems a reset token
///
/// # Errors
///
/// - `400 Bad Request`: Invalid, expired or already used token, or the new
///   password violates the length policy
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .auth
        .reset_password(&req.token, &req.new_password)
        .await?;
    Ok(Json(message.into()))
}

/// Returns the authenticated user's record
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<User>> {
    let user = state.auth.profile(principal.id).await?;
    Ok(Json(user))
}

/// Issues a fresh access token for the authenticated user
pub async fn refresh(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<TokenResponse>> {
    let token = state.auth.refresh(&principal).await?;
    Ok(Json(token))
}

/// Changes the authenticated user's password
///
/// # Errors
///
/// - `400 Bad Request`: Same password, wrong current password, or policy violation
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
