/// Authentication and role middleware
///
/// Protected routes are wrapped in two layers, outermost first:
///
/// 1. [`authenticate`]: runs the [`AuthGuard`](warden_shared::auth::guard::AuthGuard)
///    on the `Authorization` header and inserts the resulting [`Principal`]
///    into the request extensions. Any failure is a 401 with the generic
///    message.
/// 2. [`require_roles`]: checks the injected principal against the route's
///    required role set. Failure is a 403.
///
/// Handlers read the principal through the [`CurrentUser`] extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use warden_shared::auth::authorization::authorize_roles;
use warden_shared::auth::guard::Principal;
use warden_shared::error::AuthError;
use warden_shared::models::user::Role;

use crate::app::AppState;
use crate::error::ApiError;

/// Resolves the caller from the bearer token
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = state.guard.authenticate(authorization).await?;
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Rejects callers lacking every role in the required set
///
/// Must run inside [`authenticate`]; a request without a principal is
/// treated as unauthenticated.
pub async fn require_roles(
    State(required): State<&'static [Role]>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or(AuthError::Unauthenticated)?;

    authorize_roles(principal, required)?;

    Ok(next.run(req).await)
}

/// The authenticated caller of a protected route
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}
