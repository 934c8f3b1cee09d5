/// Authentication guard
///
/// Turns the raw `Authorization` header of a request into a [`Principal`]:
///
/// 1. Extract a token from an `Authorization: Bearer <token>` header (the
///    scheme must be exactly `Bearer`)
/// 2. Verify it as an access token
/// 3. Re-fetch the credential record for the token subject
/// 4. Reject missing or inactive accounts
///
/// Every failure is [`AuthError::Unauthenticated`]; the reason is logged and
/// never returned. Because the record is re-read on every request, roles are
/// always current and deactivating an account takes effect on its next
/// request.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use warden_shared::auth::guard::AuthGuard;
/// use warden_shared::auth::jwt::TokenService;
/// use warden_shared::config::AuthConfig;
/// use warden_shared::error::AuthError;
/// use warden_shared::store::memory::MemoryCredentialStore;
///
/// # async fn example() {
/// let tokens = TokenService::new(&AuthConfig::new("a-secret-that-is-at-least-32-bytes-long"));
/// let guard = AuthGuard::new(tokens, Arc::new(MemoryCredentialStore::new()));
///
/// let result = guard.authenticate(None).await;
/// assert_eq!(result.unwrap_err(), AuthError::Unauthenticated);
/// # }
/// ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::jwt::TokenService;
use crate::error::{AuthError, AuthResult};
use crate::models::user::{Role, User};
use crate::store::CredentialStore;

/// The only accepted authorization scheme
pub const BEARER_SCHEME: &str = "Bearer";

/// Authenticated identity attached to one request
///
/// Rebuilt from the credential store on every request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
    pub is_active: bool,
}

impl Principal {
    /// Checks if the principal holds `role`
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Checks if the principal holds the administrative override role
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            roles: user.roles.clone(),
            is_active: user.is_active,
        }
    }
}

/// Extracts the token from an `Authorization` header value
///
/// Returns `None` unless the value is `Bearer <token>` with exactly that
/// scheme spelling and a non-empty token.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.split_once(' ')?;

    if scheme != BEARER_SCHEME {
        return None;
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }

    Some(token)
}

/// Per-request authentication gate
#[derive(Clone)]
pub struct AuthGuard {
    tokens: TokenService,
    store: Arc<dyn CredentialStore>,
}

impl AuthGuard {
    pub fn new(tokens: TokenService, store: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, store }
    }

    /// Resolves the principal for an `Authorization` header value
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if the header is absent or not a bearer token, the
    ///   token does not verify, or the account is missing or inactive
    /// - `Internal` if the credential store fails
    pub async fn authenticate(&self, authorization: Option<&str>) -> AuthResult<Principal> {
        let Some(token) = extract_bearer(authorization) else {
            debug!("Missing or malformed bearer authorization");
            return Err(AuthError::Unauthenticated);
        };

        let claims = self.tokens.verify_access_token(token).map_err(|e| {
            debug!(error = %e, "Access token rejected");
            AuthError::Unauthenticated
        })?;

        match self.store.find_by_id(claims.sub).await? {
            Some(user) if user.is_active => Ok(Principal::from(&user)),
            Some(_) => {
                warn!(user_id = %claims.sub, "Rejected token for inactive account");
                Err(AuthError::Unauthenticated)
            }
            None => {
                warn!(user_id = %claims.sub, "Rejected token for unknown account");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}
