/// Error taxonomy for the credential and authorization core
///
/// Every orchestration operation returns `Result<T, AuthError>`. The HTTP
/// layer is the only place where an [`AuthError`] becomes a status code:
///
/// | Variant           | Status |
/// |-------------------|--------|
/// | `Unauthenticated` | 401    |
/// | `Forbidden`       | 403    |
/// | `NotFound`        | 404    |
/// | `Conflict`        | 409    |
/// | `InvalidInput`    | 400    |
/// | `Internal`        | 500    |
///
/// `Unauthenticated` deliberately carries no detail: missing header, bad
/// signature, expired token, unknown account, inactive account and wrong
/// password all render the same message.

use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Generic message for every authentication failure
pub const UNAUTHENTICATED_MESSAGE: &str = "Invalid credentials";

/// Result alias used by the services
pub type AuthResult<T> = Result<T, AuthError>;

/// Error returned by guards, checks and orchestration flows
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Caller could not be authenticated
    #[error("{}", UNAUTHENTICATED_MESSAGE)]
    Unauthenticated,

    /// Caller is authenticated but not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Unique constraint violated (e.g. duplicate email)
    #[error("{0}")]
    Conflict(String),

    /// Input violates a policy (password length, same password, bad reset token)
    #[error("{0}")]
    InvalidInput(String),

    /// Store or other internal failure; detail is for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Shorthand for `Forbidden` with the default message
    pub fn forbidden() -> Self {
        AuthError::Forbidden("Insufficient permissions".to_string())
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::NotFound(_) => "not_found",
            AuthError::Conflict(_) => "conflict",
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AuthError::Conflict(msg),
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(format!("Password operation failed: {}", err))
    }
}
