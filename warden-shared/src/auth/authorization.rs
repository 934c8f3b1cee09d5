/// Role-based authorization
///
/// Each route declares its access requirement once, in the route table, as a
/// [`RouteAccess`] value. The check itself is a pure function over that
/// declaration and the current [`Principal`]:
///
/// | Declaration              | Authentication guard | Role check                       |
/// |--------------------------|----------------------|----------------------------------|
/// | `Public`                 | skipped              | skipped                          |
/// | `Protected(&[])`         | runs                 | passes                           |
/// | `Protected(&[A, B])`     | runs                 | passes if principal has A or B   |
///
/// # Example
///
/// ```
/// use warden_shared::auth::authorization::{authorize_roles, RouteAccess};
/// use warden_shared::auth::guard::Principal;
/// use warden_shared::models::user::Role;
/// use uuid::Uuid;
///
/// const ADMIN_ONLY: RouteAccess = RouteAccess::Protected(&[Role::Admin]);
///
/// let user = Principal {
///     id: Uuid::new_v4(),
///     email: "ana@example.com".to_string(),
///     roles: vec![Role::User],
///     is_active: true,
/// };
///
/// assert!(authorize_roles(&user, ADMIN_ONLY.required_roles()).is_err());
/// ```

use tracing::debug;

use super::guard::Principal;
use crate::error::{AuthError, AuthResult};
use crate::models::user::Role;

/// Access requirement declared by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// No authentication and no role check
    Public,

    /// Authenticated; any one of the listed roles is required (empty = any principal)
    Protected(&'static [Role]),
}

impl RouteAccess {
    /// Authenticated only, no role requirement
    pub const AUTHENTICATED: RouteAccess = RouteAccess::Protected(&[]);

    /// Whether the authentication guard runs for this route
    pub fn requires_authentication(&self) -> bool {
        matches!(self, RouteAccess::Protected(_))
    }

    /// Roles of which the principal must hold at least one
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            RouteAccess::Public => &[],
            RouteAccess::Protected(roles) => roles,
        }
    }
}

/// Checks the principal's roles against a required set
///
/// # Errors
///
/// Returns `Forbidden` if `required` is non-empty and shares no role with
/// the principal.
pub fn authorize_roles(principal: &Principal, required: &[Role]) -> AuthResult<()> {
    if required.is_empty() || required.iter().any(|role| principal.has_role(*role)) {
        return Ok(());
    }

    debug!(
        user_id = %principal.id,
        required = ?required,
        actual = ?principal.roles,
        "Role check failed"
    );
    Err(AuthError::forbidden())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal(roles: &[Role]) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "p@example.com".to_string(),
            roles: roles.to_vec(),
            is_active: true,
        }
    }

    #[test]
    fn test_admin_route_rejects_plain_user() {
        let result = authorize_roles(&principal(&[Role::User]), &[Role::Admin]);
        assert_eq!(result, Err(AuthError::forbidden()));
    }

    #[test]
    fn test_admin_route_accepts_admin_user() {
        assert!(authorize_roles(&principal(&[Role::Admin, Role::User]), &[Role::Admin]).is_ok());
    }

    #[test]
    fn test_any_of_required_roles_suffices() {
        let required = [Role::Admin, Role::Moderator];
        assert!(authorize_roles(&principal(&[Role::Moderator]), &required).is_ok());
        assert!(authorize_roles(&principal(&[Role::User]), &required).is_err());
    }

    #[test]
    fn test_empty_requirement_passes() {
        assert!(authorize_roles(&principal(&[Role::User]), &[]).is_ok());
        assert!(authorize_roles(&principal(&[Role::User]), RouteAccess::AUTHENTICATED.required_roles()).is_ok());
    }

    #[test]
    fn test_route_access_flags() {
        assert!(!RouteAccess::Public.requires_authentication());
        assert!(RouteAccess::AUTHENTICATED.requires_authentication());
        assert_eq!(RouteAccess::Protected(&[Role::Admin]).required_roles(), &[Role::Admin]);
    }
}
