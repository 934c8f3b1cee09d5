/// Resource ownership checks
///
/// Called by a handler after it has fetched the record, so a missing record
/// is reported as `NotFound` before ownership is ever compared.
///
/// # Example
///
/// ```
/// use warden_shared::auth::guard::Principal;
/// use warden_shared::auth::ownership::authorize_owner;
/// use warden_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let admin = Principal {
///     id: Uuid::new_v4(),
///     email: "root@example.com".to_string(),
///     roles: vec![Role::Admin],
///     is_active: true,
/// };
/// let someone_else = Uuid::new_v4();
///
/// assert!(authorize_owner(&admin, someone_else, true).is_ok());
/// assert!(authorize_owner(&admin, someone_else, false).is_err());
/// ```

use tracing::debug;
use uuid::Uuid;

use super::guard::Principal;
use crate::error::{AuthError, AuthResult};

/// A record carrying an owner reference to a credential record
pub trait OwnedResource {
    fn owner_id(&self) -> Uuid;
}

/// Checks that `principal` owns the record, or is an admin when allowed
///
/// # Errors
///
/// Returns `Forbidden` if the principal is neither the owner nor an admin
/// with `allow_admin_override` set.
pub fn authorize_owner(
    principal: &Principal,
    owner_id: Uuid,
    allow_admin_override: bool,
) -> AuthResult<()> {
    if principal.id == owner_id || (allow_admin_override && principal.is_admin()) {
        return Ok(());
    }

    debug!(user_id = %principal.id, owner_id = %owner_id, "Ownership check failed");
    Err(AuthError::Forbidden(
        "You do not have permission to access this resource".to_string(),
    ))
}

/// Checks ownership of a fetched resource
pub fn authorize_resource<R: OwnedResource>(
    principal: &Principal,
    resource: &R,
    allow_admin_override: bool,
) -> AuthResult<()> {
    authorize_owner(principal, resource.owner_id(), allow_admin_override)
}

/// Checks every member of a batch; the first failure fails the whole batch
pub fn authorize_batch<R: OwnedResource>(
    principal: &Principal,
    resources: &[R],
    allow_admin_override: bool,
) -> AuthResult<()> {
    resources
        .iter()
        .try_for_each(|r| authorize_resource(principal, r, allow_admin_override))
}
