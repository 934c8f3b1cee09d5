/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access and reset token issuance and verification
/// - [`guard`]: Authentication guard that resolves the request [`Principal`](guard::Principal)
/// - [`authorization`]: Per-route role checks
/// - [`ownership`]: Per-record ownership checks with admin override
///
/// # Request pipeline
///
/// ```text
/// request -> AuthGuard::authenticate -> authorize_roles -> handler -> authorize_owner -> store
/// ```
///
/// Public routes skip the first two steps.

pub mod authorization;
pub mod guard;
pub mod jwt;
pub mod ownership;
pub mod password;
