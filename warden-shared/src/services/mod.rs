/// Orchestration services
///
/// Services combine the hasher, the token service and the stores into the
/// operations exposed over HTTP. Every operation returns
/// [`AuthResult`](crate::error::AuthResult); none of them knows about status
/// codes.
///
/// # Modules
///
/// - [`auth`]: Register, login, refresh, profile and the password flows
/// - [`users`]: User administration and self-service profile updates
/// - [`documents`]: Owned-resource operations guarded by ownership checks

pub mod auth;
pub mod documents;
pub mod users;

use crate::error::{AuthError, AuthResult};

/// Length bounds applied to every new password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl PasswordPolicy {
    /// Checks a plaintext password's length in characters
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the password is shorter than `min_length` or
    /// longer than `max_length`.
    pub fn check(&self, password: &str) -> AuthResult<()> {
        let length = password.chars().count();

        if length < self.min_length {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }
        if length > self.max_length {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at most {} characters long",
                self.max_length
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy_bounds() {
        let policy = PasswordPolicy { min_length: 6, max_length: 10 };

        assert!(matches!(policy.check("12345"), Err(AuthError::InvalidInput(_))));
        assert!(policy.check("123456").is_ok());
        assert!(policy.check("1234567890").is_ok());
        assert!(policy.check("12345678901").is_err());
        // Counted in characters, not bytes
        assert!(policy.check("ñññññ").is_err());
        assert!(policy.check("ññññññ").is_ok());
    }
}
