/// Password hashing module using Argon2id
///
/// Passwords are hashed with Argon2id (winner of the Password Hashing
/// Competition). The cost parameters come from [`HashCost`] in the
/// configuration; the default is 64 MiB of memory, 3 passes and 4 lanes.
///
/// # Security
///
/// - **Salt**: 16 random bytes per hash from the OS RNG, embedded in the PHC string
/// - **Verification**: constant-time comparison inside `argon2`
/// - **Malformed hashes**: verification reports `false`, never an error
///
/// # Example
///
/// ```
/// use warden_shared::auth::password::PasswordHasher;
/// use warden_shared::config::HashCost;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(HashCost { memory_kib: 8192, iterations: 1, parallelism: 1 })?;
///
/// let hash = hasher.hash("super_secret_password_123")?;
/// assert!(hasher.verify("super_secret_password_123", &hash));
/// assert!(!hasher.verify("wrong_password", &hash));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Argon2, ParamsBuilder, Version,
};
use tracing::debug;

use crate::config::HashCost;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Cost parameters rejected by Argon2
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// One-way, salted, cost-parameterized password hasher
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    cost: HashCost,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").field("cost", &self.cost).finish()
    }
}

impl PasswordHasher {
    /// Creates a hasher with the given cost
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if Argon2 rejects the parameters
    /// (e.g. memory below 8 KiB per lane).
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(cost.memory_kib)
            .t_cost(cost.iterations)
            .p_cost(cost.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self { argon2, cost })
    }

    /// Cost parameters used for new hashes
    pub fn cost(&self) -> HashCost {
        self.cost
    }

    /// Hashes a plaintext password
    ///
    /// Returns a PHC string such as `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` only if Argon2 itself fails; valid
    /// non-empty input always hashes.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verifies a plaintext password against a stored hash
    ///
    /// The parameters embedded in `hash` are used, so hashes created under an
    /// older cost still verify. Returns `false` for a wrong password and for a
    /// stored hash that does not parse.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
