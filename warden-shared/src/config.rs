/// Authentication configuration
///
/// A single immutable [`AuthConfig`] value is built once at process start and
/// handed by reference to the token service, the password hasher and the
/// orchestration services. Nothing in this crate reads configuration from
/// global state after start-up.
///
/// # Environment Variables
///
/// - `JWT_SECRET`: Signing secret for access and reset tokens (required)
/// - `JWT_EXPIRES_IN`: Access token lifetime, e.g. `1d`, `12h`, `30m` (default: `1d`)
/// - `RESET_TOKEN_TTL_SECS`: Reset token lifetime in seconds (default: 3600)
/// - `PASSWORD_MIN_LENGTH`: Minimum password length (default: 6)
/// - `ARGON2_MEMORY_KIB`, `ARGON2_ITERATIONS`, `ARGON2_PARALLELISM`: Hash cost
///
/// # Example
///
/// ```
/// use warden_shared::config::{AuthConfig, parse_expires_in};
///
/// let config = AuthConfig::new("a-secret-that-is-at-least-32-bytes-long");
/// assert_eq!(config.access_token_ttl_secs(), 86_400);
/// assert_eq!(parse_expires_in("12h"), Some(43_200));
/// ```

use std::env;

/// Access token lifetime used when `jwt_expires_in` cannot be parsed
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 86_400;

/// Reset tokens live for one hour unless configured otherwise
pub const DEFAULT_RESET_TOKEN_TTL_SECS: i64 = 3_600;

/// Minimum length accepted for `JWT_SECRET` when loaded from the environment
pub const MIN_SECRET_LENGTH: usize = 32;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A variable is present but unusable
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HashCost {
    /// 64 MiB, 3 passes, 4 lanes
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Immutable authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret used to sign access and reset tokens
    pub jwt_secret: String,

    /// Access token lifetime as a duration string (`<n>d|h|m|s`)
    pub jwt_expires_in: String,

    /// Reset token lifetime in seconds
    pub reset_token_ttl_secs: i64,

    /// Minimum accepted password length (in characters)
    pub password_min_length: usize,

    /// Maximum accepted password length (in characters)
    pub password_max_length: usize,

    /// Password hashing cost
    pub hash_cost: HashCost,
}

impl AuthConfig {
    /// Creates a configuration with default policy values around `secret`
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            jwt_expires_in: "1d".to_string(),
            reset_token_ttl_secs: DEFAULT_RESET_TOKEN_TTL_SECS,
            password_min_length: 6,
            password_max_length: 100,
            hash_cost: HashCost::default(),
        }
    }

    /// Loads configuration from environment variables
    ///
    /// Reads a `.env` file first when one is present.
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is missing or shorter than
    /// [`MIN_SECRET_LENGTH`], or if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {} characters long", MIN_SECRET_LENGTH),
            });
        }

        let defaults = Self::new(jwt_secret);
        let cost = HashCost::default();

        Ok(Self {
            jwt_expires_in: env::var("JWT_EXPIRES_IN").unwrap_or(defaults.jwt_expires_in.clone()),
            reset_token_ttl_secs: env_or("RESET_TOKEN_TTL_SECS", defaults.reset_token_ttl_secs)?,
            password_min_length: env_or("PASSWORD_MIN_LENGTH", defaults.password_min_length)?,
            password_max_length: env_or("PASSWORD_MAX_LENGTH", defaults.password_max_length)?,
            hash_cost: HashCost {
                memory_kib: env_or("ARGON2_MEMORY_KIB", cost.memory_kib)?,
                iterations: env_or("ARGON2_ITERATIONS", cost.iterations)?,
                parallelism: env_or("ARGON2_PARALLELISM", cost.parallelism)?,
            },
            ..defaults
        })
    }

    /// Access token lifetime in seconds
    ///
    /// Falls back to [`DEFAULT_ACCESS_TOKEN_TTL_SECS`] when `jwt_expires_in`
    /// does not parse.
    pub fn access_token_ttl_secs(&self) -> i64 {
        parse_expires_in(&self.jwt_expires_in).unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS)
    }
}

/// Parses a duration string such as `"1d"`, `"12h"`, `"30m"` or `"45s"`
///
/// Returns `None` for anything other than a positive integer immediately
/// followed by exactly one unit letter.
pub fn parse_expires_in(value: &str) -> Option<i64> {
    let unit = value.chars().last()?;
    let digits = &value[..value.len() - unit.len_utf8()];

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let multiplier = match unit {
        'd' => 86_400,
        'h' => 3_600,
        'm' => 60,
        's' => 1,
        _ => return None,
    };

    let amount: i64 = digits.parse().ok()?;
    let seconds = amount.checked_mul(multiplier)?;

    (seconds > 0).then_some(seconds)
}

fn env_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
