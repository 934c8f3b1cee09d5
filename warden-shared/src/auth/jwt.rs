/// Token service: access and reset tokens
///
/// Tokens are compact JWTs signed with HS256 under a single secret. Access and
/// reset tokens share the key and are told apart by the `type` claim, which is
/// present (and equal to `"reset"`) only on reset tokens. Every verification
/// path checks that discriminator explicitly.
///
/// # Claims
///
/// ```json
/// { "sub": "<uuid>", "email": "...", "roles": ["USER"], "type": "reset"?, "iat": 0, "exp": 0 }
/// ```
///
/// Reset tokens additionally carry `fgp`, a fingerprint of the password hash in
/// effect when the token was issued, so a token stops working once the
/// password changes.
///
/// # Example
///
/// ```
/// use warden_shared::auth::jwt::TokenService;
/// use warden_shared::config::AuthConfig;
/// use warden_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(&AuthConfig::new("a-secret-that-is-at-least-32-bytes-long"));
/// let user_id = Uuid::new_v4();
///
/// let issued = tokens.issue_access_token(user_id, "ana@example.com", &[Role::User])?;
/// assert_eq!(issued.expires_in, 86_400);
///
/// let claims = tokens.verify_access_token(&issued.token)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::user::Role;

/// Length (hex chars) of the password-hash fingerprint in reset tokens
const FINGERPRINT_LEN: usize = 32;

/// Error type for token operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Access token is malformed, badly signed, expired or a reset token
    #[error("Invalid token")]
    InvalidToken,

    /// Reset token is malformed, badly signed, expired or lacks the reset discriminator
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
}

/// Purpose discriminator carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    /// Single-purpose password reset token
    Reset,
}

/// JWT claims structure shared by access and reset tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Email at issuance (empty on reset tokens)
    #[serde(default)]
    pub email: String,

    /// Roles at issuance (empty on reset tokens)
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Purpose discriminator; absent on access tokens
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<TokenPurpose>,

    /// Password-hash fingerprint (reset tokens only)
    #[serde(rename = "fgp", default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// A freshly signed access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    /// Compact JWT
    pub token: String,

    /// Lifetime in seconds (`exp - iat`)
    pub expires_in: i64,
}

/// Verified reset token contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetClaims {
    /// User whose password may be reset
    pub user_id: Uuid,

    /// Fingerprint of the password hash the token was issued against
    pub fingerprint: String,
}

/// Issues and verifies access and reset tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    reset_ttl_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("reset_ttl_secs", &self.reset_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service from configuration
    ///
    /// The access lifetime is parsed from `jwt_expires_in` once, here; an
    /// unparsable value falls back to one day.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_secs: config.access_token_ttl_secs(),
            reset_ttl_secs: config.reset_token_ttl_secs,
        }
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Issues an access token for a principal
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if signing fails.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        roles: &[Role],
    ) -> Result<IssuedToken, JwtError> {
        self.issue_access_token_at(user_id, email, roles, Utc::now().timestamp())
    }

    fn issue_access_token_at(
        &self,
        user_id: Uuid,
        email: &str,
        roles: &[Role],
        issued_at: i64,
    ) -> Result<IssuedToken, JwtError> {
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            roles: roles.to_vec(),
            purpose: None,
            fingerprint: None,
            iat: issued_at,
            exp: issued_at + self.access_ttl_secs,
        };

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_in: self.access_ttl_secs,
        })
    }

    /// Verifies an access token and returns its claims
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidToken` if the signature does not match, the
    /// token is malformed or expired, or it carries a purpose discriminator.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.decode(token).ok_or(JwtError::InvalidToken)?;

        if claims.purpose.is_some() {
            debug!(sub = %claims.sub, "Rejected purpose-bound token presented as access token");
            return Err(JwtError::InvalidToken);
        }

        Ok(claims)
    }

    /// Issues a reset token bound to the account's current password hash
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if signing fails.
    pub fn issue_reset_token(&self, user_id: Uuid, password_hash: &str) -> Result<String, JwtError> {
        self.issue_reset_token_at(user_id, password_hash, Utc::now().timestamp())
    }

    fn issue_reset_token_at(
        &self,
        user_id: Uuid,
        password_hash: &str,
        issued_at: i64,
    ) -> Result<String, JwtError> {
        let claims = Claims {
            sub: user_id,
            email: String::new(),
            roles: Vec::new(),
            purpose: Some(TokenPurpose::Reset),
            fingerprint: Some(password_fingerprint(password_hash)),
            iat: issued_at,
            exp: issued_at + self.reset_ttl_secs,
        };

        self.sign(&claims)
    }

    /// Verifies a reset token
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidOrExpiredToken` on any signature, format or
    /// expiry failure, and when the `type` claim is missing or not `"reset"`.
    pub fn verify_reset_token(&self, token: &str) -> Result<ResetClaims, JwtError> {
        let claims = self.decode(token).ok_or(JwtError::InvalidOrExpiredToken)?;

        if claims.purpose != Some(TokenPurpose::Reset) {
            debug!(sub = %claims.sub, "Rejected token without reset discriminator");
            return Err(JwtError::InvalidOrExpiredToken);
        }

        let fingerprint = claims.fingerprint.ok_or(JwtError::InvalidOrExpiredToken)?;

        Ok(ResetClaims {
            user_id: claims.sub,
            fingerprint,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Decodes and checks signature and expiry; the reason for a failure is
    /// logged at debug level and never returned
    fn decode(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) if data.claims.exp > data.claims.iat => Some(data.claims),
            Ok(data) => {
                debug!(sub = %data.claims.sub, "Rejected token with exp <= iat");
                None
            }
            Err(e) => {
                debug!(error = %e, "Token verification failed");
                None
            }
        }
    }
}

/// Fingerprint of a password hash, embedded in reset tokens
pub fn password_fingerprint(password_hash: &str) -> String {
    let digest = Sha256::digest(password_hash.as_bytes());
    let mut fingerprint = hex::encode(digest);
    fingerprint.truncate(FINGERPRINT_LEN);
    fingerprint
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn service() -> TokenService {
        TokenService::new(&AuthConfig::new(SECRET))
    }

    #[test]
    fn test_access_token_roundtrip() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let issued = tokens
            .issue_access_token(user_id, "ana@example.com", &[Role::Admin, Role::User])
            .expect("Should create token");
        assert_eq!(issued.expires_in, 86_400);

        let claims = tokens.verify_access_token(&issued.token).expect("Should validate token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.roles, vec![Role::Admin, Role::User]);
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert!(claims.purpose.is_none());
    }

    #[test]
    fn test_configured_duration_sets_expiry() {
        let mut config = AuthConfig::new(SECRET);
        config.jwt_expires_in = "12h".to_string();
        let tokens = TokenService::new(&config);

        let issued = tokens.issue_access_token(Uuid::new_v4(), "a@b.c", &[Role::User]).unwrap();
        let claims = tokens.verify_access_token(&issued.token).unwrap();

        assert_eq!(issued.expires_in, 43_200);
        assert_eq!(claims.exp - claims.iat, 43_200);
    }

    #[test]
    fn test_expired_access_token_rejected() {
        let tokens = service();
        let long_ago = Utc::now().timestamp() - 86_400 - 10;

        let issued = tokens
            .issue_access_token_at(Uuid::new_v4(), "a@b.c", &[Role::User], long_ago)
            .unwrap();

        assert_eq!(tokens.verify_access_token(&issued.token), Err(JwtError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = service()
            .issue_access_token(Uuid::new_v4(), "a@b.c", &[Role::User])
            .unwrap();
        let other = TokenService::new(&AuthConfig::new("another-secret-key-at-least-32-bytes"));

        assert_eq!(other.verify_access_token(&issued.token), Err(JwtError::InvalidToken));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let tokens = service();

        assert!(tokens.verify_access_token("").is_err());
        assert!(tokens.verify_access_token("not.a.jwt").is_err());
        assert!(tokens.verify_reset_token("garbage").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = service();
        let issued = tokens.issue_access_token(Uuid::new_v4(), "a@b.c", &[Role::User]).unwrap();

        let mut parts: Vec<&str> = issued.token.split('.').collect();
        let forged = tokens
            .issue_access_token(Uuid::new_v4(), "a@b.c", &[Role::Admin])
            .unwrap();
        let forged_parts: Vec<&str> = forged.token.split('.').collect();
        parts[1] = forged_parts[1];

        assert!(tokens.verify_access_token(&parts.join(".")).is_err());
    }

    #[test]
    fn test_reset_token_roundtrip() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let token = tokens.issue_reset_token(user_id, "$argon2id$hash-a").unwrap();
        let reset = tokens.verify_reset_token(&token).expect("Should validate reset token");

        assert_eq!(reset.user_id, user_id);
        assert_eq!(reset.fingerprint, password_fingerprint("$argon2id$hash-a"));
    }

    #[test]
    fn test_reset_token_not_accepted_as_access_token() {
        let tokens = service();
        let token = tokens.issue_reset_token(Uuid::new_v4(), "hash").unwrap();

        assert_eq!(tokens.verify_access_token(&token), Err(JwtError::InvalidToken));
    }

    #[test]
    fn test_access_token_not_accepted_as_reset_token() {
        let tokens = service();
        let issued = tokens.issue_access_token(Uuid::new_v4(), "a@b.c", &[Role::User]).unwrap();

        assert_eq!(
            tokens.verify_reset_token(&issued.token),
            Err(JwtError::InvalidOrExpiredToken)
        );
    }

    #[test]
    fn test_expired_reset_token_rejected() {
        let tokens = service();
        let two_hours_ago = Utc::now().timestamp() - 7_200;
        let token = tokens.issue_reset_token_at(Uuid::new_v4(), "hash", two_hours_ago).unwrap();

        assert_eq!(tokens.verify_reset_token(&token), Err(JwtError::InvalidOrExpiredToken));
    }

    #[test]
    fn test_reset_claim_wire_format() {
        let claims = Claims {
            sub: Uuid::nil(),
            email: String::new(),
            roles: Vec::new(),
            purpose: Some(TokenPurpose::Reset),
            fingerprint: Some("ab".to_string()),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "reset");

        let access = Claims { purpose: None, fingerprint: None, ..claims };
        let json = serde_json::to_value(&access).unwrap();
        assert!(json.get("type").is_none());
        assert!(json.get("fgp").is_none());
    }

    #[test]
    fn test_fingerprint_changes_with_hash() {
        assert_eq!(password_fingerprint("a").len(), FINGERPRINT_LEN);
        assert_eq!(password_fingerprint("a"), password_fingerprint("a"));
        assert_ne!(password_fingerprint("a"), password_fingerprint("b"));
    }
}
