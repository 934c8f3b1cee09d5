/// Registration, login and password flows
///
/// [`AuthService`] owns the password hasher and the token service built from
/// one [`AuthConfig`], and reads and writes credential records through a
/// [`CredentialStore`]. Reset tokens are handed to a [`ResetNotifier`] for
/// out-of-band delivery.
///
/// # Anti-enumeration
///
/// - Login failures (unknown email, inactive account, wrong password) are all
///   `Unauthenticated` with the same message.
/// - Forgot-password returns [`FORGOT_PASSWORD_MESSAGE`] whether or not the
///   email exists.
/// - Every reset-token failure is `InvalidInput(`[`INVALID_RESET_TOKEN`]`)`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use warden_shared::config::{AuthConfig, HashCost};
/// use warden_shared::services::auth::{AuthService, LogNotifier, RegisterInput};
/// use warden_shared::store::memory::MemoryCredentialStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = AuthConfig::new("a-secret-that-is-at-least-32-bytes-long");
/// config.hash_cost = HashCost { memory_kib: 8192, iterations: 1, parallelism: 1 };
///
/// let auth = AuthService::new(&config, Arc::new(MemoryCredentialStore::new()), Arc::new(LogNotifier))?;
///
/// let registered = auth
///     .register(RegisterInput {
///         email: "Ana@Example.com".to_string(),
///         password: "hunter22".to_string(),
///         full_name: None,
///     })
///     .await?;
/// assert_eq!(registered.user.email, "ana@example.com");
///
/// let logged_in = auth.login("ana@example.com", "hunter22").await?;
/// assert_eq!(logged_in.token.token_type, "Bearer");
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::PasswordPolicy;
use crate::auth::guard::{AuthGuard, Principal};
use crate::auth::jwt::{password_fingerprint, IssuedToken, TokenService};
use crate::auth::password::{PasswordError, PasswordHasher};
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::models::user::{normalize_email, CreateUser, Role, User};
use crate::store::CredentialStore;

/// Response to every forgot-password request
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If the email exists, you will receive instructions to reset your password";

/// Message for every reset-token failure
pub const INVALID_RESET_TOKEN: &str = "Invalid or expired token";

/// Response to a successful reset
pub const PASSWORD_RESET_MESSAGE: &str = "Password has been reset successfully";

/// Response to a successful change
pub const PASSWORD_CHANGED_MESSAGE: &str = "Password changed successfully";

/// Error type for reset-token delivery
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to deliver reset token: {0}")]
    Delivery(String),
}

/// Out-of-band delivery of reset tokens (e.g. email)
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset_token(&self, user: &User, token: &str) -> Result<(), NotifyError>;
}

/// Notifier that writes the reset token to the log
///
/// Stand-in for a real delivery channel in development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn send_reset_token(&self, user: &User, token: &str) -> Result<(), NotifyError> {
        info!(user_id = %user.id, "Password reset requested");
        debug!(user_id = %user.id, reset_token = %token, "Reset token issued");
        Ok(())
    }
}

/// Bearer token part of an auth response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            access_token: issued.token,
            token_type: "Bearer",
            expires_in: issued.expires_in,
        }
    }
}

/// Token plus the account it was issued for
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: User,
}

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Credential and token flows
#[derive(Clone)]
pub struct AuthService {
    hasher: PasswordHasher,
    tokens: TokenService,
    policy: PasswordPolicy,
    /// Verified against when there is no usable record, at the configured cost
    dummy_hash: Arc<str>,
    users: Arc<dyn CredentialStore>,
    notifier: Arc<dyn ResetNotifier>,
}

impl AuthService {
    /// Builds the service from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured hash cost is rejected by Argon2.
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn CredentialStore>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Result<Self, PasswordError> {
        let hasher = PasswordHasher::new(config.hash_cost)?;
        let dummy_hash = hasher.hash(&Uuid::new_v4().to_string())?.into();

        Ok(Self {
            hasher,
            tokens: TokenService::new(config),
            policy: PasswordPolicy {
                min_length: config.password_min_length,
                max_length: config.password_max_length,
            },
            dummy_hash,
            users,
            notifier,
        })
    }

    /// Authentication guard sharing this service's token key and store
    pub fn guard(&self) -> AuthGuard {
        AuthGuard::new(self.tokens.clone(), self.users.clone())
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn policy(&self) -> PasswordPolicy {
        self.policy
    }

    fn issue_for(&self, user: &User) -> AuthResult<TokenResponse> {
        let issued = self
            .tokens
            .issue_access_token(user.id, &user.email, &user.roles)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(issued.into())
    }

    /// Registers a new account with role `USER` and signs it in
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the password violates the length policy
    /// - `Conflict` if the email is already registered
    pub async fn register(&self, input: RegisterInput) -> AuthResult<AuthResponse> {
        let email = normalize_email(&input.email);
        self.policy.check(&input.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            debug!("Registration rejected: email already registered");
            return Err(AuthError::Conflict(crate::store::EMAIL_IN_USE.to_string()));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let user = self
            .users
            .create(CreateUser {
                email,
                password_hash,
                full_name: input.full_name.unwrap_or_default(),
                roles: vec![Role::User],
            })
            .await?;

        info!(user_id = %user.id, "User registered");

        Ok(AuthResponse {
            token: self.issue_for(&user)?,
            user,
        })
    }

    /// Signs in with email and password
    ///
    /// Unknown and inactive accounts still run one Argon2 verification
    /// against a dummy hash, so every failure costs the same.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` if the email is unknown, the account is
    /// inactive or the password does not match.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthResponse> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.hasher.verify(password, &self.dummy_hash);
            warn!("Login rejected: unknown email");
            return Err(AuthError::Unauthenticated);
        };

        if !user.is_active {
            self.hasher.verify(password, &self.dummy_hash);
            warn!(user_id = %user.id, "Login rejected: inactive account");
            return Err(AuthError::Unauthenticated);
        }

        if !self.hasher.verify(password, &user.password_hash) {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::Unauthenticated);
        }

        info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse {
            token: self.issue_for(&user)?,
            user,
        })
    }

    /// Issues a fresh access token for an authenticated principal
    ///
    /// The principal was rebuilt from the store by the guard, so the new
    /// token carries current roles.
    pub async fn refresh(&self, principal: &Principal) -> AuthResult<TokenResponse> {
        let issued = self
            .tokens
            .issue_access_token(principal.id, &principal.email, &principal.roles)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(issued.into())
    }

    /// Returns the principal's credential record
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record was deleted since authentication.
    pub async fn profile(&self, user_id: Uuid) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }

    /// Starts a password reset
    ///
    /// Always returns [`FORGOT_PASSWORD_MESSAGE`]. When the email belongs to
    /// an account, a reset token bound to its current password hash is
    /// passed to the notifier; a delivery failure is only logged.
    pub async fn forgot_password(&self, email: &str) -> AuthResult<&'static str> {
        let email = normalize_email(email);

        if let Some(user) = self.users.find_by_email(&email).await? {
            let token = self
                .tokens
                .issue_reset_token(user.id, &user.password_hash)
                .map_err(|e| AuthError::Internal(e.to_string()))?;

            if let Err(e) = self.notifier.send_reset_token(&user, &token).await {
                warn!(user_id = %user.id, error = %e, "Reset token delivery failed");
            }
        } else {
            debug!("Forgot-password for unknown email");
        }

        Ok(FORGOT_PASSWORD_MESSAGE)
    }

    /// Completes a password reset
    ///
    /// A token is accepted only while the account's password hash is the one
    /// it was issued against, so it can be redeemed once.
    ///
    /// # Errors
    ///
    /// - `InvalidInput(INVALID_RESET_TOKEN)` if the token does not verify,
    ///   the account is gone or the token was already used
    /// - `InvalidInput` if the new password violates the length policy
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<&'static str> {
        let invalid = || AuthError::InvalidInput(INVALID_RESET_TOKEN.to_string());

        let claims = self.tokens.verify_reset_token(token).map_err(|e| {
            debug!(error = %e, "Reset token rejected");
            invalid()
        })?;

        self.policy.check(new_password)?;

        let Some(user) = self.users.find_by_id(claims.user_id).await? else {
            warn!(user_id = %claims.user_id, "Reset token for unknown account");
            return Err(invalid());
        };

        if password_fingerprint(&user.password_hash) != claims.fingerprint {
            warn!(user_id = %user.id, "Reset token already used or superseded");
            return Err(invalid());
        }

        let password_hash = self.hasher.hash(new_password)?;
        let replaced = self
            .users
            .replace_password_hash(user.id, &user.password_hash, &password_hash)
            .await?;

        if !replaced {
            warn!(user_id = %user.id, "Reset token redeemed concurrently");
            return Err(invalid());
        }

        info!(user_id = %user.id, "Password reset");
        Ok(PASSWORD_RESET_MESSAGE)
    }

    /// Changes the password of an authenticated account
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the old password does not verify, the new one
    ///   equals it or violates the length policy
    /// - `NotFound` if the record was deleted since authentication
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<&'static str> {
        let incorrect = || AuthError::InvalidInput("Current password is incorrect".to_string());
        let user = self.profile(user_id).await?;

        if !self.hasher.verify(old_password, &user.password_hash) {
            warn!(user_id = %user.id, "Password change rejected: wrong current password");
            return Err(incorrect());
        }

        if old_password == new_password {
            return Err(AuthError::InvalidInput(
                "New password must be different from the current password".to_string(),
            ));
        }

        self.policy.check(new_password)?;

        let password_hash = self.hasher.hash(new_password)?;
        let replaced = self
            .users
            .replace_password_hash(user.id, &user.password_hash, &password_hash)
            .await?;

        if !replaced {
            warn!(user_id = %user.id, "Password changed concurrently");
            return Err(incorrect());
        }

        info!(user_id = %user.id, "Password changed");
        Ok(PASSWORD_CHANGED_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashCost;
    use crate::models::user::{UpdateUser, UserFilter};
    use crate::models::Pagination;
    use crate::store::memory::MemoryCredentialStore;
    use crate::store::StoreResult;
    use tokio::sync::Mutex;

    /// Captures reset tokens instead of delivering them
    #[derive(Default)]
    struct CapturingNotifier {
        tokens: Mutex<Vec<String>>,
    }

    impl CapturingNotifier {
        async fn last(&self) -> Option<String> {
            self.tokens.lock().await.last().cloned()
        }
    }

    #[async_trait]
    impl ResetNotifier for CapturingNotifier {
        async fn send_reset_token(&self, _user: &User, token: &str) -> Result<(), NotifyError> {
            self.tokens.lock().await.push(token.to_string());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl ResetNotifier for FailingNotifier {
        async fn send_reset_token(&self, _user: &User, _token: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp down".to_string()))
        }
    }

    /// Lands another password write right after every read by id
    struct RacingStore {
        inner: MemoryCredentialStore,
        concurrent_hash: String,
    }

    #[async_trait]
    impl CredentialStore for RacingStore {
        async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            self.inner.find_by_email(email).await
        }

        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
            let snapshot = self.inner.find_by_id(id).await?;
            let change = UpdateUser {
                password_hash: Some(self.concurrent_hash.clone()),
                ..Default::default()
            };
            self.inner.update(id, change).await?;
            Ok(snapshot)
        }

        async fn create(&self, data: CreateUser) -> StoreResult<User> {
            self.inner.create(data).await
        }

        async fn update(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
            self.inner.update(id, data).await
        }

        async fn replace_password_hash(
            &self,
            id: Uuid,
            expected_hash: &str,
            new_hash: &str,
        ) -> StoreResult<bool> {
            self.inner.replace_password_hash(id, expected_hash, new_hash).await
        }

        async fn delete(&self, id: Uuid) -> StoreResult<bool> {
            self.inner.delete(id).await
        }

        async fn list(&self, filter: &UserFilter, page: Pagination) -> StoreResult<Vec<User>> {
            self.inner.list(filter, page).await
        }

        async fn count(&self, filter: &UserFilter) -> StoreResult<i64> {
            self.inner.count(filter).await
        }
    }

    fn test_config() -> AuthConfig {
        let mut config = AuthConfig::new("test-secret-key-at-least-32-bytes-long");
        config.hash_cost = HashCost { memory_kib: 8192, iterations: 1, parallelism: 1 };
        config
    }

    fn service() -> (AuthService, Arc<MemoryCredentialStore>, Arc<CapturingNotifier>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let notifier = Arc::new(CapturingNotifier::default());
        let auth = AuthService::new(&test_config(), store.clone(), notifier.clone()).unwrap();
        (auth, store, notifier)
    }

    async fn register(auth: &AuthService, email: &str, password: &str) -> AuthResponse {
        auth.register(RegisterInput {
            email: email.to_string(),
            password: password.to_string(),
            full_name: Some("Test User".to_string()),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_issues_token_and_user_role() {
        let (auth, store, _) = service();
        let response = register(&auth, "  New@Example.com ", "secret1").await;

        assert_eq!(response.user.email, "new@example.com");
        assert_eq!(response.user.roles, vec![Role::User]);
        assert_eq!(response.token.token_type, "Bearer");
        assert_eq!(response.token.expires_in, 86_400);

        let stored = store.find_by_email("new@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(auth.hasher().verify("secret1", &stored.password_hash));

        let claims = auth.tokens().verify_access_token(&response.token.access_token).unwrap();
        assert_eq!(claims.sub, stored.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let (auth, _, _) = service();
        register(&auth, "dup@example.com", "secret1").await;

        let err = auth
            .register(RegisterInput {
                email: "DUP@example.com".to_string(),
                password: "secret2".to_string(),
                full_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_short_password_invalid() {
        let (auth, store, _) = service();
        let err = auth
            .register(RegisterInput {
                email: "short@example.com".to_string(),
                password: "12345".to_string(),
                full_name: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidInput(_)));
        assert!(store.find_by_email("short@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_success_and_generic_failures() {
        let (auth, store, _) = service();
        let registered = register(&auth, "login@example.com", "secret1").await;

        let ok = auth.login("LOGIN@example.com", "secret1").await.unwrap();
        assert_eq!(ok.user.id, registered.user.id);

        let wrong_password = auth.login("login@example.com", "nope-nope").await.unwrap_err();
        let unknown = auth.login("ghost@example.com", "secret1").await.unwrap_err();

        store.set_active(registered.user.id, false).await.unwrap();
        let inactive = auth.login("login@example.com", "secret1").await.unwrap_err();

        assert_eq!(wrong_password, AuthError::Unauthenticated);
        assert_eq!(unknown, AuthError::Unauthenticated);
        assert_eq!(inactive, AuthError::Unauthenticated);
        assert_eq!(wrong_password.to_string(), inactive.to_string());
    }

    #[tokio::test]
    async fn test_dummy_hash_matches_configured_cost() {
        let (auth, store, _) = service();
        let registered = register(&auth, "dummy@example.com", "secret1").await;
        let real_hash = store.find_by_id(registered.user.id).await.unwrap().unwrap().password_hash;

        // Algorithm, version and m/t/p segments of the PHC string
        let params = |hash: &str| hash.split('$').take(4).collect::<Vec<_>>().join("$");

        assert!(argon2::PasswordHash::new(&auth.dummy_hash).is_ok());
        assert_eq!(params(&auth.dummy_hash), params(&real_hash));
        assert_ne!(&*auth.dummy_hash, real_hash.as_str());
        assert!(!auth.hasher.verify("secret1", &auth.dummy_hash));
    }

    #[tokio::test]
    async fn test_login_without_usable_record_still_verifies() {
        let (auth, store, _) = service();
        let registered = register(&auth, "slow@example.com", "secret1").await;
        store.set_active(registered.user.id, false).await.unwrap();

        let one_verify = (0..3)
            .map(|_| {
                let started = std::time::Instant::now();
                auth.hasher.verify("secret1", &auth.dummy_hash);
                started.elapsed()
            })
            .min()
            .unwrap();

        // Each rejection pays for a full verification at the configured cost
        for email in ["ghost@example.com", "slow@example.com"] {
            let started = std::time::Instant::now();
            let err = auth.login(email, "secret1").await.unwrap_err();
            assert_eq!(err, AuthError::Unauthenticated);
            assert!(started.elapsed() * 4 >= one_verify, "{} returned without hashing", email);
        }
    }

    #[tokio::test]
    async fn test_forgot_password_same_response_either_way() {
        let (auth, _, notifier) = service();
        register(&auth, "known@example.com", "secret1").await;

        let known = auth.forgot_password("known@example.com").await.unwrap();
        assert!(notifier.last().await.is_some());

        let unknown = auth.forgot_password("unknown@example.com").await.unwrap();
        assert_eq!(known, unknown);
        assert_eq!(notifier.tokens.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_forgot_password_ignores_delivery_failure() {
        let store = Arc::new(MemoryCredentialStore::new());
        let auth = AuthService::new(&test_config(), store, Arc::new(FailingNotifier)).unwrap();
        register(&auth, "a@example.com", "secret1").await;

        assert_eq!(auth.forgot_password("a@example.com").await.unwrap(), FORGOT_PASSWORD_MESSAGE);
    }

    #[tokio::test]
    async fn test_reset_password_flow_and_replay() {
        let (auth, _, notifier) = service();
        register(&auth, "reset@example.com", "oldpass1").await;

        auth.forgot_password("reset@example.com").await.unwrap();
        let token = notifier.last().await.unwrap();

        assert_eq!(auth.reset_password(&token, "newpass1").await.unwrap(), PASSWORD_RESET_MESSAGE);
        assert!(auth.login("reset@example.com", "newpass1").await.is_ok());
        assert!(auth.login("reset@example.com", "oldpass1").await.is_err());

        let replay = auth.reset_password(&token, "another1").await.unwrap_err();
        assert_eq!(replay, AuthError::InvalidInput(INVALID_RESET_TOKEN.to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reset_token_redeemed_once_under_concurrency() {
        let (auth, _, notifier) = service();
        register(&auth, "race@example.com", "oldpass1").await;
        auth.forgot_password("race@example.com").await.unwrap();
        let token = notifier.last().await.unwrap();

        let attempts: Vec<_> = (0..8)
            .map(|i| {
                let auth = auth.clone();
                let token = token.clone();
                tokio::spawn(async move { auth.reset_password(&token, &format!("racer-{}", i)).await })
            })
            .collect();

        let mut winners = Vec::new();
        for (i, attempt) in attempts.into_iter().enumerate() {
            match attempt.await.unwrap() {
                Ok(_) => winners.push(i),
                Err(e) => assert_eq!(e, AuthError::InvalidInput(INVALID_RESET_TOKEN.to_string())),
            }
        }

        assert_eq!(winners.len(), 1);
        let password = format!("racer-{}", winners[0]);
        assert!(auth.login("race@example.com", &password).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_loses_to_write_after_token_check() {
        let store = Arc::new(RacingStore {
            inner: MemoryCredentialStore::new(),
            concurrent_hash: "concurrent-hash".to_string(),
        });
        let notifier = Arc::new(CapturingNotifier::default());
        let auth = AuthService::new(&test_config(), store.clone(), notifier.clone()).unwrap();

        let id = register(&auth, "stale@example.com", "oldpass1").await.user.id;
        auth.forgot_password("stale@example.com").await.unwrap();
        let token = notifier.last().await.unwrap();

        let err = auth.reset_password(&token, "newpass1").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidInput(INVALID_RESET_TOKEN.to_string()));

        let stored = store.inner.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "concurrent-hash");
    }

    #[tokio::test]
    async fn test_reset_password_rejects_access_token_and_garbage() {
        let (auth, _, _) = service();
        let registered = register(&auth, "r@example.com", "secret1").await;
        let expected = AuthError::InvalidInput(INVALID_RESET_TOKEN.to_string());

        let err = auth
            .reset_password(&registered.token.access_token, "newpass1")
            .await
            .unwrap_err();
        assert_eq!(err, expected);

        assert_eq!(auth.reset_password("garbage", "newpass1").await.unwrap_err(), expected);
    }

    #[tokio::test]
    async fn test_reset_password_short_password_invalid() {
        let (auth, _, notifier) = service();
        register(&auth, "s@example.com", "secret1").await;
        auth.forgot_password("s@example.com").await.unwrap();
        let token = notifier.last().await.unwrap();

        let err = auth.reset_password(&token, "123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(ref m) if m != INVALID_RESET_TOKEN));

        // Token is still usable after a policy failure
        assert!(auth.reset_password(&token, "123456").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_invalidates_outstanding_reset_token() {
        let (auth, _, notifier) = service();
        let registered = register(&auth, "c@example.com", "secret1").await;
        auth.forgot_password("c@example.com").await.unwrap();
        let token = notifier.last().await.unwrap();

        auth.change_password(registered.user.id, "secret1", "secret2").await.unwrap();

        assert!(auth.reset_password(&token, "secret3").await.is_err());
        assert!(auth.login("c@example.com", "secret2").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_failures() {
        let (auth, _, _) = service();
        let id = register(&auth, "cp@example.com", "secret1").await.user.id;

        let same = auth.change_password(id, "secret1", "secret1").await.unwrap_err();
        let wrong = auth.change_password(id, "wrong-one", "secret2").await.unwrap_err();
        let wrong_and_same = auth.change_password(id, "guess-1", "guess-1").await.unwrap_err();
        let short = auth.change_password(id, "secret1", "123").await.unwrap_err();
        let missing = auth.change_password(Uuid::new_v4(), "a-pass", "b-pass").await.unwrap_err();

        assert!(matches!(same, AuthError::InvalidInput(_)));
        assert!(matches!(wrong, AuthError::InvalidInput(_)));
        assert!(matches!(short, AuthError::InvalidInput(_)));

        // A wrong guess gets the same answer whether or not it repeats itself
        assert_eq!(wrong_and_same, wrong);
        assert_ne!(same, wrong);
        assert!(matches!(missing, AuthError::NotFound(_)));

        assert!(auth.login("cp@example.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_carries_current_roles() {
        let (auth, store, _) = service();
        let registered = register(&auth, "f@example.com", "secret1").await;
        store
            .update(registered.user.id, UpdateUser { roles: Some(vec![Role::Moderator]), ..Default::default() })
            .await
            .unwrap();

        let header = format!("Bearer {}", registered.token.access_token);
        let principal = auth.guard().authenticate(Some(&header)).await.unwrap();
        let refreshed = auth.refresh(&principal).await.unwrap();

        let claims = auth.tokens().verify_access_token(&refreshed.access_token).unwrap();
        assert_eq!(claims.roles, vec![Role::Moderator]);
    }

    #[test]
    fn test_auth_response_shape() {
        let now = chrono::Utc::now();
        let response = AuthResponse {
            token: TokenResponse { access_token: "t".to_string(), token_type: "Bearer", expires_in: 60 },
            user: User {
                id: Uuid::nil(),
                email: "a@b.c".to_string(),
                password_hash: "secret-hash".to_string(),
                full_name: String::new(),
                roles: vec![Role::User],
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "t");
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 60);
        assert!(json["user"].get("password_hash").is_none());
    }
}
