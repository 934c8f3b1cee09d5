/// Application state and router builder
///
/// Every route is declared once in [`route_table`] together with its
/// [`RouteAccess`]. [`build_router`] turns each declaration into an axum
/// route, wrapping protected handlers in the authentication and role layers,
/// so no handler can be mounted without an explicit access decision.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use warden_api::{app::{build_router, AppState}, config::Config};
/// use warden_shared::db::pool::create_pool;
/// use warden_shared::services::auth::LogNotifier;
/// use warden_shared::store::postgres::{PgCredentialStore, PgDocumentStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.clone()).await?;
/// let state = AppState::new(
///     config,
///     Arc::new(PgCredentialStore::new(pool.clone())),
///     Arc::new(PgDocumentStore::new(pool)),
///     Arc::new(LogNotifier),
/// )?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put, MethodRouter},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use warden_shared::auth::authorization::RouteAccess;
use warden_shared::auth::guard::AuthGuard;
use warden_shared::models::user::Role;
use warden_shared::services::auth::{AuthService, ResetNotifier};
use warden_shared::services::documents::DocumentService;
use warden_shared::services::users::UserService;
use warden_shared::store::{CredentialStore, DocumentStore};

use crate::config::Config;
use crate::middleware::auth::{authenticate, require_roles};
use crate::routes;

const ADMIN: RouteAccess = RouteAccess::Protected(&[Role::Admin]);
const STAFF: RouteAccess = RouteAccess::Protected(&[Role::Admin, Role::Moderator]);
const AUTHENTICATED: RouteAccess = RouteAccess::AUTHENTICATED;
const PUBLIC: RouteAccess = RouteAccess::Public;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Every
/// member is a cheap handle over `Arc`-shared stores.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Register, login and password flows
    pub auth: AuthService,

    /// Bearer token authentication
    pub guard: AuthGuard,

    /// User administration
    pub users: UserService,

    /// Owned documents
    pub documents: DocumentService,
}

impl AppState {
    /// Wires the services over the given stores
    ///
    /// # Errors
    ///
    /// Returns an error if the configured Argon2 cost is invalid.
    pub fn new(
        config: Config,
        users: Arc<dyn CredentialStore>,
        documents: Arc<dyn DocumentStore>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> anyhow::Result<Self> {
        let auth = AuthService::new(&config.auth, users.clone(), notifier)?;
        let user_service = UserService::new(
            users,
            documents.clone(),
            auth.hasher().clone(),
            auth.policy(),
        );

        Ok(Self {
            config: Arc::new(config),
            guard: auth.guard(),
            auth,
            users: user_service,
            documents: DocumentService::new(documents),
        })
    }
}

/// A single route declaration
pub struct RouteSpec {
    pub path: &'static str,
    pub handler: MethodRouter<AppState>,
    pub access: RouteAccess,
}

fn spec(path: &'static str, handler: MethodRouter<AppState>, access: RouteAccess) -> RouteSpec {
    RouteSpec {
        path,
        handler,
        access,
    }
}

/// Every route the server exposes, with its access requirement
///
/// ```text
/// /health                              public
/// /v1/auth/register|login              public
/// /v1/auth/forgot-password             public
/// /v1/auth/reset-password              public
/// /v1/auth/profile|refresh             authenticated
/// /v1/auth/change-password             authenticated
/// /v1/users/profile|password           authenticated
/// /v1/users (GET), /search, /count     ADMIN or MODERATOR
/// /v1/users/:id (GET)                  ADMIN or MODERATOR
/// /v1/users (POST), /:id writes        ADMIN
/// /v1/documents/...                    authenticated + ownership
/// ```
pub fn route_table() -> Vec<RouteSpec> {
    use routes::{auth, documents, health, users};

    vec![
        spec("/health", get(health::health_check), PUBLIC),
        // Auth
        spec("/v1/auth/register", post(auth::register), PUBLIC),
        spec("/v1/auth/login", post(auth::login), PUBLIC),
        spec("/v1/auth/forgot-password", post(auth::forgot_password), PUBLIC),
        spec("/v1/auth/reset-password", post(auth::reset_password), PUBLIC),
        spec("/v1/auth/profile", get(auth::profile), AUTHENTICATED),
        spec("/v1/auth/refresh", post(auth::refresh), AUTHENTICATED),
        spec("/v1/auth/change-password", post(auth::change_password), AUTHENTICATED),
        // Users: self-service
        spec("/v1/users/profile", get(users::get_profile), AUTHENTICATED),
        spec("/v1/users/profile", patch(users::update_profile), AUTHENTICATED),
        spec("/v1/users/password", put(users::change_password), AUTHENTICATED),
        // Users: administration
        spec("/v1/users", get(users::list_users), STAFF),
        spec("/v1/users", post(users::create_user), ADMIN),
        spec("/v1/users/search", get(users::search_users), STAFF),
        spec("/v1/users/count", get(users::count_users), STAFF),
        spec("/v1/users/:id", get(users::get_user), STAFF),
        spec("/v1/users/:id", patch(users::update_user), ADMIN),
        spec("/v1/users/:id", delete(users::delete_user), ADMIN),
        spec("/v1/users/:id/roles", put(users::set_roles), ADMIN),
        spec("/v1/users/:id/activate", put(users::activate_user), ADMIN),
        spec("/v1/users/:id/deactivate", put(users::deactivate_user), ADMIN),
        // Documents
        spec("/v1/documents", post(documents::create_document), AUTHENTICATED),
        spec("/v1/documents", get(documents::list_documents), AUTHENTICATED),
        spec("/v1/documents/batch", delete(documents::delete_documents), AUTHENTICATED),
        spec("/v1/documents/:id", get(documents::get_document), AUTHENTICATED),
        spec("/v1/documents/:id", put(documents::update_document), AUTHENTICATED),
        spec("/v1/documents/:id", delete(documents::delete_document), AUTHENTICATED),
    ]
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. CORS (tower-http CorsLayer)
/// 2. Logging (tower-http TraceLayer)
/// 3. Authentication, then role check (per protected route)
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new();

    for route in route_table() {
        let handler = match route.access {
            RouteAccess::Public => route.handler,
            RouteAccess::Protected(roles) => route
                .handler
                .layer(from_fn_with_state(roles, require_roles))
                .layer(from_fn_with_state(state.clone(), authenticate)),
        };
        router = router.route(route.path, handler);
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_public_routes_are_the_expected_set() {
        let public: HashSet<&str> = route_table()
            .into_iter()
            .filter(|r| !r.access.requires_authentication())
            .map(|r| r.path)
            .collect();

        let expected: HashSet<&str> = [
            "/health",
            "/v1/auth/register",
            "/v1/auth/login",
            "/v1/auth/forgot-password",
            "/v1/auth/reset-password",
        ]
        .into_iter()
        .collect();

        assert_eq!(public, expected);
    }

    #[test]
    fn test_user_writes_require_admin() {
        for route in route_table() {
            if route.path.starts_with("/v1/users/:id/") {
                assert_eq!(route.access, ADMIN, "{}", route.path);
            }
        }
    }
}
