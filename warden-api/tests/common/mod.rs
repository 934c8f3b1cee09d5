//! Common test utilities for integration tests
//!
//! Builds the full router over in-memory stores with a cheap Argon2 cost and
//! a notifier that captures reset tokens, and drives it through
//! `tower::ServiceExt::oneshot` without opening a socket.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;
use warden_api::app::{build_router, AppState};
use warden_api::config::Config;
use warden_shared::config::{AuthConfig, HashCost};
use warden_shared::models::user::{Role, User};
use warden_shared::services::auth::{NotifyError, ResetNotifier};
use warden_shared::services::users::CreateUserInput;
use warden_shared::store::memory::{MemoryCredentialStore, MemoryDocumentStore};

pub const PASSWORD: &str = "correct-horse";

/// Captures reset tokens instead of delivering them
#[derive(Default)]
pub struct CapturingNotifier {
    tokens: Mutex<Vec<(Uuid, String)>>,
}

impl CapturingNotifier {
    pub async fn last_token(&self) -> Option<String> {
        self.tokens.lock().await.last().map(|(_, t)| t.clone())
    }

    pub async fn count(&self) -> usize {
        self.tokens.lock().await.len()
    }
}

#[async_trait]
impl ResetNotifier for CapturingNotifier {
    async fn send_reset_token(&self, user: &User, token: &str) -> Result<(), NotifyError> {
        self.tokens.lock().await.push((user.id, token.to_string()));
        Ok(())
    }
}

/// Response status plus raw and parsed body
pub struct TestResponse {
    pub status: StatusCode,
    pub bytes: Vec<u8>,
    pub json: Value,
}

/// Test context containing the router and its collaborators
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub documents: Arc<MemoryDocumentStore>,
    pub notifier: Arc<CapturingNotifier>,
}

impl TestContext {
    pub fn new() -> Self {
        let mut auth = AuthConfig::new("test-secret-key-at-least-32-bytes-long");
        auth.hash_cost = HashCost {
            memory_kib: 8192,
            iterations: 1,
            parallelism: 1,
        };

        let documents = Arc::new(MemoryDocumentStore::new());
        let notifier = Arc::new(CapturingNotifier::default());

        let state = AppState::new(
            Config::new(auth),
            Arc::new(MemoryCredentialStore::new()),
            documents.clone(),
            notifier.clone(),
        )
        .expect("Failed to build app state");

        Self {
            app: build_router(state.clone()),
            state,
            documents,
            notifier,
        }
    }

    /// Sends a request with an optional bearer token and JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body")
            .to_vec();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, bytes, json }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers through the API and returns `(user id, access token)`
    pub async fn register(&self, email: &str) -> (Uuid, String) {
        let res = self
            .post(
                "/v1/auth/register",
                None,
                serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.json);

        token_and_id(&res.json)
    }

    /// Logs in through the API
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post(
            "/v1/auth/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Creates an account with `roles` directly through the service and logs in
    pub async fn user_with_roles(&self, email: &str, roles: Vec<Role>) -> (Uuid, String) {
        self.state
            .users
            .create_user(CreateUserInput {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                full_name: None,
                roles,
            })
            .await
            .expect("Failed to create user");

        let res = self.login(email, PASSWORD).await;
        assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.json);

        token_and_id(&res.json)
    }

    /// Creates a document through the API and returns its id
    pub async fn create_document(&self, token: &str, title: &str) -> Uuid {
        let res = self
            .post("/v1/documents", Some(token), serde_json::json!({ "title": title }))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.json);

        parse_id(&res.json["id"])
    }
}

fn parse_id(value: &Value) -> Uuid {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("missing id")
}

fn token_and_id(json: &Value) -> (Uuid, String) {
    let token = json["access_token"]
        .as_str()
        .expect("missing access_token")
        .to_string();
    (parse_id(&json["user"]["id"]), token)
}
