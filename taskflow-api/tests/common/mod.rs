/// Common test utilities for integration tests
///
/// Builds the full router on top of an in-memory store, so the suite needs no
/// database. Passwords use cheap Argon2 parameters to keep the suite fast.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use taskflow_api::app::{build_router, AppState};
use taskflow_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskflow_shared::auth::jwt::{TokenConfig, TokenService};
use taskflow_shared::auth::password::PasswordService;
use taskflow_shared::models::{CreateUser, SystemRole};
use taskflow_shared::store::{MemoryStore, Store};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// A signed-in test user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Test context containing the router and its backing store
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_production(false)
    }

    pub fn with_production(production: bool) -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production,
            },
            database: DatabaseConfig {
                url: "postgresql://unused".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: TEST_SECRET.to_string(),
            },
        };

        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(TokenConfig::new(TEST_SECRET)).unwrap();
        let passwords = PasswordService::with_params(1024, 1, 1).unwrap();

        let state = AppState::new(
            store.clone() as Arc<dyn Store>,
            tokens.clone(),
            passwords,
            config,
        );

        Self {
            store,
            tokens,
            app: build_router(state),
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Empty bodies come back as `Value::Null`; non-JSON bodies as a string.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user through the API
    pub async fn register(&self, email: &str, name: &str) -> TestUser {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": "correct horse battery staple",
                    "name": name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email: email.to_string(),
            access_token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Inserts a system admin directly into the store and signs it in
    pub async fn create_admin(&self, email: &str) -> TestUser {
        let user = self
            .store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "unused".to_string(),
                name: "Admin".to_string(),
                system_role: SystemRole::Admin,
            })
            .await
            .unwrap();
        let pair = self.tokens.issue_pair(user.id).unwrap();

        TestUser {
            id: user.id,
            email: email.to_string(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }

    /// Creates a project as `owner` and returns its id
    pub async fn create_project(&self, owner: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/api/projects",
                &owner.access_token,
                serde_json::json!({ "name": name, "description": "" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Invites `invitee` with `role` as `inviter`, asserting success
    pub async fn invite(&self, inviter: &TestUser, project_id: Uuid, invitee: &TestUser, role: &str) {
        let (status, body) = self
            .post(
                &format!("/api/projects/{}/invite", project_id),
                &inviter.access_token,
                serde_json::json!({ "email": invitee.email, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "invite failed: {}", body);
    }
}
