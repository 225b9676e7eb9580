//! Common test utilities for adcast integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::TempDir;

use adcast_core::{CreditPolicy, UserId};
use adcast_reasoner::ReasoningConfig;
use adcast_service::auth::JwtClaims;
use adcast_service::{create_router, AppState, ServiceConfig};
use adcast_store::MemoryStore;

/// Secret used to sign session tokens in tests.
pub const JWT_SECRET: &str = "test-jwt-secret";

/// Admin key accepted by the test server.
pub const ADMIN_KEY: &str = "test-admin-key";

/// Operator key accepted for commit exports.
pub const OPERATOR_KEY: &str = "test-operator-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for diagnostics (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh store and fallback-only reasoning.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness whose config is adjusted before the server is built.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            jwt_secret: Some(JWT_SECRET.into()),
            admin_api_key: Some(ADMIN_KEY.into()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            credit_policy: CreditPolicy::default(),
            reasoning: ReasoningConfig {
                diagnostics_dir: Some(temp_dir.path().join("diagnostics")),
                ..ReasoningConfig::default()
            },
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        auth_header_for(&self.test_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        auth_header_for(&UserId::generate())
    }

    /// Open an account for the test user.
    pub async fn open_account(&self, tier: &str) {
        self.server
            .post("/v1/accounts")
            .add_header("authorization", self.user_auth_header())
            .json(&json!({ "tier": tier }))
            .await
            .assert_status_ok();
    }

    /// Generate a campaign for the test user and return the response body.
    pub async fn generate_campaign(&self, platforms: &[&str]) -> Value {
        let response = self
            .server
            .post("/v1/campaigns")
            .add_header("authorization", self.user_auth_header())
            .json(&campaign_input(platforms))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a valid session token for `user_id`.
pub fn auth_header_for(user_id: &UserId) -> String {
    let claims = JwtClaims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: Some(chrono::Utc::now().timestamp()),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token");
    format!("Bearer {token}")
}

/// A valid campaign brief for a luxury product.
pub fn campaign_input(platforms: &[&str]) -> Value {
    json!({
        "product_name": "Aurora Watch",
        "product_description": "A handcrafted smartwatch with sapphire glass",
        "category": "luxury",
        "price_range": "luxury",
        "platforms": platforms,
        "target_location": ["US"],
        "daily_budget": 50.0,
        "campaign_days": 10,
        "call_to_action": "Shop Now"
    })
}
