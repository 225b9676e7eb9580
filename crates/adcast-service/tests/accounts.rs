//! Account management integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

// ============================================================================
// Account Creation
// ============================================================================

#[tokio::test]
async fn create_account_success() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], harness.test_user_id.to_string());
    assert_eq!(body["balance"], 0);
    assert_eq!(body["tier"], "free");
}

#[tokio::test]
async fn create_account_grants_tier_and_signup_bonus() {
    let harness = TestHarness::with_config(|config| config.credit_policy.signup_bonus = 20);

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "tier": "professional" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 220);
    assert_eq!(body["lifetime_granted"], 220);
    assert_eq!(body["tier"], "professional");
}

#[tokio::test]
async fn create_account_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.post("/v1/accounts").json(&json!({})).await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn create_account_with_forged_token_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", "Bearer not-a-jwt")
        .json(&json!({}))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn create_account_duplicate_fails() {
    let harness = TestHarness::new();

    harness.open_account("free").await;

    let response = harness
        .server
        .post("/v1/accounts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

// ============================================================================
// Get Account
// ============================================================================

#[tokio::test]
async fn get_account_success() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;

    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], harness.test_user_id.to_string());
    assert_eq!(body["balance"], 50);
}

#[tokio::test]
async fn get_account_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}
