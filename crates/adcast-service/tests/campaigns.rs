//! Campaign generation and export integration tests.

mod common;

use axum::http::StatusCode;
use common::{campaign_input, TestHarness, OPERATOR_KEY};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adcast_reasoner::RetryPolicy;

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn generate_campaign_charges_and_uses_fallback_content() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;

    let body = harness.generate_campaign(&["facebook", "tiktok"]).await;

    assert_eq!(body["credits_charged"], 15);
    assert_eq!(body["balance"], 35);
    let campaign = &body["campaign"];
    assert!(campaign["id"].as_str().unwrap().starts_with("campaign_aurora_watch_"));
    assert_eq!(campaign["user_id"], harness.test_user_id.to_string());
    assert_eq!(campaign["insights"]["source"], "fallback");
    assert!(campaign["insights"]["age_min"].as_u64().unwrap() >= 30);

    let usage: Value = harness
        .server
        .get("/v1/credits/usage")
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert_eq!(usage["usage"].as_array().unwrap().len(), 1);
    assert_eq!(usage["usage"][0]["action"], "campaign_generation");
    assert_eq!(usage["usage"][0]["credits_used"], 15);
    assert_eq!(usage["usage"][0]["campaign_id"], campaign["id"]);
}

#[tokio::test]
async fn rate_limited_reasoning_falls_back_after_retries() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock)
        .await;

    let base_url = mock.uri();
    let harness = TestHarness::with_config(move |config| {
        config.reasoning.api_key = Some("test-key".into());
        config.reasoning.base_url = base_url;
        config.reasoning.retry = RetryPolicy::immediate(3);
    });
    harness.open_account("starter").await;

    let body = harness.generate_campaign(&["facebook"]).await;

    let insights = &body["campaign"]["insights"];
    assert_eq!(insights["source"], "fallback");
    assert!(insights["age_min"].as_u64().unwrap() >= 30);
    assert!(!insights["interests"].as_array().unwrap().is_empty());
    assert_eq!(body["credits_charged"], 10);

    // Insights and strategy each exhaust their attempts
    let requests = mock.received_requests().await.unwrap();
    assert_eq!(requests.len(), 6);
}

#[tokio::test]
async fn insufficient_credits_is_payment_required_and_charges_nothing() {
    let harness = TestHarness::new();
    harness.open_account("free").await;

    let response = harness
        .server
        .post("/v1/campaigns")
        .add_header("authorization", harness.user_auth_header())
        .json(&campaign_input(&["facebook"]))
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["required"], 10);
    assert_eq!(body["error"]["details"]["shortage"], 10);

    let usage: Value = harness
        .server
        .get("/v1/credits/usage")
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert!(usage["usage"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_input_is_bad_request() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;

    let mut input = campaign_input(&["facebook"]);
    input["product_description"] = json!("short");
    input["campaign_days"] = json!(0);

    let response = harness
        .server
        .post("/v1/campaigns")
        .add_header("authorization", harness.user_auth_header())
        .json(&input)
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("product_description"));
    assert!(message.contains("campaign_days"));
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn campaigns_are_private_to_their_owner() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["tiktok"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    let response = harness
        .server
        .get(&format!("/v1/campaigns/{id}"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let campaign: Value = response.json();
    assert_eq!(campaign["id"], id);

    harness
        .server
        .get(&format!("/v1/campaigns/{id}"))
        .add_header("authorization", TestHarness::other_user_auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    harness
        .server
        .get("/v1/campaigns/campaign_missing")
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn list_campaigns_paginates() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;
    harness.generate_campaign(&["tiktok"]).await;
    harness.generate_campaign(&["tiktok"]).await;

    let response = harness
        .server
        .get("/v1/campaigns")
        .add_header("authorization", harness.user_auth_header())
        .add_query_param("limit", 1)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["campaigns"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_more"], true);
}

// ============================================================================
// Feeds and Download
// ============================================================================

#[tokio::test]
async fn feeds_are_generated_per_platform() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["facebook", "linkedin"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    let response = harness
        .server
        .get(&format!("/v1/campaigns/{id}/feeds"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let feeds: Value = response.json();
    let feeds = feeds["feeds"].as_array().unwrap();
    assert_eq!(feeds.len(), 2);
    assert_eq!(feeds[0]["platform"], "facebook");
    assert_eq!(feeds[0]["supported"], true);
    assert_eq!(feeds[0]["daily_budget_minor"], 2_500);
    assert_eq!(feeds[0]["targeting"]["publisher_platforms"], json!(["facebook"]));
    assert_eq!(feeds[1]["supported"], false);
    assert_eq!(feeds[1]["error"], "Platform 'linkedin' not supported yet.");

    let response = harness
        .server
        .get(&format!("/v1/campaigns/{id}/feeds/Facebook"))
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let feed: Value = response.json();
    assert_eq!(feed["platform"], "facebook");

    harness
        .server
        .get(&format!("/v1/campaigns/{id}/feeds/tiktok"))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_not_found();

    harness
        .server
        .get(&format!("/v1/campaigns/{id}/feeds"))
        .add_header("authorization", TestHarness::other_user_auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn download_returns_package_as_attachment() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["google", "tiktok"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    let response = harness
        .server
        .get(&format!("/v1/campaigns/{id}/download"))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header("content-disposition"),
        format!("attachment; filename=\"{id}_campaign.json\"")
    );
    let package: Value = response.json();
    assert_eq!(package["metadata"]["campaign_id"], id);
    assert_eq!(package["metadata"]["version"], "1.0");
    assert_eq!(package["metadata"]["status"], "ready_for_review");
    assert_eq!(package["export_summary"]["total_platforms"], 2);
    assert_eq!(package["export_summary"]["total_daily_budget_minor"], 5_000);
    assert_eq!(package["validation_results"]["google"]["valid"], true);
    assert_eq!(
        package["download_links"]["complete_package"],
        format!("/v1/campaigns/{id}/download")
    );
    assert_eq!(
        package["download_links"]["individual_feeds"]["tiktok"],
        format!("/v1/campaigns/{id}/feeds/tiktok")
    );
    assert_eq!(package["platform_feeds"]["google"]["platform"], "google");
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn preview_export_reports_every_requested_provider() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["facebook"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    let response = harness
        .server
        .post(&format!("/v1/campaigns/{id}/export"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "providers": ["TikTok", "myspace"], "mode": "preview" }))
        .await;

    response.assert_status_ok();
    let outcome: Value = response.json();
    let results = outcome["results"].as_object().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(outcome["results"]["tiktok"]["status"], "success");
    assert_eq!(outcome["results"]["myspace"]["status"], "skipped");
    assert_eq!(outcome["credits_charged"], 0);

    let campaign: Value = harness
        .server
        .get(&format!("/v1/campaigns/{id}"))
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert_eq!(campaign["export"]["providers"]["tiktok"]["status"], "success");
    assert!(campaign["export"]["providers"].get("myspace").is_none());
    assert_eq!(campaign["export"]["history"].as_array().unwrap().len(), 1);

    let attempts: Value = harness
        .server
        .get(&format!("/v1/campaigns/{id}/exports"))
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert_eq!(attempts["attempts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn export_without_providers_uses_campaign_platforms() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["facebook", "linkedin"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    let response = harness
        .server
        .post(&format!("/v1/campaigns/{id}/export"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;

    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["mode"], "preview");
    assert_eq!(outcome["results"]["facebook"]["status"], "success");
    assert_eq!(outcome["results"]["linkedin"]["status"], "skipped");
}

#[tokio::test]
async fn commit_export_is_forbidden_when_real_ads_are_disabled() {
    let harness = TestHarness::with_config(|config| {
        config.export_admin_key = Some(OPERATOR_KEY.into());
        config.credit_policy.commit_export_cost = 5;
    });
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["tiktok"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    let response = harness
        .server
        .post(&format!("/v1/campaigns/{id}/export"))
        .add_header("authorization", harness.user_auth_header())
        .add_header("x-export-admin-key", OPERATOR_KEY)
        .json(&json!({ "mode": "commit" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    let campaign: Value = harness
        .server
        .get(&format!("/v1/campaigns/{id}"))
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert!(campaign["export"]["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn commit_export_requires_operator_key() {
    let harness = TestHarness::with_config(|config| {
        config.allow_real_ads = true;
        config.export_admin_key = Some(OPERATOR_KEY.into());
    });
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["tiktok"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    harness
        .server
        .post(&format!("/v1/campaigns/{id}/export"))
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "mode": "commit" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    harness
        .server
        .post(&format!("/v1/campaigns/{id}/export"))
        .add_header("authorization", harness.user_auth_header())
        .add_header("x-export-admin-key", "wrong-key")
        .json(&json!({ "mode": "commit" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn commit_export_without_progress_is_refunded() {
    let harness = TestHarness::with_config(|config| {
        config.allow_real_ads = true;
        config.export_admin_key = Some(OPERATOR_KEY.into());
        config.credit_policy.commit_export_cost = 5;
    });
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["tiktok"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    // No provider credentials are configured, so the adapter cannot begin
    let response = harness
        .server
        .post(&format!("/v1/campaigns/{id}/export"))
        .add_header("authorization", harness.user_auth_header())
        .add_header("x-export-admin-key", OPERATOR_KEY)
        .json(&json!({ "mode": "commit" }))
        .await;

    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["results"]["tiktok"]["status"], "error");
    assert_eq!(outcome["credits_charged"], 5);
    assert_eq!(outcome["credits_refunded"], 5);

    let balance: Value = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert_eq!(balance["balance"], 40);
}

#[tokio::test]
async fn export_by_another_user_is_forbidden() {
    let harness = TestHarness::new();
    harness.open_account("starter").await;
    let body = harness.generate_campaign(&["tiktok"]).await;
    let id = body["campaign"]["id"].as_str().unwrap();

    harness
        .server
        .post(&format!("/v1/campaigns/{id}/export"))
        .add_header("authorization", TestHarness::other_user_auth_header())
        .json(&json!({ "providers": ["tiktok"] }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
