//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, campaigns, catalog, credits, health};
use crate::state::AppState;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Maximum concurrent campaign generation and export requests.
/// These hold reasoning and provider calls open for a long time.
const CAMPAIGN_MAX_CONCURRENT_REQUESTS: usize = 10;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Readiness: store reachability, reasoning and provider setup
/// - `GET /v1/platforms` - Plannable platforms and which can be exported to
/// - `GET /v1/export-formats` - Download formats
/// - `GET /v1/credits/packages` - Purchasable credit packages
///
/// ## Accounts (JWT auth)
/// - `POST /v1/accounts` - Open an account
/// - `GET /v1/accounts/me` - Get current user's account
///
/// ## Credits (JWT auth, admin key where noted)
/// - `GET /v1/credits/balance` - Balance with low-balance flag and top-up hint
/// - `POST /v1/credits/check` - Check a balance without changing it
/// - `GET /v1/credits/usage` - List usage history
/// - `GET /v1/credits/transactions` - List transaction history
/// - `POST /v1/credits/purchases` - Start a purchase
/// - `POST /v1/credits/purchases/:id/complete` - Complete a purchase (admin)
/// - `POST /v1/credits/purchases/:id/fail` - Fail a purchase (admin)
/// - `POST /v1/credits/purchases/:id/refund` - Refund a purchase (admin)
/// - `POST /v1/credits/bonus` - Grant bonus credits (admin)
///
/// ## Campaigns (JWT auth, rate-limited)
/// - `POST /v1/campaigns` - Generate a campaign
/// - `GET /v1/campaigns` - List campaigns
/// - `GET /v1/campaigns/:id` - Get a campaign
/// - `GET /v1/campaigns/:id/feeds` - List platform feeds
/// - `GET /v1/campaigns/:id/feeds/:platform` - Get one platform feed
/// - `GET /v1/campaigns/:id/download` - Download the campaign package (JSON attachment)
/// - `POST /v1/campaigns/:id/export` - Export a campaign
/// - `GET /v1/campaigns/:id/exports` - List export attempts
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let campaign_routes = Router::new()
        .route(
            "/",
            post(campaigns::create_campaign).get(campaigns::list_campaigns),
        )
        .route("/:id", get(campaigns::get_campaign))
        .route("/:id/feeds", get(campaigns::list_feeds))
        .route("/:id/feeds/:platform", get(campaigns::get_feed))
        .route("/:id/download", get(campaigns::download_campaign))
        .route("/:id/export", post(campaigns::export_campaign))
        .route("/:id/exports", get(campaigns::list_exports))
        .layer(ConcurrencyLimitLayer::new(CAMPAIGN_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Catalog
        .route("/platforms", get(catalog::platforms))
        .route("/export-formats", get(catalog::export_formats))
        .route("/credits/packages", get(catalog::list_credit_packages))
        // Accounts
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/me", get(accounts::get_account))
        // Credits
        .route("/credits/balance", get(credits::get_balance))
        .route("/credits/check", post(credits::check_balance))
        .route("/credits/usage", get(credits::list_usage))
        .route("/credits/transactions", get(credits::list_transactions))
        .route("/credits/purchases", post(credits::create_purchase))
        .route(
            "/credits/purchases/:id/complete",
            post(credits::complete_purchase),
        )
        .route("/credits/purchases/:id/fail", post(credits::fail_purchase))
        .route(
            "/credits/purchases/:id/refund",
            post(credits::refund_purchase),
        )
        .route("/credits/bonus", post(credits::add_bonus))
        // Campaigns (with their own concurrency limit)
        .nest("/campaigns", campaign_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
