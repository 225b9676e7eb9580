//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Readiness of the service and its dependencies.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every required dependency is usable, `degraded` otherwise.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// `ok` or `error`, from a read against the store.
    pub store: &'static str,
    /// Whether a reasoning credential is configured. Campaigns fall back without one.
    pub reasoning_configured: bool,
    /// Whether commit-mode exports can be authorized.
    pub commit_exports_enabled: bool,
    /// Providers with an export adapter.
    pub providers: Vec<&'static str>,
}

/// Health check endpoint.
///
/// Returns 503 when the store cannot be read; the reasoning service is optional.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let store_ready = state.workflow.store_ready();
    let status = if store_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if store_ready { "ok" } else { "degraded" },
        service: "adcast",
        version: env!("CARGO_PKG_VERSION"),
        store: if store_ready { "ok" } else { "error" },
        reasoning_configured: state.workflow.reasoning_configured(),
        commit_exports_enabled: state.workflow.commit_enabled(),
        providers: state
            .workflow
            .providers()
            .into_iter()
            .map(|p| p.as_str())
            .collect(),
    };
    (status, Json(body))
}
