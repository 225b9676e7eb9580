//! Campaign generation and export handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use adcast_core::{
    CampaignId, CampaignInput, CampaignSpec, ExportAttempt, ExportMode, PlatformFeed,
};

use super::PageQuery;
use crate::auth::{AuthUser, OperatorKey};
use crate::error::ApiError;
use crate::state::AppState;
use crate::workflow::ExportOutcome;

fn parse_campaign_id(id: &str) -> Result<CampaignId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid campaign id: {id}")))
}

/// Generated campaign response.
#[derive(Debug, Serialize)]
pub struct CreateCampaignResponse {
    /// The persisted campaign.
    pub campaign: CampaignSpec,
    /// Credits deducted for generation.
    pub credits_charged: i64,
    /// Balance after the deduction.
    pub balance: i64,
}

/// Generate a campaign from a product brief.
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(input): Json<CampaignInput>,
) -> Result<(StatusCode, Json<CreateCampaignResponse>), ApiError> {
    let before = state.ledger.account(&auth.user_id)?.balance;
    let campaign = state.workflow.generate(&auth.user_id, input).await?;
    let balance = state.ledger.account(&auth.user_id)?.balance;

    tracing::info!(
        user_id = %auth.user_id,
        campaign_id = %campaign.id,
        "Campaign generated"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateCampaignResponse {
            campaign,
            credits_charged: before - balance,
            balance,
        }),
    ))
}

/// Campaign list response.
#[derive(Debug, Serialize)]
pub struct ListCampaignsResponse {
    /// Campaigns (newest first).
    pub campaigns: Vec<CampaignSpec>,
    /// Whether there are more campaigns.
    pub has_more: bool,
}

/// List the caller's campaigns.
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListCampaignsResponse>, ApiError> {
    let limit = query.capped_limit();
    let mut campaigns = state
        .workflow
        .campaigns(&auth.user_id, limit + 1, query.offset)?;
    let has_more = campaigns.len() > limit;
    campaigns.truncate(limit);

    Ok(Json(ListCampaignsResponse {
        campaigns,
        has_more,
    }))
}

/// Get one of the caller's campaigns.
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CampaignSpec>, ApiError> {
    let campaign_id = parse_campaign_id(&id)?;
    Ok(Json(state.workflow.campaign(&auth.user_id, &campaign_id)?))
}

/// Feed list response.
#[derive(Debug, Serialize)]
pub struct ListFeedsResponse {
    /// One feed per requested platform, in request order.
    pub feeds: Vec<PlatformFeed>,
}

/// List the platform feeds of one of the caller's campaigns.
pub async fn list_feeds(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ListFeedsResponse>, ApiError> {
    let campaign_id = parse_campaign_id(&id)?;
    let campaign = state.workflow.campaign(&auth.user_id, &campaign_id)?;
    Ok(Json(ListFeedsResponse {
        feeds: campaign.feeds,
    }))
}

/// Get the feed for one platform of one of the caller's campaigns.
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((id, platform)): Path<(String, String)>,
) -> Result<Json<PlatformFeed>, ApiError> {
    let campaign_id = parse_campaign_id(&id)?;
    Ok(Json(state.workflow.feed(&auth.user_id, &campaign_id, &platform)?))
}

/// Download the complete campaign package as a JSON attachment.
pub async fn download_campaign(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let campaign_id = parse_campaign_id(&id)?;
    let package = state.workflow.package(&auth.user_id, &campaign_id)?;

    tracing::info!(
        user_id = %auth.user_id,
        campaign_id = %campaign_id,
        feeds = package.platform_feeds.len(),
        "Campaign package downloaded"
    );

    let disposition = format!("attachment; filename=\"{}\"", package.file_name());
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(package)))
}

/// Export request.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    /// Providers to export to (default: the campaign's platforms).
    #[serde(default)]
    pub providers: Vec<String>,
    /// Export mode (default: preview).
    #[serde(default = "default_mode")]
    pub mode: ExportMode,
}

const fn default_mode() -> ExportMode {
    ExportMode::Preview
}

/// Export a campaign to ad providers.
///
/// Commit mode needs the `x-export-admin-key` header.
pub async fn export_campaign(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    OperatorKey(operator_key): OperatorKey,
    Path(id): Path<String>,
    Json(body): Json<ExportRequest>,
) -> Result<Json<ExportOutcome>, ApiError> {
    let campaign_id = parse_campaign_id(&id)?;

    tracing::info!(
        user_id = %auth.user_id,
        campaign_id = %campaign_id,
        mode = %body.mode.as_str(),
        providers = ?body.providers,
        "Export requested"
    );

    let outcome = state
        .workflow
        .export(
            &auth.user_id,
            &campaign_id,
            &body.providers,
            body.mode,
            operator_key.as_deref(),
        )
        .await?;
    Ok(Json(outcome))
}

/// Export attempt list response.
#[derive(Debug, Serialize)]
pub struct ListExportsResponse {
    /// Attempts (newest first).
    pub attempts: Vec<ExportAttempt>,
}

/// List recorded export attempts for a campaign.
pub async fn list_exports(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListExportsResponse>, ApiError> {
    let campaign_id = parse_campaign_id(&id)?;
    let attempts = state
        .workflow
        .export_attempts(&auth.user_id, &campaign_id, query.capped_limit())?;
    Ok(Json(ListExportsResponse { attempts }))
}
