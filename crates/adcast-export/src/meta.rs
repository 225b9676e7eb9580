//! Meta Graph API adapter, used for both Facebook and Instagram placements.
//!
//! Commit creates `campaign → adset → creative → ad` under one ad account. Everything is
//! created `PAUSED`. Budgets are sent in minor units (cents).

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use adcast_core::{CampaignSpec, ProviderResult};

use crate::adapter::{
    idempotency_key, not_ready, preview_result, preview_stamp, Provider, ProviderAdapter,
    StepLog,
};
use crate::error::{ProviderApiError, Result};
use crate::http::ProviderHttp;
use crate::targeting::{
    ad_text, call_to_action, clean_interest_name, countries, meta_cta_type, meta_genders,
    to_minor_units, FALLBACK_INTERESTS, MAX_INTEREST_LOOKUPS,
};

/// Default Graph API version.
pub const DEFAULT_GRAPH_VERSION: &str = "v18.0";

/// Default Graph API base URL.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// Default campaign objective.
pub const DEFAULT_OBJECTIVE: &str = "OUTCOME_TRAFFIC";

const STEPS: [&str; 4] = ["campaign", "adset", "creative", "ad"];

// =============================================================================
// Configuration
// =============================================================================

/// Meta credentials and account settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    /// Graph API access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Ad account, with or without the `act_` prefix. Discovered when absent.
    #[serde(default)]
    pub ad_account_id: Option<String>,
    /// Page that owns the creatives. Discovered when absent.
    #[serde(default)]
    pub page_id: Option<String>,
    /// Graph API version.
    #[serde(default = "default_graph_version")]
    pub graph_version: String,
    /// Graph API base URL.
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
}

fn default_graph_version() -> String {
    DEFAULT_GRAPH_VERSION.to_string()
}

fn default_graph_base_url() -> String {
    DEFAULT_GRAPH_BASE_URL.to_string()
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            ad_account_id: None,
            page_id: None,
            graph_version: default_graph_version(),
            base_url: default_graph_base_url(),
        }
    }
}

impl fmt::Debug for MetaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .field("ad_account_id", &self.ad_account_id)
            .field("page_id", &self.page_id)
            .field("graph_version", &self.graph_version)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Add the `act_` prefix if missing.
#[must_use]
pub fn normalize_account_id(id: &str) -> String {
    let id = id.trim();
    if id.starts_with("act_") {
        id.to_string()
    } else {
        format!("act_{id}")
    }
}

/// A resolved Meta interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    /// Meta interest ID.
    pub id: String,
    /// Display name.
    pub name: String,
}

fn fallback_interests() -> Vec<Interest> {
    FALLBACK_INTERESTS
        .iter()
        .map(|(id, name)| Interest {
            id: (*id).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}

/// The four request bodies, with placeholders where a previous step's ID goes.
#[derive(Debug, Clone)]
struct MetaPayload {
    campaign: Value,
    adset: Value,
    creative: Value,
    ad: Value,
    cta_type: &'static str,
    interests: Vec<Interest>,
}

// =============================================================================
// Adapter
// =============================================================================

/// Meta adapter for one placement family.
#[derive(Debug, Clone)]
pub struct MetaAdapter {
    provider: Provider,
    config: MetaConfig,
    http: ProviderHttp,
}

impl MetaAdapter {
    /// Adapter with Facebook placements.
    #[must_use]
    pub fn facebook(config: MetaConfig, http: ProviderHttp) -> Self {
        Self {
            provider: Provider::Facebook,
            config,
            http,
        }
    }

    /// Adapter with Instagram placements.
    #[must_use]
    pub fn instagram(config: MetaConfig, http: ProviderHttp) -> Self {
        Self {
            provider: Provider::Instagram,
            config,
            http,
        }
    }

    fn token(&self) -> Option<&str> {
        self.config
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    fn id_prefix(&self) -> &'static str {
        match self.provider {
            Provider::Instagram => "ig",
            _ => "fb",
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.graph_version,
            path.trim_start_matches('/')
        )
    }

    fn headers(token: &str) -> Result<HeaderMap> {
        let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ProviderApiError::MissingCredentials("access token is not a valid header value".into())
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    async fn resolve_account(&self, token: &str) -> Result<String> {
        if let Some(id) = self.config.ad_account_id.as_deref().filter(|s| !s.trim().is_empty()) {
            return Ok(normalize_account_id(id));
        }

        let body = self
            .http
            .get_json(
                &self.url("me/adaccounts"),
                Self::headers(token)?,
                &[("fields", "id,name")],
            )
            .await?;
        let account = body["data"][0]["id"]
            .as_str()
            .or_else(|| body["data"][0]["account_id"].as_str())
            .ok_or_else(|| {
                ProviderApiError::MissingCredentials(
                    "no ad account configured or discoverable".into(),
                )
            })?;

        tracing::info!(provider = %self.provider, account, "Auto-detected ad account");
        Ok(normalize_account_id(account))
    }

    async fn resolve_page(&self, token: Option<&str>) -> Option<String> {
        if let Some(id) = self.config.page_id.as_deref().filter(|s| !s.trim().is_empty()) {
            return Some(id.to_string());
        }
        let token = token?;

        let headers = Self::headers(token).ok()?;
        match self
            .http
            .get_json(&self.url("me/accounts"), headers, &[("fields", "id,name")])
            .await
        {
            Ok(body) => {
                let page = body["data"][0]["id"].as_str().map(str::to_string);
                if let Some(page) = &page {
                    tracing::info!(provider = %self.provider, page = %page, "Auto-detected page");
                }
                page
            }
            Err(err) => {
                tracing::warn!(provider = %self.provider, error = %err, "Failed to auto-detect page");
                None
            }
        }
    }

    async fn search_interest(&self, token: &str, term: &str) -> Option<Interest> {
        let headers = Self::headers(token).ok()?;
        let body = match self
            .http
            .get_json(
                &self.url("search"),
                headers,
                &[("type", "adinterest"), ("q", term), ("limit", "5")],
            )
            .await
        {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(term, error = %err, "Interest search failed");
                return None;
            }
        };

        let hit = &body["data"][0];
        let id = hit["id"]
            .as_str()
            .map(str::to_string)
            .or_else(|| hit["id"].as_u64().map(|n| n.to_string()))?;
        Some(Interest {
            id,
            name: hit["name"].as_str().unwrap_or(term).to_string(),
        })
    }

    /// Resolve interest names to Meta interest IDs, falling back to a static set.
    async fn resolve_interests(&self, token: Option<&str>, interests: &[String]) -> Vec<Interest> {
        let Some(token) = token else {
            return fallback_interests();
        };

        let terms: Vec<String> = interests
            .iter()
            .take(MAX_INTEREST_LOOKUPS)
            .map(|i| clean_interest_name(i))
            .filter(|t| !t.is_empty())
            .collect();
        let hits = join_all(terms.iter().map(|term| self.search_interest(token, term))).await;

        let mut resolved: Vec<Interest> = Vec::new();
        for hit in hits.into_iter().flatten() {
            if !resolved.iter().any(|r| r.id == hit.id) {
                resolved.push(hit);
            }
        }

        if resolved.is_empty() {
            tracing::warn!(provider = %self.provider, "No interests resolved, using fallback interests");
            return fallback_interests();
        }
        resolved
    }

    fn build_payload(
        &self,
        campaign: &CampaignSpec,
        page_id: Option<&str>,
        interests: Vec<Interest>,
    ) -> MetaPayload {
        let name = campaign.input.product_name.as_str();
        let insights = &campaign.insights;
        let cta_type = meta_cta_type(call_to_action(campaign));
        let link = campaign.input.landing_page_url.clone().unwrap_or_default();
        let (headline, body) = ad_text(campaign, 40, 125);

        let mut targeting = json!({
            "age_min": insights.age_min,
            "age_max": insights.age_max,
            "geo_locations": {"countries": countries(campaign)},
        });
        if !interests.is_empty() {
            targeting["flexible_spec"] = json!([{
                "interests": interests
                    .iter()
                    .map(|i| json!({"id": i.id, "name": i.name}))
                    .collect::<Vec<_>>(),
            }]);
        }
        if let Some(genders) = meta_genders(&insights.genders) {
            targeting["genders"] = json!(genders);
        }
        match self.provider {
            Provider::Instagram => {
                targeting["publisher_platforms"] = json!(["instagram"]);
                targeting["instagram_positions"] = json!(["stream", "story", "reels"]);
            }
            _ => {
                targeting["publisher_platforms"] = json!(["facebook"]);
                targeting["facebook_positions"] = json!(["feed"]);
            }
        }

        let objective = campaign.strategy["campaign_objective"]
            .as_str()
            .filter(|o| !o.trim().is_empty())
            .unwrap_or(DEFAULT_OBJECTIVE);

        let mut link_data = json!({
            "message": body,
            "name": headline,
            "link": link,
            "call_to_action": {"type": cta_type, "value": {"link": link}},
        });
        if let Some(image_url) = &campaign.input.image_url {
            link_data["image_url"] = json!(image_url);
        }

        MetaPayload {
            campaign: json!({
                "name": format!("{name} - {}", campaign.created_at.format("%Y-%m-%d %H:%M")),
                "objective": objective,
                "status": "PAUSED",
                "special_ad_categories": [],
            }),
            adset: json!({
                "name": format!("{name} - AdSet"),
                "campaign_id": "<CAMPAIGN_ID>",
                "daily_budget": to_minor_units(campaign.input.daily_budget),
                "billing_event": "IMPRESSIONS",
                "optimization_goal": "LINK_CLICKS",
                "bid_strategy": "LOWEST_COST_WITHOUT_CAP",
                "targeting": targeting,
                "status": "PAUSED",
            }),
            creative: json!({
                "name": format!("{name} - Creative"),
                "object_story_spec": {
                    "page_id": page_id.unwrap_or("<PAGE_ID>"),
                    "link_data": link_data,
                },
            }),
            ad: json!({
                "name": format!("{name} - Ad"),
                "adset_id": "<ADSET_ID>",
                "creative": {"creative_id": "<CREATIVE_ID>"},
                "status": "PAUSED",
            }),
            cta_type,
            interests,
        }
    }

    async fn create(&self, token: &str, account: &str, edge: &str, body: &Value) -> Result<String> {
        let response = self
            .http
            .post_json(
                &self.url(&format!("{account}/{edge}")),
                Self::headers(token)?,
                body,
            )
            .await?;

        response["id"]
            .as_str()
            .map(str::to_string)
            .or_else(|| response["id"].as_u64().map(|n| n.to_string()))
            .ok_or(ProviderApiError::MissingField("id"))
    }

    /// Upload the creative image and return its hash. Failures only degrade the creative.
    async fn upload_image(&self, token: &str, account: &str, image_url: &str) -> Option<String> {
        let headers = Self::headers(token).ok()?;
        match self
            .http
            .post_json(
                &self.url(&format!("{account}/adimages")),
                headers,
                &json!({"url": image_url}),
            )
            .await
        {
            Ok(body) => {
                let hash = body["images"]
                    .as_object()
                    .and_then(|images| images.values().next())
                    .and_then(|image| image["hash"].as_str())
                    .map(str::to_string);
                if hash.is_none() {
                    tracing::warn!(provider = %self.provider, "No image hash returned");
                }
                hash
            }
            Err(err) => {
                tracing::warn!(provider = %self.provider, error = %err, "Image upload failed");
                None
            }
        }
    }
}

fn tag_name(body: &mut Value, key: &str) {
    let tagged = body["name"].as_str().map(|name| format!("{name} [{key}]"));
    if let Some(tagged) = tagged {
        body["name"] = json!(tagged);
    }
}

#[async_trait]
impl ProviderAdapter for MetaAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn preview(&self, campaign: &CampaignSpec) -> ProviderResult {
        let token = self.token();
        let page_id = self.resolve_page(token).await;
        let interests = self
            .resolve_interests(token, &campaign.insights.interests)
            .await;
        let payload = self.build_payload(campaign, page_id.as_deref(), interests);

        let ts = preview_stamp();
        let prefix = self.id_prefix();
        let ids = BTreeMap::from([
            ("campaign_id".to_string(), format!("dry_{prefix}_cmp_{ts}")),
            ("adset_id".to_string(), format!("dry_{prefix}_set_{ts}")),
            ("creative_id".to_string(), format!("dry_{prefix}_crt_{ts}")),
            ("ad_id".to_string(), format!("dry_{prefix}_ad_{ts}")),
        ]);

        let document = json!({
            "campaign": payload.campaign,
            "adset": payload.adset,
            "creative": payload.creative,
            "ad": payload.ad,
            "meta": {
                "ad_account": self.config.ad_account_id.as_deref().map(normalize_account_id),
                "page_id": page_id,
                "interest_mapping": payload.interests,
                "cta_type": payload.cta_type,
                "placement": self.provider,
            },
        });

        preview_result(self.provider, &STEPS, ids, document)
    }

    async fn commit(&self, campaign: &CampaignSpec) -> ProviderResult {
        let Some(token) = self.token() else {
            return not_ready(
                self.provider,
                &ProviderApiError::MissingCredentials("Meta access token not configured".into()),
            );
        };
        let account = match self.resolve_account(token).await {
            Ok(account) => account,
            Err(err) => return not_ready(self.provider, &err),
        };
        let Some(page_id) = self.resolve_page(Some(token)).await else {
            return not_ready(
                self.provider,
                &ProviderApiError::MissingCredentials("no page available for creatives".into()),
            );
        };

        let interests = self
            .resolve_interests(Some(token), &campaign.insights.interests)
            .await;
        let mut payload = self.build_payload(campaign, Some(page_id.as_str()), interests);
        let key = |step: &str| idempotency_key(&campaign.id, self.provider, step);
        let mut log = StepLog::new(self.provider);

        tag_name(&mut payload.campaign, &key("campaign"));
        let campaign_id = match self.create(token, &account, "campaigns", &payload.campaign).await {
            Ok(id) => id,
            Err(err) => return log.failed("campaign", &err),
        };
        log.created("campaign", "campaign_id", &campaign_id);

        payload.adset["campaign_id"] = json!(campaign_id);
        tag_name(&mut payload.adset, &key("adset"));
        let adset_id = match self.create(token, &account, "adsets", &payload.adset).await {
            Ok(id) => id,
            Err(err) => return log.failed("adset", &err),
        };
        log.created("adset", "adset_id", &adset_id);

        if let Some(image_url) = campaign.input.image_url.as_deref() {
            if let Some(hash) = self.upload_image(token, &account, image_url).await {
                let link_data = &mut payload.creative["object_story_spec"]["link_data"];
                if let Some(fields) = link_data.as_object_mut() {
                    fields.remove("image_url");
                    fields.insert("image_hash".into(), json!(hash));
                }
            }
        }
        tag_name(&mut payload.creative, &key("creative"));
        let creative_id = match self
            .create(token, &account, "adcreatives", &payload.creative)
            .await
        {
            Ok(id) => id,
            Err(err) => return log.failed("creative", &err),
        };
        log.created("creative", "creative_id", &creative_id);

        payload.ad["adset_id"] = json!(adset_id);
        payload.ad["creative"] = json!({"creative_id": creative_id});
        tag_name(&mut payload.ad, &key("ad"));
        let ad_id = match self.create(token, &account, "ads", &payload.ad).await {
            Ok(id) => id,
            Err(err) => return log.failed("ad", &err),
        };
        log.created("ad", "ad_id", &ad_id);

        log.finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_campaign;
    use crate::http::DEFAULT_STEP_TIMEOUT;
    use adcast_core::{ExportMode, ExportStatus};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> MetaConfig {
        MetaConfig {
            access_token: Some("fb-token".into()),
            ad_account_id: Some("123".into()),
            page_id: Some("page-1".into()),
            base_url: server.uri(),
            ..MetaConfig::default()
        }
    }

    fn adapter(config: MetaConfig) -> MetaAdapter {
        MetaAdapter::facebook(config, ProviderHttp::new(DEFAULT_STEP_TIMEOUT))
    }

    async fn mount_created(server: &MockServer, edge: &str, id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/v18.0/act_123/{edge}")))
            .and(header("authorization", "Bearer fb-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": id})))
            .mount(server)
            .await;
    }

    async fn mount_search(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v18.0/search"))
            .and(query_param("type", "adinterest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": [{"id": "600111", "name": "Golf"}]})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn account_ids_get_act_prefix() {
        assert_eq!(normalize_account_id("123"), "act_123");
        assert_eq!(normalize_account_id("act_123"), "act_123");
    }

    #[tokio::test]
    async fn preview_without_token_makes_no_calls() {
        let campaign = sample_campaign();
        let result = adapter(MetaConfig::default())
            .export(&campaign, ExportMode::Preview)
            .await;

        assert_eq!(result.status, ExportStatus::Success);
        assert!(result.ids["campaign_id"].starts_with("dry_fb_cmp_"));
        assert!(result.ids["ad_id"].starts_with("dry_fb_ad_"));
        assert_eq!(result.steps["creative"], "Payload generated");

        let payload = result.payload.unwrap();
        assert_eq!(payload["adset"]["daily_budget"], 5_000);
        assert_eq!(payload["adset"]["status"], "PAUSED");
        assert_eq!(payload["adset"]["targeting"]["age_min"], 35);
        assert_eq!(
            payload["adset"]["targeting"]["flexible_spec"][0]["interests"][0]["id"],
            "6003327766874"
        );
        assert_eq!(payload["creative"]["object_story_spec"]["page_id"], "<PAGE_ID>");
        assert_eq!(payload["meta"]["cta_type"], "SHOP_NOW");
        assert_eq!(payload["campaign"]["objective"], DEFAULT_OBJECTIVE);
    }

    #[tokio::test]
    async fn instagram_preview_uses_instagram_placements() {
        let campaign = sample_campaign();
        let adapter = MetaAdapter::instagram(
            MetaConfig::default(),
            ProviderHttp::new(DEFAULT_STEP_TIMEOUT),
        );
        let result = adapter.preview(&campaign).await;

        assert_eq!(result.platform, "instagram");
        assert!(result.ids["campaign_id"].starts_with("dry_ig_cmp_"));
        let payload = result.payload.unwrap();
        assert_eq!(
            payload["adset"]["targeting"]["publisher_platforms"],
            json!(["instagram"])
        );
    }

    #[tokio::test]
    async fn commit_runs_all_steps_in_order() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .and(path("/v18.0/act_123/adimages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"images": {"aurora.png": {"hash": "h4sh"}}})),
            )
            .mount(&server)
            .await;
        mount_created(&server, "campaigns", "c1").await;
        Mock::given(method("POST"))
            .and(path("/v18.0/act_123/adsets"))
            .and(body_partial_json(json!({"campaign_id": "c1", "daily_budget": 5000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "s1"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v18.0/act_123/adcreatives"))
            .and(body_partial_json(
                json!({"object_story_spec": {"page_id": "page-1", "link_data": {"image_hash": "h4sh"}}}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "k1"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v18.0/act_123/ads"))
            .and(body_partial_json(json!({"adset_id": "s1", "creative": {"creative_id": "k1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
            .mount(&server)
            .await;

        let campaign = sample_campaign();
        let result = adapter(config(&server)).commit(&campaign).await;

        assert_eq!(result.status, ExportStatus::Success, "{result:?}");
        assert_eq!(result.ids["campaign_id"], "c1");
        assert_eq!(result.ids["adset_id"], "s1");
        assert_eq!(result.ids["creative_id"], "k1");
        assert_eq!(result.ids["ad_id"], "a1");
        assert_eq!(result.steps["ad"], "Created successfully (ID: a1)");
    }

    #[tokio::test]
    async fn failed_step_stops_the_sequence() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        mount_created(&server, "campaigns", "c1").await;
        Mock::given(method("POST"))
            .and(path("/v18.0/act_123/adsets"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": {"message": "Invalid targeting"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v18.0/act_123/adcreatives"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "k1"})))
            .expect(0)
            .mount(&server)
            .await;

        let mut campaign = sample_campaign();
        campaign.input.image_url = None;
        let result = adapter(config(&server)).commit(&campaign).await;

        assert_eq!(result.status, ExportStatus::PartialSuccess);
        assert_eq!(result.ids["campaign_id"], "c1");
        assert!(!result.ids.contains_key("adset_id"));
        assert!(result.steps["adset"].contains("Invalid targeting"));
        assert!(!result.steps.contains_key("creative"));
    }

    #[tokio::test]
    async fn first_step_failure_is_an_error() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .and(path("/v18.0/act_123/campaigns"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"message": "Invalid OAuth access token"}})),
            )
            .mount(&server)
            .await;

        let result = adapter(config(&server)).commit(&sample_campaign()).await;
        assert_eq!(result.status, ExportStatus::Error);
        assert!(result.ids.is_empty());
        assert!(result.message.contains("Invalid OAuth access token"));
    }

    #[tokio::test]
    async fn commit_without_token_never_calls_out() {
        let server = MockServer::start().await;
        let mut config = config(&server);
        config.access_token = None;

        let result = adapter(config).commit(&sample_campaign()).await;

        assert_eq!(result.status, ExportStatus::Error);
        assert!(result.message.contains("access token"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ad_account_is_discovered() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("GET"))
            .and(path("/v18.0/me/adaccounts"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "act_999"}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v18.0/act_999/campaigns"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config(&server);
        config.ad_account_id = None;
        let result = adapter(config).commit(&sample_campaign()).await;

        assert_eq!(result.status, ExportStatus::Error);
        assert!(result.steps["campaign"].starts_with("Failed - "));
    }
}
