//! TikTok Business API adapter.
//!
//! Commit creates `campaign → ad_group → ad`. Budgets are sent in currency units,
//! rounded to the minor unit.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
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
    call_to_action, countries, round_to_minor, tiktok_cta_type, tiktok_objective, truncate,
};

/// Default API base URL, including the version path.
pub const DEFAULT_BASE_URL: &str = "https://business-api.tiktok.com/open_api/v1.3";

/// Most interests sent.
pub const MAX_INTERESTS: usize = 5;

const STEPS: [&str; 3] = ["campaign", "ad_group", "ad"];

/// TikTok credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct TikTokConfig {
    /// Business API access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Advertiser account ID.
    #[serde(default)]
    pub advertiser_id: Option<String>,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for TikTokConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            advertiser_id: None,
            base_url: default_base_url(),
        }
    }
}

impl fmt::Debug for TikTokConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TikTokConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .field("advertiser_id", &self.advertiser_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// TikTok adapter.
#[derive(Debug, Clone)]
pub struct TikTokAdapter {
    config: TikTokConfig,
    http: ProviderHttp,
}

impl TikTokAdapter {
    /// Create a new adapter.
    #[must_use]
    pub fn new(config: TikTokConfig, http: ProviderHttp) -> Self {
        Self { config, http }
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (
            self.config.access_token.as_deref().filter(|t| !t.is_empty()),
            self.config.advertiser_id.as_deref().filter(|a| !a.is_empty()),
        ) {
            (Some(token), Some(advertiser)) => Ok((token, advertiser)),
            (None, _) => Err(ProviderApiError::MissingCredentials(
                "TikTok access token not configured".into(),
            )),
            (_, None) => Err(ProviderApiError::MissingCredentials(
                "TikTok advertiser ID not configured".into(),
            )),
        }
    }

    fn build_payload(campaign: &CampaignSpec, advertiser_id: &str) -> (Value, Value, Value) {
        let insights = &campaign.insights;
        let name = campaign.input.product_name.as_str();
        let budget = round_to_minor(campaign.input.daily_budget);

        let campaign_body = json!({
            "advertiser_id": advertiser_id,
            "campaign_name": format!("TikTok - {name}"),
            "objective_type": tiktok_objective(&insights.campaign_objectives),
            "budget_mode": "BUDGET_MODE_DAY",
            "budget": budget,
        });

        let ad_group = json!({
            "advertiser_id": advertiser_id,
            "campaign_id": "<CAMPAIGN_ID>",
            "adgroup_name": format!("AdGroup - {name}"),
            "placement_type": "PLACEMENT_TYPE_AUTOMATIC",
            "budget_mode": "BUDGET_MODE_DAY",
            "budget": budget,
            "schedule_type": "SCHEDULE_FROM_NOW",
            "billing_event": "CPC",
            "optimization_goal": "CLICK",
            "targeting": {
                "age_range": [insights.age_min, insights.age_max],
                "gender": insights.genders.iter().map(|g| g.to_uppercase()).collect::<Vec<_>>(),
                "location": countries(campaign)
                    .into_iter()
                    .map(|code| json!({"country_code": code}))
                    .collect::<Vec<_>>(),
                "interests": insights.interests.iter().take(MAX_INTERESTS).collect::<Vec<_>>(),
                "audience_type": "CUSTOM",
            },
        });

        let ad = json!({
            "advertiser_id": advertiser_id,
            "adgroup_id": "<ADGROUP_ID>",
            "ad_name": format!("Ad - {name}"),
            "creative_type": "VIDEO",
            "call_to_action": tiktok_cta_type(call_to_action(campaign)),
            "ad_text": truncate(&campaign.input.product_description, 100),
            "landing_page_url": campaign.input.landing_page_url.clone().unwrap_or_default(),
        });

        (campaign_body, ad_group, ad)
    }

    async fn create(&self, token: &str, endpoint: &str, body: &Value) -> Result<Value> {
        let token = HeaderValue::from_str(token).map_err(|_| {
            ProviderApiError::MissingCredentials("access token is not a valid header value".into())
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("access-token"), token);

        let url = format!(
            "{}/{}/",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_matches('/')
        );
        let response = self.http.post_json(&url, headers, body).await?;

        // The API answers HTTP 200 with a non-zero code on failure.
        match response["code"].as_i64() {
            Some(0) => Ok(response["data"].clone()),
            code => Err(ProviderApiError::Api {
                status: 200,
                message: format!(
                    "code {}: {}",
                    code.map_or_else(|| "missing".to_string(), |c| c.to_string()),
                    response["message"].as_str().unwrap_or("unknown error")
                ),
            }),
        }
    }
}

fn id_of(data: &Value, field: &'static str) -> Result<String> {
    let value = &data[field];
    value
        .as_str()
        .map(str::to_string)
        .or_else(|| value.as_u64().map(|n| n.to_string()))
        .ok_or(ProviderApiError::MissingField(field))
}

fn tag_name(body: &mut Value, field: &str, key: &str) {
    let tagged = body[field].as_str().map(|name| format!("{name} [{key}]"));
    if let Some(tagged) = tagged {
        body[field] = json!(tagged);
    }
}

#[async_trait]
impl ProviderAdapter for TikTokAdapter {
    fn provider(&self) -> Provider {
        Provider::TikTok
    }

    async fn preview(&self, campaign: &CampaignSpec) -> ProviderResult {
        let advertiser = self
            .config
            .advertiser_id
            .as_deref()
            .unwrap_or("<ADVERTISER_ID>");
        let (campaign_body, ad_group, ad) = Self::build_payload(campaign, advertiser);
        let ts = preview_stamp();

        let ids = BTreeMap::from([
            ("campaign_id".to_string(), format!("dry_tt_cmp_{ts}")),
            ("adgroup_id".to_string(), format!("dry_tt_grp_{ts}")),
            ("ad_id".to_string(), format!("dry_tt_ad_{ts}")),
        ]);
        let payload = json!({
            "campaign": campaign_body,
            "ad_group": ad_group,
            "ad": ad,
        });

        preview_result(Provider::TikTok, &STEPS, ids, payload)
    }

    async fn commit(&self, campaign: &CampaignSpec) -> ProviderResult {
        let (token, advertiser) = match self.credentials() {
            Ok(credentials) => credentials,
            Err(err) => return not_ready(Provider::TikTok, &err),
        };

        let (mut campaign_body, mut ad_group, mut ad) = Self::build_payload(campaign, advertiser);
        let key = |step: &str| idempotency_key(&campaign.id, Provider::TikTok, step);
        let mut log = StepLog::new(Provider::TikTok);

        tag_name(&mut campaign_body, "campaign_name", &key("campaign"));
        let campaign_id = match self
            .create(token, "campaign/create", &campaign_body)
            .await
            .and_then(|data| id_of(&data, "campaign_id"))
        {
            Ok(id) => id,
            Err(err) => return log.failed("campaign", &err),
        };
        log.created("campaign", "campaign_id", &campaign_id);

        ad_group["campaign_id"] = json!(campaign_id);
        tag_name(&mut ad_group, "adgroup_name", &key("ad_group"));
        let adgroup_id = match self
            .create(token, "adgroup/create", &ad_group)
            .await
            .and_then(|data| id_of(&data, "adgroup_id"))
        {
            Ok(id) => id,
            Err(err) => return log.failed("ad_group", &err),
        };
        log.created("ad_group", "adgroup_id", &adgroup_id);

        ad["adgroup_id"] = json!(adgroup_id);
        tag_name(&mut ad, "ad_name", &key("ad"));
        let ad_id = match self.create(token, "ad/create", &ad).await.and_then(|data| {
            match data["ad_ids"][0].as_str() {
                Some(id) => Ok(id.to_string()),
                None => id_of(&data, "ad_id"),
            }
        }) {
            Ok(id) => id,
            Err(err) => return log.failed("ad", &err),
        };
        log.created("ad", "ad_id", &ad_id);

        log.finished()
    }
}
