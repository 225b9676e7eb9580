//! Google Ads adapter over the REST mutate API.
//!
//! Commit creates `budget → campaign → locations → ad_group → ages → ad` for one
//! customer. Money is sent in micros (currency units × 1,000,000). Preview builds the
//! same request bodies with placeholder parent resources and returns them unsent.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use adcast_core::{CampaignSpec, ProviderResult};

use crate::adapter::{
    idempotency_key, not_ready, preview_result, preview_stamp, Provider, ProviderAdapter,
    StepLog,
};
use crate::error::{ProviderApiError, Result};
use crate::http::ProviderHttp;
use crate::targeting::{ad_text, google_age_ranges, google_geo_targets, to_micros, truncate};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://googleads.googleapis.com";

/// Default API version.
pub const DEFAULT_API_VERSION: &str = "v17";

/// Default ad group CPC bid in micros.
pub const DEFAULT_CPC_BID_MICROS: i64 = 1_000_000;

/// Longest headline accepted.
pub const MAX_HEADLINE_CHARS: usize = 30;

/// Longest description accepted.
pub const MAX_DESCRIPTION_CHARS: usize = 90;

const PLACEHOLDER_CUSTOMER: &str = "0000000000";

/// Request header carrying the idempotency hint.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Google Ads credentials and account settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleAdsConfig {
    /// Developer token.
    #[serde(default)]
    pub developer_token: Option<String>,
    /// OAuth access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Target customer ID (digits, dashes allowed).
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Manager account ID, if operating through one.
    #[serde(default)]
    pub login_customer_id: Option<String>,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl Default for GoogleAdsConfig {
    fn default() -> Self {
        Self {
            developer_token: None,
            access_token: None,
            customer_id: None,
            login_customer_id: None,
            base_url: default_base_url(),
            api_version: default_api_version(),
        }
    }
}

impl fmt::Debug for GoogleAdsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleAdsConfig")
            .field("developer_token", &self.developer_token.as_ref().map(|_| "[redacted]"))
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .field("customer_id", &self.customer_id)
            .field("login_customer_id", &self.login_customer_id)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Strip dashes and whitespace from a customer ID.
#[must_use]
pub fn normalize_customer_id(id: &str) -> String {
    id.chars().filter(char::is_ascii_digit).collect()
}

/// Google Ads adapter.
#[derive(Debug, Clone)]
pub struct GoogleAdsAdapter {
    config: GoogleAdsConfig,
    http: ProviderHttp,
}

impl GoogleAdsAdapter {
    /// Create a new adapter.
    #[must_use]
    pub fn new(config: GoogleAdsConfig, http: ProviderHttp) -> Self {
        Self { config, http }
    }

    fn customer_id(&self) -> Option<String> {
        self.config
            .customer_id
            .as_deref()
            .map(normalize_customer_id)
            .filter(|id| !id.is_empty())
    }

    fn headers(&self, request_id: &str) -> Result<HeaderMap> {
        let (Some(developer_token), Some(access_token)) = (
            self.config.developer_token.as_deref().filter(|t| !t.is_empty()),
            self.config.access_token.as_deref().filter(|t| !t.is_empty()),
        ) else {
            return Err(ProviderApiError::MissingCredentials(
                "Google Ads developer token and access token are required".into(),
            ));
        };

        let invalid =
            |_| ProviderApiError::MissingCredentials("credential is not a valid header value".into());
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(invalid)?,
        );
        headers.insert(
            HeaderName::from_static("developer-token"),
            HeaderValue::from_str(developer_token).map_err(invalid)?,
        );
        if let Some(login) = self.config.login_customer_id.as_deref() {
            let login = normalize_customer_id(login);
            if !login.is_empty() {
                headers.insert(
                    HeaderName::from_static("login-customer-id"),
                    HeaderValue::from_str(&login).map_err(invalid)?,
                );
            }
        }
        headers.insert(
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderValue::from_str(request_id).map_err(invalid)?,
        );
        Ok(headers)
    }

    /// Send one mutate request. Returns the created resource names, comma-joined.
    async fn mutate(
        &self,
        customer_id: &str,
        resource: &str,
        request_id: &str,
        body: &Value,
    ) -> Result<String> {
        let url = format!(
            "{}/{}/customers/{customer_id}/{resource}:mutate",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version
        );
        let response = self
            .http
            .post_json(&url, self.headers(request_id)?, body)
            .await?;

        let names: Vec<&str> = response["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| r["resourceName"].as_str())
                    .collect()
            })
            .unwrap_or_default();
        if names.is_empty() {
            return Err(ProviderApiError::MissingField("results[0].resourceName"));
        }
        Ok(names.join(","))
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// One `:mutate` call of the creation sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutateRequest {
    /// Step name reported in the result.
    pub step: &'static str,
    /// Mutated resource collection, e.g. `campaignBudgets`.
    pub resource: &'static str,
    /// Request body as sent.
    pub body: Value,
}

fn operations(creates: Vec<Value>) -> Value {
    let operations: Vec<Value> = creates.into_iter().map(|c| json!({"create": c})).collect();
    json!({ "operations": operations })
}

/// Builds every request body from the campaign and the parent resource names.
///
/// Preview and commit share these builders; preview passes placeholder parents.
struct RequestBuilder<'a> {
    campaign: &'a CampaignSpec,
}

impl RequestBuilder<'_> {
    fn name(&self) -> &str {
        self.campaign.input.product_name.as_str()
    }

    fn budget(&self) -> MutateRequest {
        MutateRequest {
            step: "budget",
            resource: "campaignBudgets",
            body: operations(vec![json!({
                "name": format!("{} Budget {}", self.name(), self.campaign.id),
                "amountMicros": to_micros(self.campaign.input.daily_budget).to_string(),
                "deliveryMethod": "STANDARD",
            })]),
        }
    }

    fn campaign(&self, budget: &str) -> MutateRequest {
        MutateRequest {
            step: "campaign",
            resource: "campaigns",
            body: operations(vec![json!({
                "name": format!("{} {}", self.name(), self.campaign.id),
                "advertisingChannelType": "SEARCH",
                "status": "PAUSED",
                "manualCpc": {},
                "campaignBudget": budget,
            })]),
        }
    }

    /// Country targeting, or `None` when no country maps to a geo target.
    fn locations(&self, campaign: &str) -> Option<MutateRequest> {
        let targets = google_geo_targets(self.campaign);
        if targets.is_empty() {
            return None;
        }
        let creates = targets
            .into_iter()
            .map(|geo| json!({"campaign": campaign, "location": {"geoTargetConstant": geo}}))
            .collect();
        Some(MutateRequest {
            step: "locations",
            resource: "campaignCriteria",
            body: operations(creates),
        })
    }

    fn ad_group(&self, campaign: &str) -> MutateRequest {
        MutateRequest {
            step: "ad_group",
            resource: "adGroups",
            body: operations(vec![json!({
                "name": format!("{} AdGroup", self.name()),
                "campaign": campaign,
                "status": "ENABLED",
                "cpcBidMicros": DEFAULT_CPC_BID_MICROS.to_string(),
            })]),
        }
    }

    fn ages(&self, ad_group: &str) -> MutateRequest {
        let insights = &self.campaign.insights;
        let creates = google_age_ranges(insights.age_min, insights.age_max)
            .into_iter()
            .map(|range| json!({"adGroup": ad_group, "ageRange": {"type": range}}))
            .collect();
        MutateRequest {
            step: "ages",
            resource: "adGroupCriteria",
            body: operations(creates),
        }
    }

    fn ad(&self, ad_group: &str) -> MutateRequest {
        let (headline, description) =
            ad_text(self.campaign, MAX_HEADLINE_CHARS, MAX_DESCRIPTION_CHARS);
        let text = |t: String, max: usize| json!({"text": truncate(&t, max)});
        let mut ad = json!({
            "responsiveSearchAd": {
                "headlines": [
                    text(headline.clone(), MAX_HEADLINE_CHARS),
                    text(format!("{headline} - 2"), MAX_HEADLINE_CHARS),
                    text(format!("{headline} - 3"), MAX_HEADLINE_CHARS),
                ],
                "descriptions": [
                    text(description.clone(), MAX_DESCRIPTION_CHARS),
                    text(format!("{description} - try now"), MAX_DESCRIPTION_CHARS),
                ],
            },
        });
        if let Some(url) = self
            .campaign
            .input
            .landing_page_url
            .as_deref()
            .filter(|u| !u.is_empty())
        {
            ad["finalUrls"] = json!([url]);
        }
        MutateRequest {
            step: "ad",
            resource: "adGroupAds",
            body: operations(vec![json!({
                "adGroup": ad_group,
                "status": "PAUSED",
                "ad": ad,
            })]),
        }
    }
}

/// Result payload: the customer and every request body, in order.
fn requests_payload(customer_id: &str, requests: &[MutateRequest]) -> Value {
    json!({
        "customer_id": customer_id,
        "requests": requests,
    })
}

#[async_trait]
impl ProviderAdapter for GoogleAdsAdapter {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn preview(&self, campaign: &CampaignSpec) -> ProviderResult {
        let build = RequestBuilder { campaign };
        let ts = preview_stamp();
        let customer = self
            .customer_id()
            .unwrap_or_else(|| PLACEHOLDER_CUSTOMER.to_string());

        let budget = format!("customers/{customer}/campaignBudgets/dry_{ts}");
        let campaign_resource = format!("customers/{customer}/campaigns/dry_{ts}");
        let ad_group = format!("customers/{customer}/adGroups/dry_{ts}");
        let ad = format!("customers/{customer}/adGroupAds/dry_{ts}");

        let mut requests = vec![build.budget(), build.campaign(&budget)];
        requests.extend(build.locations(&campaign_resource));
        requests.push(build.ad_group(&campaign_resource));
        requests.push(build.ages(&ad_group));
        requests.push(build.ad(&ad_group));

        let ids = BTreeMap::from([
            ("budget_resource".to_string(), budget),
            ("campaign_resource".to_string(), campaign_resource),
            ("ad_group_resource".to_string(), ad_group),
            ("ad_resource".to_string(), ad),
        ]);
        let steps: Vec<&str> = requests.iter().map(|r| r.step).collect();

        preview_result(
            Provider::Google,
            &steps,
            ids,
            requests_payload(&customer, &requests),
        )
    }

    async fn commit(&self, campaign: &CampaignSpec) -> ProviderResult {
        let Some(customer_id) = self.customer_id() else {
            return not_ready(
                Provider::Google,
                &ProviderApiError::MissingCredentials("Google Ads customer ID not configured".into()),
            );
        };
        if let Err(err) = self.headers("credential-check") {
            return not_ready(Provider::Google, &err);
        }

        let build = RequestBuilder { campaign };
        let mut sent: Vec<MutateRequest> = Vec::with_capacity(6);
        let mut log = StepLog::new(Provider::Google);

        // Sends one request, records it, and yields the created resource name(s).
        macro_rules! step {
            ($request:expr, $role:expr) => {{
                let request: MutateRequest = $request;
                let key = idempotency_key(&campaign.id, Provider::Google, request.step);
                let outcome = self
                    .mutate(&customer_id, request.resource, &key, &request.body)
                    .await;
                let step = request.step;
                sent.push(request);
                match outcome {
                    Ok(resource) => {
                        log.created(step, $role, &resource);
                        resource
                    }
                    Err(err) => {
                        let mut result = log.failed(step, &err);
                        result.payload = Some(requests_payload(&customer_id, &sent));
                        return result;
                    }
                }
            }};
        }

        let budget = step!(build.budget(), "budget_resource");
        let campaign_resource = step!(build.campaign(&budget), "campaign_resource");
        if let Some(locations) = build.locations(&campaign_resource) {
            step!(locations, "location_criteria");
        }
        let ad_group = step!(build.ad_group(&campaign_resource), "ad_group_resource");
        step!(build.ages(&ad_group), "age_criteria");
        step!(build.ad(&ad_group), "ad_resource");

        let mut result = log.finished();
        result.payload = Some(requests_payload(&customer_id, &sent));
        result
    }
}
