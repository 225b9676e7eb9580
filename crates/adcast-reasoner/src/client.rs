//! Chat-completions client with retry, salvage and fallback.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use adcast_core::{AudienceInsights, CampaignInput};

use crate::error::{ReasoningError, Result};
use crate::retry::RetryPolicy;
use crate::{fallback, insights, prompts, salvage};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Default model.
pub const DEFAULT_MODEL: &str = "mistral-large-latest";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 1600;
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Reasoning client configuration.
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    /// API key. `None` means the service is not configured and only fallback is used.
    pub api_key: Option<String>,
    /// Base URL, without the `/v1/...` path.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Timeout per HTTP request.
    pub request_timeout: Duration,
    /// Retry policy per logical call.
    pub retry: RetryPolicy,
    /// Directory for raw unparseable responses. `None` disables saving.
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            diagnostics_dir: None,
        }
    }
}

/// Client for the external reasoning service.
///
/// [`audience_insights`](Self::audience_insights) and
/// [`campaign_strategy`](Self::campaign_strategy) never fail: once the retry budget is
/// spent or the response cannot be parsed, they return fallback content.
#[derive(Clone)]
pub struct ReasoningClient {
    http: Client,
    config: ReasoningConfig,
}

impl ReasoningClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: ReasoningConfig) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { http, config }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Produce audience insights for a campaign.
    pub async fn audience_insights(&self, input: &CampaignInput) -> AudienceInsights {
        match self.complete_json("audience_insights", &prompts::insights_prompt(input)).await {
            Ok(raw) => insights::normalize(&raw, input),
            Err(err) => {
                tracing::warn!(
                    product = %input.product_name,
                    error = %err,
                    "Reasoning unavailable, using fallback insights"
                );
                fallback::fallback_insights(input)
            }
        }
    }

    /// Produce a campaign strategy consistent with `insights`.
    pub async fn campaign_strategy(&self, input: &CampaignInput, insights: &AudienceInsights) -> Value {
        match self
            .complete_json("campaign_strategy", &prompts::strategy_prompt(input, insights))
            .await
        {
            Ok(mut strategy) => {
                if let Value::Object(fields) = &mut strategy {
                    fields.insert("source".into(), json!("reasoned"));
                }
                strategy
            }
            Err(err) => {
                tracing::warn!(
                    product = %input.product_name,
                    error = %err,
                    "Reasoning unavailable, using fallback strategy"
                );
                fallback::fallback_strategy(input, insights)
            }
        }
    }

    /// Send one prompt and return the JSON object it produced.
    ///
    /// Transient failures are retried under the configured policy. Unparseable output is
    /// saved for diagnosis and reported without retrying.
    ///
    /// # Errors
    ///
    /// Returns the last error once the call cannot produce a JSON object.
    pub async fn complete_json(&self, purpose: &str, prompt: &str) -> Result<Value> {
        let text = self.chat(purpose, prompt).await?;

        match salvage::repair_or_fail(&text) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.save_diagnostics(&format!("{purpose}_parse_error"), &text)
                    .await;
                Err(err)
            }
        }
    }

    /// Send one prompt with retries and return the assistant's text.
    async fn chat(&self, purpose: &str, prompt: &str) -> Result<String> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Err(ReasoningError::NotConfigured);
        };

        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "top_p": 1.0,
            "response_format": {"type": "json_object"},
        });

        let policy = &self.config.retry;
        let mut attempt = 0;
        loop {
            match self.send_once(api_key, &body).await {
                Ok(text) => {
                    tracing::debug!(purpose, attempt = attempt + 1, "Reasoning call succeeded");
                    return Ok(text);
                }
                Err(err) if policy.should_retry(attempt, &err) => {
                    let delay = policy.delay(attempt, &err, &mut rand::thread_rng());
                    tracing::warn!(
                        purpose,
                        attempt = attempt + 1,
                        max_attempts = policy.attempts(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient reasoning failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        purpose,
                        attempt = attempt + 1,
                        error = %err,
                        "Reasoning call failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn send_once(&self, api_key: &str, body: &Value) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ReasoningError::RateLimited { retry_after });
        }
        if status.is_server_error() {
            return Err(ReasoningError::Server {
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(classify_transport)?;
        if !status.is_success() {
            return Err(ReasoningError::Client {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let content = extract_content(&text);
        if content.trim().is_empty() {
            return Err(ReasoningError::EmptyResponse);
        }
        Ok(content)
    }

    /// Save raw model output for offline diagnosis. Failures are only logged.
    async fn save_diagnostics(&self, prefix: &str, text: &str) {
        let Some(dir) = &self.config.diagnostics_dir else {
            return;
        };

        let safe_prefix: String = prefix
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .take(40)
            .collect();
        let path = dir.join(format!(
            "{safe_prefix}_{}.txt",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));

        let result = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, text).await
        }
        .await;

        match result {
            Ok(()) => tracing::warn!(path = %path.display(), "Saved unparseable model output"),
            Err(err) => tracing::warn!(error = %err, "Failed to save unparseable model output"),
        }
    }
}

fn classify_transport(err: reqwest::Error) -> ReasoningError {
    if err.is_timeout() {
        ReasoningError::Timeout
    } else {
        ReasoningError::Http(err)
    }
}

/// Pull the assistant text out of a chat-completions body.
///
/// Falls back to the raw body when it does not have the expected shape.
fn extract_content(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    let choice = &parsed["choices"][0];
    choice["message"]["content"]
        .as_str()
        .or_else(|| choice["text"].as_str())
        .map_or_else(|| body.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcast_core::InsightSource;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn luxury_input() -> CampaignInput {
        CampaignInput {
            product_name: "Aurora Watch".into(),
            product_description: "A handcrafted smartwatch with sapphire glass".into(),
            category: "luxury".into(),
            price_range: "luxury".into(),
            platforms: vec!["facebook".into()],
            target_location: vec!["US".into()],
            daily_budget: 50.0,
            campaign_days: 10,
            call_to_action: "Shop Now".into(),
            reference_description: None,
            image_url: None,
            landing_page_url: None,
            advanced_targeting: false,
        }
    }

    fn client_for(server: &MockServer, attempts: u32) -> ReasoningClient {
        ReasoningClient::new(ReasoningConfig {
            api_key: Some("test-key".into()),
            base_url: server.uri(),
            request_timeout: Duration::from_secs(5),
            retry: RetryPolicy::immediate(attempts),
            ..ReasoningConfig::default()
        })
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    async fn request_count(server: &MockServer) -> usize {
        server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    #[tokio::test]
    async fn rate_limited_every_time_falls_back_after_bounded_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server, 4);
        let insights = client.audience_insights(&luxury_input()).await;

        assert_eq!(request_count(&server).await, 4);
        assert_eq!(insights.source, InsightSource::Fallback);
        assert!(insights.age_min >= 30);
        assert!(!insights.interests.is_empty());
    }

    #[tokio::test]
    async fn server_error_then_success_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(completion(
                "Here you go:\n{\"age_min\": 31, \"age_max\": 60, \"interests\": [\"watches\",],}",
            ))
            .mount(&server)
            .await;

        let insights = client_for(&server, 3).audience_insights(&luxury_input()).await;

        assert_eq!(request_count(&server).await, 2);
        assert_eq!(insights.source, InsightSource::Reasoned);
        assert_eq!((insights.age_min, insights.age_max), (31, 60));
        assert_eq!(insights.interests, vec!["watches"]);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client_for(&server, 5)
            .complete_json("test", "prompt")
            .await
            .unwrap_err();

        assert!(matches!(err, ReasoningError::Client { status: 401, .. }));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn unparseable_output_is_saved_and_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("I'm sorry, I can't produce that."))
            .mount(&server)
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let client = ReasoningClient::new(ReasoningConfig {
            api_key: Some("test-key".into()),
            base_url: server.uri(),
            retry: RetryPolicy::immediate(3),
            diagnostics_dir: Some(dir.path().join("raw")),
            ..ReasoningConfig::default()
        });

        let input = luxury_input();
        let insights = client.audience_insights(&input).await;

        assert_eq!(insights.source, InsightSource::Fallback);
        assert_eq!(request_count(&server).await, 1);
        let saved: Vec<_> = std::fs::read_dir(dir.path().join("raw"))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .collect();
        assert_eq!(saved.len(), 1);
        let name = saved[0].file_name().to_string_lossy().to_string();
        assert!(name.starts_with("audience_insights_parse_error_"));
        assert!(std::fs::read_to_string(saved[0].path())
            .unwrap()
            .contains("can't produce"));
    }

    #[tokio::test]
    async fn unconfigured_client_never_calls_out() {
        let client = ReasoningClient::new(ReasoningConfig::default());
        let input = luxury_input();

        assert!(!client.is_configured());
        let insights = client.audience_insights(&input).await;
        let strategy = client.campaign_strategy(&input, &insights).await;

        assert_eq!(insights.source, InsightSource::Fallback);
        assert_eq!(strategy["source"], "fallback");
    }

    #[tokio::test]
    async fn strategy_is_tagged_as_reasoned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("{\"targeting_strategy\": {\"primary_audience\": \"collectors\"}}"))
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        let input = luxury_input();
        let insights = fallback::fallback_insights(&input);
        let strategy = client.campaign_strategy(&input, &insights).await;

        assert_eq!(strategy["targeting_strategy"]["primary_audience"], "collectors");
        assert_eq!(strategy["source"], "reasoned");
    }

    #[test]
    fn content_extraction_shapes() {
        assert_eq!(
            extract_content(r#"{"choices":[{"message":{"content":"{}"}}]}"#),
            "{}"
        );
        assert_eq!(extract_content(r#"{"choices":[{"text":"hi"}]}"#), "hi");
        assert_eq!(extract_content("plain"), "plain");
    }
}
