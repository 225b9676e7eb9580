//! Shared HTTP helper for provider APIs.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::error::{ProviderApiError, Result};

/// Default timeout for one provider API call.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin JSON client with a per-call timeout and uniform error extraction.
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    client: Client,
    step_timeout: Duration,
}

impl ProviderHttp {
    /// Create a new helper.
    #[must_use]
    pub fn new(step_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(step_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            step_timeout,
        }
    }

    /// The per-call timeout.
    #[must_use]
    pub const fn step_timeout(&self) -> Duration {
        self.step_timeout
    }

    /// `GET url?query` and return the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, or a non-2xx response.
    pub async fn get_json(
        &self,
        url: &str,
        headers: HeaderMap,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        self.send(self.client.get(url).headers(headers).query(query))
            .await
    }

    /// `POST url` with a JSON body and return the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, or a non-2xx response.
    pub async fn post_json(&self, url: &str, headers: HeaderMap, body: &Value) -> Result<Value> {
        self.send(self.client.post(url).headers(headers).json(body))
            .await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let timeout_ms = u64::try_from(self.step_timeout.as_millis()).unwrap_or(u64::MAX);
        let response = tokio::time::timeout(self.step_timeout, request.send())
            .await
            .map_err(|_| ProviderApiError::Timeout(timeout_ms))?
            .map_err(|err| classify(err, timeout_ms))?;

        let status = response.status();
        let text = tokio::time::timeout(self.step_timeout, response.text())
            .await
            .map_err(|_| ProviderApiError::Timeout(timeout_ms))?
            .map_err(|err| classify(err, timeout_ms))?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if status.is_success() {
            return Ok(body);
        }

        Err(ProviderApiError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

fn classify(err: reqwest::Error, timeout_ms: u64) -> ProviderApiError {
    if err.is_timeout() {
        ProviderApiError::Timeout(timeout_ms)
    } else {
        ProviderApiError::Http(err)
    }
}

/// Best human-readable message from a provider error body.
///
/// Understands Graph API (`error.message`), Google (`error.message` plus details) and
/// TikTok (`message`) shapes.
#[must_use]
pub fn error_message(body: &Value) -> String {
    if let Some(message) = body["error"]["message"].as_str() {
        return message.to_string();
    }
    if let Some(message) = body["error"].as_str() {
        return message.to_string();
    }
    if let Some(message) = body["message"].as_str() {
        return message.to_string();
    }
    match body {
        Value::String(text) => text.chars().take(300).collect(),
        other => other.to_string().chars().take(300).collect(),
    }
}
