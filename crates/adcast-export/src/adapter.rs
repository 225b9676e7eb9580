//! The provider adapter capability and shared step bookkeeping.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use adcast_core::{CampaignId, CampaignSpec, ExportMode, ExportStatus, ProviderResult};

use crate::error::ProviderApiError;

/// Step outcome text used in preview mode.
pub const PAYLOAD_GENERATED: &str = "Payload generated";

// =============================================================================
// Provider Set
// =============================================================================

/// The implemented providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Meta ads with Facebook placements.
    Facebook,
    /// Meta ads with Instagram placements.
    Instagram,
    /// Google Ads.
    Google,
    /// TikTok Business.
    #[serde(rename = "tiktok")]
    TikTok,
}

impl Provider {
    /// Every implemented provider.
    pub const ALL: [Self; 4] = [Self::Facebook, Self::Instagram, Self::Google, Self::TikTok];

    /// Return the provider name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Google => "google",
            Self::TikTok => "tiktok",
        }
    }

    /// Recognize a provider name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Adapter Trait
// =============================================================================

/// Translates a campaign into one provider's creation sequence.
///
/// Adapters never return errors: every failure, including missing credentials, ends up in
/// the returned [`ProviderResult`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// The provider this adapter serves.
    fn provider(&self) -> Provider;

    /// Build the exact payloads without mutating remote state.
    ///
    /// Always reports `success` with `dry_`-prefixed placeholder identifiers.
    async fn preview(&self, campaign: &CampaignSpec) -> ProviderResult;

    /// Run the creation steps against the provider, in order.
    ///
    /// Stops at the first failed step. Objects created by earlier steps are left in place.
    async fn commit(&self, campaign: &CampaignSpec) -> ProviderResult;

    /// Run in the given mode and stamp the wall-clock duration.
    async fn export(&self, campaign: &CampaignSpec, mode: ExportMode) -> ProviderResult {
        let started = Instant::now();
        let mut result = match mode {
            ExportMode::Preview => self.preview(campaign).await,
            ExportMode::Commit => self.commit(campaign).await,
        };
        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result
    }
}

/// Idempotency hint for one commit step.
///
/// Stable across retries of the same export so a provider (or an operator reading the
/// provider console) can recognize a repeated request.
#[must_use]
pub fn idempotency_key(campaign_id: &CampaignId, provider: Provider, step: &str) -> String {
    format!("{campaign_id}:{provider}:{step}")
}

/// Seconds timestamp used in placeholder identifiers.
#[must_use]
pub fn preview_stamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// A successful preview result.
#[must_use]
pub fn preview_result(
    provider: Provider,
    steps: &[&str],
    ids: BTreeMap<String, String>,
    payload: Value,
) -> ProviderResult {
    let mut result = ProviderResult::new(
        provider.as_str(),
        ExportStatus::Success,
        format!("Dry-run: {provider} payload prepared."),
    );
    result.steps = steps
        .iter()
        .map(|step| ((*step).to_string(), PAYLOAD_GENERATED.to_string()))
        .collect();
    result.ids = ids;
    result.payload = Some(payload);
    result
}

// =============================================================================
// Step Log
// =============================================================================

/// Bookkeeping for a commit-mode step sequence.
#[derive(Debug)]
pub struct StepLog {
    provider: Provider,
    ids: BTreeMap<String, String>,
    steps: BTreeMap<String, String>,
    completed: usize,
}

impl StepLog {
    /// Start an empty log.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            ids: BTreeMap::new(),
            steps: BTreeMap::new(),
            completed: 0,
        }
    }

    /// Record a created object.
    pub fn created(&mut self, step: &str, role: &str, id: &str) {
        tracing::debug!(provider = %self.provider, step, id, "Provider step succeeded");
        self.steps
            .insert(step.to_string(), format!("Created successfully (ID: {id})"));
        self.ids.insert(role.to_string(), id.to_string());
        self.completed += 1;
    }

    /// Number of steps that succeeded so far.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Close the log after a failed step.
    ///
    /// `partial_success` if an earlier step succeeded, `error` otherwise.
    #[must_use]
    pub fn failed(mut self, step: &str, err: &ProviderApiError) -> ProviderResult {
        tracing::warn!(
            provider = %self.provider,
            step,
            completed = self.completed,
            error = %err,
            "Provider step failed"
        );
        self.steps.insert(step.to_string(), format!("Failed - {err}"));

        let (status, message) = if self.completed == 0 {
            (
                ExportStatus::Error,
                format!("{} {step} creation failed: {err}", self.provider),
            )
        } else {
            (
                ExportStatus::PartialSuccess,
                format!(
                    "{} export stopped at {step} after {} step(s): {err}",
                    self.provider, self.completed
                ),
            )
        };

        let mut result = ProviderResult::new(self.provider.as_str(), status, message);
        result.error = Some(err.to_string());
        result.ids = self.ids;
        result.steps = self.steps;
        result
    }

    /// Close the log after every step succeeded.
    #[must_use]
    pub fn finished(self) -> ProviderResult {
        tracing::info!(provider = %self.provider, ids = ?self.ids, "Provider export created");
        let mut result = ProviderResult::new(
            self.provider.as_str(),
            ExportStatus::Success,
            format!("{} campaign and all assets created successfully.", self.provider),
        );
        result.ids = self.ids;
        result.steps = self.steps;
        result
    }
}

/// Error result for an adapter that cannot begin.
#[must_use]
pub fn not_ready(provider: Provider, err: &ProviderApiError) -> ProviderResult {
    tracing::warn!(provider = %provider, error = %err, "Provider export cannot start");
    ProviderResult::error(provider.as_str(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_are_case_insensitive() {
        assert_eq!(Provider::from_name(" Facebook "), Some(Provider::Facebook));
        assert_eq!(Provider::from_name("TIKTOK"), Some(Provider::TikTok));
        assert_eq!(Provider::from_name("linkedin"), None);
        assert_eq!(serde_json::to_string(&Provider::TikTok).unwrap(), "\"tiktok\"");
    }

    #[test]
    fn step_log_statuses() {
        let err = ProviderApiError::MissingField("id");

        let first = StepLog::new(Provider::Google).failed("budget", &err);
        assert_eq!(first.status, ExportStatus::Error);
        assert!(first.steps["budget"].starts_with("Failed - "));

        let mut log = StepLog::new(Provider::Google);
        log.created("budget", "budget_resource", "customers/1/campaignBudgets/2");
        let partial = log.failed("campaign", &err);
        assert_eq!(partial.status, ExportStatus::PartialSuccess);
        assert_eq!(partial.ids["budget_resource"], "customers/1/campaignBudgets/2");
        assert_eq!(
            partial.steps["budget"],
            "Created successfully (ID: customers/1/campaignBudgets/2)"
        );

        let mut log = StepLog::new(Provider::TikTok);
        log.created("campaign", "campaign_id", "1");
        assert_eq!(log.completed(), 1);
        assert_eq!(log.finished().status, ExportStatus::Success);
    }

    #[test]
    fn idempotency_key_is_stable() {
        let id: CampaignId = "campaign_x_20250101_000000_abcdef".parse().unwrap();
        assert_eq!(
            idempotency_key(&id, Provider::Facebook, "adset"),
            idempotency_key(&id, Provider::Facebook, "adset")
        );
        assert_eq!(
            idempotency_key(&id, Provider::Google, "budget"),
            "campaign_x_20250101_000000_abcdef:google:budget"
        );
    }
}
