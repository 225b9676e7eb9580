//! Export types: per-provider results, attempts, and the campaign export aggregate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AttemptId, CampaignId};

/// Result of one orchestrator call, keyed by the requested provider name.
pub type ExportReport = BTreeMap<String, ProviderResult>;

/// Export execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// Build payloads only. No remote side effects.
    Preview,
    /// Create real, billable objects on the provider.
    Commit,
}

impl ExportMode {
    /// Return the mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "preview" | "dry_run" | "dry-run" => Ok(Self::Preview),
            "commit" | "real" => Ok(Self::Commit),
            other => Err(format!("unknown export mode: {other}")),
        }
    }
}

/// Outcome status of one provider export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    /// Every step succeeded.
    Success,
    /// At least one step succeeded before a later step failed.
    PartialSuccess,
    /// The provider rejected the campaign as a whole.
    Failed,
    /// The provider name is not recognized or not implemented.
    Skipped,
    /// The first step failed, the adapter could not begin, it panicked, or it timed out.
    Error,
}

impl ExportStatus {
    /// Return the status name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }

    /// Whether at least one remote object is known to exist (or would, in preview).
    #[must_use]
    pub const fn made_progress(self) -> bool {
        matches!(self, Self::Success | Self::PartialSuccess)
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform per-provider result returned by adapters and the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Provider name as requested.
    pub platform: String,
    /// Outcome status.
    pub status: ExportStatus,
    /// Human-readable summary.
    pub message: String,
    /// Provider identifiers keyed by role (`campaign_id`, `adset_id`, ...).
    #[serde(default)]
    pub ids: BTreeMap<String, String>,
    /// Step name to human-readable outcome.
    #[serde(default)]
    pub steps: BTreeMap<String, String>,
    /// Request payload (preview mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Error text, if any step failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

impl ProviderResult {
    /// Create a result with the given status and message and nothing else.
    #[must_use]
    pub fn new(platform: impl Into<String>, status: ExportStatus, message: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            status,
            message: message.into(),
            ids: BTreeMap::new(),
            steps: BTreeMap::new(),
            payload: None,
            error: None,
            duration_ms: 0,
        }
    }

    /// Result for a provider name that is not implemented.
    #[must_use]
    pub fn skipped(platform: &str) -> Self {
        Self::new(
            platform,
            ExportStatus::Skipped,
            format!("Platform {platform} not implemented"),
        )
    }

    /// Error result with the given error text as both message and error.
    #[must_use]
    pub fn error(platform: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        let mut result = Self::new(platform, ExportStatus::Error, error.clone());
        result.error = Some(error);
        result
    }
}

/// One recorded export attempt for a (campaign, provider). Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportAttempt {
    /// Unique attempt ID (ULID for time-ordering).
    pub id: AttemptId,
    /// The campaign exported.
    pub campaign_id: CampaignId,
    /// Provider name.
    pub platform: String,
    /// Mode of the attempt.
    pub mode: ExportMode,
    /// Outcome status.
    pub status: ExportStatus,
    /// Summary message.
    pub message: String,
    /// Step name to outcome.
    pub steps: BTreeMap<String, String>,
    /// Provider identifiers keyed by role.
    pub ids: BTreeMap<String, String>,
    /// Request payload (preview mode).
    pub payload: Option<serde_json::Value>,
    /// Error text, if any.
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// When the attempt was recorded.
    pub created_at: DateTime<Utc>,
}

impl ExportAttempt {
    /// Build the attempt row for one provider result.
    #[must_use]
    pub fn from_result(
        campaign_id: &CampaignId,
        mode: ExportMode,
        result: &ProviderResult,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttemptId::generate(),
            campaign_id: campaign_id.clone(),
            platform: result.platform.clone(),
            mode,
            status: result.status,
            message: result.message.clone(),
            steps: result.steps.clone(),
            ids: result.ids.clone(),
            payload: result.payload.clone(),
            error: result.error.clone(),
            duration_ms: result.duration_ms,
            created_at: at,
        }
    }
}

/// Last successful export state of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderExportState {
    /// Identifiers from the most recent successful attempt.
    pub ids: BTreeMap<String, String>,
    /// Status of that attempt (always `success`).
    pub status: ExportStatus,
    /// Message of that attempt.
    pub message: String,
    /// Mode of that attempt.
    pub mode: ExportMode,
    /// When that attempt was recorded.
    pub exported_at: DateTime<Utc>,
}

/// One entry of the export history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportHistoryEntry {
    /// When the export ran.
    pub at: DateTime<Utc>,
    /// Mode of the export.
    pub mode: ExportMode,
    /// Providers involved, in request order.
    pub providers: Vec<String>,
    /// Outcome per provider.
    pub outcomes: BTreeMap<String, ExportStatus>,
}

/// Campaign-level rollup of export state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignExportAggregate {
    /// Last successful state per provider.
    pub providers: BTreeMap<String, ProviderExportState>,
    /// Every export attempt batch, oldest first.
    pub history: Vec<ExportHistoryEntry>,
    /// When the last export was attempted.
    pub last_export_attempt: Option<DateTime<Utc>>,
}

impl CampaignExportAggregate {
    /// Fold one orchestrator report into the aggregate.
    ///
    /// Only `success` results replace a provider's entry. Any other status leaves an
    /// existing entry untouched, so earlier identifiers survive a failed retry. A history
    /// entry is appended for the whole batch regardless of outcome.
    pub fn apply(&mut self, mode: ExportMode, report: &ExportReport, order: &[String], at: DateTime<Utc>) {
        for (platform, result) in report {
            if result.status == ExportStatus::Success {
                self.providers.insert(
                    platform.clone(),
                    ProviderExportState {
                        ids: result.ids.clone(),
                        status: result.status,
                        message: result.message.clone(),
                        mode,
                        exported_at: at,
                    },
                );
            }
        }

        let providers = if order.is_empty() {
            report.keys().cloned().collect()
        } else {
            order.to_vec()
        };

        self.history.push(ExportHistoryEntry {
            at,
            mode,
            providers,
            outcomes: report
                .iter()
                .map(|(platform, result)| (platform.clone(), result.status))
                .collect(),
        });
        self.last_export_attempt = Some(at);
    }

    /// Identifiers of the last successful export to `platform`.
    #[must_use]
    pub fn ids_for(&self, platform: &str) -> Option<&BTreeMap<String, String>> {
        self.providers.get(platform).map(|state| &state.ids)
    }
}
