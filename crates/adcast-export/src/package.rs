//! Downloadable campaign packages.
//!
//! A package bundles everything generated for a campaign into one JSON document: the
//! input, the insights and strategy, every platform feed, a summary, per-feed validation,
//! and the links a client uses to fetch the package or a single feed again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adcast_core::{AudienceInsights, CampaignId, CampaignInput, CampaignSpec, PlatformFeed};

/// Package format version.
pub const PACKAGE_VERSION: &str = "1.0";

/// Status stamped on every freshly built package.
pub const PACKAGE_STATUS: &str = "ready_for_review";

/// Export formats a campaign can be downloaded in.
pub const EXPORT_FORMATS: [&str; 2] = ["json", "platform_specific"];

/// A complete campaign export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPackage {
    /// Identity and build stamp.
    pub metadata: PackageMetadata,
    /// The validated input.
    pub campaign_input: CampaignInput,
    /// Targeting and creative insights.
    pub audience_insights: AudienceInsights,
    /// Strategy content.
    pub strategy: serde_json::Value,
    /// Feeds keyed by platform.
    pub platform_feeds: BTreeMap<String, PlatformFeed>,
    /// Totals across feeds.
    pub export_summary: ExportSummary,
    /// Validation outcome per platform.
    pub validation_results: BTreeMap<String, FeedValidation>,
    /// Where to fetch the package and each feed.
    pub download_links: DownloadLinks,
}

/// Package identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Campaign slug.
    pub campaign_id: CampaignId,
    /// When the package was built.
    pub export_timestamp: DateTime<Utc>,
    /// Package format version.
    pub version: String,
    /// Review status.
    pub status: String,
}

/// Totals across a campaign's feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Number of feeds.
    pub total_platforms: usize,
    /// Number of feeds with an export adapter.
    pub supported_platforms: usize,
    /// Sum of the feeds' daily budgets, in minor units.
    pub total_daily_budget_minor: i64,
    /// Campaign duration in days.
    pub campaign_days: u32,
    /// Platform names, in feed order.
    pub platforms: Vec<String>,
}

/// Validation outcome for one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedValidation {
    /// Whether the feed can be exported as is.
    pub valid: bool,
    /// Problems found, empty when valid.
    pub issues: Vec<String>,
}

/// Download locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinks {
    /// The whole package.
    pub complete_package: String,
    /// One link per platform feed.
    pub individual_feeds: BTreeMap<String, String>,
}

impl ExportPackage {
    /// Build the package for `campaign`, stamped with `now`.
    #[must_use]
    pub fn build(campaign: &CampaignSpec, now: DateTime<Utc>) -> Self {
        let base = format!("/v1/campaigns/{}", campaign.id);

        let platform_feeds: BTreeMap<String, PlatformFeed> = campaign
            .feeds
            .iter()
            .map(|feed| (feed.platform.clone(), feed.clone()))
            .collect();
        let validation_results = campaign
            .feeds
            .iter()
            .map(|feed| (feed.platform.clone(), validate_feed(feed)))
            .collect();
        let individual_feeds = campaign
            .feeds
            .iter()
            .map(|feed| (feed.platform.clone(), format!("{base}/feeds/{}", feed.platform)))
            .collect();

        Self {
            metadata: PackageMetadata {
                campaign_id: campaign.id.clone(),
                export_timestamp: now,
                version: PACKAGE_VERSION.to_string(),
                status: PACKAGE_STATUS.to_string(),
            },
            campaign_input: campaign.input.clone(),
            audience_insights: campaign.insights.clone(),
            strategy: campaign.strategy.clone(),
            export_summary: ExportSummary {
                total_platforms: campaign.feeds.len(),
                supported_platforms: campaign.feeds.iter().filter(|f| f.supported).count(),
                total_daily_budget_minor: campaign.feeds.iter().map(|f| f.daily_budget_minor).sum(),
                campaign_days: campaign.input.campaign_days,
                platforms: campaign.feeds.iter().map(|f| f.platform.clone()).collect(),
            },
            platform_feeds,
            validation_results,
            download_links: DownloadLinks {
                complete_package: format!("{base}/download"),
                individual_feeds,
            },
        }
    }

    /// Attachment file name for the package.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}_campaign.json", self.metadata.campaign_id)
    }
}

/// Check a feed for problems that would block an export.
#[must_use]
pub fn validate_feed(feed: &PlatformFeed) -> FeedValidation {
    let mut issues = Vec::new();
    if let Some(error) = &feed.error {
        issues.push(error.clone());
    } else if !feed.supported {
        issues.push(format!("Platform '{}' not supported yet.", feed.platform));
    }
    if feed.daily_budget_minor <= 0 {
        issues.push("daily budget must be greater than 0".to_string());
    }
    if feed.creative.headline.trim().is_empty() {
        issues.push("creative headline is empty".to_string());
    }
    if feed.creative.body.trim().is_empty() {
        issues.push("creative body is empty".to_string());
    }

    FeedValidation {
        valid: issues.is_empty(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::generate_feeds;
    use crate::fixtures::sample_campaign;

    #[test]
    fn package_collects_feeds_summary_and_links() {
        let mut campaign = sample_campaign();
        campaign.input.platforms = vec!["facebook".into(), "linkedin".into()];
        campaign.feeds = generate_feeds(&campaign);
        let now = Utc::now();

        let package = ExportPackage::build(&campaign, now);

        assert_eq!(package.metadata.campaign_id, campaign.id);
        assert_eq!(package.metadata.export_timestamp, now);
        assert_eq!(package.metadata.version, "1.0");
        assert_eq!(package.metadata.status, "ready_for_review");
        assert_eq!(package.export_summary.total_platforms, 2);
        assert_eq!(package.export_summary.supported_platforms, 1);
        assert_eq!(package.export_summary.total_daily_budget_minor, 5_000);
        assert!(package.validation_results["facebook"].valid);
        assert!(!package.validation_results["linkedin"].valid);
        assert_eq!(
            package.download_links.complete_package,
            format!("/v1/campaigns/{}/download", campaign.id)
        );
        assert_eq!(
            package.download_links.individual_feeds["linkedin"],
            format!("/v1/campaigns/{}/feeds/linkedin", campaign.id)
        );
        assert_eq!(package.file_name(), format!("{}_campaign.json", campaign.id));
    }

    #[test]
    fn empty_creative_fails_validation() {
        let mut campaign = sample_campaign();
        campaign.feeds = generate_feeds(&campaign);
        let mut feed = campaign.feeds[0].clone();
        feed.creative.headline = " ".into();
        feed.daily_budget_minor = 0;

        let validation = validate_feed(&feed);

        assert!(!validation.valid);
        assert_eq!(validation.issues.len(), 2);
    }
}
