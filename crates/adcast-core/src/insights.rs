//! Audience insight types.
//!
//! Insights are produced by the reasoning client (or by fallback synthesis) and carried
//! on the campaign as the targeting blob that provider adapters translate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured audience and creative guidance for a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceInsights {
    /// Minimum target age, in [13, 80].
    pub age_min: u8,
    /// Maximum target age, in [13, 80] and greater than `age_min`.
    pub age_max: u8,
    /// Target genders (lowercase).
    pub genders: Vec<String>,
    /// Interest keywords.
    pub interests: Vec<String>,
    /// Behavior keywords.
    pub behaviors: Vec<String>,
    /// Target locations (country codes or names).
    pub locations: Vec<String>,
    /// Target languages.
    pub languages: Vec<String>,
    /// Suggested call-to-action labels.
    pub suggested_ctas: Vec<String>,
    /// Campaign objectives, most important first.
    pub campaign_objectives: Vec<String>,
    /// Free-text recommendation per platform.
    #[serde(default)]
    pub platform_recommendations: BTreeMap<String, String>,
    /// Ideal posting times per platform, each `HH:MM`.
    #[serde(default)]
    pub ideal_posting_times: BTreeMap<String, Vec<String>>,
    /// `#`-prefixed hashtags.
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Ad copy variants.
    #[serde(default)]
    pub ad_copies: Vec<AdCopy>,
    /// Where the insights came from.
    pub source: InsightSource,
}

impl AudienceInsights {
    /// First suggested call-to-action, if any.
    #[must_use]
    pub fn primary_cta(&self) -> Option<&str> {
        self.suggested_ctas.first().map(String::as_str)
    }

    /// First ad copy, if any.
    #[must_use]
    pub fn primary_copy(&self) -> Option<&AdCopy> {
        self.ad_copies.first()
    }
}

/// One ad copy variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCopy {
    /// Short headline.
    pub headline: String,
    /// Primary text.
    pub body: String,
}

/// Origin of a piece of generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    /// Produced by the reasoning service.
    Reasoned,
    /// Synthesized by deterministic rules because the reasoning service was unavailable.
    Fallback,
}
