//! Per-provider campaign feeds.
//!
//! A feed is the provider-ready slice of a campaign: its share of the daily budget,
//! targeting already shaped for that provider, and the creative to run. One feed is
//! generated per requested platform when the campaign is created and stored with it.

use serde::{Deserialize, Serialize};

/// The provider-ready slice of a campaign for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformFeed {
    /// Platform name (lowercase).
    pub platform: String,

    /// Whether an export adapter exists for the platform.
    pub supported: bool,

    /// This platform's share of the daily budget, in minor currency units.
    pub daily_budget_minor: i64,

    /// Provider objective.
    pub objective: String,

    /// Targeting in the provider's own vocabulary.
    pub targeting: serde_json::Value,

    /// Creative to run.
    pub creative: FeedCreative,

    /// Suggested posting times (`HH:MM`).
    #[serde(default)]
    pub posting_times: Vec<String>,

    /// Free-text guidance for the platform, if the insights had any.
    #[serde(default)]
    pub recommendation: Option<String>,

    /// Why the feed cannot be exported, for unsupported platforms.
    #[serde(default)]
    pub error: Option<String>,
}

/// Creative content of a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCreative {
    /// Ad headline.
    pub headline: String,
    /// Ad body text.
    pub body: String,
    /// Call-to-action label.
    pub call_to_action: String,
    /// Landing page.
    #[serde(default)]
    pub link: Option<String>,
    /// Creative image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Hashtags to attach.
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Split `total_minor` into `parts` shares that differ by at most one unit.
///
/// Earlier shares take the remainder, so the shares always sum to `total_minor`.
#[must_use]
pub fn split_budget_minor(total_minor: i64, parts: usize) -> Vec<i64> {
    let Ok(count) = i64::try_from(parts) else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }

    let base = total_minor / count;
    let remainder = total_minor % count;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}
