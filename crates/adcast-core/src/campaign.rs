//! Campaign input and specification types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AdcastError, Result};
use crate::export::CampaignExportAggregate;
use crate::feed::PlatformFeed;
use crate::insights::AudienceInsights;
use crate::{CampaignId, UserId};

/// Default target location when none is given.
const DEFAULT_LOCATION: &str = "US";

/// Validated user input for campaign generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInput {
    /// Product name, 1 to 100 characters.
    pub product_name: String,
    /// Product description, 10 to 500 characters.
    pub product_description: String,
    /// Product category, 2 to 50 characters.
    pub category: String,
    /// Price tier as free text (budget, mid-range, premium, luxury).
    pub price_range: String,
    /// Requested provider names.
    pub platforms: Vec<String>,
    /// Target locations.
    #[serde(default = "default_locations")]
    pub target_location: Vec<String>,
    /// Daily budget in the account currency. Positive.
    pub daily_budget: f64,
    /// Campaign duration, 1 to 365 days.
    pub campaign_days: u32,
    /// Call-to-action text, 2 to 50 characters.
    pub call_to_action: String,
    /// Optional description of a reference creative, up to 300 characters.
    #[serde(default)]
    pub reference_description: Option<String>,
    /// Optional creative image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Optional landing page URL.
    #[serde(default)]
    pub landing_page_url: Option<String>,
    /// Whether advanced targeting was requested (affects cost).
    #[serde(default)]
    pub advanced_targeting: bool,
}

fn default_locations() -> Vec<String> {
    vec![DEFAULT_LOCATION.to_string()]
}

impl CampaignInput {
    /// Total budget over the whole campaign.
    #[must_use]
    pub fn total_budget(&self) -> f64 {
        self.daily_budget * f64::from(self.campaign_days)
    }

    /// Price tier recognized from the free-text price range.
    #[must_use]
    pub fn price_tier(&self) -> PriceTier {
        PriceTier::from_text(&self.price_range)
    }

    /// Trim fields, fill defaults, and check every constraint.
    ///
    /// # Errors
    ///
    /// Returns `AdcastError::Validation` listing every violated field.
    pub fn validate(mut self) -> Result<Self> {
        self.product_name = self.product_name.trim().to_string();
        self.product_description = self.product_description.trim().to_string();
        self.category = self.category.trim().to_string();
        self.price_range = self.price_range.trim().to_string();
        self.call_to_action = self.call_to_action.trim().to_string();
        self.platforms = self
            .platforms
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self.target_location.retain(|l| !l.trim().is_empty());
        if self.target_location.is_empty() {
            self.target_location = default_locations();
        }

        let mut problems = Vec::new();
        check_len(&mut problems, "product_name", &self.product_name, 1, 100);
        check_len(
            &mut problems,
            "product_description",
            &self.product_description,
            10,
            500,
        );
        check_len(&mut problems, "category", &self.category, 2, 50);
        check_len(&mut problems, "price_range", &self.price_range, 1, 50);
        check_len(&mut problems, "call_to_action", &self.call_to_action, 2, 50);
        if let Some(reference) = &self.reference_description {
            check_len(&mut problems, "reference_description", reference, 0, 300);
        }
        if self.platforms.is_empty() {
            problems.push("platforms: at least one platform is required".to_string());
        }
        if !self.daily_budget.is_finite() || self.daily_budget <= 0.0 {
            problems.push("daily_budget: must be greater than 0".to_string());
        }
        if !(1..=365).contains(&self.campaign_days) {
            problems.push("campaign_days: must be between 1 and 365".to_string());
        }

        if problems.is_empty() {
            Ok(self)
        } else {
            Err(AdcastError::Validation(problems.join("; ")))
        }
    }
}

fn check_len(problems: &mut Vec<String>, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        problems.push(format!("{field}: length must be between {min} and {max}"));
    }
}

/// Recognized price tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    /// Low-priced products.
    Budget,
    /// Mid-range products (also the fallback for unrecognized text).
    MidRange,
    /// Premium products.
    Premium,
    /// Luxury products.
    Luxury,
}

impl PriceTier {
    /// Recognize a tier from free text, checking the most specific keyword first.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("luxury") {
            Self::Luxury
        } else if text.contains("premium") {
            Self::Premium
        } else if text.contains("budget") || text.contains("low") {
            Self::Budget
        } else {
            Self::MidRange
        }
    }
}

/// A generated campaign.
///
/// Everything except `export` is fixed at creation, including one feed per requested
/// platform. `export` is the aggregate that the export state store maintains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSpec {
    /// Globally unique slug.
    pub id: CampaignId,
    /// Owning user.
    pub user_id: UserId,
    /// The validated input the campaign was generated from.
    pub input: CampaignInput,
    /// Targeting and creative insights.
    pub insights: AudienceInsights,
    /// Strategy content (opaque structured blob).
    pub strategy: serde_json::Value,
    /// Credits charged for generation.
    pub credits_charged: i64,
    /// When the campaign was generated.
    pub created_at: DateTime<Utc>,
    /// One feed per requested platform, in request order.
    #[serde(default)]
    pub feeds: Vec<PlatformFeed>,
    /// Export aggregate.
    #[serde(default)]
    pub export: CampaignExportAggregate,
}

impl CampaignSpec {
    /// Whether the campaign belongs to the given user.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    /// The feed for `platform`, ignoring case.
    #[must_use]
    pub fn feed(&self, platform: &str) -> Option<&PlatformFeed> {
        let platform = platform.trim();
        self.feeds
            .iter()
            .find(|feed| feed.platform.eq_ignore_ascii_case(platform))
    }
}
