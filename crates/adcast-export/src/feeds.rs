//! Per-provider feed generation.
//!
//! Feeds are built once, when the campaign is created, from the same targeting helpers
//! the adapters use, so a feed shows what an export would send. The daily budget is
//! split evenly across the requested platforms. Platforms without an adapter still get a
//! feed, flagged unsupported with an error message.

use serde_json::{json, Value};

use adcast_core::{split_budget_minor, CampaignSpec, FeedCreative, PlatformFeed};

use crate::adapter::Provider;
use crate::google::{MAX_DESCRIPTION_CHARS, MAX_HEADLINE_CHARS};
use crate::meta::DEFAULT_OBJECTIVE as META_DEFAULT_OBJECTIVE;
use crate::orchestrator::normalize_providers;
use crate::targeting::{
    ad_text, call_to_action, countries, google_age_ranges, google_geo_targets, meta_cta_type,
    meta_genders, tiktok_cta_type, tiktok_objective, to_minor_units,
};
use crate::tiktok::MAX_INTERESTS as TIKTOK_MAX_INTERESTS;

/// Platforms a campaign can be planned for. Only some have an export adapter.
pub const KNOWN_PLATFORMS: [&str; 9] = [
    "facebook",
    "instagram",
    "tiktok",
    "youtube",
    "linkedin",
    "x",
    "snapchat",
    "google",
    "pinterest",
];

/// Generate one feed per requested platform, in request order.
#[must_use]
pub fn generate_feeds(campaign: &CampaignSpec) -> Vec<PlatformFeed> {
    let platforms = normalize_providers(&campaign.input.platforms);
    let budgets = split_budget_minor(to_minor_units(campaign.input.daily_budget), platforms.len());

    platforms
        .iter()
        .zip(budgets)
        .map(|(platform, budget)| generate_feed(campaign, platform, budget))
        .collect()
}

fn generate_feed(campaign: &CampaignSpec, platform: &str, daily_budget_minor: i64) -> PlatformFeed {
    let insights = &campaign.insights;
    let mut feed = PlatformFeed {
        platform: platform.to_string(),
        supported: true,
        daily_budget_minor,
        objective: String::new(),
        targeting: Value::Null,
        creative: creative(campaign, 40, 125, call_to_action(campaign).to_string()),
        posting_times: insights
            .ideal_posting_times
            .get(platform)
            .cloned()
            .unwrap_or_default(),
        recommendation: insights.platform_recommendations.get(platform).cloned(),
        error: None,
    };

    match Provider::from_name(platform) {
        Some(provider @ (Provider::Facebook | Provider::Instagram)) => {
            feed.objective = campaign.strategy["campaign_objective"]
                .as_str()
                .filter(|o| !o.trim().is_empty())
                .unwrap_or(META_DEFAULT_OBJECTIVE)
                .to_string();
            feed.targeting = meta_targeting(campaign, provider);
            feed.creative.call_to_action = meta_cta_type(call_to_action(campaign)).to_string();
        }
        Some(Provider::Google) => {
            feed.objective = "SEARCH".to_string();
            feed.targeting = json!({
                "geo_target_constants": google_geo_targets(campaign),
                "age_ranges": google_age_ranges(insights.age_min, insights.age_max),
                "keywords": insights.interests,
            });
            feed.creative = creative(
                campaign,
                MAX_HEADLINE_CHARS,
                MAX_DESCRIPTION_CHARS,
                call_to_action(campaign).to_string(),
            );
        }
        Some(Provider::TikTok) => {
            feed.objective = tiktok_objective(&insights.campaign_objectives).to_string();
            feed.targeting = json!({
                "age_range": [insights.age_min, insights.age_max],
                "gender": insights.genders.iter().map(|g| g.to_uppercase()).collect::<Vec<_>>(),
                "location": countries(campaign)
                    .into_iter()
                    .map(|code| json!({"country_code": code}))
                    .collect::<Vec<_>>(),
                "interests": insights.interests.iter().take(TIKTOK_MAX_INTERESTS).collect::<Vec<_>>(),
            });
            feed.creative.call_to_action = tiktok_cta_type(call_to_action(campaign)).to_string();
        }
        None => {
            feed.supported = false;
            feed.objective = insights.campaign_objectives.first().cloned().unwrap_or_default();
            feed.error = Some(format!("Platform '{platform}' not supported yet."));
        }
    }

    feed
}

fn meta_targeting(campaign: &CampaignSpec, provider: Provider) -> Value {
    let insights = &campaign.insights;
    let mut targeting = json!({
        "age_min": insights.age_min,
        "age_max": insights.age_max,
        "geo_locations": {"countries": countries(campaign)},
        "interests": insights.interests,
        "publisher_platforms": [provider.as_str()],
    });
    if let Some(genders) = meta_genders(&insights.genders) {
        targeting["genders"] = json!(genders);
    }
    targeting
}

fn creative(
    campaign: &CampaignSpec,
    headline_max: usize,
    body_max: usize,
    call_to_action: String,
) -> FeedCreative {
    let (headline, body) = ad_text(campaign, headline_max, body_max);
    FeedCreative {
        headline,
        body,
        call_to_action,
        link: campaign.input.landing_page_url.clone(),
        image_url: campaign.input.image_url.clone(),
        hashtags: campaign.insights.hashtags.clone(),
    }
}
