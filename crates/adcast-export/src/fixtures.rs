//! Shared test fixtures.

use std::collections::BTreeMap;

use chrono::Utc;

use adcast_core::{
    AudienceInsights, CampaignExportAggregate, CampaignId, CampaignInput, CampaignSpec,
    InsightSource, UserId,
};

pub(crate) fn sample_campaign() -> CampaignSpec {
    let now = Utc::now();
    CampaignSpec {
        id: CampaignId::generate("Aurora Watch", now),
        user_id: UserId::generate(),
        input: CampaignInput {
            product_name: "Aurora Watch".into(),
            product_description: "A handcrafted smartwatch with sapphire glass".into(),
            category: "wearable tech".into(),
            price_range: "luxury".into(),
            platforms: vec!["facebook".into(), "google".into()],
            target_location: vec!["US".into()],
            daily_budget: 50.0,
            campaign_days: 10,
            call_to_action: "Shop Now".into(),
            reference_description: None,
            image_url: Some("https://cdn.example.com/aurora.png".into()),
            landing_page_url: Some("https://aurora.example.com".into()),
            advanced_targeting: false,
        },
        insights: AudienceInsights {
            age_min: 35,
            age_max: 65,
            genders: vec!["female".into(), "male".into()],
            interests: vec!["luxury_goods".into(), "golf".into()],
            behaviors: vec!["affluent_shoppers".into()],
            locations: vec!["US".into()],
            languages: vec!["en".into()],
            suggested_ctas: vec!["Shop Now".into()],
            campaign_objectives: vec!["awareness".into(), "conversions".into()],
            platform_recommendations: BTreeMap::new(),
            ideal_posting_times: BTreeMap::new(),
            hashtags: vec!["#AuroraWatch".into()],
            ad_copies: vec![],
            source: InsightSource::Fallback,
        },
        strategy: serde_json::json!({}),
        credits_charged: 15,
        created_at: now,
        feeds: Vec::new(),
        export: CampaignExportAggregate::default(),
    }
}
