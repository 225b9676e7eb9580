//! Deterministic fallback synthesis.
//!
//! Used whenever the reasoning service cannot produce usable content. The output
//! depends only on the campaign input, so the same input always yields the same result.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use adcast_core::{AdCopy, AudienceInsights, CampaignInput, InsightSource, PriceTier};

use crate::prompts;

/// Budget split across platforms, in percent.
pub const BUDGET_ALLOCATION: [(&str, u32); 4] =
    [("facebook", 35), ("instagram", 25), ("tiktok", 20), ("youtube", 20)];

const FALLBACK_POSTING_TIMES: [(&str, [&str; 3]); 4] = [
    ("facebook", ["19:00", "20:00", "21:00"]),
    ("instagram", ["17:00", "19:00", "21:00"]),
    ("tiktok", ["18:00", "20:00", "22:00"]),
    ("youtube", ["20:00", "21:00", "22:00"]),
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Rule-based audience insights from price tier and category keywords.
#[must_use]
pub fn fallback_insights(input: &CampaignInput) -> AudienceInsights {
    let (age_min, age_max, mut interests, behaviors) = match input.price_tier() {
        PriceTier::Luxury => (
            35,
            65,
            strings(&["luxury_goods", "premium_brands", "exclusive_products", "quality_craftsmanship"]),
            strings(&["affluent_shoppers", "brand_loyalty", "research_intensive"]),
        ),
        PriceTier::Premium => (
            28,
            55,
            strings(&["quality_products", "brand_reputation", "premium_lifestyle", "durable_goods"]),
            strings(&["comparison_shoppers", "review_readers", "value_seekers"]),
        ),
        PriceTier::Budget | PriceTier::MidRange => (
            18,
            45,
            strings(&["value_shopping", "deals", "trendy_products", "budget_friendly"]),
            strings(&["impulse_buyers", "social_shoppers", "deal_seekers"]),
        ),
    };

    let category = input.category.to_lowercase();
    let has_any = |terms: &[&str]| terms.iter().any(|t| category.contains(t));
    if has_any(&["home", "decor", "furniture"]) {
        interests.extend(strings(&["home_improvement", "interior_design", "diy_projects"]));
    } else if has_any(&["tech", "electronic", "gadget"]) {
        interests.extend(strings(&["technology", "innovation", "gadget_reviews"]));
    } else if has_any(&["fitness", "health", "wellness"]) {
        interests.extend(strings(&["exercise", "nutrition", "healthy_lifestyle"]));
    }

    let mut suggested_ctas = vec![input.call_to_action.clone()];
    for cta in ["Shop Now", "Discover More", "Get Started", "Learn More"] {
        if !suggested_ctas.iter().any(|c| c.eq_ignore_ascii_case(cta)) {
            suggested_ctas.push(cta.to_string());
        }
    }
    suggested_ctas.retain(|c| !c.is_empty());

    let platform_recommendations = input
        .platforms
        .iter()
        .map(|p| (p.clone(), prompts::platform_strategy(p, input)))
        .collect();

    let ideal_posting_times: BTreeMap<String, Vec<String>> = FALLBACK_POSTING_TIMES
        .iter()
        .map(|(platform, times)| ((*platform).to_string(), strings(times)))
        .collect();

    AudienceInsights {
        age_min,
        age_max,
        genders: strings(&["female", "male"]),
        interests,
        behaviors,
        locations: input.target_location.clone(),
        languages: strings(&["en"]),
        suggested_ctas,
        campaign_objectives: strings(&["awareness", "conversions", "engagement"]),
        platform_recommendations,
        ideal_posting_times,
        hashtags: fallback_hashtags(input),
        ad_copies: vec![AdCopy {
            headline: input.product_name.chars().take(40).collect(),
            body: input.product_description.chars().take(125).collect(),
        }],
        source: InsightSource::Fallback,
    }
}

fn fallback_hashtags(input: &CampaignInput) -> Vec<String> {
    [&input.product_name, &input.category]
        .iter()
        .map(|text| {
            text.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{tag}"))
        .collect()
}

/// Rule-based strategy consistent with `insights`.
#[must_use]
pub fn fallback_strategy(input: &CampaignInput, insights: &AudienceInsights) -> Value {
    let top_interests = insights
        .interests
        .iter()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let description: String = input.product_description.chars().take(80).collect();
    let platform_breakdown: serde_json::Map<String, Value> = BUDGET_ALLOCATION
        .iter()
        .map(|(platform, share)| ((*platform).to_string(), json!(share)))
        .collect();

    json!({
        "targeting_strategy": {
            "primary_audience": format!(
                "{}-{} year olds interested in {top_interests}",
                insights.age_min, insights.age_max
            ),
            "audience_size": "50K-200K potential customers",
            "targeting_approach": "Interest-based targeting with demographic filters and lookalike audiences",
            "key_segments": insights.interests.iter().take(3).collect::<Vec<_>>(),
        },
        "content_strategy": {
            "key_messaging": [
                format!("Discover {} - {description}", input.product_name),
                format!("Perfect for people who love {top_interests}"),
                "Join thousands of satisfied customers",
            ],
            "content_types": ["carousel_ads", "video_testimonials", "user_generated_content"],
            "visual_style": "Professional yet authentic with social proof elements",
        },
        "budget_allocation": {
            "platform_breakdown": platform_breakdown,
            "optimization_tips": [
                "Start with 70% of budget for audience testing in first 3 days",
                "Monitor CTR and conversion rates daily for quick optimization",
                "Scale budget for the audiences with the lowest cost per acquisition after 3 days",
            ],
        },
        "performance_predictions": {
            "estimated_metrics": {
                "ctr": "1.2-2.8%",
                "cpc": format!(
                    "${:.2}-${:.2}",
                    input.daily_budget / 1000.0,
                    input.daily_budget / 500.0
                ),
                "conversion_rate": "2-5%",
                "roas": "180-350%",
            },
            "success_factors": [
                "Compelling visual content that showcases product benefits",
                "Clear value proposition in ad copy",
                "Strong, action-oriented call-to-action",
            ],
        },
        "source": "fallback",
    })
}
