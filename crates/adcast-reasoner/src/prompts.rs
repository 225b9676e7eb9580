//! Prompt templates.

use adcast_core::{AudienceInsights, CampaignInput};

/// Prompt asking for audience insights as one strict JSON object.
#[must_use]
pub fn insights_prompt(input: &CampaignInput) -> String {
    let locations = serde_json::to_string(&input.target_location).unwrap_or_else(|_| "[]".into());

    format!(
        r##"You are an expert digital marketing analyst. Given the product details below, produce a SINGLE valid JSON object ONLY (no explanation, no markdown, no code fences) that follows the exact schema and types shown.

PRODUCT:
name: {name}
description: {description}
category: {category}
price_range: {price_range}
platforms: {platforms}
locations: {locations}
daily_budget: {daily_budget}
total_budget: {total_budget}
campaign_days: {days}
call_to_action: {cta}

RETURN JSON SCHEMA (MUST match exactly):
{{
  "age_min": integer,
  "age_max": integer,
  "genders": ["female","male"],
  "interests": ["interest1","interest2","interest3"],
  "behaviors": ["behavior1","behavior2"],
  "locations": {locations},
  "languages": ["en"],
  "suggested_ctas": ["Shop Now","Learn More"],
  "campaign_objectives": ["awareness","conversions","engagement"],
  "hashtags": ["#tag1","#tag2"],
  "ad_copies": [{{"headline":"...", "body":"..."}}],
  "platform_recommendations": {{"facebook": "string", "instagram": "string", "tiktok": "string"}},
  "ideal_posting_times": {{"facebook": ["HH:MM"], "instagram": ["HH:MM"], "tiktok": ["HH:MM"]}}
}}

GUIDELINES:
- Return ONLY the JSON object. No commentary.
- Use up to 8 relevant hashtags, each prefixed with '#'.
- Provide 2-3 ad copy variants (headline <= 40 chars, body <= 125 chars).
- Make ages consistent with price_range (e.g. premium -> older age_min).
- Keep outputs ASCII-safe and avoid control characters."##,
        name = input.product_name,
        description = input.product_description,
        category = input.category,
        price_range = input.price_range,
        platforms = input.platforms.join(", "),
        locations = locations,
        daily_budget = input.daily_budget,
        total_budget = input.total_budget(),
        days = input.campaign_days,
        cta = input.call_to_action,
    )
}

/// Prompt asking for a campaign strategy grounded in `insights`.
#[must_use]
pub fn strategy_prompt(input: &CampaignInput, insights: &AudienceInsights) -> String {
    let interests = if insights.interests.is_empty() {
        "n/a".to_string()
    } else {
        insights
            .interests
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"As a senior marketing strategist, create a concise, data-driven campaign plan mapped directly to the provided audience insights.

PRODUCT: {name}
DESCRIPTION: {description}
CATEGORY: {category}
PRICE RANGE: {price_range}
TARGET AUDIENCE: {age_min}-{age_max} years old
INTERESTS: {interests}
PLATFORMS: {platforms}
DAILY BUDGET: {daily_budget}
DURATION: {days} days

Return ONLY valid JSON with this exact structure, no text or markdown:

{{
  "targeting_strategy": {{
    "primary_audience": "string",
    "audience_size": "string",
    "targeting_approach": "string",
    "key_segments": ["segment1", "segment2"]
  }},
  "content_strategy": {{
    "key_messaging": ["msg1", "msg2"],
    "content_types": ["type1", "type2"],
    "visual_style": "string"
  }},
  "budget_allocation": {{
    "platform_breakdown": {{"facebook": 35, "instagram": 25, "tiktok": 20, "youtube": 20}},
    "optimization_tips": ["tip1", "tip2"]
  }},
  "performance_predictions": {{
    "estimated_metrics": {{"ctr": "1.5-2.5%", "cpc": "$0.30-$1.50", "conversion_rate": "2-6%"}}
  }}
}}"#,
        name = input.product_name,
        description = input.product_description,
        category = input.category,
        price_range = input.price_range,
        age_min = insights.age_min,
        age_max = insights.age_max,
        interests = interests,
        platforms = input.platforms.join(", "),
        daily_budget = input.daily_budget,
        days = input.campaign_days,
    )
}

/// Canned recommendation for one platform.
#[must_use]
pub fn platform_strategy(platform: &str, input: &CampaignInput) -> String {
    match platform {
        "facebook" => format!(
            "Use detailed interest targeting for {} enthusiasts with carousel ads showcasing key benefits and social proof",
            input.category
        ),
        "instagram" => format!(
            "Leverage visual storytelling through Reels and Stories targeting {} consumers interested in {}",
            input.price_range, input.category
        ),
        "tiktok" => "Create authentic, trending content with demonstrations and user testimonials targeting Gen Z and Millennials".to_string(),
        "youtube" => format!(
            "Produce educational content and detailed reviews targeting consideration-stage buyers researching {}",
            input.category
        ),
        "google" => format!(
            "Capture high-intent searches for {} with tightly themed ad groups and benefit-led headlines",
            input.category
        ),
        "linkedin" => format!(
            "Target professionals and B2B decision makers with case studies and industry insights about {}",
            input.category
        ),
        _ => format!(
            "Implement platform-appropriate content strategy focusing on {} benefits",
            input.product_name
        ),
    }
}
