//! Field-by-field normalization of model-produced audience insights.
//!
//! Each field is read, cleaned and defaulted on its own, so a malformed value in one
//! field never discards the rest of the response.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use adcast_core::{AdCopy, AudienceInsights, CampaignInput, InsightSource, PriceTier};

use crate::prompts;

/// Youngest targetable age.
pub const AGE_FLOOR: u8 = 13;
/// Oldest targetable age.
pub const AGE_CEILING: u8 = 80;

const DEFAULT_AGE_MIN: i64 = 25;
const DEFAULT_AGE_MAX: i64 = 45;
const DEFAULT_CTA: &str = "Shop Now";
const MAX_HASHTAGS: usize = 8;
const MAX_AD_COPIES: usize = 5;
const MAX_HEADLINE_CHARS: usize = 40;
const MAX_BODY_CHARS: usize = 125;

/// Default posting times for platforms that must always have some.
pub const DEFAULT_POSTING_TIMES: [(&str, [&str; 2]); 3] = [
    ("facebook", ["19:00", "20:00"]),
    ("instagram", ["17:00", "19:00"]),
    ("tiktok", ["18:00", "20:00"]),
];

/// Build insights from a parsed model response.
#[must_use]
pub fn normalize(raw: &Value, input: &CampaignInput) -> AudienceInsights {
    let (age_min, age_max) = normalize_ages(
        raw.get("age_min").and_then(as_int),
        raw.get("age_max").and_then(as_int),
        input.price_tier(),
    );

    let genders = or_default(
        string_list(raw.get("genders"))
            .into_iter()
            .map(|g| g.to_lowercase())
            .collect(),
        &["female", "male"],
    );

    let cta = if input.call_to_action.is_empty() {
        DEFAULT_CTA
    } else {
        input.call_to_action.as_str()
    };

    let mut platform_recommendations = recommendations(raw.get("platform_recommendations"));
    for platform in &input.platforms {
        platform_recommendations
            .entry(platform.clone())
            .or_insert_with(|| prompts::platform_strategy(platform, input));
    }

    AudienceInsights {
        age_min,
        age_max,
        genders: dedupe(genders),
        interests: or_default(string_list(raw.get("interests")), &["shopping", "lifestyle"]),
        behaviors: or_default(string_list(raw.get("behaviors")), &["online_shopping"]),
        locations: nonempty_or(string_list(raw.get("locations")), &input.target_location),
        languages: or_default(string_list(raw.get("languages")), &["en"]),
        suggested_ctas: or_default(string_list(raw.get("suggested_ctas")), &[cta]),
        campaign_objectives: or_default(
            string_list(raw.get("campaign_objectives")),
            &["awareness", "conversions"],
        ),
        platform_recommendations,
        ideal_posting_times: posting_times(raw.get("ideal_posting_times")),
        hashtags: hashtags(raw.get("hashtags")),
        ad_copies: ad_copies(raw.get("ad_copies")),
        source: InsightSource::Reasoned,
    }
}

/// Clamp an age range into `[13, 80]` with `max > min`, nudged by price tier.
#[must_use]
pub fn normalize_ages(age_min: Option<i64>, age_max: Option<i64>, tier: PriceTier) -> (u8, u8) {
    let floor = i64::from(AGE_FLOOR);
    let ceiling = i64::from(AGE_CEILING);

    let mut min = age_min.unwrap_or(DEFAULT_AGE_MIN).clamp(floor, ceiling - 1);
    min = match tier {
        PriceTier::Luxury => min.max(30),
        PriceTier::Premium => min.max(25),
        PriceTier::Budget => min.min(35),
        PriceTier::MidRange => min,
    };
    let max = age_max.unwrap_or(DEFAULT_AGE_MAX).clamp(min + 1, ceiling);

    (to_age(min), to_age(max))
}

fn to_age(value: i64) -> u8 {
    u8::try_from(value).unwrap_or(AGE_CEILING)
}

/// Normalize `H:MM` or `HH:MM` to `HH:MM`, wrapping hours and minutes.
#[must_use]
pub fn normalize_time(text: &str) -> Option<String> {
    let caps = time_pattern().captures(text.trim())?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    Some(format!("{:02}:{:02}", hours % 24, minutes % 60))
}

fn time_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid regex"))
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items.iter().filter_map(as_text).collect(),
        Some(other) => as_text(other).into_iter().collect(),
        None => Vec::new(),
    };
    dedupe(items)
}

/// Remove case-insensitive duplicates, keeping the first spelling.
fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

fn or_default(items: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if items.is_empty() {
        defaults.iter().map(|d| (*d).to_string()).collect()
    } else {
        items
    }
}

fn nonempty_or(items: Vec<String>, defaults: &[String]) -> Vec<String> {
    if items.is_empty() {
        defaults.to_vec()
    } else {
        items
    }
}

fn hashtags(value: Option<&Value>) -> Vec<String> {
    let tags = string_list(value)
        .into_iter()
        .map(|tag| tag.split_whitespace().collect::<String>())
        .map(|tag| tag.trim_start_matches('#').to_string())
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{tag}"))
        .collect();

    dedupe(tags).into_iter().take(MAX_HASHTAGS).collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn ad_copies(value: Option<&Value>) -> Vec<AdCopy> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .take(MAX_AD_COPIES)
        .filter_map(|item| {
            let (headline, body) = match item {
                Value::Object(fields) => (
                    fields.get("headline").and_then(as_text).unwrap_or_default(),
                    fields.get("body").and_then(as_text).unwrap_or_default(),
                ),
                other => {
                    let text = as_text(other)?;
                    (text.clone(), text)
                }
            };
            if headline.is_empty() && body.is_empty() {
                return None;
            }
            Some(AdCopy {
                headline: truncate(&headline, MAX_HEADLINE_CHARS),
                body: truncate(&body, MAX_BODY_CHARS),
            })
        })
        .collect()
}

fn recommendations(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(fields)) = value else {
        return BTreeMap::new();
    };

    fields
        .iter()
        .filter_map(|(platform, rec)| {
            let text = as_text(rec).or_else(|| match rec {
                Value::Array(_) | Value::Object(_) => Some(rec.to_string()),
                _ => None,
            })?;
            Some((platform.trim().to_lowercase(), text))
        })
        .collect()
}

fn posting_times(value: Option<&Value>) -> BTreeMap<String, Vec<String>> {
    let mut times: BTreeMap<String, Vec<String>> = BTreeMap::new();

    if let Some(Value::Object(fields)) = value {
        for (platform, entries) in fields {
            let normalized: Vec<String> = string_list(Some(entries))
                .iter()
                .filter_map(|t| normalize_time(t))
                .collect();
            if !normalized.is_empty() {
                times.insert(platform.trim().to_lowercase(), dedupe(normalized));
            }
        }
    }

    for (platform, defaults) in DEFAULT_POSTING_TIMES {
        times
            .entry(platform.to_string())
            .or_insert_with(|| defaults.iter().map(|t| (*t).to_string()).collect());
    }

    times
}
