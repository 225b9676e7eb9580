//! Targeting and unit-conversion helpers shared by the adapters.

use adcast_core::{AudienceInsights, CampaignSpec};

/// Meta interests used when no interest can be resolved: `(id, name)`.
pub const FALLBACK_INTERESTS: [(&str, &str); 3] = [
    ("6003327766874", "Wearable technology"),
    ("6003320344664", "Fitness"),
    ("6003107902613", "Luxury goods"),
];

/// Words that make interest searches worse.
const INTEREST_NOISE: [&str; 6] = ["premium", "high end", "products", "enthusiast", "lovers", "tech"];

/// Most interests looked up per export.
pub const MAX_INTEREST_LOOKUPS: usize = 10;

/// Convert a currency amount to minor units (cents). Rounds half away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert a currency amount to micros. Rounds half away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_micros(amount: f64) -> i64 {
    (amount * 1_000_000.0).round() as i64
}

/// Round a currency amount to its minor unit, keeping currency units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn round_to_minor(amount: f64) -> f64 {
    to_minor_units(amount) as f64 / 100.0
}

/// Prepare an interest for a provider search.
///
/// Underscores become spaces, the text is lowercased, and noise words are removed.
#[must_use]
pub fn clean_interest_name(interest: &str) -> String {
    let mut text = interest.replace('_', " ").trim().to_lowercase();
    for noise in INTEREST_NOISE {
        text = text.replace(noise, "");
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Target countries: the insight locations, else the campaign input locations, else `US`.
#[must_use]
pub fn countries(campaign: &CampaignSpec) -> Vec<String> {
    let source = if campaign.insights.locations.is_empty() {
        &campaign.input.target_location
    } else {
        &campaign.insights.locations
    };
    let countries: Vec<String> = source
        .iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();

    if countries.is_empty() {
        vec!["US".to_string()]
    } else {
        countries
    }
}

/// The call-to-action text to use: the first suggested one, else the input CTA.
#[must_use]
pub fn call_to_action(campaign: &CampaignSpec) -> &str {
    campaign
        .insights
        .primary_cta()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(campaign.input.call_to_action.as_str())
}

/// Map call-to-action text to a Meta CTA type.
#[must_use]
pub fn meta_cta_type(cta: &str) -> &'static str {
    const MAPPING: [(&str, &str); 6] = [
        ("shop now", "SHOP_NOW"),
        ("learn", "LEARN_MORE"),
        ("sign up", "SIGN_UP"),
        ("download", "DOWNLOAD"),
        ("book", "BOOK_TRAVEL"),
        ("get", "GET_OFFER"),
    ];
    let cta = cta.to_lowercase();
    MAPPING
        .iter()
        .find(|(needle, _)| cta.contains(needle))
        .map_or("LEARN_MORE", |(_, kind)| *kind)
}

/// Meta gender codes (`1` male, `2` female) when exactly one gender is targeted.
///
/// Targeting both, or none, is expressed by leaving the field out.
#[must_use]
pub fn meta_genders(genders: &[String]) -> Option<Vec<u8>> {
    let codes: Vec<u8> = genders
        .iter()
        .filter_map(|g| match g.trim().to_lowercase().as_str() {
            "male" => Some(1),
            "female" => Some(2),
            _ => None,
        })
        .collect();
    (codes.len() == 1).then_some(codes)
}

/// Map call-to-action text to a TikTok CTA type.
#[must_use]
pub fn tiktok_cta_type(cta: &str) -> &'static str {
    match cta.trim().to_lowercase().as_str() {
        "shop now" => "SHOP_NOW",
        "sign up" => "SIGN_UP",
        "download" => "DOWNLOAD",
        _ => "LEARN_MORE",
    }
}

/// Map campaign objectives to a TikTok objective. The first recognized one wins.
#[must_use]
pub fn tiktok_objective(objectives: &[String]) -> &'static str {
    objectives
        .iter()
        .find_map(|objective| match objective.trim().to_lowercase().as_str() {
            "conversions" => Some("CONVERSIONS"),
            "awareness" => Some("REACH"),
            "engagement" => Some("ENGAGEMENT"),
            "traffic" => Some("TRAFFIC"),
            _ => None,
        })
        .unwrap_or("CONVERSIONS")
}

/// Headline and body for the first ad, falling back to the product name and description.
#[must_use]
pub fn ad_text(campaign: &CampaignSpec, headline_max: usize, body_max: usize) -> (String, String) {
    let insights: &AudienceInsights = &campaign.insights;
    let (headline, body) = insights.primary_copy().map_or(
        (
            campaign.input.product_name.as_str(),
            campaign.input.product_description.as_str(),
        ),
        |copy| (copy.headline.as_str(), copy.body.as_str()),
    );
    (truncate(headline, headline_max), truncate(body, body_max))
}

/// Google Ads geo target constants for common country codes.
const GOOGLE_GEO_TARGETS: [(&str, u32); 12] = [
    ("AU", 2036),
    ("BR", 2076),
    ("CA", 2124),
    ("DE", 2276),
    ("ES", 2724),
    ("FR", 2250),
    ("GB", 2826),
    ("IN", 2356),
    ("IT", 2380),
    ("JP", 2392),
    ("MX", 2484),
    ("US", 2840),
];

/// Google Ads age brackets: `(first age, last age, enum name)`.
const GOOGLE_AGE_RANGES: [(u8, u8, &str); 6] = [
    (18, 24, "AGE_RANGE_18_24"),
    (25, 34, "AGE_RANGE_25_34"),
    (35, 44, "AGE_RANGE_35_44"),
    (45, 54, "AGE_RANGE_45_54"),
    (55, 64, "AGE_RANGE_55_64"),
    (65, u8::MAX, "AGE_RANGE_65_UP"),
];

/// Geo target constant resource names for the campaign's countries.
///
/// Countries without a known constant are dropped.
#[must_use]
pub fn google_geo_targets(campaign: &CampaignSpec) -> Vec<String> {
    countries(campaign)
        .iter()
        .filter_map(|country| {
            GOOGLE_GEO_TARGETS
                .iter()
                .find(|(code, _)| code == country)
                .map(|(_, id)| format!("geoTargetConstants/{id}"))
        })
        .collect()
}

/// Google age brackets overlapping `[age_min, age_max]`.
///
/// Falls back to the 18-24 bracket when the range sits entirely below 18.
#[must_use]
pub fn google_age_ranges(age_min: u8, age_max: u8) -> Vec<&'static str> {
    let ranges: Vec<&'static str> = GOOGLE_AGE_RANGES
        .iter()
        .filter(|(first, last, _)| *first <= age_max && age_min <= *last)
        .map(|(_, _, name)| *name)
        .collect();
    if ranges.is_empty() {
        vec![GOOGLE_AGE_RANGES[0].2]
    } else {
        ranges
    }
}

/// Truncate to at most `max` characters.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    text.trim().chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_campaign;
    use adcast_core::AdCopy;

    #[test]
    fn unit_conversions_round_consistently() {
        assert_eq!(to_minor_units(50.0), 5_000);
        assert_eq!(to_minor_units(19.999), 2_000);
        assert_eq!(to_micros(1.25), 1_250_000);
        assert!((round_to_minor(12.345_6) - 12.35).abs() < 1e-9);
    }

    #[test]
    fn interest_names_are_cleaned() {
        assert_eq!(clean_interest_name("luxury_products"), "luxury");
        assert_eq!(clean_interest_name("Premium Watch Lovers"), "watch");
        assert_eq!(clean_interest_name("golf"), "golf");
        assert_eq!(clean_interest_name("tech"), "");
    }

    #[test]
    fn cta_mappings() {
        assert_eq!(meta_cta_type("Shop Now"), "SHOP_NOW");
        assert_eq!(meta_cta_type("Learn more today"), "LEARN_MORE");
        assert_eq!(meta_cta_type("Book your stay"), "BOOK_TRAVEL");
        assert_eq!(meta_cta_type("Get 20% off"), "GET_OFFER");
        assert_eq!(meta_cta_type("Call us"), "LEARN_MORE");
        assert_eq!(tiktok_cta_type("Sign Up"), "SIGN_UP");
        assert_eq!(tiktok_cta_type("whatever"), "LEARN_MORE");
    }

    #[test]
    fn meta_genders_only_narrow_for_one_gender() {
        assert_eq!(meta_genders(&["Female".into()]), Some(vec![2]));
        assert_eq!(meta_genders(&["male".into(), "female".into()]), None);
        assert_eq!(meta_genders(&["all".into()]), None);
    }

    #[test]
    fn tiktok_objective_uses_first_recognized() {
        let objectives = vec!["brand".to_string(), "Awareness".to_string(), "traffic".to_string()];
        assert_eq!(tiktok_objective(&objectives), "REACH");
        assert_eq!(tiktok_objective(&[]), "CONVERSIONS");
    }

    #[test]
    fn countries_prefer_insights() {
        let mut campaign = sample_campaign();
        campaign.insights.locations = vec!["gb".into(), " ".into()];
        assert_eq!(countries(&campaign), vec!["GB"]);

        campaign.insights.locations.clear();
        campaign.input.target_location = vec!["de".into()];
        assert_eq!(countries(&campaign), vec!["DE"]);
    }

    #[test]
    fn google_targeting_maps_countries_and_ages() {
        let mut campaign = sample_campaign();
        campaign.insights.locations = vec!["us".into(), "gb".into(), "zz".into()];
        assert_eq!(
            google_geo_targets(&campaign),
            vec!["geoTargetConstants/2840", "geoTargetConstants/2826"]
        );

        assert_eq!(
            google_age_ranges(35, 65),
            vec!["AGE_RANGE_35_44", "AGE_RANGE_45_54", "AGE_RANGE_55_64", "AGE_RANGE_65_UP"]
        );
        assert_eq!(google_age_ranges(25, 34), vec!["AGE_RANGE_25_34"]);
        assert_eq!(google_age_ranges(13, 17), vec!["AGE_RANGE_18_24"]);
    }

    #[test]
    fn ad_text_prefers_copy_and_truncates() {
        let mut campaign = sample_campaign();
        let (headline, body) = ad_text(&campaign, 5, 10);
        assert_eq!(headline, "Auror");
        assert_eq!(body, "A handcraf");

        campaign.insights.ad_copies = vec![AdCopy {
            headline: "Time, refined".into(),
            body: "Sapphire glass.".into(),
        }];
        assert_eq!(ad_text(&campaign, 30, 90), ("Time, refined".to_string(), "Sapphire glass.".to_string()));
    }
}
