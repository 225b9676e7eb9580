//! Service configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use adcast_core::CreditPolicy;
use adcast_export::meta::{DEFAULT_GRAPH_BASE_URL, DEFAULT_GRAPH_VERSION};
use adcast_export::ProvidersConfig;
use adcast_reasoner::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use adcast_reasoner::{ReasoningConfig, RetryPolicy};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/adcast").
    pub data_dir: String,

    /// HS256 secret for end-user session tokens.
    pub jwt_secret: Option<String>,

    /// Admin API key for privileged credit operations.
    pub admin_api_key: Option<String>,

    /// Operator token for commit-mode exports, in plain text.
    pub export_admin_key: Option<String>,

    /// Operator token for commit-mode exports, as hex SHA-256.
    pub export_admin_key_sha256: Option<String>,

    /// Whether commit-mode exports are allowed at all.
    pub allow_real_ads: bool,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Timeout for one provider HTTP call, in seconds.
    pub provider_timeout_seconds: u64,

    /// Wall-clock limit for one provider's whole export, in seconds.
    pub export_timeout_seconds: u64,

    /// Most campaigns kept in the read cache.
    pub campaign_cache_capacity: usize,

    /// How long a cached campaign stays valid, in seconds.
    pub campaign_cache_ttl_seconds: u64,

    /// Credit policy (bonuses, thresholds, export charging).
    pub credit_policy: CreditPolicy,

    /// Reasoning service settings.
    pub reasoning: ReasoningConfig,

    /// Provider credentials.
    pub providers: ProvidersConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables and the provider secrets file.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let credit_policy = CreditPolicy {
            signup_bonus: env_parse("SIGNUP_BONUS_CREDITS").unwrap_or(0),
            commit_export_cost: env_parse("COMMIT_EXPORT_COST").unwrap_or(0),
            ..CreditPolicy::default()
        };

        let reasoning = ReasoningConfig {
            api_key: env_opt("MISTRAL_API_KEY"),
            base_url: env_opt("MISTRAL_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            model: env_opt("MISTRAL_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            retry: env_parse("REASONER_MAX_ATTEMPTS").map_or_else(RetryPolicy::default, |max_attempts| {
                RetryPolicy {
                    max_attempts,
                    ..RetryPolicy::default()
                }
            }),
            diagnostics_dir: env_opt("REASONER_DIAGNOSTICS_DIR").map(PathBuf::from),
            ..ReasoningConfig::default()
        };

        Self {
            listen_addr: env_opt("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: env_opt("DATA_DIR").unwrap_or(defaults.data_dir),
            jwt_secret: env_opt("JWT_SECRET"),
            admin_api_key: env_opt("ADMIN_API_KEY"),
            export_admin_key: env_opt("EXPORT_ADMIN_KEY"),
            export_admin_key_sha256: env_opt("EXPORT_ADMIN_KEY_SHA256"),
            allow_real_ads: env_opt("ALLOW_REAL_ADS").is_some_and(|v| parse_flag(&v)),
            cors_origins: env_opt("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            provider_timeout_seconds: env_parse("PROVIDER_TIMEOUT_SECONDS")
                .unwrap_or(defaults.provider_timeout_seconds),
            export_timeout_seconds: env_parse("EXPORT_TIMEOUT_SECONDS")
                .unwrap_or(defaults.export_timeout_seconds),
            campaign_cache_capacity: env_parse("CAMPAIGN_CACHE_CAPACITY")
                .unwrap_or(defaults.campaign_cache_capacity),
            campaign_cache_ttl_seconds: env_parse("CAMPAIGN_CACHE_TTL_SECONDS")
                .unwrap_or(defaults.campaign_cache_ttl_seconds),
            credit_policy,
            reasoning,
            providers: load_provider_secrets(),
        }
    }

    /// Per-call provider timeout.
    #[must_use]
    pub const fn provider_step_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_seconds)
    }

    /// Per-provider export limit.
    #[must_use]
    pub const fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_seconds)
    }

    /// Cache time-to-live.
    #[must_use]
    pub const fn campaign_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.campaign_cache_ttl_seconds)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/adcast".into(),
            jwt_secret: None,
            admin_api_key: None,
            export_admin_key: None,
            export_admin_key_sha256: None,
            allow_real_ads: false,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 120,
            provider_timeout_seconds: 30,
            export_timeout_seconds: 120,
            campaign_cache_capacity: 1000,
            campaign_cache_ttl_seconds: 86_400,
            credit_policy: CreditPolicy::default(),
            reasoning: ReasoningConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_opt(name).and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load provider credentials from the secrets file, falling back to the environment.
fn load_provider_secrets() -> ProvidersConfig {
    let secret_paths = [
        ".secrets/providers.json",
        "adcast/.secrets/providers.json",
        "../.secrets/providers.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<ProvidersConfig>(path) {
            tracing::info!(path = %path, "Loaded provider secrets from file");
            return secrets;
        }
    }

    tracing::debug!("Provider secrets file not found, using environment variables");
    providers_from_env()
}

fn providers_from_env() -> ProvidersConfig {
    let mut providers = ProvidersConfig::default();

    providers.facebook.access_token = env_opt("FACEBOOK_ACCESS_TOKEN");
    providers.facebook.ad_account_id = env_opt("FACEBOOK_AD_ACCOUNT_ID");
    providers.facebook.page_id = env_opt("FACEBOOK_PAGE_ID");
    providers.facebook.graph_version =
        env_opt("FACEBOOK_GRAPH_VERSION").unwrap_or_else(|| DEFAULT_GRAPH_VERSION.into());
    providers.facebook.base_url =
        env_opt("FACEBOOK_GRAPH_BASE_URL").unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.into());

    providers.google.developer_token = env_opt("GOOGLE_ADS_DEVELOPER_TOKEN");
    providers.google.access_token = env_opt("GOOGLE_ADS_ACCESS_TOKEN");
    providers.google.customer_id = env_opt("GOOGLE_ADS_CUSTOMER_ID");
    providers.google.login_customer_id = env_opt("GOOGLE_ADS_LOGIN_CUSTOMER_ID");

    providers.tiktok.access_token = env_opt("TIKTOK_ACCESS_TOKEN");
    providers.tiktok.advertiser_id = env_opt("TIKTOK_ADVERTISER_ID");

    providers
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
