//! Provider name to adapter lookup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::adapter::{Provider, ProviderAdapter};
use crate::google::{GoogleAdsAdapter, GoogleAdsConfig};
use crate::http::ProviderHttp;
use crate::meta::{MetaAdapter, MetaConfig};
use crate::tiktok::{TikTokAdapter, TikTokConfig};

/// Credentials for every provider.
///
/// The Meta section serves both the `facebook` and `instagram` adapters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Meta Graph API credentials.
    #[serde(alias = "meta")]
    pub facebook: MetaConfig,
    /// Google Ads credentials.
    #[serde(alias = "google_ads")]
    pub google: GoogleAdsConfig,
    /// TikTok Business credentials.
    pub tiktok: TikTokConfig,
}

/// The set of available adapters.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    /// A registry with no adapters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the standard adapters from credentials.
    ///
    /// Every implemented provider is registered even without credentials; a commit then
    /// reports the missing credential as an error result.
    #[must_use]
    pub fn from_config(config: &ProvidersConfig, step_timeout: Duration) -> Self {
        let http = ProviderHttp::new(step_timeout);
        let mut registry = Self::empty();
        registry.register(Arc::new(MetaAdapter::facebook(
            config.facebook.clone(),
            http.clone(),
        )));
        registry.register(Arc::new(MetaAdapter::instagram(
            config.facebook.clone(),
            http.clone(),
        )));
        registry.register(Arc::new(GoogleAdsAdapter::new(
            config.google.clone(),
            http.clone(),
        )));
        registry.register(Arc::new(TikTokAdapter::new(config.tiktok.clone(), http)));
        registry
    }

    /// Add or replace the adapter for its provider.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider(), adapter);
    }

    /// Look up an adapter by provider name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        Provider::from_name(name).and_then(|provider| self.adapters.get(&provider).cloned())
    }

    /// Registered providers, in a stable order.
    #[must_use]
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.adapters.keys().copied().collect();
        providers.sort();
        providers
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_every_provider() {
        let registry = AdapterRegistry::from_config(&ProvidersConfig::default(), Duration::from_secs(1));
        assert_eq!(registry.providers(), Provider::ALL.to_vec());
        assert_eq!(
            registry.get("Instagram").map(|a| a.provider()),
            Some(Provider::Instagram)
        );
        assert!(registry.get("linkedin").is_none());
    }

    #[test]
    fn providers_config_accepts_aliases() {
        let config: ProvidersConfig = serde_json::from_value(serde_json::json!({
            "meta": { "access_token": "t", "ad_account_id": "123" },
            "tiktok": { "advertiser_id": "42" }
        }))
        .unwrap();
        assert_eq!(config.facebook.ad_account_id.as_deref(), Some("123"));
        assert_eq!(config.tiktok.advertiser_id.as_deref(), Some("42"));
    }
}
