//! Application state.

use std::sync::Arc;

use adcast_export::{AdapterRegistry, ExportOrchestrator};
use adcast_reasoner::ReasoningClient;
use adcast_store::{CampaignCache, CreditLedger, Store};

use crate::config::ServiceConfig;
use crate::gate::CommitGate;
use crate::workflow::CampaignWorkflow;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// Credit ledger over the store.
    pub ledger: Arc<CreditLedger>,

    /// Campaign generation and export.
    pub workflow: Arc<CampaignWorkflow>,
}

impl AppState {
    /// Create application state with the standard provider adapters.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let registry =
            AdapterRegistry::from_config(&config.providers, config.provider_step_timeout());
        Self::with_registry(store, config, registry)
    }

    /// Create application state with a custom adapter registry.
    #[must_use]
    pub fn with_registry(
        store: Arc<dyn Store>,
        config: ServiceConfig,
        registry: AdapterRegistry,
    ) -> Self {
        let ledger = Arc::new(CreditLedger::new(
            Arc::clone(&store),
            config.credit_policy.clone(),
        ));
        let cache = Arc::new(CampaignCache::new(
            config.campaign_cache_capacity,
            config.campaign_cache_ttl(),
        ));

        let reasoner = ReasoningClient::new(config.reasoning.clone());
        if reasoner.is_configured() {
            tracing::info!(model = %config.reasoning.model, "Reasoning service enabled");
        } else {
            tracing::warn!("Reasoning service not configured - campaigns will use fallback content");
        }

        let gate = CommitGate::from_config(&config);
        if config.allow_real_ads && !gate.has_key() {
            tracing::warn!("ALLOW_REAL_ADS is set but no export operator key is configured");
        }

        tracing::info!(providers = ?registry.providers(), "Provider adapters registered");
        let orchestrator = ExportOrchestrator::new(Arc::new(registry), config.export_timeout());

        let workflow = Arc::new(CampaignWorkflow::new(
            store,
            Arc::clone(&ledger),
            cache,
            reasoner,
            orchestrator,
            gate,
        ));

        Self {
            config,
            ledger,
            workflow,
        }
    }
}
