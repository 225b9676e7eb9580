//! Persistence of export outcomes.
//!
//! Every provider result becomes an append-only attempt row, and the campaign aggregate
//! is folded forward in the same unit of work. A failed retry never erases identifiers
//! from an earlier successful export.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use adcast_core::{CampaignId, CampaignSpec, ExportAttempt, ExportMode, ExportReport};
use adcast_store::{CampaignCache, Result, Store};

/// Records export reports against campaigns.
#[derive(Clone)]
pub struct ExportStateStore {
    store: Arc<dyn Store>,
    cache: Option<Arc<CampaignCache>>,
}

impl ExportStateStore {
    /// Create a state store without a read cache.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, cache: None }
    }

    /// Invalidate `cache` whenever an export is recorded.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<CampaignCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Record one orchestrator report.
    ///
    /// `order` is the provider order as requested; it is kept in the history entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the campaign doesn't exist, or a database error.
    /// Nothing is written in either case.
    pub fn record(
        &self,
        campaign_id: &CampaignId,
        mode: ExportMode,
        report: &ExportReport,
        order: &[String],
    ) -> Result<CampaignSpec> {
        let at = Utc::now();
        let attempts: Vec<ExportAttempt> = report
            .values()
            .map(|result| ExportAttempt::from_result(campaign_id, mode, result, at))
            .collect();

        let updated = self.store.record_export(campaign_id, &attempts, &|aggregate| {
            aggregate.apply(mode, report, order, at);
        })?;

        if let Some(cache) = &self.cache {
            cache.invalidate(campaign_id);
        }

        info!(
            campaign_id = %campaign_id,
            mode = %mode,
            attempts = attempts.len(),
            "Export recorded"
        );
        Ok(updated)
    }

    /// Recorded attempts for a campaign, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn attempts(&self, campaign_id: &CampaignId, limit: usize) -> Result<Vec<ExportAttempt>> {
        self.store.list_export_attempts(campaign_id, limit)
    }
}

impl std::fmt::Debug for ExportStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportStateStore")
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}
