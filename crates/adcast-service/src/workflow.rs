//! Campaign generation and export, with their credit rules.
//!
//! # Generation
//!
//! 1. Validate the input.
//! 2. Check the balance. An insufficient balance fails here, before any reasoning call.
//! 3. Ask the reasoning service for insights and strategy (never fails; falls back).
//! 4. Deduct the campaign cost.
//! 5. Build one feed per requested platform.
//! 6. Persist the campaign with its feeds. If that fails the deduction is refunded.
//!
//! # Export
//!
//! Commit mode is authorized by the [`CommitGate`] before anything else. When export
//! charging is enabled, commit exports deduct per recognized provider up front and refund
//! when no provider made progress. Provider outcomes never fail the call; they are
//! reported per provider and recorded on the campaign.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use adcast_core::ledger::{ACTION_CAMPAIGN_GENERATION, ACTION_COMMIT_EXPORT};
use adcast_core::{
    AdcastError, CampaignExportAggregate, CampaignId, CampaignInput, CampaignSpec,
    ExportAttempt, ExportMode, ExportReport, PlatformFeed, Result, UserId,
};
use adcast_export::{
    generate_feeds, normalize_providers, ExportOrchestrator, ExportPackage, ExportStateStore,
    Provider,
};
use adcast_reasoner::ReasoningClient;
use adcast_store::{CampaignCache, CreditLedger, Store};

use crate::gate::CommitGate;

/// Result of one export call.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    /// The exported campaign.
    pub campaign_id: CampaignId,
    /// Mode the export ran in.
    pub mode: ExportMode,
    /// One entry per distinct requested provider.
    pub results: ExportReport,
    /// Credits deducted for this export.
    pub credits_charged: i64,
    /// Credits returned because no provider made progress.
    pub credits_refunded: i64,
}

/// Orchestrates the ledger, reasoning client, store, and export components.
pub struct CampaignWorkflow {
    store: Arc<dyn Store>,
    ledger: Arc<CreditLedger>,
    cache: Arc<CampaignCache>,
    reasoner: ReasoningClient,
    orchestrator: ExportOrchestrator,
    export_state: ExportStateStore,
    gate: CommitGate,
}

impl CampaignWorkflow {
    /// Wire the workflow together.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<CreditLedger>,
        cache: Arc<CampaignCache>,
        reasoner: ReasoningClient,
        orchestrator: ExportOrchestrator,
        gate: CommitGate,
    ) -> Self {
        let export_state = ExportStateStore::new(Arc::clone(&store)).with_cache(Arc::clone(&cache));
        Self {
            store,
            ledger,
            cache,
            reasoner,
            orchestrator,
            export_state,
            gate,
        }
    }

    /// The campaign read cache.
    #[must_use]
    pub fn cache(&self) -> &CampaignCache {
        &self.cache
    }

    /// Whether a reasoning service credential is configured.
    #[must_use]
    pub fn reasoning_configured(&self) -> bool {
        self.reasoner.is_configured()
    }

    /// Whether commit-mode exports can be authorized at all.
    #[must_use]
    pub fn commit_enabled(&self) -> bool {
        self.gate.is_open()
    }

    /// Whether the store answers a read.
    #[must_use]
    pub fn store_ready(&self) -> bool {
        match self.store.list_campaigns_by_user(&UserId::generate(), 1, 0) {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(error = %err, "Store read failed during health check");
                false
            }
        }
    }

    /// Providers with a registered export adapter.
    #[must_use]
    pub fn providers(&self) -> Vec<Provider> {
        self.orchestrator.registry().providers()
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Generate and persist a campaign, charging its cost.
    ///
    /// # Errors
    ///
    /// - `AdcastError::Validation` for rejected input.
    /// - `AdcastError::InsufficientCredits` before any reasoning work if the balance is
    ///   too low.
    /// - `AdcastError::NotFound` if the user has no account.
    /// - `AdcastError::Persistence` if the campaign could not be saved; the charge is
    ///   refunded.
    pub async fn generate(&self, user_id: &UserId, input: CampaignInput) -> Result<CampaignSpec> {
        let input = input.validate()?;
        let providers = normalize_providers(&input.platforms);
        let cost = self
            .ledger
            .policy()
            .campaign_cost(providers.len(), input.advanced_targeting);

        let check = self.ledger.check_balance(user_id, cost)?;
        if !check.has_enough {
            tracing::info!(
                user_id = %user_id,
                balance = check.current_balance,
                required = cost,
                "Campaign generation rejected for insufficient credits"
            );
            return Err(AdcastError::InsufficientCredits {
                balance: check.current_balance,
                required: cost,
            });
        }

        let insights = self.reasoner.audience_insights(&input).await;
        let strategy = self.reasoner.campaign_strategy(&input, &insights).await;

        let created_at = Utc::now();
        let campaign_id = CampaignId::generate(&input.product_name, created_at);
        self.ledger.deduct(
            user_id,
            cost,
            ACTION_CAMPAIGN_GENERATION,
            Some(&campaign_id),
            json!({
                "product_name": input.product_name,
                "providers": providers,
                "advanced_targeting": input.advanced_targeting,
                "insights_source": insights.source,
            }),
        )?;

        let mut campaign = CampaignSpec {
            id: campaign_id,
            user_id: *user_id,
            input,
            insights,
            strategy,
            credits_charged: cost,
            created_at,
            feeds: Vec::new(),
            export: CampaignExportAggregate::default(),
        };
        campaign.feeds = generate_feeds(&campaign);

        if let Err(err) = self.store.create_campaign(&campaign) {
            tracing::error!(
                user_id = %user_id,
                campaign_id = %campaign.id,
                error = %err,
                "Failed to save campaign, refunding"
            );
            self.refund(user_id, cost, "Campaign could not be saved");
            return Err(AdcastError::Persistence(err.to_string()));
        }

        self.cache.put(campaign.clone());
        tracing::info!(
            user_id = %user_id,
            campaign_id = %campaign.id,
            credits = cost,
            source = ?campaign.insights.source,
            "Campaign generated"
        );
        Ok(campaign)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Load a campaign owned by `user_id`.
    ///
    /// # Errors
    ///
    /// `AdcastError::NotFound` if it doesn't exist, `AdcastError::Forbidden` if it belongs
    /// to someone else.
    pub fn campaign(&self, user_id: &UserId, campaign_id: &CampaignId) -> Result<CampaignSpec> {
        let campaign = self
            .cache
            .get_or_load(campaign_id, || self.store.get_campaign(campaign_id))?
            .ok_or_else(|| AdcastError::NotFound {
                entity: "campaign",
                id: campaign_id.to_string(),
            })?;

        if campaign.is_owned_by(user_id) {
            Ok(campaign)
        } else {
            Err(AdcastError::Forbidden(format!(
                "campaign {campaign_id} belongs to another user"
            )))
        }
    }

    /// Campaigns owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn campaigns(&self, user_id: &UserId, limit: usize, offset: usize) -> Result<Vec<CampaignSpec>> {
        Ok(self.store.list_campaigns_by_user(user_id, limit, offset)?)
    }

    /// The stored feed for `platform` of a campaign owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Same as [`campaign`](Self::campaign), plus `AdcastError::NotFound` if the campaign
    /// has no feed for the platform.
    pub fn feed(
        &self,
        user_id: &UserId,
        campaign_id: &CampaignId,
        platform: &str,
    ) -> Result<PlatformFeed> {
        let campaign = self.campaign(user_id, campaign_id)?;
        campaign
            .feed(platform)
            .cloned()
            .ok_or_else(|| AdcastError::NotFound {
                entity: "feed",
                id: format!("{campaign_id}/{}", platform.trim().to_lowercase()),
            })
    }

    /// The downloadable package for a campaign owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Same as [`campaign`](Self::campaign).
    pub fn package(&self, user_id: &UserId, campaign_id: &CampaignId) -> Result<ExportPackage> {
        let campaign = self.campaign(user_id, campaign_id)?;
        Ok(ExportPackage::build(&campaign, Utc::now()))
    }

    /// Recorded export attempts for a campaign owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Same as [`campaign`](Self::campaign), plus store read failures.
    pub fn export_attempts(
        &self,
        user_id: &UserId,
        campaign_id: &CampaignId,
        limit: usize,
    ) -> Result<Vec<ExportAttempt>> {
        self.campaign(user_id, campaign_id)?;
        Ok(self.export_state.attempts(campaign_id, limit)?)
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Export a campaign to `providers` (or its own platforms when empty).
    ///
    /// # Errors
    ///
    /// - `AdcastError::Authorization` if commit mode is not authorized. Nothing runs.
    /// - `AdcastError::NotFound` / `AdcastError::Forbidden` for the campaign lookup.
    /// - `AdcastError::InsufficientCredits` if export charging is on and the balance is
    ///   too low.
    /// - `AdcastError::Persistence` if the outcome could not be recorded.
    pub async fn export(
        &self,
        user_id: &UserId,
        campaign_id: &CampaignId,
        providers: &[String],
        mode: ExportMode,
        operator_key: Option<&str>,
    ) -> Result<ExportOutcome> {
        if mode == ExportMode::Commit {
            self.gate.authorize(operator_key)?;
        }

        let campaign = self.campaign(user_id, campaign_id)?;
        let names = if providers.is_empty() {
            normalize_providers(&campaign.input.platforms)
        } else {
            normalize_providers(providers)
        };

        let charge = if mode == ExportMode::Commit {
            let recognized = names
                .iter()
                .filter(|name| self.orchestrator.registry().get(name).is_some())
                .count();
            self.ledger.policy().commit_export_cost(recognized)
        } else {
            0
        };
        if charge > 0 {
            self.ledger.deduct(
                user_id,
                charge,
                ACTION_COMMIT_EXPORT,
                Some(campaign_id),
                json!({ "providers": names }),
            )?;
        }

        let report = self.orchestrator.run(Arc::new(campaign), &names, mode).await;

        let mut refunded = 0;
        if charge > 0
            && !report.values().any(|result| result.status.made_progress())
            && self.refund(user_id, charge, "Export made no progress on any provider")
        {
            refunded = charge;
        }

        self.export_state
            .record(campaign_id, mode, &report, &names)
            .map_err(|err| {
                tracing::error!(
                    campaign_id = %campaign_id,
                    error = %err,
                    "Failed to record export outcome"
                );
                AdcastError::Persistence(err.to_string())
            })?;

        Ok(ExportOutcome {
            campaign_id: campaign_id.clone(),
            mode,
            results: report,
            credits_charged: charge,
            credits_refunded: refunded,
        })
    }

    fn refund(&self, user_id: &UserId, amount: i64, reason: &str) -> bool {
        match self.ledger.refund(user_id, amount, reason) {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(
                    user_id = %user_id,
                    amount,
                    error = %err,
                    "Refund failed"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for CampaignWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignWorkflow")
            .field("reasoning_configured", &self.reasoner.is_configured())
            .field("orchestrator", &self.orchestrator)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcast_core::{CreditPolicy, ExportStatus, SubscriptionTier};
    use adcast_export::AdapterRegistry;
    use adcast_reasoner::ReasoningConfig;
    use adcast_store::MemoryStore;
    use std::time::Duration;

    fn input(platforms: &[&str]) -> CampaignInput {
        CampaignInput {
            product_name: "Aurora Watch".into(),
            product_description: "A handcrafted smartwatch with sapphire glass".into(),
            category: "luxury".into(),
            price_range: "luxury".into(),
            platforms: platforms.iter().map(ToString::to_string).collect(),
            target_location: vec!["US".into()],
            daily_budget: 50.0,
            campaign_days: 10,
            call_to_action: "Shop Now".into(),
            reference_description: None,
            image_url: None,
            landing_page_url: None,
            advanced_targeting: false,
        }
    }

    struct Fixture {
        workflow: CampaignWorkflow,
        ledger: Arc<CreditLedger>,
        user_id: UserId,
    }

    fn fixture(policy: CreditPolicy, gate: CommitGate, tier: SubscriptionTier) -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let ledger = Arc::new(CreditLedger::new(Arc::clone(&store), policy));
        let user_id = UserId::generate();
        ledger.open_account(user_id, tier).unwrap();

        let registry = AdapterRegistry::from_config(&Default::default(), Duration::from_secs(1));
        let workflow = CampaignWorkflow::new(
            store,
            Arc::clone(&ledger),
            Arc::new(CampaignCache::new(10, Duration::from_secs(60))),
            ReasoningClient::new(ReasoningConfig::default()),
            ExportOrchestrator::new(Arc::new(registry), Duration::from_secs(5)),
            gate,
        );
        Fixture {
            workflow,
            ledger,
            user_id,
        }
    }

    fn open_gate() -> CommitGate {
        CommitGate::from_config(&crate::config::ServiceConfig {
            allow_real_ads: true,
            export_admin_key: Some("operator".into()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn generate_charges_and_persists() {
        let f = fixture(CreditPolicy::default(), CommitGate::default(), SubscriptionTier::Starter);

        let campaign = f
            .workflow
            .generate(&f.user_id, input(&["facebook", "google"]))
            .await
            .unwrap();

        assert_eq!(campaign.credits_charged, 15);
        assert_eq!(f.ledger.account(&f.user_id).unwrap().balance, 35);
        assert!(campaign.insights.age_min >= 30);
        let loaded = f.workflow.campaign(&f.user_id, &campaign.id).unwrap();
        assert_eq!(loaded.id, campaign.id);
    }

    #[tokio::test]
    async fn generate_stores_one_feed_per_platform() {
        let f = fixture(CreditPolicy::default(), CommitGate::default(), SubscriptionTier::Starter);

        let campaign = f
            .workflow
            .generate(&f.user_id, input(&["facebook", "linkedin"]))
            .await
            .unwrap();

        f.workflow.cache().invalidate(&campaign.id);
        let facebook = f.workflow.feed(&f.user_id, &campaign.id, "Facebook").unwrap();
        assert!(facebook.supported);
        assert_eq!(facebook.daily_budget_minor, 2_500);
        let linkedin = f.workflow.feed(&f.user_id, &campaign.id, "linkedin").unwrap();
        assert!(!linkedin.supported);
        assert!(matches!(
            f.workflow.feed(&f.user_id, &campaign.id, "google"),
            Err(AdcastError::NotFound { entity: "feed", .. })
        ));

        let package = f.workflow.package(&f.user_id, &campaign.id).unwrap();
        assert_eq!(package.platform_feeds.len(), 2);
        assert_eq!(package.export_summary.total_daily_budget_minor, 5_000);
    }

    #[tokio::test]
    async fn generate_rejects_low_balance_without_charging() {
        let f = fixture(CreditPolicy::default(), CommitGate::default(), SubscriptionTier::Free);

        let err = f
            .workflow
            .generate(&f.user_id, input(&["facebook"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AdcastError::InsufficientCredits {
                balance: 0,
                required: 10
            }
        ));
        assert!(f.ledger.usage_history(&f.user_id, 10, 0).unwrap().is_empty());
        assert!(f.workflow.campaigns(&f.user_id, 10, 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_cannot_read_or_export() {
        let f = fixture(CreditPolicy::default(), CommitGate::default(), SubscriptionTier::Starter);
        let campaign = f
            .workflow
            .generate(&f.user_id, input(&["facebook"]))
            .await
            .unwrap();

        let stranger = UserId::generate();
        assert!(matches!(
            f.workflow.campaign(&stranger, &campaign.id),
            Err(AdcastError::Forbidden(_))
        ));
        let err = f
            .workflow
            .export(&stranger, &campaign.id, &[], ExportMode::Preview, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AdcastError::Forbidden(_)));
    }

    #[tokio::test]
    async fn preview_export_defaults_to_campaign_platforms() {
        let f = fixture(CreditPolicy::default(), CommitGate::default(), SubscriptionTier::Starter);
        let campaign = f
            .workflow
            .generate(&f.user_id, input(&["facebook", "linkedin"]))
            .await
            .unwrap();

        let outcome = f
            .workflow
            .export(&f.user_id, &campaign.id, &[], ExportMode::Preview, None)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results["facebook"].status, ExportStatus::Success);
        assert_eq!(outcome.results["linkedin"].status, ExportStatus::Skipped);
        assert_eq!(outcome.credits_charged, 0);

        let stored = f.workflow.campaign(&f.user_id, &campaign.id).unwrap();
        assert!(stored.export.ids_for("facebook").is_some());
        assert_eq!(
            f.workflow
                .export_attempts(&f.user_id, &campaign.id, 10)
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn commit_requires_the_gate_before_anything_runs() {
        let policy = CreditPolicy {
            commit_export_cost: 5,
            ..CreditPolicy::default()
        };
        let f = fixture(policy, CommitGate::default(), SubscriptionTier::Starter);
        let campaign = f
            .workflow
            .generate(&f.user_id, input(&["tiktok"]))
            .await
            .unwrap();
        let balance = f.ledger.account(&f.user_id).unwrap().balance;

        let err = f
            .workflow
            .export(&f.user_id, &campaign.id, &[], ExportMode::Commit, Some("operator"))
            .await
            .unwrap_err();

        assert!(matches!(err, AdcastError::Authorization(_)));
        assert_eq!(f.ledger.account(&f.user_id).unwrap().balance, balance);
        assert!(f
            .workflow
            .export_attempts(&f.user_id, &campaign.id, 10)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn failed_commit_export_is_refunded() {
        let policy = CreditPolicy {
            commit_export_cost: 5,
            ..CreditPolicy::default()
        };
        let f = fixture(policy, open_gate(), SubscriptionTier::Starter);
        let campaign = f
            .workflow
            .generate(&f.user_id, input(&["tiktok"]))
            .await
            .unwrap();
        let balance = f.ledger.account(&f.user_id).unwrap().balance;

        let outcome = f
            .workflow
            .export(
                &f.user_id,
                &campaign.id,
                &["tiktok".to_string(), "myspace".to_string()],
                ExportMode::Commit,
                Some("operator"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.results["tiktok"].status, ExportStatus::Error);
        assert_eq!(outcome.results["myspace"].status, ExportStatus::Skipped);
        assert_eq!(outcome.credits_charged, 5);
        assert_eq!(outcome.credits_refunded, 5);
        assert_eq!(f.ledger.account(&f.user_id).unwrap().balance, balance);
    }
}
