//! Concurrent fan-out of one campaign to several providers.
//!
//! Each requested provider runs in its own task under a wall-clock limit. A provider
//! that fails, times out, or panics yields an `error` result for that provider only;
//! the others are unaffected. The report always has exactly one entry per distinct
//! requested provider name. Each result's `duration_ms` is measured from that
//! provider's own start to its own completion.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::task::JoinError;
use tracing::{info, warn};

use adcast_core::{CampaignSpec, ExportMode, ExportReport, ProviderResult};

use crate::registry::AdapterRegistry;

/// Default wall-clock limit for one provider's whole sequence.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);

/// Lowercase, trim, and de-duplicate requested provider names, keeping first occurrence order.
#[must_use]
pub fn normalize_providers(providers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    providers
        .iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Runs adapters concurrently and collects their results.
#[derive(Debug, Clone)]
pub struct ExportOrchestrator {
    registry: Arc<AdapterRegistry>,
    provider_timeout: Duration,
}

impl ExportOrchestrator {
    /// Create an orchestrator over a registry.
    #[must_use]
    pub fn new(registry: Arc<AdapterRegistry>, provider_timeout: Duration) -> Self {
        Self {
            registry,
            provider_timeout,
        }
    }

    /// The adapters this orchestrator dispatches to.
    #[must_use]
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Export `campaign` to every requested provider.
    ///
    /// Unknown names are reported as `skipped` without running anything. Never fails.
    pub async fn run(
        &self,
        campaign: Arc<CampaignSpec>,
        providers: &[String],
        mode: ExportMode,
    ) -> ExportReport {
        let names = normalize_providers(providers);
        let started = Instant::now();
        let mut report = ExportReport::new();
        let mut pending = Vec::with_capacity(names.len());

        info!(
            campaign_id = %campaign.id,
            mode = %mode,
            providers = ?names,
            "Starting export"
        );

        for name in names {
            let Some(adapter) = self.registry.get(&name) else {
                warn!(campaign_id = %campaign.id, platform = %name, "Platform not implemented");
                report.insert(name.clone(), ProviderResult::skipped(&name));
                continue;
            };

            let campaign = Arc::clone(&campaign);
            let limit = self.provider_timeout;
            let task_started = Instant::now();
            let handle = tokio::spawn(async move {
                tokio::time::timeout(limit, adapter.export(&campaign, mode)).await
            });
            // Resolves when this task ends, including by panic, so the clock stops here.
            let timed = async move {
                let outcome = handle.await;
                (outcome, millis(task_started.elapsed()))
            };
            pending.push((name, timed));
        }

        let (names, tasks): (Vec<String>, Vec<_>) = pending.into_iter().unzip();
        let outcomes = join_all(tasks).await;

        for (name, (outcome, elapsed_ms)) in names.into_iter().zip(outcomes) {
            let mut result = match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(_elapsed)) => {
                    let mut result = ProviderResult::error(
                        name.as_str(),
                        format!("Timed out after {} ms", self.provider_timeout.as_millis()),
                    );
                    result.duration_ms = elapsed_ms;
                    result
                }
                Err(err) => {
                    let mut result = ProviderResult::error(name.as_str(), task_failure(err));
                    result.duration_ms = elapsed_ms;
                    result
                }
            };
            result.platform.clone_from(&name);

            if result.error.is_some() {
                warn!(
                    campaign_id = %campaign.id,
                    platform = %name,
                    status = %result.status,
                    error = result.error.as_deref().unwrap_or_default(),
                    "Provider export did not fully succeed"
                );
            } else {
                info!(
                    campaign_id = %campaign.id,
                    platform = %name,
                    status = %result.status,
                    duration_ms = result.duration_ms,
                    "Provider export finished"
                );
            }
            report.insert(name, result);
        }

        info!(
            campaign_id = %campaign.id,
            mode = %mode,
            providers = report.len(),
            elapsed_ms = millis(started.elapsed()),
            "Export finished"
        );
        report
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn task_failure(err: JoinError) -> String {
    if err.is_panic() {
        format!("Adapter panicked: {}", panic_message(err.into_panic().as_ref()))
    } else {
        "Adapter task was cancelled".to_string()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{preview_result, Provider, ProviderAdapter};
    use crate::fixtures::sample_campaign;
    use adcast_core::ExportStatus;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Panic,
        Hang,
    }

    struct StubAdapter {
        provider: Provider,
        behavior: Behavior,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl StubAdapter {
        fn new(provider: Provider, behavior: Behavior) -> Self {
            Self {
                provider,
                behavior,
                delay: Duration::from_millis(100),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        async fn behave(&self) -> ProviderResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed => {
                    tokio::time::sleep(self.delay).await;
                    let mut ids = BTreeMap::new();
                    ids.insert("campaign_id".to_string(), format!("{}-1", self.provider));
                    preview_result(self.provider, &["campaign"], ids, serde_json::json!({}))
                }
                Behavior::Panic => panic!("adapter exploded"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    ProviderResult::error(self.provider.as_str(), "unreachable")
                }
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn preview(&self, _campaign: &CampaignSpec) -> ProviderResult {
            self.behave().await
        }

        async fn commit(&self, _campaign: &CampaignSpec) -> ProviderResult {
            self.behave().await
        }
    }

    fn orchestrator(adapters: Vec<StubAdapter>, timeout: Duration) -> ExportOrchestrator {
        let mut registry = AdapterRegistry::empty();
        for adapter in adapters {
            registry.register(Arc::new(adapter));
        }
        ExportOrchestrator::new(Arc::new(registry), timeout)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn normalize_dedupes_case_insensitively() {
        assert_eq!(
            normalize_providers(&names(&["Facebook", " google ", "facebook", "", "GOOGLE"])),
            vec!["facebook", "google"]
        );
    }

    #[tokio::test]
    async fn equal_length_providers_overlap() {
        let delay = Duration::from_millis(200);
        let orchestrator = orchestrator(
            [
                Provider::Facebook,
                Provider::Instagram,
                Provider::Google,
                Provider::TikTok,
            ]
            .into_iter()
            .map(|p| StubAdapter::new(p, Behavior::Succeed).with_delay(delay))
            .collect(),
            Duration::from_secs(5),
        );

        let started = Instant::now();
        let report = orchestrator
            .run(
                Arc::new(sample_campaign()),
                &names(&["facebook", "instagram", "google", "tiktok"]),
                ExportMode::Preview,
            )
            .await;
        let elapsed = started.elapsed();

        assert_eq!(report.len(), 4);
        assert!(report.values().all(|r| r.status == ExportStatus::Success));
        // Run one after another, four 200 ms providers take at least 800 ms.
        assert!(elapsed < delay * 2, "took {elapsed:?}");
    }

    #[tokio::test]
    async fn each_result_carries_its_own_duration() {
        let orchestrator = orchestrator(
            vec![
                StubAdapter::new(Provider::Instagram, Behavior::Panic),
                StubAdapter::new(Provider::TikTok, Behavior::Hang),
            ],
            Duration::from_millis(300),
        );

        let report = orchestrator
            .run(
                Arc::new(sample_campaign()),
                &names(&["instagram", "tiktok"]),
                ExportMode::Preview,
            )
            .await;

        let hung = &report["tiktok"];
        assert!(hung.duration_ms >= 300, "timed out after {} ms", hung.duration_ms);
        let panicked = &report["instagram"];
        assert!(panicked.duration_ms < 150, "panicked after {} ms", panicked.duration_ms);
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let orchestrator = orchestrator(
            vec![
                StubAdapter::new(Provider::Facebook, Behavior::Succeed),
                StubAdapter::new(Provider::Google, Behavior::Succeed),
                StubAdapter::new(Provider::Instagram, Behavior::Panic),
                StubAdapter::new(Provider::TikTok, Behavior::Hang),
            ],
            Duration::from_millis(300),
        );

        let report = orchestrator
            .run(
                Arc::new(sample_campaign()),
                &names(&["facebook", "google", "instagram", "tiktok"]),
                ExportMode::Preview,
            )
            .await;

        assert_eq!(report.len(), 4);
        assert_eq!(report["facebook"].status, ExportStatus::Success);
        assert_eq!(report["google"].status, ExportStatus::Success);
        assert_eq!(report["facebook"].ids["campaign_id"], "facebook-1");

        let panicked = &report["instagram"];
        assert_eq!(panicked.status, ExportStatus::Error);
        assert!(panicked.error.as_deref().unwrap().contains("adapter exploded"));

        let hung = &report["tiktok"];
        assert_eq!(hung.status, ExportStatus::Error);
        assert_eq!(hung.error.as_deref(), Some("Timed out after 300 ms"));
    }

    #[tokio::test]
    async fn unknown_providers_are_skipped() {
        let orchestrator = orchestrator(
            vec![StubAdapter::new(Provider::Facebook, Behavior::Succeed)],
            Duration::from_secs(5),
        );

        let report = orchestrator
            .run(
                Arc::new(sample_campaign()),
                &names(&["facebook", "linkedin"]),
                ExportMode::Preview,
            )
            .await;

        assert_eq!(report.len(), 2);
        assert_eq!(report["facebook"].status, ExportStatus::Success);
        let skipped = &report["linkedin"];
        assert_eq!(skipped.status, ExportStatus::Skipped);
        assert_eq!(skipped.message, "Platform linkedin not implemented");
    }

    #[tokio::test]
    async fn duplicate_names_run_once() {
        let adapter = StubAdapter::new(Provider::Google, Behavior::Succeed);
        let calls = Arc::clone(&adapter.calls);
        let orchestrator = orchestrator(vec![adapter], Duration::from_secs(5));

        let report = orchestrator
            .run(
                Arc::new(sample_campaign()),
                &names(&["google", "Google", "GOOGLE "]),
                ExportMode::Commit,
            )
            .await;

        assert_eq!(report.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_request_gives_empty_report() {
        let orchestrator = orchestrator(vec![], Duration::from_secs(1));
        let report = orchestrator
            .run(Arc::new(sample_campaign()), &[], ExportMode::Preview)
            .await;
        assert!(report.is_empty());
    }
}
