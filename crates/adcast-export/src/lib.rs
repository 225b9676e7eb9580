//! Campaign export for adcast.
//!
//! A campaign is pushed to one or more ad providers through [`ProviderAdapter`]s, each of
//! which translates it into that provider's creation sequence. Adapters work in two
//! modes:
//!
//! - **preview** builds the exact payloads and returns them with `dry_` placeholder
//!   identifiers, never touching the provider;
//! - **commit** runs the steps in order, stopping at the first failure and reporting
//!   `partial_success` when earlier steps already created objects.
//!
//! At creation time [`generate_feeds`] shapes the campaign into one feed per requested
//! platform, and [`ExportPackage`] bundles the campaign and its feeds for download.
//!
//! The [`ExportOrchestrator`] fans one campaign out to every requested provider
//! concurrently, isolating failures, panics, and timeouts per provider. The
//! [`ExportStateStore`] records each result as an attempt and folds the report into the
//! campaign's export aggregate.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use adcast_core::ExportMode;
//! use adcast_export::{AdapterRegistry, ExportOrchestrator, ProvidersConfig};
//!
//! # async fn run(campaign: adcast_core::CampaignSpec) {
//! let registry = AdapterRegistry::from_config(&ProvidersConfig::default(), Duration::from_secs(30));
//! let orchestrator = ExportOrchestrator::new(Arc::new(registry), Duration::from_secs(120));
//! let report = orchestrator
//!     .run(Arc::new(campaign), &["facebook".into(), "linkedin".into()], ExportMode::Preview)
//!     .await;
//! assert_eq!(report.len(), 2);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod adapter;
pub mod error;
pub mod feeds;
pub mod google;
pub mod http;
pub mod meta;
pub mod orchestrator;
pub mod package;
pub mod registry;
pub mod state;
pub mod targeting;
pub mod tiktok;

#[cfg(test)]
mod fixtures;

pub use adapter::{Provider, ProviderAdapter};
pub use error::{ProviderApiError, Result};
pub use feeds::{generate_feeds, KNOWN_PLATFORMS};
pub use google::{GoogleAdsAdapter, GoogleAdsConfig};
pub use http::ProviderHttp;
pub use meta::{MetaAdapter, MetaConfig};
pub use orchestrator::{normalize_providers, ExportOrchestrator, DEFAULT_PROVIDER_TIMEOUT};
pub use package::{validate_feed, ExportPackage, FeedValidation, EXPORT_FORMATS};
pub use registry::{AdapterRegistry, ProvidersConfig};
pub use state::ExportStateStore;
pub use tiktok::{TikTokAdapter, TikTokConfig};
