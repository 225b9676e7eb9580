//! Core types and utilities for adcast.
//!
//! This crate provides the foundational types shared by every other adcast crate:
//!
//! - **Identifiers**: `UserId`, `CampaignId`, `TransactionId`, `AttemptId`
//! - **Accounts**: `CreditAccount`, `SubscriptionTier`
//! - **Ledger**: `UsageRecord`, `TransactionRecord`, `TransactionKind`, `TransactionStatus`
//! - **Policy**: `CreditPolicy`, `BalanceCheck`, `TopUp`
//! - **Campaigns**: `CampaignInput`, `CampaignSpec`, `AudienceInsights`, `PlatformFeed`
//! - **Export**: `ExportMode`, `ExportStatus`, `ProviderResult`, `ExportAttempt`,
//!   `CampaignExportAggregate`
//!
//! # Credit Unit
//!
//! Credits are whole units stored as `i64`. Every cost in the credit policy is integral,
//! so the ledger never deals with fractional balances or floating point rounding.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod campaign;
pub mod error;
pub mod export;
pub mod feed;
pub mod ids;
pub mod insights;
pub mod ledger;
pub mod pricing;

pub use account::{CreditAccount, SubscriptionTier};
pub use campaign::{CampaignInput, CampaignSpec, PriceTier};
pub use error::{AdcastError, Result};
pub use export::{
    CampaignExportAggregate, ExportAttempt, ExportHistoryEntry, ExportMode, ExportReport,
    ExportStatus, ProviderExportState, ProviderResult,
};
pub use feed::{split_budget_minor, FeedCreative, PlatformFeed};
pub use ids::{AttemptId, CampaignId, IdError, TransactionId, UserId};
pub use insights::{AdCopy, AudienceInsights, InsightSource};
pub use ledger::{TransactionKind, TransactionRecord, TransactionStatus, UsageRecord};
pub use pricing::{
    credit_package, credit_packages, BalanceCheck, CreditPackage, CreditPolicy, TopUp,
    BASE_CREDIT_PRICE_MINOR, CREDIT_PACKAGES, LOW_BALANCE_THRESHOLD, MIN_CREDITS_REQUIRED,
};
