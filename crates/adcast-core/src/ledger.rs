//! Ledger record types for adcast.
//!
//! This module defines the two append-only audit rows that back every balance change:
//! `UsageRecord` for consumption and `TransactionRecord` for purchases, refunds,
//! bonuses, and purchase reversals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CampaignId, TransactionId, UserId};

/// Action label for campaign generation usage.
pub const ACTION_CAMPAIGN_GENERATION: &str = "campaign_generation";

/// Action label for commit-mode export usage.
pub const ACTION_COMMIT_EXPORT: &str = "commit_export";

/// A credit consumption row.
///
/// `balance_after == balance_before - credits_used` holds for every row; the snapshot
/// is taken inside the same atomic write that changes the balance and is never
/// recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Unique row ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance was reduced.
    pub user_id: UserId,

    /// The campaign the usage relates to, if any.
    pub campaign_id: Option<CampaignId>,

    /// Credits consumed. Always positive.
    pub credits_used: i64,

    /// What the credits were spent on (e.g. `campaign_generation`).
    pub action: String,

    /// Balance before the deduction.
    pub balance_before: i64,

    /// Balance after the deduction.
    pub balance_after: i64,

    /// Free-form detail (platforms, budget, ...).
    pub details: serde_json::Value,

    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    /// Create a usage row whose balance snapshot is filled in by the store.
    #[must_use]
    pub fn new(
        user_id: UserId,
        campaign_id: Option<CampaignId>,
        credits_used: i64,
        action: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            campaign_id,
            credits_used,
            action: action.into(),
            balance_before: 0,
            balance_after: 0,
            details,
            created_at: Utc::now(),
        }
    }
}

/// A purchase, refund, bonus, or reversal row.
///
/// Rows are never rewritten to change a balance after the fact: reversing a purchase
/// flips its status to `refunded` and appends a separate `reversal` row that carries the
/// debit and its own balance snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique row ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance is affected.
    pub user_id: UserId,

    /// What kind of balance change this is.
    pub kind: TransactionKind,

    /// Monetary amount in minor currency units (zero for refunds and bonuses).
    pub amount_minor: i64,

    /// ISO currency code of `amount_minor`.
    pub currency: String,

    /// Credits granted by this row, or revoked for a `reversal`. Always positive.
    pub credits: i64,

    /// Lifecycle status.
    pub status: TransactionStatus,

    /// External payment reference, for purchases.
    pub payment_ref: Option<String>,

    /// Human-readable reason.
    pub description: String,

    /// Why a purchase failed, set when it moves to `failed`.
    #[serde(default)]
    pub failure_reason: Option<String>,

    /// The purchase a `reversal` row undoes.
    #[serde(default)]
    pub reverses: Option<TransactionId>,

    /// Balance before the credits were applied. `None` until the row succeeds.
    pub balance_before: Option<i64>,

    /// Balance after the credits were applied. `None` until the row succeeds.
    pub balance_after: Option<i64>,

    /// When the row was created.
    pub created_at: DateTime<Utc>,

    /// When the row reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    /// Create a pending purchase.
    #[must_use]
    pub fn purchase(
        user_id: UserId,
        amount_minor: i64,
        currency: impl Into<String>,
        credits: i64,
        payment_ref: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            kind: TransactionKind::Purchase,
            amount_minor,
            currency: currency.into(),
            credits,
            status: TransactionStatus::Pending,
            payment_ref,
            description: format!("Purchase of {credits} credits"),
            failure_reason: None,
            reverses: None,
            balance_before: None,
            balance_after: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Create a refund of previously deducted credits.
    #[must_use]
    pub fn refund(user_id: UserId, credits: i64, reason: impl Into<String>) -> Self {
        Self::grant(user_id, TransactionKind::Refund, credits, reason.into())
    }

    /// Create a bonus grant.
    #[must_use]
    pub fn bonus(user_id: UserId, credits: i64, reason: impl Into<String>) -> Self {
        Self::grant(user_id, TransactionKind::Bonus, credits, reason.into())
    }

    /// Create the debit row that undoes a successful purchase.
    #[must_use]
    pub fn reversal(purchase: &Self, reason: impl Into<String>) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id: purchase.user_id,
            kind: TransactionKind::Reversal,
            amount_minor: purchase.amount_minor,
            currency: purchase.currency.clone(),
            credits: purchase.credits,
            status: TransactionStatus::Success,
            payment_ref: purchase.payment_ref.clone(),
            description: reason.into(),
            failure_reason: None,
            reverses: Some(purchase.id),
            balance_before: None,
            balance_after: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Net effect of this row on the balance.
    ///
    /// A purchase keeps its `+credits` after it is refunded; the matching `reversal` row
    /// carries the `-credits`. Pending and failed rows never touched the balance.
    #[must_use]
    pub const fn signed_credits(&self) -> i64 {
        match (self.kind, self.status) {
            (_, TransactionStatus::Pending | TransactionStatus::Failed) => 0,
            (TransactionKind::Reversal, _) => -self.credits,
            _ => self.credits,
        }
    }

    fn grant(user_id: UserId, kind: TransactionKind, credits: i64, description: String) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            kind,
            amount_minor: 0,
            currency: String::new(),
            credits,
            status: TransactionStatus::Success,
            payment_ref: None,
            description,
            failure_reason: None,
            reverses: None,
            balance_before: None,
            balance_after: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Kind of transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// User purchased credits.
    Purchase,

    /// Credits returned after failed downstream work.
    Refund,

    /// Promotional, signup, or subscription credits.
    Bonus,

    /// Debit undoing a refunded purchase.
    Reversal,
}

/// Status of a transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting payment confirmation. No credits applied yet.
    Pending,

    /// Credits applied.
    Success,

    /// Payment failed. No credits applied.
    Failed,

    /// A successful purchase that was later reversed by a `reversal` row.
    Refunded,
}

impl TransactionStatus {
    /// Whether the status is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}
