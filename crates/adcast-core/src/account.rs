//! Credit account types for adcast.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A prepaid credit account for a user.
///
/// The balance is only ever changed by the credit ledger, and every change is paired
/// with exactly one usage or transaction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAccount {
    /// The owning user.
    pub user_id: UserId,

    /// Current credit balance. Never negative.
    pub balance: i64,

    /// Lifetime credits purchased.
    pub lifetime_purchased: i64,

    /// Lifetime credits granted as bonuses.
    pub lifetime_granted: i64,

    /// Lifetime credits consumed.
    pub lifetime_used: i64,

    /// Subscription tier, which drives bonuses and purchase discounts.
    pub tier: SubscriptionTier,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CreditAccount {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(user_id: UserId, tier: SubscriptionTier) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: 0,
            lifetime_purchased: 0,
            lifetime_granted: 0,
            lifetime_used: 0,
            tier,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can cover a deduction of `amount` credits.
    #[must_use]
    pub const fn has_sufficient_credits(&self, amount: i64) -> bool {
        self.balance >= amount
    }
}

/// Subscription tier of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    /// No paid subscription.
    #[default]
    Free,
    /// Entry-level subscription.
    Starter,
    /// Mid-level subscription.
    Professional,
    /// Top-level subscription.
    Enterprise,
}

impl SubscriptionTier {
    /// Bonus credits granted when a user subscribes to this tier.
    #[must_use]
    pub const fn bonus_credits(self) -> i64 {
        match self {
            Self::Free => 0,
            Self::Starter => 50,
            Self::Professional => 200,
            Self::Enterprise => 500,
        }
    }

    /// Discount on credit purchases, in percent.
    #[must_use]
    pub const fn purchase_discount_percent(self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Starter => 10,
            Self::Professional => 20,
            Self::Enterprise => 30,
        }
    }

    /// Return the tier name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "professional" => Ok(Self::Professional),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(format!("unknown subscription tier: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_empty() {
        let account = CreditAccount::new(UserId::generate(), SubscriptionTier::Free);
        assert_eq!(account.balance, 0);
        assert_eq!(account.lifetime_used, 0);
        assert!(account.has_sufficient_credits(0));
        assert!(!account.has_sufficient_credits(1));
    }

    #[test]
    fn tier_bonuses() {
        assert_eq!(SubscriptionTier::Free.bonus_credits(), 0);
        assert_eq!(SubscriptionTier::Starter.bonus_credits(), 50);
        assert_eq!(SubscriptionTier::Professional.bonus_credits(), 200);
        assert_eq!(SubscriptionTier::Enterprise.bonus_credits(), 500);
    }

    #[test]
    fn tier_parse_is_case_insensitive() {
        assert_eq!(
            "Professional".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Professional
        );
        assert!("gold".parse::<SubscriptionTier>().is_err());
    }
}
