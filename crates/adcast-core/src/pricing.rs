//! Credit policy for adcast.
//!
//! Costs are a pure function of the provider count and the advanced-targeting flag. The
//! ledger itself is cost-agnostic; callers evaluate the policy before deducting.

use serde::{Deserialize, Serialize};

/// Minimum credits required to generate a campaign.
pub const MIN_CREDITS_REQUIRED: i64 = 10;

/// Balance at or below which an account is considered low.
pub const LOW_BALANCE_THRESHOLD: i64 = 20;

/// Cost of a single-provider campaign.
const BASIC_CAMPAIGN_COST: i64 = 10;

/// Cost of a campaign targeting two or three providers.
const STANDARD_CAMPAIGN_COST: i64 = 15;

/// Cost of a campaign targeting four or more providers.
const ADVANCED_CAMPAIGN_COST: i64 = 25;

/// Surcharge for advanced targeting.
const ADVANCED_TARGETING_SURCHARGE: i64 = 5;

/// Base price of one credit in minor currency units, before package discounts.
pub const BASE_CREDIT_PRICE_MINOR: i64 = 100;

/// Purchasable credit packages: `(credits, price in minor units)`, smallest first.
pub const CREDIT_PACKAGES: [(i64, i64); 5] = [
    (10, 1_000),
    (50, 4_000),
    (100, 7_500),
    (500, 35_000),
    (1_000, 60_000),
];

/// Credit policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditPolicy {
    /// Balance at or below which an account is flagged as low.
    pub low_balance_threshold: i64,

    /// Credits granted when an account is opened.
    pub signup_bonus: i64,

    /// Credits charged per recognized provider for a commit-mode export. Zero disables
    /// export charging.
    pub commit_export_cost: i64,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            low_balance_threshold: LOW_BALANCE_THRESHOLD,
            signup_bonus: 0,
            commit_export_cost: 0,
        }
    }
}

impl CreditPolicy {
    /// Credits needed to generate a campaign.
    ///
    /// One provider costs 10, two or three cost 15, four or more cost 25. Advanced
    /// targeting adds 5. An empty provider set is priced as a single provider.
    #[must_use]
    pub fn campaign_cost(&self, provider_count: usize, advanced_targeting: bool) -> i64 {
        let base = match provider_count {
            0 | 1 => BASIC_CAMPAIGN_COST,
            2 | 3 => STANDARD_CAMPAIGN_COST,
            _ => ADVANCED_CAMPAIGN_COST,
        };

        if advanced_targeting {
            base + ADVANCED_TARGETING_SURCHARGE
        } else {
            base
        }
    }

    /// Credits needed for a commit-mode export to `provider_count` providers.
    #[must_use]
    pub fn commit_export_cost(&self, provider_count: usize) -> i64 {
        self.commit_export_cost
            .saturating_mul(i64::try_from(provider_count).unwrap_or(i64::MAX))
    }

    /// Evaluate whether `balance` covers `required`. Pure; never mutates anything.
    #[must_use]
    pub fn check_balance(&self, balance: i64, required: i64) -> BalanceCheck {
        let has_enough = balance >= required;
        let is_low_balance = balance <= self.low_balance_threshold;
        let shortage = (required - balance).max(0);

        let message = if !has_enough {
            format!("Insufficient credits. You need {shortage} more credits.")
        } else if is_low_balance {
            format!("Low balance warning! You have {balance} credits remaining.")
        } else {
            format!("You have {balance} credits available.")
        };

        BalanceCheck {
            has_enough,
            current_balance: balance,
            required,
            balance_after: balance - required,
            shortage,
            is_low_balance,
            message,
        }
    }

    /// Recommend a credit package for the given balance.
    #[must_use]
    pub const fn recommended_top_up(balance: i64) -> TopUp {
        let index = if balance < 10 {
            1
        } else if balance < 50 {
            2
        } else {
            3
        };
        let (credits, amount_minor) = CREDIT_PACKAGES[index];
        TopUp {
            credits,
            amount_minor,
        }
    }
}

/// A purchasable credit package with its discount against the base credit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPackage {
    /// Credits in the package.
    pub credits: i64,
    /// Price in minor currency units.
    pub amount_minor: i64,
    /// Price per credit in minor currency units, rounded down.
    pub price_per_credit_minor: i64,
    /// Whole-percent saving against [`BASE_CREDIT_PRICE_MINOR`] per credit.
    pub discount_percent: i64,
}

impl CreditPackage {
    const fn from_entry(credits: i64, amount_minor: i64) -> Self {
        let base = credits * BASE_CREDIT_PRICE_MINOR;
        Self {
            credits,
            amount_minor,
            price_per_credit_minor: amount_minor / credits,
            discount_percent: (base - amount_minor) * 100 / base,
        }
    }
}

/// Every purchasable package, smallest first.
#[must_use]
pub fn credit_packages() -> Vec<CreditPackage> {
    CREDIT_PACKAGES
        .iter()
        .map(|&(credits, amount_minor)| CreditPackage::from_entry(credits, amount_minor))
        .collect()
}

/// The package with exactly `credits` credits, if one is on sale.
#[must_use]
pub fn credit_package(credits: i64) -> Option<CreditPackage> {
    CREDIT_PACKAGES
        .iter()
        .find(|(c, _)| *c == credits)
        .map(|&(credits, amount_minor)| CreditPackage::from_entry(credits, amount_minor))
}

/// Result of a balance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    /// Whether the balance covers the requirement.
    pub has_enough: bool,
    /// Balance at the time of the check.
    pub current_balance: i64,
    /// Credits required.
    pub required: i64,
    /// Balance that would remain after deducting `required` (may be negative).
    pub balance_after: i64,
    /// Credits missing to cover `required` (zero when covered).
    pub shortage: i64,
    /// Whether the balance is at or below the low-balance threshold.
    pub is_low_balance: bool,
    /// Human-readable summary.
    pub message: String,
}

/// A recommended credit package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUp {
    /// Credits in the package.
    pub credits: i64,
    /// Price in minor currency units.
    pub amount_minor: i64,
}
