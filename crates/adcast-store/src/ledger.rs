//! Credit ledger.
//!
//! The only component that changes a credit balance. Every operation is one store call,
//! so the balance change and its audit row are written together or not at all.
//!
//! Refunds are not deduplicated here: the caller must refund at most once per failure.

use std::sync::Arc;

use adcast_core::{
    BalanceCheck, CampaignId, CreditAccount, CreditPolicy, SubscriptionTier, TransactionId,
    TransactionKind, TransactionRecord, TransactionStatus, UsageRecord, UserId,
};

use crate::error::{Result, StoreError};
use crate::Store;

/// Atomic balance operations over a [`Store`].
#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn Store>,
    policy: CreditPolicy,
}

impl CreditLedger {
    /// Create a ledger over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, policy: CreditPolicy) -> Self {
        Self { store, policy }
    }

    /// The policy used for balance checks and bonuses.
    #[must_use]
    pub fn policy(&self) -> &CreditPolicy {
        &self.policy
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an account and grant the signup and tier bonuses.
    ///
    /// Each non-zero bonus is its own audit row. The account and its bonus rows are
    /// written in one store call, so an account never exists without its bonuses.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the user already has an account.
    pub fn open_account(&self, user_id: UserId, tier: SubscriptionTier) -> Result<CreditAccount> {
        let mut grants = Vec::with_capacity(2);
        if self.policy.signup_bonus > 0 {
            grants.push(TransactionRecord::bonus(
                user_id,
                self.policy.signup_bonus,
                "Signup bonus",
            ));
        }
        if tier.bonus_credits() > 0 {
            grants.push(TransactionRecord::bonus(
                user_id,
                tier.bonus_credits(),
                format!("{tier} subscription bonus"),
            ));
        }

        self.store
            .create_account(&CreditAccount::new(user_id, tier), &grants)?;

        let account = self.account(&user_id)?;
        tracing::info!(
            user_id = %user_id,
            tier = %tier,
            balance = account.balance,
            "Opened credit account"
        );
        Ok(account)
    }

    /// Get an account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user has no account.
    pub fn account(&self, user_id: &UserId) -> Result<CreditAccount> {
        self.store
            .get_account(user_id)?
            .ok_or_else(|| StoreError::account_not_found(user_id))
    }

    // =========================================================================
    // Balance
    // =========================================================================

    /// Check whether the balance covers `required`. Never mutates.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user has no account.
    pub fn check_balance(&self, user_id: &UserId, required: i64) -> Result<BalanceCheck> {
        let account = self.account(user_id)?;
        Ok(self.policy.check_balance(account.balance, required))
    }

    /// Deduct credits and append one usage row.
    ///
    /// # Errors
    ///
    /// - `StoreError::InsufficientCredits` if `amount` exceeds the balance. Nothing changes.
    /// - `StoreError::InvalidAmount` if `amount` is not positive.
    /// - `StoreError::NotFound` if the user has no account.
    pub fn deduct(
        &self,
        user_id: &UserId,
        amount: i64,
        action: &str,
        campaign_id: Option<&CampaignId>,
        details: serde_json::Value,
    ) -> Result<UsageRecord> {
        let usage = UsageRecord::new(*user_id, campaign_id.cloned(), amount, action, details);

        match self.store.record_usage(&usage) {
            Ok(row) => {
                tracing::info!(
                    user_id = %user_id,
                    amount,
                    action,
                    balance = row.balance_after,
                    "Credits deducted"
                );
                Ok(row)
            }
            Err(err) => {
                tracing::debug!(user_id = %user_id, amount, action, error = %err, "Deduction rejected");
                Err(err)
            }
        }
    }

    /// Return credits after downstream work failed.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `amount` is not positive.
    /// - `StoreError::NotFound` if the user has no account.
    pub fn refund(&self, user_id: &UserId, amount: i64, reason: &str) -> Result<TransactionRecord> {
        let row = self
            .store
            .record_credit(&TransactionRecord::refund(*user_id, amount, reason))?;
        tracing::info!(
            user_id = %user_id,
            amount,
            reason,
            balance = ?row.balance_after,
            "Credits refunded"
        );
        Ok(row)
    }

    /// Grant bonus credits.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `amount` is not positive.
    /// - `StoreError::NotFound` if the user has no account.
    pub fn add_bonus(&self, user_id: &UserId, amount: i64, reason: &str) -> Result<TransactionRecord> {
        let row = self
            .store
            .record_credit(&TransactionRecord::bonus(*user_id, amount, reason))?;
        tracing::info!(
            user_id = %user_id,
            amount,
            reason,
            balance = ?row.balance_after,
            "Bonus credits granted"
        );
        Ok(row)
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Record a pending purchase. The balance is untouched until it completes.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `credits` is not positive.
    /// - `StoreError::NotFound` if the user has no account.
    pub fn begin_purchase(
        &self,
        user_id: &UserId,
        amount_minor: i64,
        currency: &str,
        credits: i64,
        payment_ref: Option<String>,
    ) -> Result<TransactionRecord> {
        if credits <= 0 {
            return Err(StoreError::InvalidAmount(credits));
        }

        let transaction =
            TransactionRecord::purchase(*user_id, amount_minor, currency, credits, payment_ref);
        self.store.put_pending_transaction(&transaction)?;
        tracing::info!(
            user_id = %user_id,
            transaction_id = %transaction.id,
            credits,
            amount_minor,
            currency,
            "Purchase started"
        );
        Ok(transaction)
    }

    /// Complete a pending purchase and credit the balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidState` if the transaction is not a pending purchase.
    /// - `StoreError::NotFound` if it doesn't exist.
    pub fn complete_purchase(&self, transaction_id: &TransactionId) -> Result<TransactionRecord> {
        self.require_purchase(transaction_id)?;
        let row = self
            .store
            .settle_transaction(transaction_id, TransactionStatus::Success, None)?;
        tracing::info!(
            user_id = %row.user_id,
            transaction_id = %row.id,
            credits = row.credits,
            balance = ?row.balance_after,
            "Purchase completed"
        );
        Ok(row)
    }

    /// Mark a pending purchase as failed, recording `reason` on the row.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidState` if the transaction is not a pending purchase.
    /// - `StoreError::NotFound` if it doesn't exist.
    pub fn fail_purchase(&self, transaction_id: &TransactionId, reason: &str) -> Result<TransactionRecord> {
        self.require_purchase(transaction_id)?;
        let row = self
            .store
            .settle_transaction(transaction_id, TransactionStatus::Failed, Some(reason))?;
        tracing::warn!(
            user_id = %row.user_id,
            transaction_id = %row.id,
            reason,
            "Purchase failed"
        );
        Ok(row)
    }

    /// Reverse a completed purchase and debit its credits.
    ///
    /// The purchase is marked `refunded` and a `reversal` row described by `reason`
    /// carries the debit.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidState` if the transaction is not a successful purchase.
    /// - `StoreError::InsufficientCredits` if the credits were already spent.
    pub fn mark_refunded(
        &self,
        transaction_id: &TransactionId,
        reason: &str,
    ) -> Result<TransactionRecord> {
        self.require_purchase(transaction_id)?;
        let row = self
            .store
            .settle_transaction(transaction_id, TransactionStatus::Refunded, Some(reason))?;
        tracing::info!(
            user_id = %row.user_id,
            transaction_id = %row.id,
            credits = row.credits,
            "Purchase refunded"
        );
        Ok(row)
    }

    fn require_purchase(&self, transaction_id: &TransactionId) -> Result<()> {
        let transaction = self
            .store
            .get_transaction(transaction_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "transaction",
                id: transaction_id.to_string(),
            })?;
        if transaction.kind == TransactionKind::Purchase {
            Ok(())
        } else {
            Err(StoreError::InvalidState(format!(
                "transaction {transaction_id} is not a purchase"
            )))
        }
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Usage rows for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn usage_history(&self, user_id: &UserId, limit: usize, offset: usize) -> Result<Vec<UsageRecord>> {
        self.store.list_usage_by_user(user_id, limit, offset)
    }

    /// Transaction rows for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn transaction_history(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransactionRecord>> {
        self.store.list_transactions_by_user(user_id, limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn ledger_with(policy: CreditPolicy) -> CreditLedger {
        CreditLedger::new(Arc::new(MemoryStore::new()), policy)
    }

    fn funded(ledger: &CreditLedger, balance: i64) -> UserId {
        let user_id = UserId::generate();
        ledger.open_account(user_id, SubscriptionTier::Free).unwrap();
        ledger.add_bonus(&user_id, balance, "funding").unwrap();
        user_id
    }

    #[test]
    fn open_account_grants_bonuses_as_separate_rows() {
        let ledger = ledger_with(CreditPolicy {
            signup_bonus: 20,
            ..CreditPolicy::default()
        });
        let user_id = UserId::generate();

        let account = ledger
            .open_account(user_id, SubscriptionTier::Starter)
            .unwrap();

        assert_eq!(account.balance, 70);
        assert_eq!(account.lifetime_granted, 70);
        let rows = ledger.transaction_history(&user_id, 10, 0).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.kind == TransactionKind::Bonus));
    }

    #[test]
    fn free_account_without_signup_bonus_has_no_rows() {
        let ledger = ledger_with(CreditPolicy::default());
        let user_id = UserId::generate();

        let account = ledger.open_account(user_id, SubscriptionTier::Free).unwrap();

        assert_eq!(account.balance, 0);
        assert!(ledger.transaction_history(&user_id, 10, 0).unwrap().is_empty());
        assert!(matches!(
            ledger.open_account(user_id, SubscriptionTier::Free),
            Err(StoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn check_balance_is_read_only() {
        let ledger = ledger_with(CreditPolicy::default());
        let user_id = funded(&ledger, 15);

        for required in [0, 10, 15, 16, 1_000] {
            let check = ledger.check_balance(&user_id, required).unwrap();
            assert_eq!(check.current_balance, 15);
            assert!(check.is_low_balance);
        }

        assert_eq!(ledger.account(&user_id).unwrap().balance, 15);
        assert_eq!(ledger.transaction_history(&user_id, 10, 0).unwrap().len(), 1);
        assert!(ledger.usage_history(&user_id, 10, 0).unwrap().is_empty());
    }

    #[test]
    fn deduct_then_refund_restores_balance_and_chains_rows() {
        let ledger = ledger_with(CreditPolicy::default());

        for (balance, amount) in [(10, 10), (25, 1), (100, 37), (500, 499)] {
            let user_id = funded(&ledger, balance);

            let usage = ledger
                .deduct(&user_id, amount, "campaign_generation", None, serde_json::json!({}))
                .unwrap();
            let refund = ledger.refund(&user_id, amount, "generation failed").unwrap();

            assert_eq!(usage.balance_before, balance);
            assert_eq!(usage.balance_after, balance - amount);
            assert_eq!(refund.balance_before, Some(usage.balance_after));
            assert_eq!(refund.balance_after, Some(balance));
            assert_eq!(ledger.account(&user_id).unwrap().balance, balance);
        }
    }

    #[test]
    fn overdraft_is_a_no_op() {
        let ledger = ledger_with(CreditPolicy::default());
        let user_id = funded(&ledger, 9);
        let before_rows = ledger.transaction_history(&user_id, 10, 0).unwrap().len();

        let err = ledger
            .deduct(&user_id, 10, "campaign_generation", None, serde_json::Value::Null)
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::InsufficientCredits {
                balance: 9,
                required: 10
            }
        ));
        assert_eq!(ledger.account(&user_id).unwrap().balance, 9);
        assert!(ledger.usage_history(&user_id, 10, 0).unwrap().is_empty());
        assert_eq!(
            ledger.transaction_history(&user_id, 10, 0).unwrap().len(),
            before_rows
        );
    }

    #[test]
    fn concurrent_deductions_serialize() {
        let ledger = ledger_with(CreditPolicy::default());
        let user_id = funded(&ledger, 55);

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    ledger
                        .deduct(&user_id, 5, "campaign_generation", None, serde_json::Value::Null)
                        .is_ok()
                })
            })
            .collect();
        let ok = handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .filter(|ok| *ok)
            .count();

        assert_eq!(ok, 11);
        assert_eq!(ledger.account(&user_id).unwrap().balance, 0);
    }

    #[test]
    fn purchase_flow() {
        let ledger = ledger_with(CreditPolicy::default());
        let user_id = funded(&ledger, 5);

        let pending = ledger
            .begin_purchase(&user_id, 4_000, "INR", 50, Some("order_1".into()))
            .unwrap();
        assert_eq!(ledger.account(&user_id).unwrap().balance, 5);

        let done = ledger.complete_purchase(&pending.id).unwrap();
        assert_eq!(done.status, TransactionStatus::Success);
        assert_eq!(done.balance_after, Some(55));
        assert!(done.completed_at.is_some());

        assert!(matches!(
            ledger.complete_purchase(&pending.id),
            Err(StoreError::InvalidState(_))
        ));

        ledger
            .deduct(&user_id, 30, "campaign_generation", None, serde_json::Value::Null)
            .unwrap();
        assert!(matches!(
            ledger.mark_refunded(&pending.id, "chargeback"),
            Err(StoreError::InsufficientCredits { .. })
        ));
    }

    #[test]
    fn refunded_purchase_leaves_a_balanced_audit_trail() {
        let ledger = ledger_with(CreditPolicy::default());
        let user_id = funded(&ledger, 5);
        let pending = ledger.begin_purchase(&user_id, 4_000, "INR", 50, None).unwrap();
        ledger.complete_purchase(&pending.id).unwrap();
        let rows_before = ledger.transaction_history(&user_id, 10, 0).unwrap().len();

        let refunded = ledger.mark_refunded(&pending.id, "chargeback").unwrap();

        assert_eq!(refunded.status, TransactionStatus::Refunded);
        let rows = ledger.transaction_history(&user_id, 10, 0).unwrap();
        assert_eq!(rows.len(), rows_before + 1);
        assert_eq!(rows[0].kind, TransactionKind::Reversal);
        assert_eq!(rows[0].balance_before, Some(55));
        assert_eq!(rows[0].balance_after, Some(5));

        let balance = ledger.account(&user_id).unwrap().balance;
        let net: i64 = rows.iter().map(TransactionRecord::signed_credits).sum();
        assert_eq!(net, balance);
    }

    #[test]
    fn refunds_cannot_be_settled_as_purchases() {
        let ledger = ledger_with(CreditPolicy::default());
        let user_id = funded(&ledger, 5);
        let refund = ledger.refund(&user_id, 5, "oops").unwrap();

        assert!(matches!(
            ledger.mark_refunded(&refund.id, "chargeback"),
            Err(StoreError::InvalidState(_))
        ));
    }

    #[test]
    fn failed_purchase_keeps_balance() {
        let ledger = ledger_with(CreditPolicy::default());
        let user_id = funded(&ledger, 5);
        let pending = ledger.begin_purchase(&user_id, 7_500, "INR", 100, None).unwrap();

        let failed = ledger.fail_purchase(&pending.id, "card declined").unwrap();

        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("card declined"));
        let stored = ledger.transaction_history(&user_id, 1, 0).unwrap();
        assert_eq!(stored[0].id, pending.id);
        assert_eq!(stored[0].failure_reason.as_deref(), Some("card declined"));
        assert_eq!(ledger.account(&user_id).unwrap().balance, 5);
        assert!(matches!(
            ledger.begin_purchase(&user_id, 0, "INR", 0, None),
            Err(StoreError::InvalidAmount(0))
        ));
    }
}
