//! Balance mutation rules shared by every backend.
//!
//! Each function checks a proposed change against an account snapshot and, if it is
//! allowed, applies it to in-memory copies. Backends call these under their write lock
//! and persist the results in one unit of work, so the invariants live in one place.

use chrono::Utc;

use adcast_core::{
    CreditAccount, TransactionKind, TransactionRecord, TransactionStatus, UsageRecord,
};

use crate::error::{Result, StoreError};

/// Apply a deduction to `account` and stamp the balance snapshot on `usage`.
///
/// # Errors
///
/// - `StoreError::InvalidAmount` if the amount is not positive.
/// - `StoreError::InsufficientCredits` if the balance is too low.
pub fn apply_usage(account: &mut CreditAccount, usage: &mut UsageRecord) -> Result<()> {
    let amount = usage.credits_used;
    if amount <= 0 {
        return Err(StoreError::InvalidAmount(amount));
    }
    if !account.has_sufficient_credits(amount) {
        return Err(StoreError::InsufficientCredits {
            balance: account.balance,
            required: amount,
        });
    }

    usage.balance_before = account.balance;
    account.balance -= amount;
    account.lifetime_used += amount;
    account.updated_at = Utc::now();
    usage.balance_after = account.balance;

    Ok(())
}

/// Apply an immediately successful credit (refund or bonus) to `account`.
///
/// # Errors
///
/// - `StoreError::InvalidAmount` if the amount is not positive.
/// - `StoreError::InvalidState` if the row is not `success`.
pub fn apply_credit(account: &mut CreditAccount, transaction: &mut TransactionRecord) -> Result<()> {
    if transaction.status != TransactionStatus::Success {
        return Err(StoreError::InvalidState(format!(
            "credit rows must be successful, got {:?}",
            transaction.status
        )));
    }
    grant(account, transaction)
}

/// Apply a status transition to a stored transaction.
///
/// `reason` is recorded on a failed purchase, and becomes the description of the
/// reversal row a refund produces. Returns that reversal row, which the backend must
/// persist in the same unit of work as the settled transaction.
///
/// # Errors
///
/// - `StoreError::InvalidState` for transitions other than `pending → success`,
///   `pending → failed`, and `success → refunded` (purchases only).
/// - `StoreError::InsufficientCredits` if refunding a purchase would overdraw the account.
pub fn apply_settlement(
    account: &mut CreditAccount,
    transaction: &mut TransactionRecord,
    status: TransactionStatus,
    reason: Option<&str>,
) -> Result<Option<TransactionRecord>> {
    let now = Utc::now();
    let mut reversal = None;

    match (transaction.status, status) {
        (TransactionStatus::Pending, TransactionStatus::Success) => {
            grant(account, transaction)?;
        }
        (TransactionStatus::Pending, TransactionStatus::Failed) => {
            transaction.failure_reason = Some(reason.unwrap_or("payment failed").to_string());
        }
        (TransactionStatus::Success, TransactionStatus::Refunded)
            if transaction.kind == TransactionKind::Purchase =>
        {
            let credits = transaction.credits;
            if !account.has_sufficient_credits(credits) {
                return Err(StoreError::InsufficientCredits {
                    balance: account.balance,
                    required: credits,
                });
            }

            let mut row = TransactionRecord::reversal(
                transaction,
                reason.unwrap_or("Purchase refunded"),
            );
            row.balance_before = Some(account.balance);
            account.balance -= credits;
            account.lifetime_purchased -= credits;
            account.updated_at = now;
            row.balance_after = Some(account.balance);
            row.completed_at = Some(now);
            reversal = Some(row);
        }
        (from, to) => {
            return Err(StoreError::InvalidState(format!(
                "cannot move transaction {} from {from:?} to {to:?}",
                transaction.id
            )));
        }
    }

    transaction.status = status;
    transaction.completed_at = Some(now);
    Ok(reversal)
}

fn grant(account: &mut CreditAccount, transaction: &mut TransactionRecord) -> Result<()> {
    if transaction.kind == TransactionKind::Reversal {
        return Err(StoreError::InvalidState(
            "reversal rows are only written by a refund".into(),
        ));
    }
    let amount = transaction.credits;
    if amount <= 0 {
        return Err(StoreError::InvalidAmount(amount));
    }

    transaction.balance_before = Some(account.balance);
    account.balance += amount;
    match transaction.kind {
        TransactionKind::Purchase => account.lifetime_purchased += amount,
        TransactionKind::Bonus => account.lifetime_granted += amount,
        TransactionKind::Refund => account.lifetime_used -= amount.min(account.lifetime_used),
        TransactionKind::Reversal => {}
    }
    account.updated_at = Utc::now();
    transaction.balance_after = Some(account.balance);
    if transaction.completed_at.is_none() {
        transaction.completed_at = Some(account.updated_at);
    }

    Ok(())
}
