//! Storage layer for adcast.
//!
//! This crate provides persistent storage for credit accounts, the credit audit trail,
//! campaigns, and export attempts, plus the two components that sit directly on top of
//! it: the [`CreditLedger`] and the [`CampaignCache`].
//!
//! # Units of Work
//!
//! Every method that changes more than one record is a single unit of work: it either
//! writes everything (one `RocksDB` `WriteBatch`, or one critical section in
//! [`MemoryStore`]) or returns an error having written nothing. Read-modify-write of a
//! balance or a campaign aggregate happens under a store-wide write lock, so two
//! concurrent deductions can never both read the same stale balance.
//!
//! # Column Families (`RocksDB`)
//!
//! - `accounts`: credit accounts, keyed by `user_id`
//! - `usage`: usage rows, keyed by row ID (ULID)
//! - `usage_by_user`: index `user_id || row_id`
//! - `transactions`: transaction rows, keyed by row ID (ULID)
//! - `transactions_by_user`: index `user_id || row_id`
//! - `campaigns`: campaigns, keyed by slug
//! - `campaigns_by_user`: index `user_id || created_at_ms || slug`
//! - `export_attempts`: attempts, keyed by `slug || 0x00 || attempt_id`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use adcast_core::{CreditPolicy, SubscriptionTier, UserId};
//! use adcast_store::{CreditLedger, MemoryStore};
//!
//! let ledger = CreditLedger::new(Arc::new(MemoryStore::new()), CreditPolicy::default());
//! let user_id = UserId::generate();
//! ledger.open_account(user_id, SubscriptionTier::Starter).unwrap();
//! let check = ledger.check_balance(&user_id, 10).unwrap();
//! assert!(check.has_enough);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod memory;
pub mod mutation;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use cache::CampaignCache;
pub use error::{Result, StoreError};
pub use ledger::CreditLedger;
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use adcast_core::{
    CampaignExportAggregate, CampaignId, CampaignSpec, CreditAccount, ExportAttempt,
    TransactionId, TransactionRecord, TransactionStatus, UsageRecord, UserId,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (`RocksDB` in production, in-memory for tests and development).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert a new account together with its opening grants in one unit of work.
    ///
    /// Each grant is applied in order as a successful credit (see
    /// [`Store::record_credit`]); the returned rows carry their balance snapshots.
    ///
    /// # Errors
    ///
    /// - `StoreError::AlreadyExists` if the user already has an account.
    /// - `StoreError::InvalidAmount` or `StoreError::InvalidState` if a grant is
    ///   malformed; neither the account nor any grant is written.
    fn create_account(
        &self,
        account: &CreditAccount,
        grants: &[TransactionRecord],
    ) -> Result<Vec<TransactionRecord>>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>>;

    // =========================================================================
    // Ledger Operations (compound, atomic)
    // =========================================================================

    /// Deduct `usage.credits_used` and append the usage row in one unit of work.
    ///
    /// The store fills in the balance snapshot and returns the row as written.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InvalidAmount` if the amount is not positive.
    /// - `StoreError::InsufficientCredits` if the balance is too low; nothing is written.
    fn record_usage(&self, usage: &UsageRecord) -> Result<UsageRecord>;

    /// Credit `transaction.credits` and append the transaction row in one unit of work.
    ///
    /// Used for refunds and bonuses, which succeed immediately.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InvalidAmount` if the amount is not positive.
    /// - `StoreError::InvalidState` if the row is not in `success` status.
    fn record_credit(&self, transaction: &TransactionRecord) -> Result<TransactionRecord>;

    /// Insert a pending transaction without touching the balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidState` if the row is not `pending`.
    /// - `StoreError::NotFound` if the account doesn't exist.
    fn put_pending_transaction(&self, transaction: &TransactionRecord) -> Result<()>;

    /// Move a transaction to a new status, applying its balance effect atomically.
    ///
    /// `pending → success` credits the balance. `pending → failed` only changes the
    /// status and records `reason`. `success → refunded` marks the purchase and appends
    /// a `reversal` row debiting the purchased credits, described by `reason`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the transaction or account doesn't exist.
    /// - `StoreError::InvalidState` for any other transition.
    /// - `StoreError::InsufficientCredits` if a refund would make the balance negative.
    fn settle_transaction(
        &self,
        transaction_id: &TransactionId,
        status: TransactionStatus,
        reason: Option<&str>,
    ) -> Result<TransactionRecord>;

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<TransactionRecord>>;

    /// List transactions for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransactionRecord>>;

    /// List usage rows for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_usage_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<UsageRecord>>;

    // =========================================================================
    // Campaign Operations
    // =========================================================================

    /// Insert a new campaign.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the slug is taken.
    fn create_campaign(&self, campaign: &CampaignSpec) -> Result<()>;

    /// Get a campaign by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_campaign(&self, campaign_id: &CampaignId) -> Result<Option<CampaignSpec>>;

    /// List campaigns for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_campaigns_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CampaignSpec>>;

    // =========================================================================
    // Export Operations (compound, atomic)
    // =========================================================================

    /// Append export attempts and update the campaign aggregate in one unit of work.
    ///
    /// `update` runs against the current aggregate under the write lock; the attempts and
    /// the updated campaign are then written together. Returns the updated campaign.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the campaign doesn't exist; nothing is written.
    fn record_export(
        &self,
        campaign_id: &CampaignId,
        attempts: &[ExportAttempt],
        update: &dyn Fn(&mut CampaignExportAggregate),
    ) -> Result<CampaignSpec>;

    /// List export attempts for a campaign, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_export_attempts(
        &self,
        campaign_id: &CampaignId,
        limit: usize,
    ) -> Result<Vec<ExportAttempt>>;
}
