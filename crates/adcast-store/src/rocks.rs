//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use adcast_core::{
    CampaignExportAggregate, CampaignId, CampaignSpec, CreditAccount, ExportAttempt,
    TransactionId, TransactionRecord, TransactionStatus, UsageRecord, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::mutation;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes every read-modify-write so balance checks never see a stale value.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read and decode one value.
    fn get_value<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Collect every key in `cf_name` that starts with `prefix`, newest (largest) first.
    fn keys_with_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut all_keys = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }

        all_keys.reverse();
        Ok(all_keys)
    }

    /// List ledger rows through a `user_id || row_id` index.
    fn list_rows<T: serde::de::DeserializeOwned>(
        &self,
        index_cf: &str,
        rows_cf: &str,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        for key in self
            .keys_with_prefix(index_cf, &keys::user_prefix(user_id))?
            .into_iter()
            .skip(offset)
            .take(limit)
        {
            let Some(row_id) = keys::row_id_from_user_key(&key) else {
                tracing::warn!(cf = index_cf, "Skipping malformed index key");
                continue;
            };
            if let Some(row) = self.get_value(rows_cf, &keys::row_key(&row_id))? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn require_account(&self, user_id: &UserId) -> Result<CreditAccount> {
        self.get_account(user_id)?
            .ok_or_else(|| StoreError::account_not_found(user_id))
    }

    /// Add an account and a transaction row (plus its index entry) to a batch.
    fn stage_account_and_transaction(
        &self,
        batch: &mut WriteBatch,
        account: &CreditAccount,
        transaction: &TransactionRecord,
    ) -> Result<()> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&account.user_id),
            Self::serialize(account)?,
        );
        self.stage_transaction(batch, transaction)
    }

    /// Stage a transaction row and its per-user index entry.
    fn stage_transaction(
        &self,
        batch: &mut WriteBatch,
        transaction: &TransactionRecord,
    ) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        batch.put_cf(
            &cf_tx,
            keys::row_key(&transaction.id),
            Self::serialize(transaction)?,
        );
        batch.put_cf(
            &cf_tx_by_user,
            keys::user_row_key(&transaction.user_id, &transaction.id),
            [],
        );
        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(
        &self,
        account: &CreditAccount,
        grants: &[TransactionRecord],
    ) -> Result<Vec<TransactionRecord>> {
        let _guard = self.write_lock.lock();

        if self.get_account(&account.user_id)?.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "account",
                id: account.user_id.to_string(),
            });
        }

        let mut account = account.clone();
        let mut written = Vec::with_capacity(grants.len());
        for grant in grants {
            let mut grant = grant.clone();
            mutation::apply_credit(&mut account, &mut grant)?;
            written.push(grant);
        }

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&account.user_id),
            Self::serialize(&account)?,
        );
        for grant in &written {
            self.stage_transaction(&mut batch, grant)?;
        }
        self.write(batch)?;

        Ok(written)
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        self.get_value(cf::ACCOUNTS, &keys::account_key(user_id))
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn record_usage(&self, usage: &UsageRecord) -> Result<UsageRecord> {
        let _guard = self.write_lock.lock();

        let mut account = self.require_account(&usage.user_id)?;
        let mut usage = usage.clone();
        mutation::apply_usage(&mut account, &mut usage)?;

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_usage = self.cf(cf::USAGE)?;
        let cf_usage_by_user = self.cf(cf::USAGE_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&account.user_id),
            Self::serialize(&account)?,
        );
        batch.put_cf(&cf_usage, keys::row_key(&usage.id), Self::serialize(&usage)?);
        batch.put_cf(
            &cf_usage_by_user,
            keys::user_row_key(&usage.user_id, &usage.id),
            [],
        );
        self.write(batch)?;

        Ok(usage)
    }

    fn record_credit(&self, transaction: &TransactionRecord) -> Result<TransactionRecord> {
        let _guard = self.write_lock.lock();

        let mut account = self.require_account(&transaction.user_id)?;
        let mut transaction = transaction.clone();
        mutation::apply_credit(&mut account, &mut transaction)?;

        let mut batch = WriteBatch::default();
        self.stage_account_and_transaction(&mut batch, &account, &transaction)?;
        self.write(batch)?;

        Ok(transaction)
    }

    fn put_pending_transaction(&self, transaction: &TransactionRecord) -> Result<()> {
        if transaction.status != TransactionStatus::Pending {
            return Err(StoreError::InvalidState(format!(
                "expected a pending transaction, got {:?}",
                transaction.status
            )));
        }

        let _guard = self.write_lock.lock();
        let account = self.require_account(&transaction.user_id)?;

        let mut batch = WriteBatch::default();
        self.stage_account_and_transaction(&mut batch, &account, transaction)?;
        self.write(batch)
    }

    fn settle_transaction(
        &self,
        transaction_id: &TransactionId,
        status: TransactionStatus,
        reason: Option<&str>,
    ) -> Result<TransactionRecord> {
        let _guard = self.write_lock.lock();

        let mut transaction = self
            .get_transaction(transaction_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "transaction",
                id: transaction_id.to_string(),
            })?;
        let mut account = self.require_account(&transaction.user_id)?;
        let reversal = mutation::apply_settlement(&mut account, &mut transaction, status, reason)?;

        let mut batch = WriteBatch::default();
        self.stage_account_and_transaction(&mut batch, &account, &transaction)?;
        if let Some(reversal) = &reversal {
            self.stage_transaction(&mut batch, reversal)?;
        }
        self.write(batch)?;

        Ok(transaction)
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<TransactionRecord>> {
        self.get_value(cf::TRANSACTIONS, &keys::row_key(transaction_id))
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransactionRecord>> {
        self.list_rows(cf::TRANSACTIONS_BY_USER, cf::TRANSACTIONS, user_id, limit, offset)
    }

    fn list_usage_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<UsageRecord>> {
        self.list_rows(cf::USAGE_BY_USER, cf::USAGE, user_id, limit, offset)
    }

    // =========================================================================
    // Campaign Operations
    // =========================================================================

    fn create_campaign(&self, campaign: &CampaignSpec) -> Result<()> {
        let _guard = self.write_lock.lock();

        if self.get_campaign(&campaign.id)?.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "campaign",
                id: campaign.id.to_string(),
            });
        }

        let cf_campaigns = self.cf(cf::CAMPAIGNS)?;
        let cf_by_user = self.cf(cf::CAMPAIGNS_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_campaigns,
            keys::campaign_key(&campaign.id),
            Self::serialize(campaign)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_campaign_key(&campaign.user_id, campaign.created_at, &campaign.id),
            [],
        );
        self.write(batch)
    }

    fn get_campaign(&self, campaign_id: &CampaignId) -> Result<Option<CampaignSpec>> {
        self.get_value(cf::CAMPAIGNS, &keys::campaign_key(campaign_id))
    }

    fn list_campaigns_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CampaignSpec>> {
        let mut campaigns = Vec::new();
        for key in self
            .keys_with_prefix(cf::CAMPAIGNS_BY_USER, &keys::user_prefix(user_id))?
            .into_iter()
            .skip(offset)
            .take(limit)
        {
            let Some(campaign_id) = keys::campaign_id_from_user_key(&key) else {
                tracing::warn!("Skipping malformed campaign index key");
                continue;
            };
            if let Some(campaign) = self.get_campaign(&campaign_id)? {
                campaigns.push(campaign);
            }
        }
        Ok(campaigns)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    fn record_export(
        &self,
        campaign_id: &CampaignId,
        attempts: &[ExportAttempt],
        update: &dyn Fn(&mut CampaignExportAggregate),
    ) -> Result<CampaignSpec> {
        let _guard = self.write_lock.lock();

        let mut campaign = self
            .get_campaign(campaign_id)?
            .ok_or_else(|| StoreError::campaign_not_found(campaign_id))?;
        update(&mut campaign.export);

        let cf_campaigns = self.cf(cf::CAMPAIGNS)?;
        let cf_attempts = self.cf(cf::EXPORT_ATTEMPTS)?;

        let mut batch = WriteBatch::default();
        for attempt in attempts {
            batch.put_cf(
                &cf_attempts,
                keys::attempt_key(campaign_id, &attempt.id),
                Self::serialize(attempt)?,
            );
        }
        batch.put_cf(
            &cf_campaigns,
            keys::campaign_key(campaign_id),
            Self::serialize(&campaign)?,
        );
        self.write(batch)?;

        Ok(campaign)
    }

    fn list_export_attempts(
        &self,
        campaign_id: &CampaignId,
        limit: usize,
    ) -> Result<Vec<ExportAttempt>> {
        let mut attempts = Vec::new();
        for key in self
            .keys_with_prefix(cf::EXPORT_ATTEMPTS, &keys::attempts_prefix(campaign_id))?
            .into_iter()
            .take(limit)
        {
            if let Some(attempt) = self.get_value(cf::EXPORT_ATTEMPTS, &key)? {
                attempts.push(attempt);
            }
        }
        Ok(attempts)
    }
}
