//! In-memory storage implementation.
//!
//! Used by tests and by the service when no data directory is configured. Every
//! compound operation runs in one critical section under the table write lock, so it
//! has the same all-or-nothing behavior as the `RocksDB` backend.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use adcast_core::{
    AttemptId, CampaignExportAggregate, CampaignId, CampaignSpec, CreditAccount,
    ExportAttempt, TransactionId, TransactionRecord, TransactionStatus, UsageRecord, UserId,
};

use crate::error::{Result, StoreError};
use crate::mutation;
use crate::Store;

#[derive(Default)]
struct Tables {
    accounts: HashMap<UserId, CreditAccount>,
    usage: BTreeMap<TransactionId, UsageRecord>,
    transactions: BTreeMap<TransactionId, TransactionRecord>,
    campaigns: HashMap<CampaignId, CampaignSpec>,
    attempts: HashMap<CampaignId, BTreeMap<AttemptId, ExportAttempt>>,
}

/// In-memory storage backed by hash maps behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(rows: impl DoubleEndedIterator<Item = T>, limit: usize, offset: usize) -> Vec<T> {
    rows.rev().skip(offset).take(limit).collect()
}

impl Store for MemoryStore {
    fn create_account(
        &self,
        account: &CreditAccount,
        grants: &[TransactionRecord],
    ) -> Result<Vec<TransactionRecord>> {
        let mut tables = self.tables.write();
        if tables.accounts.contains_key(&account.user_id) {
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

        tables.accounts.insert(account.user_id, account);
        for grant in &written {
            tables.transactions.insert(grant.id, grant.clone());
        }
        Ok(written)
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        Ok(self.tables.read().accounts.get(user_id).cloned())
    }

    fn record_usage(&self, usage: &UsageRecord) -> Result<UsageRecord> {
        let mut tables = self.tables.write();

        let mut account = tables
            .accounts
            .get(&usage.user_id)
            .cloned()
            .ok_or_else(|| StoreError::account_not_found(usage.user_id))?;
        let mut usage = usage.clone();
        mutation::apply_usage(&mut account, &mut usage)?;

        tables.accounts.insert(account.user_id, account);
        tables.usage.insert(usage.id, usage.clone());
        Ok(usage)
    }

    fn record_credit(&self, transaction: &TransactionRecord) -> Result<TransactionRecord> {
        let mut tables = self.tables.write();

        let mut account = tables
            .accounts
            .get(&transaction.user_id)
            .cloned()
            .ok_or_else(|| StoreError::account_not_found(transaction.user_id))?;
        let mut transaction = transaction.clone();
        mutation::apply_credit(&mut account, &mut transaction)?;

        tables.accounts.insert(account.user_id, account);
        tables.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    fn put_pending_transaction(&self, transaction: &TransactionRecord) -> Result<()> {
        if transaction.status != TransactionStatus::Pending {
            return Err(StoreError::InvalidState(format!(
                "expected a pending transaction, got {:?}",
                transaction.status
            )));
        }

        let mut tables = self.tables.write();
        if !tables.accounts.contains_key(&transaction.user_id) {
            return Err(StoreError::account_not_found(transaction.user_id));
        }
        tables.transactions.insert(transaction.id, transaction.clone());
        Ok(())
    }

    fn settle_transaction(
        &self,
        transaction_id: &TransactionId,
        status: TransactionStatus,
        reason: Option<&str>,
    ) -> Result<TransactionRecord> {
        let mut tables = self.tables.write();

        let mut transaction = tables
            .transactions
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "transaction",
                id: transaction_id.to_string(),
            })?;
        let mut account = tables
            .accounts
            .get(&transaction.user_id)
            .cloned()
            .ok_or_else(|| StoreError::account_not_found(transaction.user_id))?;
        let reversal = mutation::apply_settlement(&mut account, &mut transaction, status, reason)?;

        tables.accounts.insert(account.user_id, account);
        tables.transactions.insert(transaction.id, transaction.clone());
        if let Some(reversal) = reversal {
            tables.transactions.insert(reversal.id, reversal);
        }
        Ok(transaction)
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<TransactionRecord>> {
        Ok(self.tables.read().transactions.get(transaction_id).cloned())
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransactionRecord>> {
        let tables = self.tables.read();
        Ok(page(
            tables
                .transactions
                .values()
                .filter(|tx| tx.user_id == *user_id)
                .cloned(),
            limit,
            offset,
        ))
    }

    fn list_usage_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<UsageRecord>> {
        let tables = self.tables.read();
        Ok(page(
            tables
                .usage
                .values()
                .filter(|row| row.user_id == *user_id)
                .cloned(),
            limit,
            offset,
        ))
    }

    fn create_campaign(&self, campaign: &CampaignSpec) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.campaigns.contains_key(&campaign.id) {
            return Err(StoreError::AlreadyExists {
                entity: "campaign",
                id: campaign.id.to_string(),
            });
        }
        tables.campaigns.insert(campaign.id.clone(), campaign.clone());
        Ok(())
    }

    fn get_campaign(&self, campaign_id: &CampaignId) -> Result<Option<CampaignSpec>> {
        Ok(self.tables.read().campaigns.get(campaign_id).cloned())
    }

    fn list_campaigns_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CampaignSpec>> {
        let tables = self.tables.read();
        let mut owned: Vec<_> = tables
            .campaigns
            .values()
            .filter(|c| c.is_owned_by(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        Ok(page(owned.into_iter(), limit, offset))
    }

    fn record_export(
        &self,
        campaign_id: &CampaignId,
        attempts: &[ExportAttempt],
        update: &dyn Fn(&mut CampaignExportAggregate),
    ) -> Result<CampaignSpec> {
        let mut tables = self.tables.write();

        let mut campaign = tables
            .campaigns
            .get(campaign_id)
            .cloned()
            .ok_or_else(|| StoreError::campaign_not_found(campaign_id))?;
        update(&mut campaign.export);

        let rows = tables.attempts.entry(campaign_id.clone()).or_default();
        for attempt in attempts {
            rows.insert(attempt.id, attempt.clone());
        }
        tables.campaigns.insert(campaign_id.clone(), campaign.clone());
        Ok(campaign)
    }

    fn list_export_attempts(
        &self,
        campaign_id: &CampaignId,
        limit: usize,
    ) -> Result<Vec<ExportAttempt>> {
        let tables = self.tables.read();
        Ok(tables
            .attempts
            .get(campaign_id)
            .map(|rows| page(rows.values().cloned(), limit, 0))
            .unwrap_or_default())
    }
}
