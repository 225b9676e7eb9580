//! Read-through campaign cache.
//!
//! A bounded, TTL-evicting cache in front of the [`Store`](crate::Store). The store stays
//! the source of truth: misses load from it, and every write to a campaign must be
//! followed by [`CampaignCache::invalidate`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use adcast_core::{CampaignId, CampaignSpec};

use crate::error::Result;

struct CacheEntry {
    campaign: CampaignSpec,
    inserted_at: Instant,
    last_used: u64,
}

/// Bounded LRU cache of campaigns with a time-to-live.
pub struct CampaignCache {
    entries: Arc<DashMap<CampaignId, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    clock: AtomicU64,
}

impl CampaignCache {
    /// Create a cache holding at most `max_entries` campaigns for `ttl` each.
    #[must_use]
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::with_capacity(max_entries)),
            ttl,
            max_entries,
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Get a cached campaign. Expired entries are dropped and count as a miss.
    #[must_use]
    pub fn get(&self, campaign_id: &CampaignId) -> Option<CampaignSpec> {
        let mut entry = self.entries.get_mut(campaign_id)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(campaign_id);
            return None;
        }
        entry.last_used = self.tick();
        Some(entry.campaign.clone())
    }

    /// Insert or replace a campaign, evicting the least recently used entry when full.
    pub fn put(&self, campaign: CampaignSpec) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&campaign.id) {
            self.evict_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_least_recent();
            }
        }

        let last_used = self.tick();
        self.entries.insert(
            campaign.id.clone(),
            CacheEntry {
                campaign,
                inserted_at: Instant::now(),
                last_used,
            },
        );
    }

    /// Return the cached campaign, or load it with `load` and cache the result.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` returns on failure. Nothing is cached in that case.
    pub fn get_or_load<F>(&self, campaign_id: &CampaignId, load: F) -> Result<Option<CampaignSpec>>
    where
        F: FnOnce() -> Result<Option<CampaignSpec>>,
    {
        if let Some(campaign) = self.get(campaign_id) {
            return Ok(Some(campaign));
        }

        let loaded = load()?;
        if let Some(campaign) = &loaded {
            self.put(campaign.clone());
        }
        Ok(loaded)
    }

    /// Drop a campaign so the next read goes to the store.
    pub fn invalidate(&self, campaign_id: &CampaignId) {
        self.entries.remove(campaign_id);
    }

    /// Remove expired entries and return how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        before.saturating_sub(self.entries.len())
    }

    fn evict_least_recent(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.last_used)
            .map(|entry| entry.key().clone());
        if let Some(campaign_id) = oldest {
            tracing::debug!(campaign_id = %campaign_id, "Evicting least recently used campaign");
            self.entries.remove(&campaign_id);
        }
    }

    /// Number of cached campaigns (including not yet evicted expired ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
