//! Key encoding utilities for `RocksDB`.
//!
//! Index keys put the owner first so a prefix scan lists one owner's rows, and put a
//! time-ordered component next so the scan comes back in chronological order.

use adcast_core::{AttemptId, CampaignId, TransactionId, UserId};
use chrono::{DateTime, Utc};

/// Separator between a campaign slug and the attempt ID. Slugs never contain it.
const SLUG_SEPARATOR: u8 = 0x00;

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a ledger row key (usage or transaction) from its ID.
#[must_use]
pub fn row_key(row_id: &TransactionId) -> Vec<u8> {
    row_id.to_bytes().to_vec()
}

/// Create a user-row index key.
///
/// Format: `user_id (16 bytes) || row_id (16 bytes)`
#[must_use]
pub fn user_row_key(user_id: &UserId, row_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&row_id.to_bytes());
    key
}

/// Create a prefix for iterating everything a user owns in an index.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the row ID from a user-row index key.
///
/// Returns `None` if the key is shorter than 32 bytes.
#[must_use]
pub fn row_id_from_user_key(key: &[u8]) -> Option<TransactionId> {
    let bytes: [u8; 16] = key.get(16..32)?.try_into().ok()?;
    Some(TransactionId::from_bytes(bytes))
}

/// Create a campaign key from its slug.
#[must_use]
pub fn campaign_key(campaign_id: &CampaignId) -> Vec<u8> {
    campaign_id.as_str().as_bytes().to_vec()
}

/// Create a user-campaign index key.
///
/// Format: `user_id (16 bytes) || created_at millis (8 bytes, big-endian) || slug`
#[must_use]
pub fn user_campaign_key(
    user_id: &UserId,
    created_at: DateTime<Utc>,
    campaign_id: &CampaignId,
) -> Vec<u8> {
    let millis = u64::try_from(created_at.timestamp_millis()).unwrap_or(0);
    let slug = campaign_id.as_str().as_bytes();

    let mut key = Vec::with_capacity(24 + slug.len());
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&millis.to_be_bytes());
    key.extend_from_slice(slug);
    key
}

/// Extract the campaign slug from a user-campaign index key.
#[must_use]
pub fn campaign_id_from_user_key(key: &[u8]) -> Option<CampaignId> {
    let slug = std::str::from_utf8(key.get(24..)?).ok()?;
    slug.parse().ok()
}

/// Create a prefix for iterating all attempts of a campaign.
#[must_use]
pub fn attempts_prefix(campaign_id: &CampaignId) -> Vec<u8> {
    let mut key = campaign_key(campaign_id);
    key.push(SLUG_SEPARATOR);
    key
}

/// Create an export attempt key.
///
/// Format: `slug || 0x00 || attempt_id (16 bytes)`
#[must_use]
pub fn attempt_key(campaign_id: &CampaignId, attempt_id: &AttemptId) -> Vec<u8> {
    let mut key = attempts_prefix(campaign_id);
    key.extend_from_slice(&attempt_id.to_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_row_key_format() {
        let user_id = UserId::generate();
        let row_id = TransactionId::generate();
        let key = user_row_key(&user_id, &row_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(row_id_from_user_key(&key), Some(row_id));
        assert_eq!(row_id_from_user_key(&key[..20]), None);
    }

    #[test]
    fn user_campaign_key_roundtrip() {
        let user_id = UserId::generate();
        let campaign_id = CampaignId::generate("Desk Lamp", Utc::now());
        let key = user_campaign_key(&user_id, Utc::now(), &campaign_id);

        assert!(key.starts_with(&user_prefix(&user_id)));
        assert_eq!(campaign_id_from_user_key(&key), Some(campaign_id));
    }

    #[test]
    fn user_campaign_keys_sort_by_time() {
        let user_id = UserId::generate();
        let earlier = DateTime::from_timestamp(1_000, 0).unwrap();
        let later = DateTime::from_timestamp(2_000, 0).unwrap();
        let a = user_campaign_key(&user_id, earlier, &"campaign_z".parse().unwrap());
        let b = user_campaign_key(&user_id, later, &"campaign_a".parse().unwrap());

        assert!(a < b);
    }

    #[test]
    fn attempt_keys_do_not_collide_across_slug_prefixes() {
        let short: CampaignId = "campaign_a".parse().unwrap();
        let long: CampaignId = "campaign_ab".parse().unwrap();
        let key = attempt_key(&long, &AttemptId::generate());

        assert!(!key.starts_with(&attempts_prefix(&short)));
        assert!(key.starts_with(&attempts_prefix(&long)));
    }
}
