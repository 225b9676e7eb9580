//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Credit accounts, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Usage rows, keyed by row ID (ULID).
    pub const USAGE: &str = "usage";

    /// Index: usage rows by user, keyed by `user_id || row_id`.
    /// Value is empty (index only).
    pub const USAGE_BY_USER: &str = "usage_by_user";

    /// Transaction rows, keyed by row ID (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || row_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Campaigns, keyed by slug.
    pub const CAMPAIGNS: &str = "campaigns";

    /// Index: campaigns by user, keyed by `user_id || created_at_ms || slug`.
    /// Value is empty (index only).
    pub const CAMPAIGNS_BY_USER: &str = "campaigns_by_user";

    /// Export attempts, keyed by `slug || 0x00 || attempt_id`.
    pub const EXPORT_ATTEMPTS: &str = "export_attempts";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::USAGE,
        cf::USAGE_BY_USER,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::CAMPAIGNS,
        cf::CAMPAIGNS_BY_USER,
        cf::EXPORT_ATTEMPTS,
    ]
}
