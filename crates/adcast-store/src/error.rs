//! Error types for adcast storage.

use adcast_core::AdcastError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// Any error returned from a compound operation means nothing from that operation was
/// written.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Requested identifier.
        id: String,
    },

    /// Record already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Kind of record.
        entity: &'static str,
        /// Conflicting identifier.
        id: String,
    },

    /// Insufficient credits for deduction.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Credit amounts must be positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// The record is not in a state that allows the requested change.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl StoreError {
    /// Shorthand for a missing account.
    #[must_use]
    pub fn account_not_found(user_id: impl ToString) -> Self {
        Self::NotFound {
            entity: "account",
            id: user_id.to_string(),
        }
    }

    /// Shorthand for a missing campaign.
    #[must_use]
    pub fn campaign_not_found(campaign_id: impl ToString) -> Self {
        Self::NotFound {
            entity: "campaign",
            id: campaign_id.to_string(),
        }
    }
}

impl From<StoreError> for AdcastError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            StoreError::InvalidAmount(amount) => {
                Self::Validation(format!("credit amount must be positive, got {amount}"))
            }
            StoreError::InvalidState(msg) => Self::Validation(msg),
            StoreError::AlreadyExists { entity, id } => {
                Self::Persistence(format!("{entity} already exists: {id}"))
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Persistence(msg),
        }
    }
}
