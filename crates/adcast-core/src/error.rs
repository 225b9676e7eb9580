//! Error types for adcast.

use crate::ids::IdError;

/// Result type for adcast operations.
pub type Result<T> = std::result::Result<T, AdcastError>;

/// Errors that can occur in adcast operations.
#[derive(Debug, thiserror::Error)]
pub enum AdcastError {
    /// Caller-supplied data was rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(String),

    /// The ledger check failed.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// A provider adapter failed. Contained in that provider's result slot.
    #[error("provider error: {platform} - {message}")]
    Provider {
        /// The provider that failed.
        platform: String,
        /// Error message.
        message: String,
    },

    /// The reasoning service could not produce usable content.
    #[error("reasoning service unavailable: {0}")]
    ReasoningUnavailable(String),

    /// Persistence failed; the current unit of work was rolled back.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The caller is not authorized for the operation.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Requested identifier.
        id: String,
    },

    /// The record exists but belongs to someone else.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl AdcastError {
    /// Credits missing for an `InsufficientCredits` error, zero otherwise.
    #[must_use]
    pub fn shortage(&self) -> i64 {
        match self {
            Self::InsufficientCredits { balance, required } => (required - balance).max(0),
            _ => 0,
        }
    }
}
