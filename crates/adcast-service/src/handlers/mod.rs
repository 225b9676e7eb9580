//! HTTP request handlers.

pub mod accounts;
pub mod campaigns;
pub mod catalog;
pub mod credits;
pub mod health;

use serde::Deserialize;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Maximum number of rows to return (default: 50, capped at 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl PageQuery {
    /// The limit, capped.
    #[must_use]
    pub fn capped_limit(&self) -> usize {
        self.limit.min(100)
    }
}
