//! Identifier types for adcast.
//!
//! This module provides strongly-typed identifiers for users, campaigns, ledger
//! transactions, and export attempts.
//!
//! # Macro-based ID Types
//!
//! The `uuid_id_type!` and `ulid_id_type!` macros reduce boilerplate for identifier
//! types, ensuring consistent serialization, parsing, and display.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::{Generator, Ulid};

/// Maximum length of a campaign slug.
const MAX_CAMPAIGN_ID_LEN: usize = 160;

/// Maximum number of product-name characters carried into a campaign slug.
const MAX_SLUG_NAME_LEN: usize = 60;

/// Process-wide ULID source. Two IDs minted in the same millisecond still sort in
/// creation order, which keeps same-millisecond ledger rows in write order.
static ULID_GENERATOR: Mutex<Generator> = parking_lot::const_mutex(Generator::new());

/// Mint a ULID strictly greater than every ULID previously minted by this process.
fn monotonic_ulid() -> Ulid {
    // Overflow needs 2^80 IDs in one millisecond; fall back to a fresh random ULID.
    ULID_GENERATOR
        .lock()
        .generate()
        .unwrap_or_else(|_| Ulid::new())
}

/// Macro to define a UUID-based identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `uuid::Uuid` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `Serialize`, `Deserialize` (as string)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
macro_rules! uuid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create a new identifier from a UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Return the bytes of the UUID (16 bytes).
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
                Ok(Self(uuid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

/// Macro to define a ULID-based, time-ordered identifier type.
///
/// ULIDs sort by creation time, so keys built from them iterate chronologically. IDs
/// come from one monotonic generator, so the order holds within a millisecond too.
macro_rules! ulid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new identifier with the current timestamp.
            #[must_use]
            pub fn generate() -> Self {
                Self(monotonic_ulid())
            }

            /// Return the bytes of the ULID (16 bytes).
            #[must_use]
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_bytes()
            }

            /// Create an identifier from its 16 raw bytes.
            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Ulid::from_bytes(bytes))
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
                Ok(Self(ulid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

uuid_id_type!(
    UserId,
    "A user identifier (UUID format).\n\nUser IDs are taken from the `sub` claim of the session token."
);

ulid_id_type!(
    TransactionId,
    "A ledger row identifier using ULID for time-ordering.\n\nShared by usage and transaction records so the audit trail sorts chronologically."
);

ulid_id_type!(
    AttemptId,
    "An export attempt identifier using ULID for time-ordering."
);

/// A campaign identifier: an opaque, globally unique slug.
///
/// Format: `campaign_{product}_{YYYYmmdd_HHMMSS}_{suffix}` where `product` is the
/// lowercased product name with every non-alphanumeric character replaced by `_`, and
/// `suffix` is six random base32 characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CampaignId(String);

impl CampaignId {
    /// Generate a new campaign slug for a product at the given time.
    #[must_use]
    pub fn generate(product_name: &str, at: DateTime<Utc>) -> Self {
        let name: String = product_name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .take(MAX_SLUG_NAME_LEN)
            .collect();
        let name = if name.is_empty() { "untitled".to_string() } else { name };

        let random = Ulid::new().to_string().to_lowercase();
        let suffix = &random[random.len() - 6..];

        Self(format!(
            "campaign_{name}_{}_{suffix}",
            at.format("%Y%m%d_%H%M%S")
        ))
    }

    /// Return the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CampaignId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= MAX_CAMPAIGN_ID_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(IdError::InvalidSlug)
        }
    }
}

impl fmt::Debug for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CampaignId({})", self.0)
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CampaignId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CampaignId> for String {
    fn from(id: CampaignId) -> Self {
        id.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,

    /// The input is not a valid campaign slug.
    #[error("invalid campaign identifier")]
    InvalidSlug,
}
