//! Newtype identifiers used across the reconciliation pipeline.
//!
//! Natural keys (`MessageId`, `(SourceLabel, ExternalTxId)`) identify raw
//! records from the outside world and drive idempotent upsert (§4.4).
//! Surrogate ids (`EmailId`, `TransactionId`, `MatchId`, `ActionId`) are
//! assigned once a record is persisted and are what the rest of the
//! pipeline (retriever, scorer, dispatcher) passes around.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(u: Uuid) -> Self {
                Self(u)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

uuid_id!(EmailId);
uuid_id!(TransactionId);
uuid_id!(MatchId);
uuid_id!(ActionId);

/// Natural key for a raw email: the message identifier from the mail
/// transport (e.g. the `Message-ID` header). Unique across all sources.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

/// Label identifying which upstream source produced a transaction, e.g.
/// `"paystack"` or `"mock"`. Part of the transaction natural key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLabel(pub String);

impl SourceLabel {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceLabel({})", self.0)
    }
}

/// External identifier assigned by the upstream source, unique only in
/// combination with `SourceLabel`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalTxId(pub String);

impl ExternalTxId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalTxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ExternalTxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalTxId({})", self.0)
    }
}

/// Natural key for transactions: `(source, external_id)`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct TransactionNaturalKey {
    pub source: SourceLabel,
    pub external_id: ExternalTxId,
}

impl TransactionNaturalKey {
    pub fn new(source: SourceLabel, external_id: ExternalTxId) -> Self {
        Self { source, external_id }
    }

    /// Stable string form used as the sled key.
    pub fn storage_key(&self) -> String {
        format!("{}\u{1f}{}", self.source.as_str(), self.external_id.as_str())
    }
}
