//! Crate-wide error taxonomy.
//!
//! One enum, grouped by the failure classes of the error-handling design:
//! malformed input, transient/persistent source failures, storage
//! conflicts/failures, policy violations, action failures, and the
//! circuit-open sentinel. Call sites use `?`; `From` impls exist for the
//! underlying storage/serialization error types so conversions are free.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    // ── Input normalization ──────────────────────────────────────────
    #[error("unparsable amount: {0}")]
    UnparsableAmount(String),

    #[error("unparsable timestamp: {0}")]
    UnparsableTimestamp(String),

    #[error("missing required field for {operation}: {field}")]
    MissingField { operation: &'static str, field: &'static str },

    // ── Source pullers ───────────────────────────────────────────────
    #[error("transient source failure on {source_label}: {detail}")]
    TransientSource { source_label: String, detail: String },

    #[error("persistent source failure on {source_label}: {detail}")]
    PersistentSource { source_label: String, detail: String },

    #[error("circuit '{name}' is open, call rejected without attempt")]
    CircuitOpen { name: String },

    // ── Storage ──────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("record not found: {0}")]
    NotFound(String),

    // ── Configuration / policy ───────────────────────────────────────
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    // ── Actions ──────────────────────────────────────────────────────
    #[error("action '{kind}' failed: {detail}")]
    ActionFailed { kind: String, detail: String },

    #[error("http error calling {url}: {detail}")]
    Http { url: String, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl ReconError {
    /// True for failures the retry runner should retry and the circuit
    /// breaker should count (§7 classes 2 and 8).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReconError::TransientSource { .. } | ReconError::CircuitOpen { .. }
        )
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(e: serde_json::Error) -> Self {
        ReconError::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for ReconError {
    fn from(e: bincode::Error) -> Self {
        ReconError::Serialization(e.to_string())
    }
}

impl From<sled::Error> for ReconError {
    fn from(e: sled::Error) -> Self {
        ReconError::Storage(e.to_string())
    }
}

pub type ReconResult<T> = Result<T, ReconError>;
