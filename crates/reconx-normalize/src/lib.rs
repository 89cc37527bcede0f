//! reconx-normalize
//!
//! Stateless pure functions converting semi-structured email text and
//! raw API records into the canonical, comparable representation used
//! by storage, scoring, and the dispatcher (C2).

pub mod amount;
pub mod bank_aliases;
pub mod canonicalize;
pub mod composite_key;
pub mod currency;
pub mod enrichment;
pub mod fuzzy;
pub mod reference;
pub mod timestamp;

pub use amount::normalize_amount;
pub use canonicalize::{build_canonical_email, build_canonical_transaction, RawEmailFields, RawTransactionFields};
pub use composite_key::composite_key;
pub use currency::normalize_currency;
pub use enrichment::enrich_bank_info;
pub use fuzzy::FuzzyMatcher;
pub use reference::normalize_reference;
pub use timestamp::normalize_timestamp;
