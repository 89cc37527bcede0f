//! reconx-sources
//!
//! Pluggable email and transaction source pullers (C3): the uniform
//! contract, a pre-filter for inbound emails, the opaque extraction
//! collaborator contract, deterministic in-memory fakes, an HTTP-backed
//! transaction puller, and the resilience wiring that composes C1 around
//! a puller's fetch call.

pub mod extraction;
pub mod filter;
pub mod http_transaction;
pub mod mock;
pub mod puller;
pub mod raw;
pub mod resilient;

pub use extraction::{EmailExtractor, ExtractedFields, NullExtractor};
pub use filter::{passes_filter, EmailFilterConfig};
pub use http_transaction::HttpTransactionPuller;
pub use mock::{FlakyTransactionPuller, MockEmailPuller, MockTransactionPuller};
pub use puller::{EmailPuller, TransactionPuller};
pub use raw::{BatchCounts, RawEmail, RawTransaction, TxType};
pub use resilient::{resilient_email_fetch, resilient_transaction_fetch};
