//! reconx-orchestrator
//!
//! Ties every other crate together into the periodic reconciliation
//! process (§4.8): ingest emails, ingest transactions per bank source,
//! match and act on the unmatched queue, and expose a status/trigger
//! surface over the running loop (§4.9).

pub mod cycle;
pub mod ingest;
pub mod matching;
pub mod orchestrator;
pub mod status;

pub use cycle::{run_cycle, CycleDeps, TransactionSource};
pub use orchestrator::Orchestrator;
pub use status::{StatusSnapshot, TriggerOutcome};
