//! reconx-core
//!
//! Shared domain types, error taxonomy, numeric defaults, and typed
//! configuration for the bank-alert reconciliation pipeline. Every other
//! crate in the workspace depends on this one and none of its siblings.

pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod types;

pub use error::{ReconError, ReconResult};
