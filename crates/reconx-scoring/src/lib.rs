//! reconx-scoring
//!
//! Candidate retrieval (C5), the weighted rule set (C6), the ranker and
//! tie-breaker, and the threshold decision table that turns a ranked
//! candidate list into a [`reconx_core::model::MatchStatus`].

pub mod decision;
pub mod ranker;
pub mod retriever;
pub mod rules;
pub mod scorer;

pub use decision::{decide, Decision};
pub use retriever::{retrieve_candidates, retrieve_candidates_by_composite_key};
pub use scorer::score_candidates;
