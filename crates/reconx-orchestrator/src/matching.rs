//! Phase 3 (§4.8): retriever → scorer → ranker → decision → persist,
//! then an optional action dispatch, for one email. Sequential by
//! design — ordering and metrics determinism matter more than
//! parallelizing CPU-bound scoring (§5).

use chrono::Utc;
use reconx_actions::ActionDispatcher;
use reconx_core::config::Config;
use reconx_core::model::{CanonicalEmail, MatchResult, MatchStatus};
use reconx_core::types::MatchId;
use reconx_core::ReconResult;
use reconx_metrics::CycleAccumulator;
use reconx_scoring::{decide, retrieve_candidates, score_candidates};
use reconx_storage::Repository;
use tracing::{debug, info};

/// Runs the full per-email pipeline and records its outcome into the
/// cycle's metrics accumulator. Returns the persisted `MatchResult` so
/// the caller can dispatch post-match actions.
pub async fn match_one_email(
    email: &CanonicalEmail,
    repo: &dyn Repository,
    dispatcher: Option<&ActionDispatcher>,
    config: &Config,
    accumulator: &mut CycleAccumulator,
) -> ReconResult<MatchResult> {
    // Non-alert extractions are stored but never scored (§4.3, §6):
    // persist a trivial no-candidates match so the email still leaves
    // the unmatched queue deterministically.
    if !email.is_alert {
        let result = build_result(email.id, MatchStatus::NoCandidates, None, Vec::new(), 0.0);
        repo.write_match(&result)?;
        repo.mark_email_processed(email.id, None)?;
        accumulator.record_match(&result, &[]);
        debug!(email_id = %email.id, "non-alert email stored without scoring");
        return Ok(result);
    }

    let candidates = retrieve_candidates(
        repo,
        email,
        config.matching.time_window.default_hours,
        &config.matching.candidate_retrieval,
    )?;

    let scored = score_candidates(email, &candidates, &config.matching);
    let ranked = reconx_scoring::ranker::rank(scored);
    let tie_broken = reconx_scoring::ranker::apply_tie_breaking(ranked, &config.matching.tie_breaking, email);

    let all_scores: Vec<_> = tie_broken.iter().map(|c| c.scores.clone()).collect();
    let decision = decide(tie_broken, &config.matching);

    let result = build_result(
        email.id,
        decision.status,
        decision.best,
        decision.alternatives,
        decision.confidence,
    );

    repo.write_match(&result)?;
    repo.mark_email_processed(email.id, None)?;
    accumulator.record_match(&result, &all_scores);

    info!(email_id = %email.id, status = ?result.status, confidence = result.confidence, "email_matched");

    if let Some(dispatcher) = dispatcher {
        if config.orchestrator.actions_enabled {
            let _ = dispatcher.dispatch(&result, config, &config.retry, "orchestrator").await?;
        }
    }

    Ok(result)
}

fn build_result(
    email_id: reconx_core::types::EmailId,
    status: MatchStatus,
    best: Option<reconx_core::model::MatchCandidate>,
    alternatives: Vec<reconx_core::model::MatchCandidate>,
    confidence: f64,
) -> MatchResult {
    let now = Utc::now();
    MatchResult {
        id: MatchId::new(),
        email_id,
        best_candidate: best,
        alternative_candidates: alternatives,
        status,
        confidence,
        created_at: now,
        updated_at: now,
        notes: None,
    }
}
