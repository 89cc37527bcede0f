//! `mark_verified`, `update_status`, and `flag_unmatched` are
//! storage-backed handlers that call back into the repository (C4)
//! rather than an external system (§4.7 "Handler set grounding").

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reconx_storage::Repository;
use serde_json::json;
use tracing::{info, warn};

use crate::handlers::{ActionContext, ActionHandler, HandlerOutcome};

/// Flips `CanonicalTransaction.verified` for the matched transaction.
/// Idempotent per the repository contract (§3 `Transaction.verified`).
pub struct MarkVerifiedHandler {
    repo: Arc<dyn Repository>,
}

impl MarkVerifiedHandler {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ActionHandler for MarkVerifiedHandler {
    async fn handle(&self, ctx: &ActionContext) -> HandlerOutcome {
        let Some(transaction_id) = ctx.transaction_id() else {
            return HandlerOutcome::failure("mark_verified_skipped", "no matched transaction to verify");
        };

        match self.repo.mark_transaction_verified(transaction_id, Utc::now()) {
            Ok(()) => {
                info!(transaction_id = %transaction_id, "mark_verified_success");
                HandlerOutcome::success("mark_verified_success")
            }
            Err(e) => {
                warn!(transaction_id = %transaction_id, error = %e, "mark_verified_failed");
                HandlerOutcome::failure("mark_verified_failed", e.to_string())
            }
        }
    }
}

/// Confirms the decided match status is durably persisted. The status
/// itself was already written by `writeMatch` ahead of dispatch (§4.8
/// Phase 3); this handler's job is the downstream propagation step —
/// reading the row back so a storage regression surfaces as an action
/// failure rather than silently diverging from what was dispatched on.
pub struct UpdateStatusHandler {
    repo: Arc<dyn Repository>,
}

impl UpdateStatusHandler {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ActionHandler for UpdateStatusHandler {
    async fn handle(&self, ctx: &ActionContext) -> HandlerOutcome {
        match self.repo.get_match_for_email(ctx.email_id) {
            Ok(Some(stored)) if stored.id == ctx.match_id => {
                HandlerOutcome::success("update_status_success")
                    .with_metadata(json!({ "stored_status": stored.status.stored_str() }))
            }
            Ok(Some(_)) | Ok(None) => {
                warn!(email_id = %ctx.email_id, "update_status_mismatch: stored match diverged from dispatched match");
                HandlerOutcome::failure("update_status_failed", "stored match row no longer matches the dispatched match")
            }
            Err(e) => HandlerOutcome::failure("update_status_failed", e.to_string()),
        }
    }
}

/// Marks an email with no candidate as needing attention. Like
/// `update_status`, the authoritative state (`status = no_candidates`)
/// is already persisted; this handler exists for the audit trail a
/// human reviewer queue reads (`outcomeLabel`, `(status, startInstant)`
/// index — §6).
pub struct FlagUnmatchedHandler;

#[async_trait]
impl ActionHandler for FlagUnmatchedHandler {
    async fn handle(&self, ctx: &ActionContext) -> HandlerOutcome {
        info!(email_id = %ctx.email_id, "flag_unmatched");
        HandlerOutcome::success("flag_unmatched_success").with_metadata(json!({ "email_id": ctx.email_id.to_string() }))
    }
}
