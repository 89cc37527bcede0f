//! Wires the action set's handlers together, computes the per-outcome
//! action list, executes it in order against the audit trail, and
//! retries critical actions under the same [`reconx_resilience`]
//! runner the source pullers use (§4.7 "Execution").

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use reconx_core::config::Config;
use reconx_core::model::{ActionAudit, ActionKind, ActionStatus, AuditPatch, MatchResult};
use reconx_core::types::ActionId;
use reconx_core::ReconResult;
use reconx_resilience::retry_with_backoff;
use reconx_storage::Repository;
use tracing::{info, warn};

use crate::escalate_handler::EscalateHandler;
use crate::handlers::{ActionContext, ActionHandler, HandlerOutcome};
use crate::http_handler::HttpActionHandler;
use crate::notification_handler::{CreateTicketHandler, SendEmailConfig, SendEmailHandler, TicketConfig};
use crate::outcome::{categorize, compute_action_list};
use crate::storage_handler::{FlagUnmatchedHandler, MarkVerifiedHandler, UpdateStatusHandler};

/// External integration endpoints; all optional — unconfigured
/// integrations simulate success (§4.7).
#[derive(Clone, Debug, Default)]
pub struct IntegrationConfig {
    pub webhook_url: Option<String>,
    pub external_system_url: Option<String>,
    pub email_recipient: Option<String>,
}

/// One action's final disposition, returned to the orchestrator after
/// every action in the computed list has run (§4.7 "Execution").
#[derive(Clone, Debug)]
pub struct ActionResult {
    pub action_id: ActionId,
    pub kind: ActionKind,
    pub status: ActionStatus,
    pub outcome_label: Option<String>,
    pub error: Option<String>,
    pub retry_count: u32,
    pub duration_millis: i64,
}

pub struct ActionDispatcher {
    repo: Arc<dyn Repository>,
    handlers: HashMap<ActionKind, Box<dyn ActionHandler>>,
    action_timeout: Duration,
}

impl ActionDispatcher {
    pub fn new(repo: Arc<dyn Repository>, integrations: IntegrationConfig, action_timeout: Duration) -> Self {
        let mut handlers: HashMap<ActionKind, Box<dyn ActionHandler>> = HashMap::new();

        handlers.insert(ActionKind::MarkVerified, Box::new(MarkVerifiedHandler::new(repo.clone())));
        handlers.insert(ActionKind::UpdateStatus, Box::new(UpdateStatusHandler::new(repo.clone())));
        handlers.insert(ActionKind::FlagUnmatched, Box::new(FlagUnmatchedHandler));
        handlers.insert(
            ActionKind::NotifyExternalSystem,
            Box::new(HttpActionHandler::new(
                "notify_external_system",
                integrations.external_system_url.clone(),
                action_timeout,
            )),
        );
        handlers.insert(
            ActionKind::SendWebhook,
            Box::new(HttpActionHandler::new("send_webhook", integrations.webhook_url.clone(), action_timeout)),
        );
        handlers.insert(ActionKind::CreateTicket, Box::new(CreateTicketHandler::new(TicketConfig::default())));
        handlers.insert(
            ActionKind::SendEmail,
            Box::new(SendEmailHandler::new(SendEmailConfig {
                recipient: integrations.email_recipient.clone(),
            })),
        );
        handlers.insert(
            ActionKind::Escalate,
            Box::new(EscalateHandler::new(
                Box::new(CreateTicketHandler::new(TicketConfig::default())),
                Box::new(SendEmailHandler::new(SendEmailConfig {
                    recipient: integrations.email_recipient,
                })),
            )),
        );

        Self {
            repo,
            handlers,
            action_timeout,
        }
    }

    /// Categorizes the match's outcome, computes the action list, and
    /// runs every action in order. A handler failure never aborts
    /// subsequent actions (§4.7).
    pub async fn dispatch(&self, result: &MatchResult, config: &Config, retry_config: &reconx_core::config::RetryConfig, actor: &str) -> ReconResult<Vec<ActionResult>> {
        let outcome = categorize(result, config);
        let actions = compute_action_list(result, outcome, config);

        info!(email_id = %result.email_id, ?outcome, action_count = actions.len(), "dispatching_actions");

        let mut results = Vec::with_capacity(actions.len());
        for kind in actions {
            let action_result = self.run_one(kind, result, outcome, retry_config, actor).await?;
            results.push(action_result);
        }
        Ok(results)
    }

    async fn run_one(
        &self,
        kind: ActionKind,
        result: &MatchResult,
        outcome: reconx_core::model::MatchOutcome,
        retry_config: &reconx_core::config::RetryConfig,
        actor: &str,
    ) -> ReconResult<ActionResult> {
        let ctx = ActionContext::for_action(kind, result, outcome);

        let audit = ActionAudit {
            id: ActionId::new(),
            action_kind: kind,
            match_id: result.id,
            email_id: result.email_id,
            transaction_id: ctx.transaction_id(),
            match_status_at_time: result.status,
            confidence_at_time: result.confidence,
            actor: actor.to_string(),
            start_instant: Utc::now(),
            end_instant: None,
            duration_millis: None,
            status: ActionStatus::Pending,
            outcome_label: None,
            message: None,
            error: None,
            retry_count: 0,
            payload_blob: None,
        };
        let audit_id = self.repo.append_audit(&audit)?;

        let start = Instant::now();
        let (outcome_result, retry_count) = if kind.is_critical() {
            self.run_critical(kind, &ctx, retry_config).await
        } else {
            (self.invoke(kind, &ctx).await, 0)
        };
        let elapsed_ms = start.elapsed().as_millis() as i64;

        let status = if outcome_result.success { ActionStatus::Success } else { ActionStatus::Failed };
        let patch = AuditPatch {
            status: Some(status),
            outcome_label: Some(outcome_result.outcome_label.clone()),
            message: outcome_result.message.clone(),
            error: outcome_result.error.clone(),
            end_instant: Some(Utc::now()),
            duration_millis: Some(elapsed_ms),
            payload_blob: outcome_result.metadata.clone(),
        };
        self.repo.update_audit(audit_id, &patch)?;

        if !outcome_result.success {
            warn!(action = kind.as_str(), email_id = %result.email_id, error = ?outcome_result.error, "action_failed");
        }

        Ok(ActionResult {
            action_id: audit_id,
            kind,
            status,
            outcome_label: Some(outcome_result.outcome_label),
            error: outcome_result.error,
            retry_count,
            duration_millis: elapsed_ms,
        })
    }

    async fn invoke(&self, kind: ActionKind, ctx: &ActionContext) -> HandlerOutcome {
        match self.handlers.get(&kind) {
            Some(handler) => handler.handle(ctx).await,
            None => HandlerOutcome::failure(format!("{}_unhandled", kind.as_str()), "no handler registered"),
        }
    }

    /// Critical actions (`mark_verified`, `update_status`) retry under
    /// the same backoff runner pullers use; on exhaustion the audit row
    /// is left `failed` and the persisted match is untouched (§7 class 7).
    async fn run_critical(
        &self,
        kind: ActionKind,
        ctx: &ActionContext,
        retry_config: &reconx_core::config::RetryConfig,
    ) -> (HandlerOutcome, u32) {
        let attempts = Cell::new(0u32);
        let result: Result<HandlerOutcome, HandlerOutcome> = retry_with_backoff(
            kind.as_str(),
            retry_config,
            || {
                attempts.set(attempts.get() + 1);
                async move {
                    let outcome = self.invoke(kind, ctx).await;
                    if outcome.success {
                        Ok(outcome)
                    } else {
                        Err(outcome)
                    }
                }
            },
            |_| true,
        )
        .await;

        let retry_count = attempts.get().saturating_sub(1);
        match result {
            Ok(outcome) => (outcome, retry_count),
            Err(outcome) => (outcome, retry_count),
        }
    }

    pub fn action_timeout(&self) -> Duration {
        self.action_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconx_core::model::MatchStatus;
    use reconx_core::types::{EmailId, MatchId};
    use reconx_storage::InMemoryRepository;

    fn sample_result(status: MatchStatus) -> MatchResult {
        MatchResult {
            id: MatchId::new(),
            email_id: EmailId::new(),
            best_candidate: None,
            alternative_candidates: vec![],
            status,
            confidence: 0.9,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn rejected_outcome_dispatches_no_actions() {
        let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
        let dispatcher = ActionDispatcher::new(repo, IntegrationConfig::default(), Duration::from_secs(1));
        let result = sample_result(MatchStatus::Rejected);
        let config = Config::default();
        let results = dispatcher.dispatch(&result, &config, &config.retry, "test").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn no_candidates_dispatches_flag_and_notify_actions() {
        let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
        let dispatcher = ActionDispatcher::new(repo, IntegrationConfig::default(), Duration::from_secs(1));
        let result = sample_result(MatchStatus::NoCandidates);
        let config = Config::default();
        let results = dispatcher.dispatch(&result, &config, &config.retry, "test").await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.status == ActionStatus::Success));
    }
}
