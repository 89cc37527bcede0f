//! Action handler contract (§4.7 "Handler contracts") and the context
//! passed to every handler invocation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reconx_core::model::{ActionKind, CanonicalTransaction, MatchOutcome, MatchResult};
use reconx_core::types::{EmailId, MatchId, TransactionId};
use serde_json::Value as Json;

/// Everything a handler needs to act on one match, independent of how
/// the dispatcher got here (a fresh cycle or a manual rematch).
#[derive(Clone, Debug)]
pub struct ActionContext {
    pub action_kind: ActionKind,
    pub match_id: MatchId,
    pub email_id: EmailId,
    pub transaction: Option<CanonicalTransaction>,
    pub outcome: MatchOutcome,
    pub confidence: f64,
    pub alternative_count: usize,
    pub triggered_at: DateTime<Utc>,
}

impl ActionContext {
    pub fn for_action(kind: ActionKind, result: &MatchResult, outcome: MatchOutcome) -> Self {
        Self {
            action_kind: kind,
            match_id: result.id,
            email_id: result.email_id,
            transaction: result.best_candidate.as_ref().map(|c| c.transaction.clone()),
            outcome,
            confidence: result.confidence,
            alternative_count: result.alternative_count(),
            triggered_at: Utc::now(),
        }
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction.as_ref().map(|t| t.id)
    }
}

/// What a handler invocation produced — mirrors the audit fields it
/// feeds (§3 `ActionAudit`).
#[derive(Clone, Debug)]
pub struct HandlerOutcome {
    pub success: bool,
    pub outcome_label: String,
    pub message: Option<String>,
    pub error: Option<String>,
    pub metadata: Option<Json>,
}

impl HandlerOutcome {
    pub fn success(outcome_label: impl Into<String>) -> Self {
        Self {
            success: true,
            outcome_label: outcome_label.into(),
            message: None,
            error: None,
            metadata: None,
        }
    }

    pub fn simulated(kind: ActionKind) -> Self {
        Self::success(format!("{}_simulated", kind.as_str()))
    }

    pub fn failure(outcome_label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome_label: outcome_label.into(),
            message: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Json) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, ctx: &ActionContext) -> HandlerOutcome;
}
