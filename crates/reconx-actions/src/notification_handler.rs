//! `create_ticket` and `send_email` are notification-style handlers with
//! a typed payload (title/description/priority/category for tickets;
//! recipient/subject/message for email) that, unconfigured, simulate
//! success (§4.7 "Handler set grounding").

use async_trait::async_trait;
use reconx_core::model::{ActionKind, MatchOutcome};
use serde_json::json;
use tracing::info;

use crate::handlers::{ActionContext, ActionHandler, HandlerOutcome};

#[derive(Clone, Debug)]
pub struct TicketConfig {
    pub default_priority: &'static str,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self { default_priority: "normal" }
    }
}

/// Unconfigured in every environment this core ships with — ticketing
/// system integration is an external collaborator (§6) — so this always
/// simulates, recording the payload it would have sent in the audit
/// metadata for observability.
pub struct CreateTicketHandler {
    config: TicketConfig,
}

impl CreateTicketHandler {
    pub fn new(config: TicketConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ActionHandler for CreateTicketHandler {
    async fn handle(&self, ctx: &ActionContext) -> HandlerOutcome {
        let priority = if matches!(ctx.outcome, MatchOutcome::Ambiguous) {
            "high"
        } else {
            self.config.default_priority
        };
        let title = format!("Reconciliation review needed: email {}", ctx.email_id);
        let description = format!(
            "outcome={:?} confidence={:.2} alternatives={}",
            ctx.outcome, ctx.confidence, ctx.alternative_count
        );

        info!(email_id = %ctx.email_id, priority, "create_ticket_simulated");
        HandlerOutcome::simulated(ActionKind::CreateTicket)
            .with_message(title)
            .with_metadata(json!({
                "priority": priority,
                "category": "reconciliation",
                "description": description,
            }))
    }
}

#[derive(Clone, Debug, Default)]
pub struct SendEmailConfig {
    pub recipient: Option<String>,
}

pub struct SendEmailHandler {
    config: SendEmailConfig,
}

impl SendEmailHandler {
    pub fn new(config: SendEmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ActionHandler for SendEmailHandler {
    async fn handle(&self, ctx: &ActionContext) -> HandlerOutcome {
        let recipient = self.config.recipient.as_deref().unwrap_or("unconfigured");
        let subject = format!("Reconciliation {:?}: email {}", ctx.outcome, ctx.email_id);

        info!(email_id = %ctx.email_id, recipient, "send_email_simulated");
        HandlerOutcome::simulated(ActionKind::SendEmail)
            .with_message(subject)
            .with_metadata(json!({ "recipient": recipient }))
    }
}
