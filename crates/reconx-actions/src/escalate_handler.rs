//! `escalate` is policy-driven and composes with whichever handler the
//! escalation target is configured to use — default: ticket + email
//! (§4.7 "Handler set grounding").

use async_trait::async_trait;
use reconx_core::model::ActionKind;
use serde_json::json;

use crate::handlers::{ActionContext, ActionHandler, HandlerOutcome};

pub struct EscalateHandler {
    ticket: Box<dyn ActionHandler>,
    email: Box<dyn ActionHandler>,
}

impl EscalateHandler {
    pub fn new(ticket: Box<dyn ActionHandler>, email: Box<dyn ActionHandler>) -> Self {
        Self { ticket, email }
    }
}

#[async_trait]
impl ActionHandler for EscalateHandler {
    async fn handle(&self, ctx: &ActionContext) -> HandlerOutcome {
        let mut escalate_ctx = ctx.clone();
        escalate_ctx.action_kind = ActionKind::CreateTicket;
        let ticket_outcome = self.ticket.handle(&escalate_ctx).await;

        escalate_ctx.action_kind = ActionKind::SendEmail;
        let email_outcome = self.email.handle(&escalate_ctx).await;

        let success = ticket_outcome.success && email_outcome.success;
        HandlerOutcome {
            success,
            outcome_label: "escalate_dispatched".into(),
            message: Some(format!(
                "ticket={} email={}",
                ticket_outcome.outcome_label, email_outcome.outcome_label
            )),
            error: if success {
                None
            } else {
                Some(
                    [ticket_outcome.error, email_outcome.error]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join("; "),
                )
            },
            metadata: Some(json!({
                "ticket": ticket_outcome.metadata,
                "email": email_outcome.metadata,
            })),
        }
    }
}
