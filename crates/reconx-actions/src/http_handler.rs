//! `notify_external_system` and `send_webhook` share an HTTP-POST
//! handler shape (§4.7 "Handler set grounding"): a typed JSON payload, a
//! per-call timeout, and 2xx/4xx/5xx classification mirroring the
//! transaction puller's status handling (§6).

use std::time::Duration;

use async_trait::async_trait;
use reconx_core::model::MatchOutcome;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::handlers::{ActionContext, ActionHandler, HandlerOutcome};

#[derive(Serialize)]
struct WebhookPayload {
    event: &'static str,
    match_id: String,
    email_id: String,
    transaction_id: Option<String>,
    status: String,
    confidence: f64,
    outcome: String,
    metadata: serde_json::Value,
}

impl WebhookPayload {
    fn from_ctx(ctx: &ActionContext) -> Self {
        Self {
            event: "match_completed",
            match_id: ctx.match_id.to_string(),
            email_id: ctx.email_id.to_string(),
            transaction_id: ctx.transaction_id().map(|id| id.to_string()),
            status: outcome_str(ctx.outcome).to_string(),
            confidence: ctx.confidence,
            outcome: outcome_str(ctx.outcome).to_string(),
            metadata: json!({ "alternative_count": ctx.alternative_count }),
        }
    }
}

fn outcome_str(outcome: MatchOutcome) -> &'static str {
    match outcome {
        MatchOutcome::Matched => "matched",
        MatchOutcome::Ambiguous => "ambiguous",
        MatchOutcome::Unmatched => "unmatched",
        MatchOutcome::Review => "review",
        MatchOutcome::Rejected => "rejected",
    }
}

/// Posts the webhook payload to a configured URL. When `url` is `None`
/// (unconfigured integration), simulates success so the pipeline stays
/// observable end-to-end in development mode (§4.7).
pub struct HttpActionHandler {
    label: &'static str,
    url: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpActionHandler {
    pub fn new(label: &'static str, url: Option<String>, timeout: Duration) -> Self {
        Self {
            label,
            url,
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl ActionHandler for HttpActionHandler {
    async fn handle(&self, ctx: &ActionContext) -> HandlerOutcome {
        let Some(url) = &self.url else {
            info!(handler = self.label, "no URL configured, simulating success");
            return HandlerOutcome::simulated(ctx.action_kind);
        };

        let payload = WebhookPayload::from_ctx(ctx);
        let send = self.client.post(url).timeout(self.timeout).json(&payload).send().await;

        match send {
            Ok(resp) if resp.status().is_success() => {
                info!(handler = self.label, url, status = %resp.status(), "webhook_delivered");
                HandlerOutcome::success(format!("{}_delivered", ctx.action_kind.as_str()))
            }
            Ok(resp) if resp.status().is_server_error() => {
                warn!(handler = self.label, url, status = %resp.status(), "webhook_transient_failure");
                HandlerOutcome::failure(
                    format!("{}_failed", ctx.action_kind.as_str()),
                    format!("http {}", resp.status()),
                )
            }
            Ok(resp) => {
                warn!(handler = self.label, url, status = %resp.status(), "webhook_rejected");
                HandlerOutcome::failure(
                    format!("{}_rejected", ctx.action_kind.as_str()),
                    format!("http {}", resp.status()),
                )
            }
            Err(e) => {
                warn!(handler = self.label, url, error = %e, "webhook_transport_error");
                HandlerOutcome::failure(format!("{}_failed", ctx.action_kind.as_str()), e.to_string())
            }
        }
    }
}
