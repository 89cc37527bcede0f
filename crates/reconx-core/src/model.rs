//! Canonical domain model shared by normalization, storage, scoring, and
//! the action dispatcher.
//!
//! Amounts are `rust_decimal::Decimal` at scale 2 — never floats — per
//! the amount-precision design note. Instants are always UTC.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

use crate::types::{ActionId, EmailId, ExternalTxId, MatchId, MessageId, SourceLabel, TransactionId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    #[default]
    Structured,
    Model,
    Hybrid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Credit,
    Debit,
    Unknown,
}

/// Whitespace-collapsed, tokenized view of a free-text reference used by
/// exact and fuzzy reference rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceBundle {
    pub original: String,
    pub cleaned: String,
    pub alphanumeric_only: String,
    pub tokens: Vec<String>,
}

/// Bank/fintech identity derived from sender domain, sender name, or
/// subject against the alias table (§4.2).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub bank_code: String,
    pub bank_name: String,
    pub category: String,
    pub confidence: f64,
}

/// Coarse-grained fingerprint used for cheap candidate grouping. Does not
/// uniquely identify an entity — see GLOSSARY.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeKey {
    pub amount_string: String,
    pub currency: String,
    pub date_bucket: String,
    pub top_reference_tokens: Vec<String>,
    pub account_last4: Option<String>,
}

impl CompositeKey {
    /// `amount|currency|dateBucket|tok1_tok2_tok3|last4` string form. Two
    /// keys built from identical inputs produce an identical string.
    pub fn as_string(&self) -> String {
        let tokens = self.top_reference_tokens.join("_");
        let last4 = self.account_last4.as_deref().unwrap_or("");
        format!(
            "{}|{}|{}|{}|{}",
            self.amount_string, self.currency, self.date_bucket, tokens, last4
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalEmail {
    pub id: EmailId,
    pub message_id: MessageId,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,

    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub transaction_instant: Option<DateTime<Utc>>,
    pub reference: Option<ReferenceBundle>,
    pub account_last_segment: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub extraction_confidence: Option<f64>,
    pub extraction_method: Option<ExtractionMethod>,
    pub is_alert: bool,

    pub enrichment: Option<Enrichment>,
    pub composite_key: Option<CompositeKey>,

    pub processed: bool,
    pub parsing_error: Option<String>,
    pub ingested_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub id: TransactionId,
    pub source: SourceLabel,
    pub external_id: ExternalTxId,

    pub amount: Decimal,
    pub currency: String,
    pub instant: DateTime<Utc>,
    pub description: Option<String>,
    pub reference: Option<ReferenceBundle>,
    pub account_ref: Option<String>,
    pub counterparty_name: Option<String>,
    pub counterparty_email: Option<String>,
    pub status: String,

    pub enrichment: Option<Enrichment>,

    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

impl CanonicalTransaction {
    pub fn natural_key(&self) -> crate::types::TransactionNaturalKey {
        crate::types::TransactionNaturalKey::new(self.source.clone(), self.external_id.clone())
    }
}

/// One rule's contribution to a candidate's total score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleScore {
    pub rule_name: String,
    pub raw: f64,
    pub weight: f64,
    pub weighted: f64,
    pub details: BTreeMap<String, Json>,
}

impl RuleScore {
    pub fn new(rule_name: impl Into<String>, raw: f64, weight: f64, details: BTreeMap<String, Json>) -> Self {
        Self {
            rule_name: rule_name.into(),
            raw,
            weight,
            weighted: raw * weight,
            details,
        }
    }
}

/// One scored transaction with its ordered rule contributions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub transaction: CanonicalTransaction,
    pub scores: Vec<RuleScore>,
    pub total: f64,
    pub rank: usize,
}

impl MatchCandidate {
    pub fn raw_of(&self, rule_name: &str) -> f64 {
        self.scores
            .iter()
            .find(|s| s.rule_name == rule_name)
            .map(|s| s.raw)
            .unwrap_or(0.0)
    }
}

/// Internal decision status, before mapping to the persisted string form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    AutoMatched,
    NeedsReview,
    Rejected,
    NoCandidates,
    /// Reserved for crash recovery; never emitted by a normal decision.
    Pending,
}

impl MatchStatus {
    /// Maps the internal status to the stored string per §4.6.
    pub fn stored_str(&self) -> &'static str {
        match self {
            MatchStatus::AutoMatched => "matched",
            MatchStatus::NeedsReview => "review",
            MatchStatus::Rejected => "rejected",
            MatchStatus::NoCandidates => "no_candidates",
            MatchStatus::Pending => "pending",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: MatchId,
    pub email_id: EmailId,
    pub best_candidate: Option<MatchCandidate>,
    pub alternative_candidates: Vec<MatchCandidate>,
    pub status: MatchStatus,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl MatchResult {
    pub fn alternative_count(&self) -> usize {
        self.alternative_candidates.len()
    }
}

/// Outcome categories consumed by the action dispatcher (§4.7), derived
/// from a persisted `MatchResult` plus the policy thresholds — distinct
/// from the internal `MatchStatus` used during scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Matched,
    Ambiguous,
    Unmatched,
    Review,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    MarkVerified,
    UpdateStatus,
    NotifyExternalSystem,
    SendWebhook,
    CreateTicket,
    SendEmail,
    FlagUnmatched,
    Escalate,
}

impl ActionKind {
    pub fn is_critical(&self) -> bool {
        matches!(self, ActionKind::MarkVerified | ActionKind::UpdateStatus)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::MarkVerified => "mark_verified",
            ActionKind::UpdateStatus => "update_status",
            ActionKind::NotifyExternalSystem => "notify_external_system",
            ActionKind::SendWebhook => "send_webhook",
            ActionKind::CreateTicket => "create_ticket",
            ActionKind::SendEmail => "send_email",
            ActionKind::FlagUnmatched => "flag_unmatched",
            ActionKind::Escalate => "escalate",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
    Retrying,
}

/// One row per attempted action. Append-only: `appendAudit` creates,
/// `updateAudit` may only touch status/outcome/message/error/timings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionAudit {
    pub id: ActionId,
    pub action_kind: ActionKind,
    pub match_id: MatchId,
    pub email_id: EmailId,
    pub transaction_id: Option<TransactionId>,
    pub match_status_at_time: MatchStatus,
    pub confidence_at_time: f64,
    pub actor: String,
    pub start_instant: DateTime<Utc>,
    pub end_instant: Option<DateTime<Utc>>,
    pub duration_millis: Option<i64>,
    pub status: ActionStatus,
    pub outcome_label: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub retry_count: u32,
    pub payload_blob: Option<Json>,
}

/// Patch applied by `updateAudit` — only these fields may change after
/// the audit row is appended.
#[derive(Clone, Debug, Default)]
pub struct AuditPatch {
    pub status: Option<ActionStatus>,
    pub outcome_label: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub end_instant: Option<DateTime<Utc>>,
    pub duration_millis: Option<i64>,
    pub payload_blob: Option<Json>,
}
