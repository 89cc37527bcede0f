//! Assembles canonical entities from normalized fields. Callers (the
//! source pullers) own the raw record shape; this module only knows how
//! to turn already-extracted primitive fields into the canonical form.

use chrono::{DateTime, Utc};
use reconx_core::model::{CanonicalEmail, CanonicalTransaction, ExtractionMethod, TransactionType};
use reconx_core::types::{EmailId, ExternalTxId, MessageId, SourceLabel, TransactionId};
use rust_decimal::Decimal;

use crate::{composite_key, enrich_bank_info, normalize_amount, normalize_currency, normalize_reference, normalize_timestamp};

pub struct RawEmailFields<'a> {
    pub message_id: &'a str,
    pub sender: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub received_at: DateTime<Utc>,
    pub extracted_amount: Option<&'a str>,
    pub extracted_currency: Option<&'a str>,
    pub extracted_reference: Option<&'a str>,
    pub extracted_account_segment: Option<&'a str>,
    pub extracted_instant: Option<&'a str>,
    pub extraction_confidence: Option<f64>,
    pub extraction_method: Option<ExtractionMethod>,
    pub transaction_type: Option<TransactionType>,
    pub is_alert: bool,
    pub min_token_length: usize,
}

pub fn build_canonical_email(raw: RawEmailFields<'_>) -> CanonicalEmail {
    let now = Utc::now();

    let amount = normalize_amount(raw.extracted_amount);
    let currency = normalize_currency(raw.extracted_currency);
    let transaction_instant = normalize_timestamp(raw.extracted_instant);
    let reference = normalize_reference(raw.extracted_reference, raw.min_token_length);
    let enrichment = enrich_bank_info(Some(raw.sender), Some(raw.sender), Some(raw.subject));

    let key = composite_key(
        amount,
        currency.as_deref(),
        transaction_instant,
        reference.as_ref(),
        raw.extracted_account_segment,
    );

    CanonicalEmail {
        id: EmailId::new(),
        message_id: MessageId::new(raw.message_id),
        sender: raw.sender.to_string(),
        subject: raw.subject.to_string(),
        body: raw.body.to_string(),
        received_at: raw.received_at,
        amount,
        currency,
        transaction_instant,
        reference,
        account_last_segment: raw.extracted_account_segment.map(|s| s.to_string()),
        transaction_type: raw.transaction_type,
        extraction_confidence: raw.extraction_confidence,
        extraction_method: raw.extraction_method,
        is_alert: raw.is_alert,
        enrichment,
        composite_key: key,
        processed: false,
        parsing_error: None,
        ingested_at: now,
        last_updated: now,
    }
}

pub struct RawTransactionFields<'a> {
    pub source: &'a str,
    pub external_id: &'a str,
    pub amount: Decimal,
    pub currency: &'a str,
    pub instant: DateTime<Utc>,
    pub description: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub account_ref: Option<&'a str>,
    pub counterparty_name: Option<&'a str>,
    pub counterparty_email: Option<&'a str>,
    pub status: &'a str,
    pub min_token_length: usize,
}

pub fn build_canonical_transaction(raw: RawTransactionFields<'_>) -> CanonicalTransaction {
    let reference = normalize_reference(raw.reference, raw.min_token_length);
    let enrichment = enrich_bank_info(raw.counterparty_email, raw.counterparty_name, None);

    CanonicalTransaction {
        id: TransactionId::new(),
        source: SourceLabel::new(raw.source),
        external_id: ExternalTxId::new(raw.external_id),
        amount: raw.amount.round_dp(2),
        currency: raw.currency.to_uppercase(),
        instant: raw.instant,
        description: raw.description.map(|s| s.to_string()),
        reference,
        account_ref: raw.account_ref.map(|s| s.to_string()),
        counterparty_name: raw.counterparty_name.map(|s| s.to_string()),
        counterparty_email: raw.counterparty_email.map(|s| s.to_string()),
        status: raw.status.to_string(),
        enrichment,
        verified: false,
        verified_at: None,
    }
}
