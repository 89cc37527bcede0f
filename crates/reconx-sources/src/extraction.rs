//! The email-extraction collaborator (§6) — treated as an opaque
//! field-extraction component returning a structured record with a
//! confidence score. Prompting/NLP internals are out of scope; only the
//! contract is modeled here.

use async_trait::async_trait;
use reconx_core::model::{ExtractionMethod, TransactionType};
use reconx_core::ReconResult;

#[derive(Clone, Debug, Default)]
pub struct ExtractedFields {
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub reference: Option<String>,
    pub account_segment: Option<String>,
    pub transaction_instant: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub confidence: f64,
    pub method: ExtractionMethod,
    pub is_alert: bool,
}

#[async_trait]
pub trait EmailExtractor: Send + Sync {
    async fn extract(&self, sender: &str, subject: &str, body: &str) -> ReconResult<ExtractedFields>;
}

/// Extractor used in tests and local development: treats every email as
/// a non-alert with no structured fields, so pipelines stay runnable
/// without a real NLP/LLM collaborator wired in.
pub struct NullExtractor;

#[async_trait]
impl EmailExtractor for NullExtractor {
    async fn extract(&self, _sender: &str, _subject: &str, _body: &str) -> ReconResult<ExtractedFields> {
        Ok(ExtractedFields {
            is_alert: false,
            method: ExtractionMethod::Structured,
            ..Default::default()
        })
    }
}
