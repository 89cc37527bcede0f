//! HTTP-backed transaction puller. Polls a paginated REST endpoint
//! yielding records with at minimum `{externalId, amount, currency,
//! instant, status}` (§6).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reconx_core::{ReconError, ReconResult};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::puller::TransactionPuller;
use crate::raw::RawTransaction;

#[derive(Debug, Deserialize)]
struct TransactionPage {
    transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    external_id: String,
    amount: Decimal,
    currency: String,
    instant: DateTime<Utc>,
    status: String,
    reference: Option<String>,
    description: Option<String>,
    account_ref: Option<String>,
    counterparty_name: Option<String>,
    counterparty_email: Option<String>,
}

impl From<TransactionRecord> for RawTransaction {
    fn from(r: TransactionRecord) -> Self {
        RawTransaction {
            external_id: r.external_id,
            amount: r.amount,
            currency: r.currency,
            instant: r.instant,
            description: r.description,
            reference: r.reference,
            account_ref: r.account_ref,
            counterparty_name: r.counterparty_name,
            counterparty_email: r.counterparty_email,
            status: r.status,
        }
    }
}

pub struct HttpTransactionPuller {
    label: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransactionPuller {
    pub fn new(label: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TransactionPuller for HttpTransactionPuller {
    fn source_label(&self) -> &str {
        &self.label
    }

    async fn fetch(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> ReconResult<Vec<RawTransaction>> {
        let url = format!("{}/transactions", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("since", since.to_rfc3339()),
                ("until", until.to_rfc3339()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&url, &e))?;

        if !resp.status().is_success() {
            return Err(classify_http_status(&url, resp.status()));
        }

        let page: TransactionPage = resp
            .json()
            .await
            .map_err(|e| ReconError::TransientSource {
                source_label: self.label.clone(),
                detail: format!("decoding response from {url}: {e}"),
            })?;

        Ok(page.transactions.into_iter().map(RawTransaction::from).collect())
    }

    async fn get_by_id(&self, external_id: &str) -> ReconResult<Option<RawTransaction>> {
        let url = format!("{}/transactions/{}", self.base_url, external_id);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&url, &e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(classify_http_status(&url, resp.status()));
        }

        let record: TransactionRecord = resp.json().await.map_err(|e| ReconError::TransientSource {
            source_label: self.label.clone(),
            detail: format!("decoding response from {url}: {e}"),
        })?;

        Ok(Some(record.into()))
    }

    async fn validate(&self) -> ReconResult<()> {
        let url = format!("{}/health", self.base_url);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&url, &e))?;
        Ok(())
    }
}

fn classify_reqwest_error(url: &str, e: &reqwest::Error) -> ReconError {
    ReconError::TransientSource {
        source_label: url.to_string(),
        detail: e.to_string(),
    }
}

/// 5xx are transient (retried), 4xx are fatal (not retried) — §6.
fn classify_http_status(url: &str, status: reqwest::StatusCode) -> ReconError {
    if status.is_server_error() {
        ReconError::TransientSource {
            source_label: url.to_string(),
            detail: format!("http {status}"),
        }
    } else {
        ReconError::PersistentSource {
            source_label: url.to_string(),
            detail: format!("http {status}"),
        }
    }
}
