//! Raw record shapes produced by pullers, before normalization.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub struct RawEmail {
    pub message_id: String,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxType {
    Credit,
    Debit,
    Unknown,
}

#[derive(Clone, Debug)]
pub struct RawTransaction {
    pub external_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub instant: DateTime<Utc>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub account_ref: Option<String>,
    pub counterparty_name: Option<String>,
    pub counterparty_email: Option<String>,
    pub status: String,
}

/// Result of one puller invocation, enumerated per-record so a handful
/// of bad records never abort the whole batch (§4.3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub fetched: usize,
    pub new: usize,
    pub duplicate: usize,
    pub stored: usize,
    pub failed: usize,
}
