//! `compositeKey` — deterministic, coarse-grained fingerprint for cheap
//! candidate grouping.

use chrono::{DateTime, Datelike, Timelike, Utc};
use reconx_core::model::{CompositeKey, ReferenceBundle};
use rust_decimal::Decimal;

/// Requires all three of amount/currency/instant; otherwise `None`.
/// `dateBucket` uses the UTC hour start. `topReferenceTokens` is the
/// first three tokens, sorted lexicographically. `accountLast4` is the
/// last 4 characters of `account_number` when present.
pub fn composite_key(
    amount: Option<Decimal>,
    currency: Option<&str>,
    instant: Option<DateTime<Utc>>,
    reference: Option<&ReferenceBundle>,
    account_number: Option<&str>,
) -> Option<CompositeKey> {
    let amount = amount?;
    let currency = currency?;
    let instant = instant?;

    let date_bucket = format!(
        "{:04}-{:02}-{:02}-{:02}",
        instant.year(),
        instant.month(),
        instant.day(),
        instant.hour()
    );

    let mut top_reference_tokens: Vec<String> = reference
        .map(|r| r.tokens.iter().take(3).cloned().collect())
        .unwrap_or_default();
    top_reference_tokens.sort();

    let account_last4 = account_number.map(|acc| {
        let chars: Vec<char> = acc.chars().collect();
        let start = chars.len().saturating_sub(4);
        chars[start..].iter().collect::<String>()
    });

    Some(CompositeKey {
        amount_string: amount.round_dp(2).to_string(),
        currency: currency.to_string(),
        date_bucket,
        top_reference_tokens,
        account_last4,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reconx_core::model::ReferenceBundle;
    use rust_decimal_macros::dec;

    fn bundle(tokens: &[&str]) -> ReferenceBundle {
        ReferenceBundle {
            original: "".into(),
            cleaned: "".into(),
            alphanumeric_only: "".into(),
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn requires_all_three_core_inputs() {
        assert!(composite_key(None, Some("NGN"), Some(Utc::now()), None, None).is_none());
        assert!(composite_key(Some(dec!(1.00)), None, Some(Utc::now()), None, None).is_none());
        assert!(composite_key(Some(dec!(1.00)), Some("NGN"), None, None, None).is_none());
    }

    #[test]
    fn round_trips_deterministically() {
        let instant = Utc.with_ymd_and_hms(2025, 11, 5, 10, 30, 0).unwrap();
        let refs = bundle(&["GTB", "TRF", "2025", "001"]);

        let k1 = composite_key(Some(dec!(23500.00)), Some("NGN"), Some(instant), Some(&refs), Some("1234567890")).unwrap();
        let k2 = composite_key(Some(dec!(23500.00)), Some("NGN"), Some(instant), Some(&refs), Some("1234567890")).unwrap();

        assert_eq!(k1.as_string(), k2.as_string());
        assert_eq!(k1.date_bucket, "2025-11-05-10");
        assert_eq!(k1.account_last4, Some("7890".to_string()));
        assert_eq!(k1.top_reference_tokens, vec!["2025", "GTB", "TRF"]);
    }
}
