//! `normalizeTimestamp` — parse a free-text instant into a UTC instant.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
];

/// Accepts ISO-8601 (with or without an offset) and a handful of common
/// bank-alert date formats. Naive input (no explicit offset) is assumed
/// UTC. Returns `None` when no format matches.
pub fn normalize_timestamp(input: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = input?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let got = normalize_timestamp(Some("2025-11-05T10:30:00+01:00")).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 11, 5, 9, 30, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_utc_yields_same_instant() {
        let got = normalize_timestamp(Some("2025-11-05T10:30:00Z")).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 11, 5, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_slash_dd_mm_yyyy() {
        let got = normalize_timestamp(Some("05/11/2025 10:30:00")).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 11, 5, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_space_separated_yyyy_mm_dd() {
        let got = normalize_timestamp(Some("2025-11-05 10:30")).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 11, 5, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_dd_mmm_yyyy() {
        let got = normalize_timestamp(Some("05 Nov 2025 10:30:00")).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2025, 11, 5, 10, 30, 0).unwrap());
    }

    #[test]
    fn returns_none_for_garbage() {
        assert_eq!(normalize_timestamp(Some("not a date")), None);
        assert_eq!(normalize_timestamp(None), None);
    }
}
