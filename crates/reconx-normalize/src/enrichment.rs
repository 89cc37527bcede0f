//! `enrichBankInfo` — resolve bank/fintech identity from sender domain,
//! sender display name, or subject, in that priority order.

use reconx_core::model::Enrichment;

use crate::bank_aliases;

const DOMAIN_CONFIDENCE: f64 = 0.95;
const NAME_CONFIDENCE: f64 = 0.85;
const SUBJECT_CONFIDENCE: f64 = 0.75;

/// Aliases are matched as substrings of the lowercased, space-stripped
/// candidate text. Priority: domain > name > subject; the first
/// priority with a substring hit wins.
pub fn enrich_bank_info(
    sender_email: Option<&str>,
    sender_name: Option<&str>,
    subject: Option<&str>,
) -> Option<Enrichment> {
    if let Some(email) = sender_email {
        if let Some(domain) = email.rsplit('@').next() {
            if let Some(info) = match_alias(domain) {
                return Some(to_enrichment(info, DOMAIN_CONFIDENCE));
            }
        }
    }

    if let Some(name) = sender_name {
        if let Some(info) = match_alias(name) {
            return Some(to_enrichment(info, NAME_CONFIDENCE));
        }
    }

    if let Some(subject) = subject {
        if let Some(info) = match_alias(subject) {
            return Some(to_enrichment(info, SUBJECT_CONFIDENCE));
        }
    }

    None
}

fn match_alias(text: &str) -> Option<&'static bank_aliases::BankInfo> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    bank_aliases::BANK_ALIASES
        .iter()
        .find(|(alias, _)| normalized.contains(**alias))
        .map(|(_, info)| info)
}

fn to_enrichment(info: &bank_aliases::BankInfo, confidence: f64) -> Enrichment {
    Enrichment {
        bank_code: info.code.to_string(),
        bank_name: info.name.to_string(),
        category: info.category.to_string(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_from_sender_domain_with_highest_priority() {
        let e = enrich_bank_info(Some("alerts@gtbank.com"), Some("First Bank"), None).unwrap();
        assert_eq!(e.bank_code, "GTB");
        assert_eq!(e.confidence, DOMAIN_CONFIDENCE);
    }

    #[test]
    fn falls_back_to_sender_name_when_domain_has_no_hit() {
        let e = enrich_bank_info(Some("alerts@example.com"), Some("Access Bank Notification"), None).unwrap();
        assert_eq!(e.bank_code, "ACC");
        assert_eq!(e.confidence, NAME_CONFIDENCE);
    }

    #[test]
    fn falls_back_to_subject_last() {
        let e = enrich_bank_info(Some("noreply@example.com"), Some("Alerts"), Some("Your Zenith Bank transfer")).unwrap();
        assert_eq!(e.bank_code, "ZEN");
        assert_eq!(e.confidence, SUBJECT_CONFIDENCE);
    }

    #[test]
    fn returns_none_without_any_hit() {
        assert!(enrich_bank_info(Some("noreply@example.com"), Some("Notifications"), Some("Hello")).is_none());
    }
}
