//! Pre-filter applied to raw emails before handing survivors to the
//! extraction collaborator (§4.3). Rejected emails are dropped without
//! persistence.

#[derive(Clone, Debug)]
pub struct EmailFilterConfig {
    pub sender_domain_allowlist: Vec<String>,
    pub subject_keywords: Vec<String>,
    pub subject_denylist: Vec<String>,
    pub min_body_length: usize,
}

impl Default for EmailFilterConfig {
    fn default() -> Self {
        Self {
            sender_domain_allowlist: Vec::new(),
            subject_keywords: Vec::new(),
            subject_denylist: Vec::new(),
            min_body_length: 10,
        }
    }
}

pub fn passes_filter(config: &EmailFilterConfig, sender: &str, subject: &str, body: &str) -> bool {
    if !config.sender_domain_allowlist.is_empty() {
        let domain = sender.rsplit('@').next().unwrap_or("").to_lowercase();
        if !config
            .sender_domain_allowlist
            .iter()
            .any(|allowed| domain == allowed.to_lowercase())
        {
            return false;
        }
    }

    let subject_lower = subject.to_lowercase();

    if !config.subject_denylist.is_empty()
        && config
            .subject_denylist
            .iter()
            .any(|term| subject_lower.contains(&term.to_lowercase()))
    {
        return false;
    }

    if !config.subject_keywords.is_empty()
        && !config
            .subject_keywords
            .iter()
            .any(|term| subject_lower.contains(&term.to_lowercase()))
    {
        return false;
    }

    if body.len() < config.min_body_length {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sender_outside_allowlist() {
        let config = EmailFilterConfig {
            sender_domain_allowlist: vec!["gtbank.com".into()],
            ..Default::default()
        };
        assert!(!passes_filter(&config, "alerts@example.com", "Debit Alert", "body text here"));
        assert!(passes_filter(&config, "alerts@gtbank.com", "Debit Alert", "body text here"));
    }

    #[test]
    fn rejects_denylisted_subjects() {
        let config = EmailFilterConfig {
            subject_denylist: vec!["newsletter".into()],
            ..Default::default()
        };
        assert!(!passes_filter(&config, "x@y.com", "Weekly Newsletter", "body text here"));
    }

    #[test]
    fn rejects_short_bodies() {
        let config = EmailFilterConfig {
            min_body_length: 50,
            ..Default::default()
        };
        assert!(!passes_filter(&config, "x@y.com", "Alert", "short"));
    }
}
