//! Typed, validated configuration (C10).
//!
//! Every sub-config implements `Default` with the values named in the
//! component design sections; `Config::validate` is the single policy
//! gate run once at load (§7 class 6) — on failure, startup aborts.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ReconError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleWeights {
    pub exact_amount: f64,
    pub exact_reference: f64,
    pub fuzzy_reference: f64,
    pub timestamp_proximity: f64,
    pub account_match: f64,
    pub composite_key: f64,
    pub bank_match: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            exact_amount: WEIGHT_EXACT_AMOUNT,
            exact_reference: WEIGHT_EXACT_REFERENCE,
            fuzzy_reference: WEIGHT_FUZZY_REFERENCE,
            timestamp_proximity: WEIGHT_TIMESTAMP_PROXIMITY,
            account_match: WEIGHT_ACCOUNT_MATCH,
            composite_key: WEIGHT_COMPOSITE_KEY,
            bank_match: WEIGHT_BANK_MATCH,
        }
    }
}

impl RuleWeights {
    pub fn total_weight(&self) -> f64 {
        self.exact_amount
            + self.exact_reference
            + self.fuzzy_reference
            + self.timestamp_proximity
            + self.account_match
            + self.composite_key
            + self.bank_match
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeWindowConfig {
    pub default_hours: i64,
    pub strict_hours: i64,
    pub max_hours: i64,
}

impl Default for TimeWindowConfig {
    fn default() -> Self {
        Self {
            default_hours: DEFAULT_WINDOW_HOURS,
            strict_hours: STRICT_WINDOW_HOURS,
            max_hours: MAX_WINDOW_HOURS,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FuzzyMatchConfig {
    pub min_similarity: f64,
    pub high_similarity: f64,
    pub min_token_length: usize,
    pub use_partial_ratio: bool,
    pub use_token_sort: bool,
}

impl Default for FuzzyMatchConfig {
    fn default() -> Self {
        Self {
            min_similarity: MIN_SIMILARITY,
            high_similarity: HIGH_SIMILARITY,
            min_token_length: MIN_TOKEN_LENGTH,
            use_partial_ratio: true,
            use_token_sort: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    pub auto_match: f64,
    pub needs_review: f64,
    pub reject: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            auto_match: THRESHOLD_AUTO_MATCH,
            needs_review: THRESHOLD_NEEDS_REVIEW,
            reject: THRESHOLD_REJECT,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        if !(self.reject < self.needs_review && self.needs_review < self.auto_match) {
            return Err(ReconError::PolicyViolation(
                "thresholds must satisfy reject < needs_review < auto_match".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CandidateRetrievalConfig {
    pub max_candidates: usize,
    pub amount_tolerance_percent: f64,
    pub require_same_currency: bool,
    pub exclude_already_matched: bool,
}

impl Default for CandidateRetrievalConfig {
    fn default() -> Self {
        Self {
            max_candidates: MAX_CANDIDATES,
            amount_tolerance_percent: AMOUNT_TOLERANCE_PERCENT,
            require_same_currency: true,
            exclude_already_matched: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TieBreakingConfig {
    pub prefer_recent: bool,
    pub prefer_high_reference_similarity: bool,
    pub prefer_same_bank: bool,
    pub max_tie_difference: f64,
}

impl Default for TieBreakingConfig {
    fn default() -> Self {
        Self {
            prefer_recent: true,
            prefer_high_reference_similarity: true,
            prefer_same_bank: true,
            max_tie_difference: MAX_TIE_DIFFERENCE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    pub rule_weights: RuleWeights,
    pub time_window: TimeWindowConfig,
    pub fuzzy_match: FuzzyMatchConfig,
    pub thresholds: ThresholdConfig,
    pub candidate_retrieval: CandidateRetrievalConfig,
    pub tie_breaking: TieBreakingConfig,

    pub debug: bool,
    pub store_alternatives: bool,
    pub max_alternatives: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            rule_weights: RuleWeights::default(),
            time_window: TimeWindowConfig::default(),
            fuzzy_match: FuzzyMatchConfig::default(),
            thresholds: ThresholdConfig::default(),
            candidate_retrieval: CandidateRetrievalConfig::default(),
            tie_breaking: TieBreakingConfig::default(),
            debug: false,
            store_alternatives: true,
            max_alternatives: MAX_ALTERNATIVES,
        }
    }
}

impl MatchingConfig {
    /// Ensures rule weights sum to approximately 1.0 and thresholds are
    /// in the correct order. Called once at process start; failure
    /// aborts startup (§7 class 6).
    pub fn validate(&self) -> Result<(), ReconError> {
        self.thresholds.validate()?;

        let total = self.rule_weights.total_weight();
        if !(0.95..=1.05).contains(&total) {
            return Err(ReconError::PolicyViolation(format!(
                "rule weights must sum to ~1.0, got {total:.2}"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub base: f64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            base: DEFAULT_BACKOFF_BASE,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.max_attempts < 1 {
            return Err(ReconError::PolicyViolation("max_attempts must be >= 1".into()));
        }
        if self.initial_delay_ms == 0 {
            return Err(ReconError::PolicyViolation("initial_delay_ms must be > 0".into()));
        }
        if self.base <= 1.0 {
            return Err(ReconError::PolicyViolation("base must be > 1".into()));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ReconError::PolicyViolation(
                "max_delay_ms must be >= initial_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            timeout_secs: DEFAULT_CIRCUIT_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmailFetcherConfig {
    pub poll_interval_minutes: u32,
    pub batch_size: u32,
    pub mark_as_read: bool,
    pub start_immediately: bool,
}

impl Default for EmailFetcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
            batch_size: DEFAULT_BATCH_SIZE,
            mark_as_read: false,
            start_immediately: true,
        }
    }
}

impl EmailFetcherConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        if !(1..=1440).contains(&self.poll_interval_minutes) {
            return Err(ReconError::PolicyViolation(
                "poll_interval_minutes must be in 1..=1440".into(),
            ));
        }
        if !(1..=500).contains(&self.batch_size) {
            return Err(ReconError::PolicyViolation("batch_size must be in 1..=500".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetentionConfig {
    pub email_days: u32,
    pub audit_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            email_days: DEFAULT_EMAIL_RETENTION_DAYS,
            audit_days: DEFAULT_AUDIT_RETENTION_DAYS,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub cycle_interval_secs: u64,
    pub stop_grace_secs: u64,
    pub source_timeout_secs: u64,
    pub action_timeout_secs: u64,
    pub error_backoff_secs: u64,
    pub actions_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: DEFAULT_CYCLE_INTERVAL_SECS,
            stop_grace_secs: DEFAULT_STOP_GRACE_SECS,
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            error_backoff_secs: DEFAULT_ERROR_BACKOFF_SECS,
            actions_enabled: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        if !(MIN_CYCLE_INTERVAL_SECS..=MAX_CYCLE_INTERVAL_SECS).contains(&self.cycle_interval_secs) {
            return Err(ReconError::PolicyViolation(format!(
                "cycle_interval_secs must be in {MIN_CYCLE_INTERVAL_SECS}..={MAX_CYCLE_INTERVAL_SECS}"
            )));
        }
        Ok(())
    }
}

/// Top-level process configuration. Loads from defaults, an optional
/// file, then environment overrides (§10.3); validated once at load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub matching: MatchingConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub email_fetcher: EmailFetcherConfig,
    pub retention: RetentionConfig,
    pub orchestrator: OrchestratorConfig,
    pub deduplication_enabled: bool,
    pub ambiguous_candidates_count: usize,
    pub escalate_if_amount_above: Option<f64>,
    pub escalate_if_multiple_matches: bool,
    pub escalate_if_no_reference: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matching: MatchingConfig::default(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            email_fetcher: EmailFetcherConfig::default(),
            retention: RetentionConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            deduplication_enabled: true,
            ambiguous_candidates_count: AMBIGUOUS_CANDIDATES_COUNT,
            escalate_if_amount_above: Some(DEFAULT_ESCALATE_IF_AMOUNT_ABOVE),
            escalate_if_multiple_matches: true,
            escalate_if_no_reference: true,
        }
    }
}

impl Config {
    /// Runs every sub-validator; the first failure aborts startup.
    pub fn validate(&self) -> Result<(), ReconError> {
        self.matching.validate()?;
        self.retry.validate()?;
        self.email_fetcher.validate()?;
        self.orchestrator.validate()?;
        Ok(())
    }

    /// Loads defaults, overlays an optional JSON config file, then a
    /// handful of `RECONX_`-prefixed environment variables for the
    /// settings operators most often need to flip without shipping a new
    /// file (§10.3). Unlike the file layer this is not a full
    /// dotted-path overlay of every field — only the variables named in
    /// [`Config::apply_env_overrides`] are recognized.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ReconError> {
        let mut cfg = Config::default();

        if let Some(p) = path {
            let raw = std::fs::read_to_string(p)
                .map_err(|e| ReconError::Other(format!("reading config file {p:?}: {e}")))?;
            cfg = serde_json::from_str(&raw)
                .map_err(|e| ReconError::Other(format!("parsing config file {p:?}: {e}")))?;
        }

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `RECONX_*` environment overrides on top of whatever
    /// defaults/file produced `self`. Malformed values are a startup
    /// error, not a silent ignore.
    fn apply_env_overrides(&mut self) -> Result<(), ReconError> {
        if let Some(v) = env_var("RECONX_CYCLE_INTERVAL_SECS")? {
            self.orchestrator.cycle_interval_secs = v;
        }
        if let Some(v) = env_var("RECONX_POLL_INTERVAL_MINUTES")? {
            self.email_fetcher.poll_interval_minutes = v;
        }
        if let Some(v) = env_var("RECONX_ACTIONS_ENABLED")? {
            self.orchestrator.actions_enabled = v;
        }
        if let Some(v) = env_var("RECONX_DEDUPLICATION_ENABLED")? {
            self.deduplication_enabled = v;
        }
        if let Some(v) = env_var("RECONX_ESCALATE_IF_AMOUNT_ABOVE")? {
            self.escalate_if_amount_above = Some(v);
        }
        Ok(())
    }
}

/// Reads and parses one `RECONX_*` variable, or `None` if unset.
fn env_var<T>(name: &str) -> Result<Option<T>, ReconError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| ReconError::Other(format!("parsing {name}: {e}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ReconError::Other(format!("reading {name}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().expect("defaults must be valid");
    }

    #[test]
    fn env_override_wins_over_default() {
        std::env::set_var("RECONX_CYCLE_INTERVAL_SECS", "120");
        let mut cfg = Config::default();
        cfg.apply_env_overrides().unwrap();
        std::env::remove_var("RECONX_CYCLE_INTERVAL_SECS");
        assert_eq!(cfg.orchestrator.cycle_interval_secs, 120);
    }

    #[test]
    fn malformed_env_override_is_a_load_error() {
        std::env::set_var("RECONX_POLL_INTERVAL_MINUTES", "not-a-number");
        let mut cfg = Config::default();
        let result = cfg.apply_env_overrides();
        std::env::remove_var("RECONX_POLL_INTERVAL_MINUTES");
        assert!(result.is_err());
    }

    #[test]
    fn rule_weights_sum_close_to_one() {
        let total = RuleWeights::default().total_weight();
        assert!((total - 1.0).abs() < 1e-9, "got {total}");
    }

    #[test]
    fn threshold_validation_rejects_misordering() {
        let bad = ThresholdConfig {
            auto_match: 0.5,
            needs_review: 0.6,
            reject: 0.4,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn rule_weight_validation_rejects_underweight_sum() {
        let mut cfg = MatchingConfig::default();
        cfg.rule_weights.bank_match = 0.0;
        cfg.rule_weights.exact_amount = 0.0;
        assert!(cfg.validate().is_err());
    }
}
