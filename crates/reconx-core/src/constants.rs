//! Default numeric parameters for the reconciliation pipeline.
//!
//! These are the values `Config::default()` (see [`crate::config`])
//! starts from; they are data, not magic numbers scattered through the
//! scorer and orchestrator.

// ── Rule weights (must sum to ≈ 1.0, validated at load) ───────────────
pub const WEIGHT_EXACT_AMOUNT: f64 = 0.25;
pub const WEIGHT_EXACT_REFERENCE: f64 = 0.20;
pub const WEIGHT_FUZZY_REFERENCE: f64 = 0.15;
pub const WEIGHT_TIMESTAMP_PROXIMITY: f64 = 0.15;
pub const WEIGHT_ACCOUNT_MATCH: f64 = 0.10;
pub const WEIGHT_COMPOSITE_KEY: f64 = 0.10;
pub const WEIGHT_BANK_MATCH: f64 = 0.05;

// ── Time windows (hours) ───────────────────────────────────────────────
pub const DEFAULT_WINDOW_HOURS: i64 = 48;
pub const STRICT_WINDOW_HOURS: i64 = 24;
pub const MAX_WINDOW_HOURS: i64 = 168;

// ── Fuzzy matching ─────────────────────────────────────────────────────
pub const MIN_SIMILARITY: f64 = 0.6;
pub const HIGH_SIMILARITY: f64 = 0.85;
pub const MIN_TOKEN_LENGTH: usize = 3;

// ── Decision thresholds (reject < needs_review < auto_match) ───────────
pub const THRESHOLD_AUTO_MATCH: f64 = 0.80;
pub const THRESHOLD_NEEDS_REVIEW: f64 = 0.60;
pub const THRESHOLD_REJECT: f64 = 0.40;

// ── Candidate retrieval ─────────────────────────────────────────────────
pub const MAX_CANDIDATES: usize = 50;
pub const AMOUNT_TOLERANCE_PERCENT: f64 = 0.01;

// ── Tie-breaking ─────────────────────────────────────────────────────────
pub const MAX_TIE_DIFFERENCE: f64 = 0.05;
pub const TIE_SCORE_ADJUSTMENT_FACTOR: f64 = 0.01;
pub const TIE_RECENCY_WEIGHT: f64 = 0.4;
pub const TIE_REFERENCE_WEIGHT: f64 = 0.4;
pub const TIE_BANK_WEIGHT: f64 = 0.2;

// ── General matching settings ───────────────────────────────────────────
pub const MAX_ALTERNATIVES: usize = 5;
pub const AMBIGUOUS_CANDIDATES_COUNT: usize = 2;
pub const DEFAULT_ESCALATE_IF_AMOUNT_ABOVE: f64 = 1_000_000.0;

// ── Resilience (C1) ──────────────────────────────────────────────────────
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
pub const DEFAULT_BACKOFF_BASE: f64 = 2.0;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 2;
pub const DEFAULT_CIRCUIT_TIMEOUT_SECS: u64 = 60;

// ── Orchestrator cycle ────────────────────────────────────────────────────
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 300;
pub const MIN_CYCLE_INTERVAL_SECS: u64 = 60;
pub const MAX_CYCLE_INTERVAL_SECS: u64 = 86_400;
pub const DEFAULT_STOP_GRACE_SECS: u64 = 30;
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ERROR_BACKOFF_SECS: u64 = 60;

// ── Email fetcher ──────────────────────────────────────────────────────────
pub const DEFAULT_POLL_INTERVAL_MINUTES: u32 = 5;
pub const DEFAULT_BATCH_SIZE: u32 = 100;

// ── Retention ────────────────────────────────────────────────────────────
pub const DEFAULT_EMAIL_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_AUDIT_RETENTION_DAYS: u32 = 90;

// ── Metrics ──────────────────────────────────────────────────────────────
pub const METRICS_ROLLING_WINDOW: usize = 100;

// ── Dispatcher defaults ───────────────────────────────────────────────────
pub const DEFAULT_MAX_ALTERNATIVES_TO_STORE: usize = 5;
