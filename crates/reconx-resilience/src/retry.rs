//! Retry with exponential backoff and optional jitter (§4.1).

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reconx_core::config::RetryConfig;
use reconx_core::error::ReconError;
use tracing::{debug, warn};

/// Runs `operation` up to `config.max_attempts` times, retrying only
/// errors classified transient by the caller-supplied predicate.
///
/// Delay for attempt `k` (0-indexed) is `min(initial * base^k, max_delay)`,
/// multiplied by a uniform factor in `[0.5, 1.0]` when jitter is enabled.
/// Gives up with the last error once attempts are exhausted.
pub async fn retry_with_backoff<T, E, F, Fut, IsTransient>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
    is_transient: IsTransient,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    IsTransient: Fn(&E) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(v) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "retry succeeded");
                }
                return Ok(v);
            }
            Err(e) if attempt < config.max_attempts && is_transient(&e) => {
                let delay = backoff_delay(config, attempt - 1);
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "retry_attempt"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    warn!(operation = operation_name, attempt, "retry_exhausted");
                }
                return Err(e);
            }
        }
    }
}

/// Convenience wrapper for the common case where the error type is
/// `ReconError`, whose transience is classified by [`ReconError::is_transient`].
pub async fn retry_recon<T, F, Fut>(
    operation_name: &str,
    config: &RetryConfig,
    operation: F,
) -> Result<T, ReconError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReconError>>,
{
    retry_with_backoff(operation_name, config, operation, ReconError::is_transient).await
}

fn backoff_delay(config: &RetryConfig, attempt_index: u32) -> Duration {
    let raw_ms = (config.initial_delay_ms as f64) * config.base.powi(attempt_index as i32);
    let capped_ms = raw_ms.min(config.max_delay_ms as f64);
    let final_ms = if config.jitter {
        let factor = rand::thread_rng().gen_range(0.5..=1.0);
        capped_ms * factor
    } else {
        capped_ms
    };
    Duration::from_millis(final_ms.max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        let cfg = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            base: 2.0,
            max_delay_ms: 1000,
            jitter: false,
        };
        assert_eq!(backoff_delay(&cfg, 0).as_millis(), 100);
        assert_eq!(backoff_delay(&cfg, 1).as_millis(), 200);
        assert_eq!(backoff_delay(&cfg, 2).as_millis(), 400);
        assert_eq!(backoff_delay(&cfg, 5).as_millis(), 1000); // capped
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn succeeds_on_third_attempt_with_exactly_three_invocations() {
        let calls = AtomicU32::new(0);
        let cfg = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 1,
            base: 2.0,
            max_delay_ms: 10,
            jitter: false,
        };

        let result: Result<u32, ReconError> = retry_recon("test-op", &cfg, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(ReconError::TransientSource {
                        source_label: "test".into(),
                        detail: "boom".into(),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn gives_up_with_last_error_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let cfg = RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            base: 2.0,
            max_delay_ms: 5,
            jitter: false,
        };

        let result: Result<(), ReconError> = retry_recon("test-op", &cfg, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ReconError::TransientSource {
                    source_label: "test".into(),
                    detail: "always fails".into(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn does_not_retry_non_transient_errors() {
        let calls = AtomicU32::new(0);
        let cfg = RetryConfig::default();

        let result: Result<(), ReconError> = retry_recon("test-op", &cfg, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ReconError::PolicyViolation("fatal".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
