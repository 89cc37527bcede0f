//! Circuit breaker with CLOSED/OPEN/HALF_OPEN states (§4.1).

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use reconx_core::config::CircuitBreakerConfig;
use reconx_core::error::ReconError;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
}

/// One instance per external dependency, internally synchronized so
/// state transitions are atomic under concurrent callers.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                opened_at: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.maybe_transition_to_half_open(&mut inner);
        inner.state
    }

    /// Runs `operation` through the breaker. Returns `ReconError::CircuitOpen`
    /// immediately, without invoking `operation`, while the breaker is open
    /// and the timeout has not elapsed.
    pub async fn call<T, Fut>(&self, operation: Fut) -> Result<T, ReconError>
    where
        Fut: Future<Output = Result<T, ReconError>>,
    {
        {
            let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
            self.maybe_transition_to_half_open(&mut inner);
            if inner.state == CircuitState::Open {
                return Err(ReconError::CircuitOpen {
                    name: self.name.clone(),
                });
            }
        }

        match operation.await {
            Ok(v) => {
                self.on_success();
                Ok(v)
            }
            Err(e) => {
                self.on_failure();
                Err(e)
            }
        }
    }

    fn maybe_transition_to_half_open(&self, inner: &mut Inner) {
        if inner.state == CircuitState::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= Duration::from_secs(self.config.timeout_secs) {
                    inner.state = CircuitState::HalfOpen;
                    inner.consecutive_successes = 0;
                    info!(circuit = %self.name, "circuit_breaker_half_open");
                }
            }
        }
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.consecutive_successes = 0;
                    inner.opened_at = None;
                    info!(circuit = %self.name, "circuit_breaker_closed");
                }
            }
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.consecutive_successes = 0;
                warn!(circuit = %self.name, "circuit_breaker_opened_from_half_open");
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(circuit = %self.name, failures = inner.consecutive_failures, "circuit_breaker_opened");
                }
            }
            CircuitState::Open => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            success_threshold: 2,
            timeout_secs: 0,
        }
    }

    fn ok() -> Result<(), ReconError> {
        Ok(())
    }

    fn fail() -> Result<(), ReconError> {
        Err(ReconError::TransientSource {
            source_label: "svc".into(),
            detail: "boom".into(),
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn opens_after_failure_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new("svc", fast_config());
        for _ in 0..3 {
            let _ = breaker.call(async { fail() }).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fails_fast_without_invoking_operation_while_open() {
        let breaker = CircuitBreaker::new("svc", CircuitBreakerConfig {
            timeout_secs: 3600,
            ..fast_config()
        });
        for _ in 0..3 {
            let _ = breaker.call(async { fail() }).await;
        }

        let invoked = std::sync::atomic::AtomicBool::new(false);
        let result = breaker
            .call(async {
                invoked.store(true, std::sync::atomic::Ordering::SeqCst);
                ok()
            })
            .await;

        assert!(matches!(result, Err(ReconError::CircuitOpen { .. })));
        assert!(!invoked.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn closes_after_success_threshold_in_half_open() {
        let breaker = CircuitBreaker::new("svc", fast_config());
        for _ in 0..3 {
            let _ = breaker.call(async { fail() }).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        // timeout_secs = 0, so the very next call attempt transitions to half-open.
        let _ = breaker.call(async { ok() }).await;
        let _ = breaker.call(async { ok() }).await;
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn any_failure_in_half_open_reopens() {
        let breaker = CircuitBreaker::new("svc", fast_config());
        for _ in 0..3 {
            let _ = breaker.call(async { fail() }).await;
        }
        let _ = breaker.call(async { fail() }).await;
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
