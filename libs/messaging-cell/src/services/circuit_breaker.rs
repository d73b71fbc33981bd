// libs/messaging-cell/src/services/circuit_breaker.rs
use std::future::Future;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::models::CircuitState;

#[derive(Error, Debug)]
pub enum CircuitBreakerError<E>
where
    E: std::error::Error + 'static,
{
    /// The breaker is open and the recovery window has not elapsed; the
    /// wrapped operation was not invoked.
    #[error("Circuit breaker is open")]
    Open,

    /// The wrapped operation ran and failed; the original error is preserved
    /// so callers can inspect the cause.
    #[error(transparent)]
    Inner(E),
}

impl<E> CircuitBreakerError<E>
where
    E: std::error::Error + 'static,
{
    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Open => None,
            CircuitBreakerError::Inner(err) => Some(err),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

impl BreakerInner {
    fn should_attempt_reset(&self, recovery_timeout: Duration) -> bool {
        match self.last_failure_time {
            Some(last_failure) => last_failure.elapsed() > recovery_timeout,
            None => true,
        }
    }
}

/// Guards calls to a failing downstream dependency. After
/// `failure_threshold` consecutive failures the breaker opens and rejects
/// calls outright; once `recovery_timeout` has elapsed since the last
/// failure, a single probe call is let through (half-open) and its outcome
/// decides whether the breaker closes again or re-opens.
///
/// State is re-evaluated lazily on each call, never by a background timer,
/// and is not persisted across restarts. One instance is shared per
/// downstream dependency; the lock is held only across counter updates,
/// never across the wrapped call.
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_time: None,
            }),
        }
    }

    /// Runs `operation` under the breaker. Returns the operation's output on
    /// success, its own error (inspectable) on failure, or
    /// [`CircuitBreakerError::Open`] without invoking it while the breaker is
    /// open.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        {
            let mut inner = self.inner.lock().await;

            if inner.state == CircuitState::Open {
                if inner.should_attempt_reset(self.recovery_timeout) {
                    debug!("Recovery timeout elapsed, probing downstream");
                    inner.state = CircuitState::HalfOpen;
                } else {
                    warn!("Circuit breaker is open, rejecting call");
                    return Err(CircuitBreakerError::Open);
                }
            }
        }

        match operation().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                self.on_failure().await;
                Err(CircuitBreakerError::Inner(err))
            }
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    pub async fn failure_count(&self) -> u32 {
        self.inner.lock().await.failure_count
    }

    async fn on_success(&self) {
        let mut inner = self.inner.lock().await;

        if inner.state != CircuitState::Closed {
            info!("Circuit breaker closed after successful call");
        }

        inner.failure_count = 0;
        inner.state = CircuitState::Closed;
    }

    async fn on_failure(&self) {
        let mut inner = self.inner.lock().await;

        inner.failure_count += 1;
        inner.last_failure_time = Some(Instant::now());

        if inner.failure_count >= self.failure_threshold {
            if inner.state != CircuitState::Open {
                warn!(
                    "Circuit breaker opened after {} consecutive failures",
                    inner.failure_count
                );
            }
            inner.state = CircuitState::Open;
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}
