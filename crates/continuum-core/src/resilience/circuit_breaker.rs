//! Per-named-dependency circuit breaker (spec §4.8, §5, §8 property 5).
//! Grounded on `original_source/apps/api/utils/circuit_breaker.py`:
//! closed → open after `failure_threshold` consecutive matching failures;
//! open → half-open after `recovery_timeout`; half-open → closed after
//! `success_threshold` consecutive successes; any half-open failure
//! reopens.

use continuum_types::CoreError;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Circuit breaker state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests pass through normally.
    Closed,
    /// Requests fail fast without attempting the call.
    Open,
    /// A single probe is allowed through to test recovery.
    HalfOpen,
}

/// Tunables for a circuit breaker instance (defaults match spec §4.8/§8).
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures from `Closed` before tripping to `Open`. Default 5.
    pub failure_threshold: u32,
    /// Time spent in `Open` before allowing a half-open probe. Default 30s.
    pub recovery_timeout: Duration,
    /// Consecutive successes from `HalfOpen` required to close. Default 2.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
}

/// A single named circuit breaker. Internally lock-guarded so it is safe to
/// share behind an `Arc` across concurrent callers (spec §5's "internal
/// lock guarding state transitions and counters").
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Construct a named breaker with the given config.
    #[must_use]
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

    /// Name of the guarded dependency.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, resolving an `Open` → `HalfOpen` transition if the
    /// recovery timeout has elapsed.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let mut guard = self.inner.lock();
        self.maybe_transition_to_half_open(&mut guard);
        guard.state
    }

    fn maybe_transition_to_half_open(&self, guard: &mut Inner) {
        if guard.state == CircuitState::Open {
            if let Some(opened_at) = guard.opened_at {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    guard.state = CircuitState::HalfOpen;
                    guard.consecutive_successes = 0;
                    tracing::info!(dependency = %self.name, "circuit breaker entering half-open");
                }
            }
        }
    }

    /// Call before attempting the guarded operation. Returns
    /// `Err(CoreError::CircuitOpen)` if the circuit is open (fast-fail path
    /// of spec §4.8).
    pub fn check(&self) -> Result<(), CoreError> {
        let mut guard = self.inner.lock();
        self.maybe_transition_to_half_open(&mut guard);
        match guard.state {
            CircuitState::Open => {
                let remaining = guard
                    .opened_at
                    .map(|t| self.config.recovery_timeout.saturating_sub(t.elapsed()))
                    .unwrap_or(self.config.recovery_timeout);
                Err(CoreError::CircuitOpen {
                    dependency: self.name.clone(),
                    retry_after_ms: remaining.as_millis() as u64,
                })
            }
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut guard = self.inner.lock();
        match guard.state {
            CircuitState::HalfOpen => {
                guard.consecutive_successes += 1;
                if guard.consecutive_successes >= self.config.success_threshold {
                    guard.state = CircuitState::Closed;
                    guard.consecutive_failures = 0;
                    guard.consecutive_successes = 0;
                    guard.opened_at = None;
                    tracing::info!(dependency = %self.name, "circuit breaker closed");
                }
            }
            CircuitState::Closed => {
                guard.consecutive_failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed call (of a retryable/matching exception class — the
    /// caller decides which error kinds count).
    pub fn record_failure(&self) {
        let mut guard = self.inner.lock();
        match guard.state {
            CircuitState::HalfOpen => {
                guard.state = CircuitState::Open;
                guard.opened_at = Some(Instant::now());
                guard.consecutive_successes = 0;
                tracing::warn!(dependency = %self.name, "half-open probe failed, reopening circuit");
            }
            CircuitState::Closed => {
                guard.consecutive_failures += 1;
                if guard.consecutive_failures >= self.config.failure_threshold {
                    guard.state = CircuitState::Open;
                    guard.opened_at = Some(Instant::now());
                    tracing::warn!(
                        dependency = %self.name,
                        failures = guard.consecutive_failures,
                        "circuit breaker opened"
                    );
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Run `f`, checking the breaker beforehand and recording the outcome
    /// afterward. `is_matching_failure` decides whether an `Err` counts
    /// toward tripping the breaker *and* is surfaced as
    /// `CoreError::UpstreamFailure` (the retryable class `retry::retry`
    /// recognizes). Non-matching errors don't affect circuit state and are
    /// propagated as-is, so a permanent failure (bad request, auth
    /// rejection) neither trips the breaker nor gets retried.
    pub async fn call<F, Fut, T, E>(&self, is_matching_failure: impl Fn(&E) -> bool, f: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display + Into<CoreError>,
    {
        self.check()?;
        match f().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                if is_matching_failure(&err) {
                    self.record_failure();
                    Err(CoreError::UpstreamFailure(err.to_string()))
                } else {
                    Err(err.into())
                }
            }
        }
    }
}

static REGISTRY: Lazy<DashMap<String, Arc<CircuitBreaker>>> = Lazy::new(DashMap::new);

/// Get (or create, with default config) the singleton breaker for `name`,
/// matching the original's `get_circuit_breaker()` registry.
#[must_use]
pub fn get_circuit_breaker(name: &str) -> Arc<CircuitBreaker> {
    REGISTRY
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(CircuitBreaker::new(name, CircuitBreakerConfig::default())))
        .clone()
}

/// Snapshot stats for every registered breaker, for a `/health` or admin
/// endpoint (mirrors `get_circuit_breaker_stats()`).
#[must_use]
pub fn all_breaker_states() -> Vec<(String, CircuitState)> {
    REGISTRY
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().state()))
        .collect()
}
