//! Exponential backoff with jitter, gated on a caller-supplied retryable
//! predicate (spec §4.2/§4.8). Grounded on
//! `original_source/apps/api/utils/retry.py`'s `calculate_backoff` and
//! `retry()` decorator.

use continuum_types::CoreError;
use rand::Rng;
use std::time::Duration;

/// Backoff tunables.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first). Default 3.
    pub max_attempts: u32,
    /// Base delay in seconds for exponential growth. Default 1.0.
    pub base_delay_secs: f64,
    /// Ceiling on any single delay, in seconds. Default 8.0.
    pub max_delay_secs: f64,
    /// Whether to add `U(0,1)` jitter to each computed delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 8.0,
            jitter: true,
        }
    }
}

/// `min(base * 2^attempt, max) [+ U(0,1) jitter]`, matching the original's
/// `calculate_backoff`.
#[must_use]
pub fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    let exp = config.base_delay_secs * 2f64.powi(attempt as i32);
    let mut delay = exp.min(config.max_delay_secs);
    if config.jitter {
        delay += rand::thread_rng().gen_range(0.0..1.0);
    }
    Duration::from_secs_f64(delay.max(0.0))
}

/// Run `f`, retrying while `is_retryable` returns true for the error and
/// attempts remain. Sleeps `calculate_backoff` between attempts. Returns
/// `CoreError::RetryExhausted` if every attempt fails.
pub async fn retry<F, Fut, T, E>(
    config: &RetryConfig,
    is_retryable: impl Fn(&E) -> bool,
    mut f: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_message = String::new();
    for attempt in 0..config.max_attempts {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_message = err.to_string();
                if attempt + 1 >= config.max_attempts || !is_retryable(&err) {
                    break;
                }
                let delay = calculate_backoff(attempt, config);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_message,
                    "retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    Err(CoreError::RetryExhausted {
        attempts: config.max_attempts,
        message: last_message,
    })
}

/// HTTP status codes the client treats as transient (spec §4.8).
#[must_use]
pub fn is_retryable_http_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        let config = RetryConfig {
            jitter: false,
            base_delay_secs: 1.0,
            max_delay_secs: 8.0,
            ..Default::default()
        };
        assert_eq!(calculate_backoff(0, &config), Duration::from_secs_f64(1.0));
        assert_eq!(calculate_backoff(1, &config), Duration::from_secs_f64(2.0));
        assert_eq!(calculate_backoff(2, &config), Duration::from_secs_f64(4.0));
        // 2^3 = 8, already at the cap.
        assert_eq!(calculate_backoff(3, &config), Duration::from_secs_f64(8.0));
        // 2^4 = 16, clamped to the cap.
        assert_eq!(calculate_backoff(4, &config), Duration::from_secs_f64(8.0));
    }

    #[test]
    fn jitter_adds_between_zero_and_one_second() {
        let config = RetryConfig {
            jitter: true,
            base_delay_secs: 1.0,
            max_delay_secs: 8.0,
            ..Default::default()
        };
        let delay = calculate_backoff(0, &config).as_secs_f64();
        assert!((1.0..2.0).contains(&delay));
    }

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            base_delay_secs: 0.001,
            max_delay_secs: 0.002,
            jitter: false,
        };
        let result: Result<&str, CoreError> = retry(
            &config,
            |_: &&str| true,
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok("ok")
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_stops_immediately_on_non_retryable_error() {
        let attempts = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            base_delay_secs: 0.001,
            max_delay_secs: 0.002,
            jitter: false,
        };
        let result: Result<&str, CoreError> = retry(
            &config,
            |_: &&str| false,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<&str, _>("permanent") }
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_exhaustion_surfaces_typed_error() {
        let config = RetryConfig {
            max_attempts: 2,
            base_delay_secs: 0.001,
            max_delay_secs: 0.002,
            jitter: false,
        };
        let result: Result<&str, CoreError> =
            retry(&config, |_: &&str| true, || async { Err::<&str, _>("down") }).await;
        match result {
            Err(CoreError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            _ => panic!("expected RetryExhausted"),
        }
    }

    #[test]
    fn retryable_status_set_matches_spec() {
        for status in [429, 500, 502, 503, 504] {
            assert!(is_retryable_http_status(status));
        }
        for status in [200, 400, 401, 404] {
            assert!(!is_retryable_http_status(status));
        }
    }
}
