//! Resilience substrate shared across the extraction pipeline, LLM client,
//! and notification fan-out: circuit breakers, retry/backoff, a sliding
//! window rate limiter, a multi-tenant TTL cache, and a per-session message
//! batcher (spec §4.8, §5, §8 properties 5-7).

pub mod cache;
pub mod circuit_breaker;
pub mod message_batcher;
pub mod rate_limiter;
pub mod retry;

pub use cache::{CachePrefix, CachedValue, TenantCache};
pub use circuit_breaker::{get_circuit_breaker, all_breaker_states, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use message_batcher::{BatchSink, BatcherConfig, MessageQueueManager};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use retry::{calculate_backoff, is_retryable_http_status, retry, RetryConfig};
