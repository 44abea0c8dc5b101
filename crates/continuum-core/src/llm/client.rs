//! `LlmProvider`/`EmbeddingProvider` trait objects plus `ResilientLlmClient`,
//! which composes the rate limiter, circuit breaker, retry/backoff, and
//! response cache already built in `crate::resilience` around a pluggable
//! provider (spec §4.8). Grounded on
//! `original_source/apps/api/services/llm_providers/nvidia.py`'s
//! `generate`/`generate_stream`/`embed` contract.

use crate::resilience::{retry, CircuitBreaker, RateLimiter, RetryConfig, TenantCache};
use crate::telemetry::sanitize_user_id;
use async_trait::async_trait;
use continuum_types::CoreError;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Instant;

/// A chat message role, matching the OpenAI-style `{role, content}` shape
/// every provider in the corpus speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn in a chat-style prompt.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// Token accounting returned alongside generated text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A pluggable chat-completion backend. Implementations wrap a concrete
/// provider (NVIDIA NIM, Bedrock, ...); none are implemented here, matching
/// spec §1's "hosting LLMs" non-goal — only the contract lives in this
/// crate.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Identifier used in cache keys and observability records.
    fn model_name(&self) -> &str;

    async fn generate(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<(String, LlmUsage), CoreError>;

    /// Streamed completion. Cancellation of the returned stream must close
    /// the upstream connection at the next suspension point (spec §5).
    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<BoxStream<'static, Result<String, CoreError>>, CoreError>;
}

/// A pluggable embedding backend (spec §4.4, §6).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, texts: &[String], input_type: &str) -> Result<Vec<Vec<f32>>, CoreError>;
}

/// One observability record per LLM call (spec §4.8's "Observability hook").
#[derive(Debug, Clone)]
pub struct LlmCallRecord {
    pub model: String,
    pub operation: &'static str,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub latency_ms: u64,
    pub success: bool,
    pub error_kind: Option<String>,
}

/// Pluggable call-record sink. Default is a structured log line; a remote
/// metrics intake is an extension point, not implemented here (spec §12's
/// explicit non-supplementation of a Datadog-specific wire client).
pub trait ObservabilityHook: Send + Sync {
    fn record(&self, record: &LlmCallRecord);
}

/// Default sink: one structured `tracing` event per call.
pub struct StructuredLogHook;

impl ObservabilityHook for StructuredLogHook {
    fn record(&self, record: &LlmCallRecord) {
        if record.success {
            tracing::info!(
                model = %record.model,
                operation = record.operation,
                prompt_tokens = record.prompt_tokens,
                completion_tokens = record.completion_tokens,
                latency_ms = record.latency_ms,
                "llm call completed"
            );
        } else {
            tracing::warn!(
                model = %record.model,
                operation = record.operation,
                latency_ms = record.latency_ms,
                error_kind = record.error_kind.as_deref().unwrap_or("unknown"),
                "llm call failed"
            );
        }
    }
}

/// Tunables for `ResilientLlmClient` (spec §4.8, §6's config keys).
#[derive(Debug, Clone)]
pub struct ResilientLlmConfig {
    pub retry: RetryConfig,
    /// Effective max prompt size in tokens; the client has no compressor of
    /// its own (that's the extractor's job, §4.2 step 1) so it only guards
    /// the hard overflow case.
    pub effective_max_prompt_tokens: usize,
    /// Whether identical (hash, model, prompt_version) requests are served
    /// from cache. Always disabled for streaming (spec §4.8).
    pub cache_enabled: bool,
}

impl Default for ResilientLlmConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            effective_max_prompt_tokens: 100_000,
            cache_enabled: true,
        }
    }
}

fn estimate_tokens(messages: &[ChatMessage]) -> usize {
    // Rough chars/4 heuristic; providers don't expose a pre-flight
    // tokenizer and the corpus does not pull one in as a dependency.
    messages.iter().map(|m| m.content.len()).sum::<usize>() / 4
}

fn render_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::System => "system",
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            format!("{role}:{}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Only the transient upstream class (HTTP 429/500/502/503/504, or a
/// transport-level failure the provider couldn't classify further) is
/// retryable. A permanent rejection (`UpstreamRejected`, e.g. 400/401/404)
/// would fail identically on every attempt, so it is excluded (spec
/// §4.2/§4.8's "retries only on transient error classes").
fn is_retryable_core_error(err: &CoreError) -> bool {
    matches!(err, CoreError::UpstreamFailure(_))
}

/// Wraps a primary (and optional fallback) `LlmProvider` with the rate
/// limiter, circuit breaker, retry, and response cache the spec requires
/// every LLM call path to share (§4.2/§4.3/§4.5/§4.6 all route through
/// this).
pub struct ResilientLlmClient {
    primary: Arc<dyn LlmProvider>,
    fallback: Option<Arc<dyn LlmProvider>>,
    breaker: Arc<CircuitBreaker>,
    limiter: Arc<RateLimiter>,
    cache: TenantCache,
    hook: Arc<dyn ObservabilityHook>,
    config: ResilientLlmConfig,
}

impl ResilientLlmClient {
    #[must_use]
    pub fn new(
        primary: Arc<dyn LlmProvider>,
        fallback: Option<Arc<dyn LlmProvider>>,
        breaker: Arc<CircuitBreaker>,
        limiter: Arc<RateLimiter>,
        cache: TenantCache,
        hook: Arc<dyn ObservabilityHook>,
        config: ResilientLlmConfig,
    ) -> Self {
        Self { primary, fallback, breaker, limiter, cache, hook, config }
    }

    /// Name of the primary provider backing this client, for provenance
    /// records (spec §3's `Provenance::model_name`).
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.primary.model_name()
    }

    /// Generate text for `user_id`, consulting the response cache first,
    /// then the rate limiter, circuit breaker, and retry/backoff around the
    /// primary provider, falling back once on a configured fallback
    /// provider for unretryable primary failures.
    pub async fn generate(
        &self,
        user_id: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
        prompt_version: &str,
    ) -> Result<(String, LlmUsage), CoreError> {
        let estimated = estimate_tokens(messages);
        if estimated > self.config.effective_max_prompt_tokens {
            return Err(CoreError::PromptTooLarge {
                estimated_tokens: estimated,
                limit: self.config.effective_max_prompt_tokens,
            });
        }

        if !self.limiter.try_acquire(user_id) {
            let retry_after = self.limiter.retry_after(user_id).unwrap_or_default();
            return Err(CoreError::RateLimited { retry_after_secs: retry_after.as_secs() });
        }

        let cache_key = self.config.cache_enabled.then(|| {
            let digest = TenantCache::content_hash(&format!(
                "{}:{}:{prompt_version}",
                self.primary.model_name(),
                render_messages(messages)
            ));
            self.cache.build_key(user_id, "chat", &digest)
        });

        if let Some(key) = &cache_key {
            if let Some(Some(cached)) = self.cache.get(key).await {
                tracing::debug!(user_id = %sanitize_user_id(user_id), "llm response cache hit");
                return Ok((cached, LlmUsage::default()));
            }
        }

        let start = Instant::now();
        let result = retry::retry(&self.config.retry, is_retryable_core_error, || {
            self.breaker.call(is_retryable_core_error, || self.primary.generate(messages, temperature, max_tokens))
        })
        .await;

        match result {
            Ok((text, usage)) => {
                self.hook.record(&LlmCallRecord {
                    model: self.primary.model_name().to_string(),
                    operation: "generate",
                    prompt_tokens: usage.prompt_tokens,
                    completion_tokens: usage.completion_tokens,
                    latency_ms: start.elapsed().as_millis() as u64,
                    success: true,
                    error_kind: None,
                });
                if let Some(key) = cache_key {
                    self.cache.set(key, Some(text.clone())).await;
                }
                Ok((text, usage))
            }
            Err(err) => {
                self.hook.record(&LlmCallRecord {
                    model: self.primary.model_name().to_string(),
                    operation: "generate",
                    prompt_tokens: 0,
                    completion_tokens: 0,
                    latency_ms: start.elapsed().as_millis() as u64,
                    success: false,
                    error_kind: Some(err.tag().to_string()),
                });
                match (&self.fallback, &err) {
                    (Some(fallback), CoreError::RetryExhausted { .. }) => {
                        tracing::warn!(user_id = %sanitize_user_id(user_id), "primary llm exhausted, trying fallback model");
                        fallback.generate(messages, temperature, max_tokens).await
                    }
                    _ => Err(err),
                }
            }
        }
    }

    /// Streamed completion; never served from cache (spec §4.8).
    pub async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<BoxStream<'static, Result<String, CoreError>>, CoreError> {
        self.breaker.check()?;
        let result = self.primary.generate_stream(messages, temperature, max_tokens).await;
        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(err) if is_retryable_core_error(err) => self.breaker.record_failure(),
            Err(_) => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{CircuitBreakerConfig, RateLimiterConfig};
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingProvider {
        model: String,
        fail_times: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        fn model_name(&self) -> &str {
            &self.model
        }

        async fn generate(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<(String, LlmUsage), CoreError> {
            if self.fail_times.load(Ordering::SeqCst) > 0 {
                self.fail_times.fetch_sub(1, Ordering::SeqCst);
                return Err(CoreError::UpstreamFailure("simulated transient failure".to_string()));
            }
            Ok(("response text".to_string(), LlmUsage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 }))
        }

        async fn generate_stream(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<BoxStream<'static, Result<String, CoreError>>, CoreError> {
            Ok(Box::pin(stream::iter(vec![Ok("chunk".to_string())])))
        }
    }

    fn test_client(fail_times: usize) -> ResilientLlmClient {
        let primary = Arc::new(CountingProvider { model: "test-model".to_string(), fail_times: AtomicUsize::new(fail_times) });
        ResilientLlmClient::new(
            primary,
            None,
            Arc::new(CircuitBreaker::new("test-llm", CircuitBreakerConfig::default())),
            Arc::new(RateLimiter::new(RateLimiterConfig::default())),
            TenantCache::new(crate::resilience::CachePrefix::LlmResponse),
            Arc::new(StructuredLogHook),
            ResilientLlmConfig {
                retry: RetryConfig { max_attempts: 3, base_delay_secs: 0.001, max_delay_secs: 0.002, jitter: false },
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn generate_succeeds_and_populates_cache() {
        let client = test_client(0);
        let messages = vec![ChatMessage::user("hello")];
        let (text, _) = client.generate("alice", &messages, 0.5, 100, "v1").await.unwrap();
        assert_eq!(text, "response text");
    }

    #[tokio::test]
    async fn cached_response_short_circuits_provider() {
        let client = test_client(0);
        let messages = vec![ChatMessage::user("hello")];
        client.generate("alice", &messages, 0.5, 100, "v1").await.unwrap();
        let (text, usage) = client.generate("alice", &messages, 0.5, 100, "v1").await.unwrap();
        assert_eq!(text, "response text");
        assert_eq!(usage.prompt_tokens, 0);
    }

    #[tokio::test]
    async fn oversize_prompt_is_rejected_without_calling_provider() {
        let client = test_client(0);
        let huge = "x".repeat(500_000);
        let messages = vec![ChatMessage::user(huge)];
        let err = client.generate("alice", &messages, 0.5, 100, "v1").await.unwrap_err();
        assert!(matches!(err, CoreError::PromptTooLarge { .. }));
    }

    #[tokio::test]
    async fn rate_limited_tenant_is_rejected() {
        let client = test_client(0);
        let messages = vec![ChatMessage::user("hi")];
        for _ in 0..RateLimiterConfig::default().max_requests {
            let _ = client.generate("bob", &messages, 0.5, 100, &uuid::Uuid::new_v4().to_string()).await;
        }
        let err = client.generate("bob", &messages, 0.5, 100, "v-final").await.unwrap_err();
        assert!(matches!(err, CoreError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_and_recover() {
        let client = test_client(1);
        let messages = vec![ChatMessage::user("retry me")];
        let (text, _) = client.generate("carol", &messages, 0.5, 100, "v1").await.unwrap();
        assert_eq!(text, "response text");
    }

    #[test]
    fn duration_default_is_sane() {
        assert!(Duration::from_secs(0) < RateLimiterConfig::default().window);
    }
}
