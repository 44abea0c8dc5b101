//! Embedding composition, batching, and caching (spec §4.4). Grounded on
//! `original_source/apps/api/services/embeddings.py`'s weighted field
//! composition, default batch size of 32, and its cache-bypass rule for
//! very short texts.

use crate::llm::EmbeddingProvider;
use crate::resilience::{CircuitBreaker, TenantCache};
use continuum_types::CoreError;
use std::sync::Arc;

/// Field weights for composing a decision's embedding text (spec §4.4).
pub const TITLE_WEIGHT: f32 = 1.5;
pub const DECISION_WEIGHT: f32 = 1.2;
pub const RATIONALE_WEIGHT: f32 = 1.0;
pub const CONTEXT_WEIGHT: f32 = 0.8;
pub const TRIGGER_WEIGHT: f32 = 0.8;

/// Texts shorter than this bypass the cache outright — too little signal to
/// be worth the lookup, and short strings collide more often under a
/// content hash (spec §4.4).
const CACHE_BYPASS_CHAR_THRESHOLD: usize = 10;

/// The subset of a decision's fields that feed its embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEmbeddingFields<'a> {
    pub title: &'a str,
    pub decision: &'a str,
    pub rationale: &'a str,
    pub context: &'a str,
    pub trigger: &'a str,
}

/// Embed a decision's weighted fields as one vector: each non-empty field is
/// embedded independently, then combined as a weight-normalized average
/// (spec §4.4's "weighted composition" without requiring a pooling model —
/// every weighted field still costs exactly one embedding call each, batched
/// together).
///
/// # Errors
/// Propagates the provider's error; returns a zero vector if every field is
/// empty.
pub async fn embed_decision_fields(
    provider: &dyn EmbeddingProvider,
    fields: &DecisionEmbeddingFields<'_>,
) -> Result<Vec<f32>, CoreError> {
    let weighted: Vec<(&str, f32)> = [
        (fields.title, TITLE_WEIGHT),
        (fields.decision, DECISION_WEIGHT),
        (fields.rationale, RATIONALE_WEIGHT),
        (fields.context, CONTEXT_WEIGHT),
        (fields.trigger, TRIGGER_WEIGHT),
    ]
    .into_iter()
    .filter(|(text, _)| !text.trim().is_empty())
    .collect();

    let dim = provider.dimensions();
    if weighted.is_empty() {
        return Ok(vec![0.0; dim]);
    }

    let texts: Vec<String> = weighted.iter().map(|(text, _)| (*text).to_string()).collect();
    let vectors = provider.embed(&texts, "passage").await?;

    let total_weight: f32 = weighted.iter().map(|(_, w)| w).sum();
    let mut combined = vec![0.0f32; dim];
    for (vector, (_, weight)) in vectors.iter().zip(weighted.iter()) {
        let normalized_weight = weight / total_weight;
        for (slot, value) in combined.iter_mut().zip(vector.iter()) {
            *slot += value * normalized_weight;
        }
    }
    Ok(combined)
}

/// Embedding text for an entity: `"{type}: {canonical_name}"`, already
/// composed by `Entity::embedding_text`.
pub async fn embed_entity_text(provider: &dyn EmbeddingProvider, embedding_text: &str) -> Result<Vec<f32>, CoreError> {
    let vectors = provider.embed(&[embedding_text.to_string()], "passage").await?;
    vectors
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::Internal("embedding provider returned no vectors".to_string()))
}

/// Cosine similarity between two equal-length vectors. Returns 0.0 for
/// mismatched or zero-norm inputs rather than panicking (used by entity
/// resolution stage 5 and the evolution analyzer's `SIMILAR_TO` scoring).
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn encode_vector(vector: &[f32]) -> String {
    serde_json::to_string(vector).unwrap_or_default()
}

fn decode_vector(raw: &str) -> Result<Vec<f32>, CoreError> {
    serde_json::from_str(raw).map_err(CoreError::from)
}

/// Batches, caches, and circuit-breaker-gates raw embedding calls for
/// arbitrary texts (used by the extractor for decision/entity vectors and by
/// re-embedding jobs). Wraps the same `EmbeddingProvider` the rest of the
/// pipeline uses, so a provider outage trips the same breaker the chat path
/// observes.
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    breaker: Arc<CircuitBreaker>,
    cache: TenantCache,
    batch_size: usize,
}

impl Embedder {
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>, breaker: Arc<CircuitBreaker>, cache: TenantCache, batch_size: usize) -> Self {
        Self { provider, breaker, cache, batch_size: batch_size.max(1) }
    }

    /// Embed `texts` for `user_id`, serving cache hits directly and batching
    /// the misses through the breaker-guarded provider in chunks of
    /// `batch_size` (spec §4.4 default 32).
    pub async fn embed_texts(&self, user_id: &str, texts: &[String], input_type: &str) -> Result<Vec<Vec<f32>>, CoreError> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();
        let mut miss_keys: Vec<Option<String>> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            if text.chars().count() < CACHE_BYPASS_CHAR_THRESHOLD {
                miss_indices.push(i);
                miss_texts.push(text.clone());
                miss_keys.push(None);
                continue;
            }
            let digest = TenantCache::content_hash(&format!("{input_type}:{text}"));
            let key = self.cache.build_key(user_id, "vector", &digest);
            match self.cache.get(&key).await {
                Some(Some(cached)) => results[i] = Some(decode_vector(&cached)?),
                _ => {
                    miss_indices.push(i);
                    miss_texts.push(text.clone());
                    miss_keys.push(Some(key));
                }
            }
        }

        for chunk_start in (0..miss_texts.len()).step_by(self.batch_size) {
            let chunk_end = (chunk_start + self.batch_size).min(miss_texts.len());
            let batch = miss_texts[chunk_start..chunk_end].to_vec();
            let provider = Arc::clone(&self.provider);
            let input_type_owned = input_type.to_string();
            let vectors = self
                .breaker
                .call(|_err: &CoreError| true, || async move { provider.embed(&batch, &input_type_owned).await })
                .await?;

            for (offset, vector) in vectors.into_iter().enumerate() {
                let global_idx = chunk_start + offset;
                let original_idx = miss_indices[global_idx];
                if let Some(key) = &miss_keys[global_idx] {
                    self.cache.set(key.clone(), Some(encode_vector(&vector))).await;
                }
                results[original_idx] = Some(vector);
            }
        }

        Ok(results.into_iter().map(Option::unwrap_or_default).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{CachePrefix, CircuitBreakerConfig};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        dim: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn dimensions(&self) -> usize {
            self.dim
        }

        async fn embed(&self, texts: &[String], _input_type: &str) -> Result<Vec<Vec<f32>>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32; self.dim]).collect())
        }
    }

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_handles_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[tokio::test]
    async fn empty_decision_fields_yield_zero_vector() {
        let provider = FixedProvider { dim: 4, calls: AtomicUsize::new(0) };
        let vector = embed_decision_fields(&provider, &DecisionEmbeddingFields::default()).await.unwrap();
        assert_eq!(vector, vec![0.0; 4]);
    }

    #[tokio::test]
    async fn decision_fields_combine_into_one_vector_of_right_dimension() {
        let provider = FixedProvider { dim: 4, calls: AtomicUsize::new(0) };
        let fields = DecisionEmbeddingFields {
            title: "use postgres",
            decision: "adopt postgres",
            rationale: "",
            context: "",
            trigger: "",
        };
        let vector = embed_decision_fields(&provider, &fields).await.unwrap();
        assert_eq!(vector.len(), 4);
        assert!(vector.iter().all(|x| *x > 0.0));
    }

    #[tokio::test]
    async fn embed_texts_caches_and_avoids_repeat_provider_calls() {
        let provider = Arc::new(FixedProvider { dim: 2, calls: AtomicUsize::new(0) });
        let embedder = Embedder::new(
            Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
            Arc::new(CircuitBreaker::new("test-embed", CircuitBreakerConfig::default())),
            TenantCache::new(CachePrefix::Embedding),
            32,
        );
        let texts = vec!["a sufficiently long string".to_string()];
        embedder.embed_texts("alice", &texts, "passage").await.unwrap();
        embedder.embed_texts("alice", &texts, "passage").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_texts_bypass_the_cache() {
        let provider = Arc::new(FixedProvider { dim: 2, calls: AtomicUsize::new(0) });
        let embedder = Embedder::new(
            Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
            Arc::new(CircuitBreaker::new("test-embed-short", CircuitBreakerConfig::default())),
            TenantCache::new(CachePrefix::Embedding),
            32,
        );
        let texts = vec!["hi".to_string()];
        embedder.embed_texts("alice", &texts, "passage").await.unwrap();
        embedder.embed_texts("alice", &texts, "passage").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn batches_respect_configured_batch_size() {
        let provider = Arc::new(FixedProvider { dim: 2, calls: AtomicUsize::new(0) });
        let embedder = Embedder::new(
            Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
            Arc::new(CircuitBreaker::new("test-embed-batch", CircuitBreakerConfig::default())),
            TenantCache::new(CachePrefix::Embedding),
            2,
        );
        let texts: Vec<String> = (0..5).map(|i| format!("text number {i} long enough")).collect();
        let results = embedder.embed_texts("alice", &texts, "passage").await.unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }
}
