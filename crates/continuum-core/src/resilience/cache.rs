//! Multi-tenant, TTL-based cache shared by the response cache (§4.2),
//! entity cache (§4.3), and embedding cache (§4.4). Generalizes
//! `original_source/apps/api/utils/cache.py`'s prefix/TTL table and
//! `services/entity_cache.py`'s key shape into one `moka`-backed type
//! instead of three bespoke Redis call sites (SPEC_FULL.md §12).

use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Which logical cache a key belongs to — purely for key-prefixing and
/// default-TTL lookup, mirroring the original's `CACHE_PREFIXES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePrefix {
    /// LLM response cache (§4.2, §4.8).
    LlmResponse,
    /// Entity resolution cache (§4.3).
    Entity,
    /// Embedding cache (§4.4).
    Embedding,
}

impl CachePrefix {
    fn as_str(self) -> &'static str {
        match self {
            Self::LlmResponse => "llm_response",
            Self::Entity => "entity",
            Self::Embedding => "embedding",
        }
    }

    /// Default TTL for entries under this prefix, per spec defaults.
    #[must_use]
    pub fn default_ttl(self) -> Duration {
        match self {
            Self::LlmResponse => Duration::from_secs(86_400),    // 24h, §4.2
            Self::Entity => Duration::from_secs(300),             // 5min, §4.3
            Self::Embedding => Duration::from_secs(30 * 86_400),  // 30d, §4.4
        }
    }
}

/// A cached value: present (`Some`) or a recorded negative result (`None`)
/// — both get stored so repeated misses don't repeat the expensive lookup
/// (spec §4.3: "negative results are cached to absorb repeated misses").
pub type CachedValue = Option<String>;

/// A user-scoped, TTL-based cache. Each logical cache (response/entity/
/// embedding) gets its own `TenantCache` instance so TTLs and eviction
/// don't interfere across concerns, but the key-building and invalidation
/// code path is shared.
pub struct TenantCache {
    prefix: CachePrefix,
    inner: Cache<String, CachedValue>,
}

impl TenantCache {
    /// Construct a cache for `prefix` with its default TTL and a generous
    /// entry cap (spec doesn't bound entry count; `moka` requires one).
    #[must_use]
    pub fn new(prefix: CachePrefix) -> Self {
        let inner = Cache::builder()
            .time_to_live(prefix.default_ttl())
            .max_capacity(100_000)
            .build();
        Self { prefix, inner }
    }

    /// Build a tenant-scoped key: `{prefix}:{user_id}:{lookup_kind}:{key}`,
    /// matching `entity_cache.py`'s `entity:{user_id}:{lookup_type}:{key}`
    /// shape generalized across all three cache consumers.
    #[must_use]
    pub fn build_key(&self, user_id: &str, lookup_kind: &str, key: &str) -> String {
        format!("{}:{}:{}:{}", self.prefix.as_str(), user_id, lookup_kind, key)
    }

    /// Deterministic content-hash key component (spec §4.2/§4.4:
    /// `hash(prompt)`/`md5(text)` — this crate uses sha256 throughout for a
    /// single hashing primitive across the codebase).
    #[must_use]
    pub fn content_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Fetch a cached value (hit on `Some(value)`, recorded negative on
    /// `Some(None)`, true miss on `None`).
    pub async fn get(&self, key: &str) -> Option<CachedValue> {
        self.inner.get(key).await
    }

    /// Store a positive or negative result under `key` with this cache's
    /// default TTL.
    pub async fn set(&self, key: String, value: CachedValue) {
        self.inner.insert(key, value).await;
    }

    /// Invalidate a single key.
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Invalidate every key for a tenant. `moka` has no native prefix scan,
    /// so this walks the current entry set — acceptable for the bounded
    /// per-tenant cardinality these caches hold (entities/decisions are
    /// per-user, not global). Mirrors `invalidate_user_cache`'s SCAN-based
    /// approach conceptually, without requiring a real key-space scan
    /// command.
    pub async fn invalidate_user(&self, user_id: &str) {
        let prefix = format!("{}:{}:", self.prefix.as_str(), user_id);
        let keys: Vec<String> = self
            .inner
            .iter()
            .map(|(k, _)| (*k).clone())
            .filter(|k| k.starts_with(&prefix))
            .collect();
        for key in keys {
            self.inner.invalidate(&key).await;
        }
    }

    /// Current entry count, for diagnostics.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_key_is_tenant_and_kind_scoped() {
        let cache = TenantCache::new(CachePrefix::Entity);
        let key = cache.build_key("alice", "exact_name", "postgresql");
        assert_eq!(key, "entity:alice:exact_name:postgresql");
    }

    #[tokio::test]
    async fn positive_and_negative_results_are_both_cacheable() {
        let cache = TenantCache::new(CachePrefix::Entity);
        let key = cache.build_key("alice", "exact_name", "mongodb");
        cache.set(key.clone(), None).await;
        assert_eq!(cache.get(&key).await, Some(None));

        let key2 = cache.build_key("alice", "exact_name", "postgresql");
        cache.set(key2.clone(), Some("entity-id-123".to_string())).await;
        assert_eq!(cache.get(&key2).await, Some(Some("entity-id-123".to_string())));
    }

    #[tokio::test]
    async fn invalidate_user_only_clears_that_tenants_keys() {
        let cache = TenantCache::new(CachePrefix::Entity);
        let alice_key = cache.build_key("alice", "exact_name", "postgresql");
        let bob_key = cache.build_key("bob", "exact_name", "postgresql");
        cache.set(alice_key.clone(), Some("a".to_string())).await;
        cache.set(bob_key.clone(), Some("b".to_string())).await;

        cache.invalidate_user("alice").await;

        assert_eq!(cache.get(&alice_key).await, None);
        assert_eq!(cache.get(&bob_key).await, Some(Some("b".to_string())));
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(TenantCache::content_hash("hello"), TenantCache::content_hash("hello"));
        assert_ne!(TenantCache::content_hash("hello"), TenantCache::content_hash("world"));
    }

    #[test]
    fn default_ttls_match_spec() {
        assert_eq!(CachePrefix::LlmResponse.default_ttl(), Duration::from_secs(86_400));
        assert_eq!(CachePrefix::Entity.default_ttl(), Duration::from_secs(300));
        assert_eq!(CachePrefix::Embedding.default_ttl(), Duration::from_secs(30 * 86_400));
    }
}
