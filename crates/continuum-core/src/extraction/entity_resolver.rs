//! Six-stage entity resolution (spec §4.3): exact canonical match, static
//! alias dictionary, alias-field search, fuzzy string match, embedding
//! similarity, then create-new. Grounded on
//! `original_source/apps/api/services/entity_cache.py`'s two-tier
//! cache-then-lookup shape, generalized across all six stages instead of
//! just the cache layer.

use crate::extraction::embedder::cosine_similarity;
use crate::resilience::TenantCache;
use async_trait::async_trait;
use continuum_types::{CoreError, Entity, EntityId, EntityType, UserId};
use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Which stage resolved a mention, surfaced for telemetry (spec §4.3's
/// "resolution_stage" return field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    Cached,
    ExactMatch,
    AliasDictionary,
    AliasField,
    FuzzyMatch,
    EmbeddingSimilarity,
    Created,
}

/// The outcome of resolving one mention to an entity.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub entity_id: EntityId,
    pub canonical_name: String,
    pub stage: ResolutionStage,
}

/// Storage seam the resolver needs. Implemented by the graph storage layer;
/// kept local to this module so `extraction` does not depend on `graph`.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_by_id(&self, user_id: &UserId, entity_id: &EntityId) -> Result<Option<Entity>, CoreError>;
    async fn find_by_exact_name(&self, user_id: &UserId, canonical_name: &str) -> Result<Option<Entity>, CoreError>;
    async fn find_by_alias(&self, user_id: &UserId, mention: &str) -> Result<Option<Entity>, CoreError>;
    /// All of a user's entities, for the fuzzy and embedding-similarity
    /// passes (spec doesn't bound a user's entity count; the storage
    /// backend is free to cap or paginate internally).
    async fn list_entities(&self, user_id: &UserId) -> Result<Vec<Entity>, CoreError>;
    async fn create(&self, entity: Entity) -> Result<(), CoreError>;
}

/// Maps common technical aliases to their canonical entity name. Seeded with
/// defaults, then grown at runtime by the ontology updater (§4.6) —
/// `insert_if_absent` never overwrites an existing mapping so an operator
/// correction always wins over a later automatic one.
pub struct AliasDictionary {
    table: DashMap<String, String>,
}

impl Default for AliasDictionary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AliasDictionary {
    #[must_use]
    pub fn with_defaults() -> Self {
        let table = DashMap::new();
        for (alias, canonical) in DEFAULT_ALIASES {
            table.insert((*alias).to_string(), (*canonical).to_string());
        }
        Self { table }
    }

    #[must_use]
    pub fn resolve(&self, mention_lower: &str) -> Option<String> {
        self.table.get(mention_lower).map(|entry| entry.clone())
    }

    /// Add a mapping only if `alias` isn't already known.
    pub fn insert_if_absent(&self, alias: &str, canonical: &str) {
        self.table.entry(alias.to_lowercase()).or_insert_with(|| canonical.to_string());
    }

    /// Every distinct canonical name the dictionary currently maps to, for
    /// callers that need to scan free text for known entity names (e.g. a
    /// cheap mention deriver ahead of full entity resolution).
    #[must_use]
    pub fn canonical_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.iter().map(|entry| entry.value().clone()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

static DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("postgres", "PostgreSQL"),
    ("pg", "PostgreSQL"),
    ("mongo", "MongoDB"),
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("k8s", "Kubernetes"),
    ("ddb", "DynamoDB"),
    ("es", "Elasticsearch"),
    ("rmq", "RabbitMQ"),
    ("gha", "GitHub Actions"),
];

static NON_ALPHANUMERIC: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r"[^a-z0-9]+").unwrap());

fn normalize_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_ALPHANUMERIC
        .split(&lowered)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaro-Winkler similarity between two strings, in `[0.0, 1.0]`. Hand-rolled:
/// no string-similarity crate appears anywhere in the corpus stack, so this
/// follows the standard algorithm directly rather than importing one crate
/// for a single call site.
fn jaro_winkler(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let match_distance = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matches = vec![false; a.len()];
    let mut b_matches = vec![false; b.len()];
    let mut matches = 0;

    for i in 0..a.len() {
        let lo = i.saturating_sub(match_distance);
        let hi = (i + match_distance + 1).min(b.len());
        for j in lo..hi {
            if b_matches[j] || a[i] != b[j] {
                continue;
            }
            a_matches[i] = true;
            b_matches[j] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0;
    let mut k = 0;
    for i in 0..a.len() {
        if !a_matches[i] {
            continue;
        }
        while !b_matches[k] {
            k += 1;
        }
        if a[i] != b[k] {
            transpositions += 1;
        }
        k += 1;
    }
    let transpositions = transpositions / 2;

    let matches = matches as f64;
    let jaro = (matches / a.len() as f64 + matches / b.len() as f64 + (matches - transpositions as f64) / matches) / 3.0;

    let prefix_len = a.iter().zip(b.iter()).take(4).take_while(|(x, y)| x == y).count() as f64;
    jaro + prefix_len * 0.1 * (1.0 - jaro)
}

/// Token-based similarity: tokenize both strings on non-alphanumeric
/// boundaries, sort each token multiset, pair tokens positionally, and
/// length-weight the per-token Jaro-Winkler scores (DESIGN.md's entity
/// resolution stage-4 decision). Order-insensitive, so "vector database
/// postgres" and "postgres vector database" score identically.
#[must_use]
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let mut tokens_a = normalize_tokens(a);
    let mut tokens_b = normalize_tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    tokens_a.sort();
    tokens_b.sort();

    let n = tokens_a.len().max(tokens_b.len());
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for i in 0..n {
        let ta = tokens_a.get(i).cloned().unwrap_or_default();
        let tb = tokens_b.get(i).cloned().unwrap_or_default();
        let weight = ta.len().max(tb.len()).max(1) as f64;
        weighted_sum += jaro_winkler(&ta, &tb) * weight;
        total_weight += weight;
    }
    weighted_sum / total_weight
}

/// Thresholds the resolver compares similarity scores against (spec §4.3;
/// defaults mirror `Config::fuzzy_match_threshold`/`embedding_match_threshold`).
#[derive(Debug, Clone, Copy)]
pub struct ResolverThresholds {
    pub fuzzy: f64,
    pub embedding: f32,
}

/// Orchestrates the six-stage resolution pipeline over an `EntityStore`,
/// short-circuiting stages 1 and 3 through a shared two-tier cache (spec
/// §4.3's "cache absorbs repeated mentions across a session").
pub struct EntityResolver<'a> {
    store: &'a dyn EntityStore,
    alias_dict: &'a AliasDictionary,
    cache: &'a TenantCache,
    thresholds: ResolverThresholds,
}

impl<'a> EntityResolver<'a> {
    #[must_use]
    pub fn new(store: &'a dyn EntityStore, alias_dict: &'a AliasDictionary, cache: &'a TenantCache, thresholds: ResolverThresholds) -> Self {
        Self { store, alias_dict, cache, thresholds }
    }

    /// Resolve `mention` (as it appeared in text) to an entity for
    /// `user_id`, creating one of `entity_type` if every lookup stage
    /// misses. Equivalent to `resolve_with_embedding` with no mention
    /// embedding available, so stage 5 (embedding similarity) is skipped.
    pub async fn resolve(&self, user_id: &UserId, mention: &str, entity_type: EntityType) -> Result<Resolved, CoreError> {
        self.resolve_inner(user_id, mention, entity_type, None).await
    }

    /// As `resolve`, but also runs stage 5 (embedding cosine similarity)
    /// against `mention_embedding` before falling back to entity creation.
    pub async fn resolve_with_embedding(
        &self,
        user_id: &UserId,
        mention: &str,
        entity_type: EntityType,
        mention_embedding: &[f32],
    ) -> Result<Resolved, CoreError> {
        self.resolve_inner(user_id, mention, entity_type, Some(mention_embedding)).await
    }

    async fn resolve_inner(
        &self,
        user_id: &UserId,
        mention: &str,
        entity_type: EntityType,
        mention_embedding: Option<&[f32]>,
    ) -> Result<Resolved, CoreError> {
        let normalized = mention.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::Validation {
                field: "mention".to_string(),
                message: "entity mention must not be empty".to_string(),
            });
        }

        let cache_key = self.cache.build_key(user_id.0.as_str(), "resolve", &normalized);
        if let Some(Some(cached_id)) = self.cache.get(&cache_key).await {
            if let Ok(parsed) = cached_id.parse::<uuid::Uuid>() {
                let entity_id = EntityId::from_uuid(parsed);
                if let Some(entity) = self.store.find_by_id(user_id, &entity_id).await? {
                    return Ok(Resolved { entity_id: entity.id, canonical_name: entity.canonical_name, stage: ResolutionStage::Cached });
                }
            }
        }

        // Stage 1: exact canonical-name match.
        if let Some(entity) = self.store.find_by_exact_name(user_id, &normalized).await? {
            return self.hit(entity, ResolutionStage::ExactMatch, &cache_key).await;
        }

        // Stage 2: static/learned alias dictionary.
        if let Some(canonical) = self.alias_dict.resolve(&normalized) {
            if let Some(entity) = self.store.find_by_exact_name(user_id, &canonical.to_lowercase()).await? {
                return self.hit(entity, ResolutionStage::AliasDictionary, &cache_key).await;
            }
        }

        // Stage 3: search every entity's recorded aliases.
        if let Some(entity) = self.store.find_by_alias(user_id, &normalized).await? {
            return self.hit(entity, ResolutionStage::AliasField, &cache_key).await;
        }

        let candidates = self.store.list_entities(user_id).await?;

        // Stage 4: fuzzy token-similarity match.
        let fuzzy_best = candidates
            .iter()
            .map(|c| (c, token_similarity(&normalized, &c.canonical_name.to_lowercase())))
            .filter(|(_, score)| *score >= self.thresholds.fuzzy)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        if let Some((entity, _)) = fuzzy_best {
            return self.hit(entity.clone(), ResolutionStage::FuzzyMatch, &cache_key).await;
        }

        // Stage 5: embedding cosine similarity, only when the caller
        // supplied a mention embedding. Runs before creation so a match
        // here never leaves a duplicate entity behind.
        if let Some(mention_embedding) = mention_embedding {
            let embedding_best = candidates
                .iter()
                .filter_map(|c| c.embedding.as_ref().map(|vec| (c, cosine_similarity(vec, mention_embedding))))
                .filter(|(_, score)| *score >= self.thresholds.embedding)
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            if let Some((entity, _)) = embedding_best {
                return self.hit(entity.clone(), ResolutionStage::EmbeddingSimilarity, &cache_key).await;
            }
        }

        // Stage 6: create.
        let entity = Entity::new(user_id.clone(), mention.trim().to_string(), entity_type);
        self.store.create(entity.clone()).await?;
        self.hit(entity, ResolutionStage::Created, &cache_key).await
    }

    async fn hit(&self, entity: Entity, stage: ResolutionStage, cache_key: &str) -> Result<Resolved, CoreError> {
        self.cache.set(cache_key.to_string(), Some(entity.id.to_string())).await;
        Ok(Resolved { entity_id: entity.id, canonical_name: entity.canonical_name, stage })
    }
}
