//! Graph Writer & Relationship Analyzer (spec §4.5).
//!
//! Persists a newly extracted decision and its derived structure in the
//! order the spec mandates, then runs evolution analysis against the
//! user's recent decisions that share at least one entity. Grounded on
//! `src/storage/mod.rs`'s synchronous `StorageBackend` (wrapped here in
//! `spawn_blocking` since the writer itself runs on the async runtime that
//! also drives LLM/embedding calls) plus `extraction::entity_resolver` and
//! `extraction::embedder` for the entity/embedding steps.

use crate::extraction::embedder::{cosine_similarity, embed_decision_fields, embed_entity_text, DecisionEmbeddingFields};
use crate::extraction::entity_resolver::{EntityResolver, EntityStore};
use crate::extraction::{sanitize_prompt, ExtractedDecision};
use crate::graph::storage::GraphStorage;
use crate::llm::{paired_evolution_prompt, ChatMessage, EmbeddingProvider, ResilientLlmClient};
use crate::resilience::{CachePrefix, TenantCache};
use async_trait::async_trait;
use continuum_types::{
    AffectsSource, CandidateDecision, CoreError, Decision, Edge, EdgeType, Entity, EntityType,
    Result, UserId,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// How confidently an evolution edge must be classified before it is
/// persisted (spec §4.5: "only edges above configured confidence").
pub const MIN_EVOLUTION_CONFIDENCE: f32 = 0.6;

/// How many of the user's most recent same-entity decisions are compared
/// against the new one for evolution analysis.
pub const EVOLUTION_CANDIDATE_WINDOW: usize = 10;

/// Adapter making [`GraphStorage`] (sync) satisfy [`EntityStore`] (async),
/// so `EntityResolver` can be driven from the writer without depending on
/// the concrete backend. Every call is dispatched onto a blocking thread.
pub struct StorageEntityStore {
    storage: Arc<dyn GraphStorage>,
}

impl StorageEntityStore {
    #[must_use]
    pub fn new(storage: Arc<dyn GraphStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl EntityStore for StorageEntityStore {
    async fn find_by_id(
        &self,
        _user_id: &UserId,
        entity_id: &continuum_types::EntityId,
    ) -> Result<Option<Entity>> {
        let storage = self.storage.clone();
        let id = *entity_id;
        tokio::task::spawn_blocking(move || storage.get_entity(&id))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))?
    }

    async fn find_by_exact_name(
        &self,
        user_id: &UserId,
        canonical_name: &str,
    ) -> Result<Option<Entity>> {
        let storage = self.storage.clone();
        let user_id = user_id.clone();
        let name = canonical_name.to_string();
        tokio::task::spawn_blocking(move || storage.find_entity_by_exact_name(&user_id, &name))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))?
    }

    async fn find_by_alias(&self, user_id: &UserId, mention: &str) -> Result<Option<Entity>> {
        let storage = self.storage.clone();
        let user_id = user_id.clone();
        let mention = mention.to_string();
        tokio::task::spawn_blocking(move || storage.find_entity_by_alias(&user_id, &mention))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))?
    }

    async fn list_entities(&self, user_id: &UserId) -> Result<Vec<Entity>> {
        let storage = self.storage.clone();
        let user_id = user_id.clone();
        tokio::task::spawn_blocking(move || storage.list_entities(&user_id))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))?
    }

    async fn create(&self, entity: Entity) -> Result<()> {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || storage.put_entity(&entity))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))?
    }
}

/// A resolved entity mention plus the relationship role it plays in the
/// decision text (spec §4.5's "relationship role attribute").
pub struct MentionedEntity {
    pub mention: String,
    pub entity_type: EntityType,
    pub role: String,
}

/// Tool-call-derived or text-inferred file path affected by a decision.
pub struct AffectedFile {
    pub file_path: String,
    pub source: AffectsSource,
}

#[derive(Debug, Deserialize)]
struct EvolutionVerdict {
    relationship: String,
    confidence: f32,
    #[allow(dead_code)]
    reasoning: String,
}

/// Orchestrates the write path described in spec §4.5.
pub struct GraphWriter {
    storage: Arc<dyn GraphStorage>,
    llm: Arc<ResilientLlmClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    similarity_threshold: f32,
    entity_cache: TenantCache,
}

impl GraphWriter {
    #[must_use]
    pub fn new(
        storage: Arc<dyn GraphStorage>,
        llm: Arc<ResilientLlmClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            storage,
            llm,
            embedder,
            similarity_threshold,
            entity_cache: TenantCache::new(CachePrefix::Entity),
        }
    }

    /// Persist `extracted` as a `Decision`, its rejected candidates, entity
    /// edges, affected-file edges, and evolution edges, in the order spec
    /// §4.5 mandates. Returns the created decision.
    pub async fn persist_decision(
        &self,
        user_id: &UserId,
        project: Option<String>,
        source: continuum_types::DecisionSource,
        extracted: ExtractedDecision,
        mentions: Vec<MentionedEntity>,
        tool_call_files: Vec<String>,
        alias_dict: &crate::extraction::AliasDictionary,
        resolver_thresholds: crate::extraction::ResolverThresholds,
    ) -> Result<Decision> {
        if extracted.options.is_empty() {
            return Err(CoreError::Validation {
                field: "options".to_string(),
                message: "decision must have at least one option".to_string(),
            });
        }

        let mut decision = Decision::new(
            user_id.clone(),
            project,
            extracted.trigger,
            extracted.context,
            extracted.agent_decision,
            extracted.agent_rationale,
            extracted.options,
            extracted.scope,
            extracted.assumptions,
            source,
            extracted.provenance,
        );
        decision.set_confidence(extracted.confidence);
        decision.grounding = extracted.grounding;

        let fields = DecisionEmbeddingFields {
            title: &decision.agent_decision,
            decision: &decision.agent_decision,
            rationale: &decision.agent_rationale,
            context: &decision.context,
            trigger: &decision.trigger,
        };
        decision.embedding = embed_decision_fields(self.embedder.as_ref(), &fields).await.ok();

        self.put_decision(&decision).await?;

        for option in decision.rejected_options().iter().map(|s| s.to_string()).collect::<Vec<_>>() {
            let candidate = CandidateDecision::new(option, &decision);
            self.put_candidate(&candidate).await?;
            let edge = Edge::new(
                *candidate.id.as_uuid(),
                *decision.id.as_uuid(),
                EdgeType::RejectedBy,
            );
            self.put_edge(&edge).await?;
        }

        let entity_store = StorageEntityStore::new(self.storage.clone());
        let resolver = EntityResolver::new(&entity_store, alias_dict, &self.entity_cache, resolver_thresholds);
        for mentioned in mentions {
            let sanitized = sanitize_prompt(&mentioned.mention);
            if sanitized.risk_level >= crate::extraction::InjectionRiskLevel::High {
                continue;
            }
            let mention_embedding = embed_entity_text(self.embedder.as_ref(), &sanitized.sanitized_text).await.ok();
            let resolved = match &mention_embedding {
                Some(embedding) => {
                    resolver.resolve_with_embedding(user_id, &sanitized.sanitized_text, mentioned.entity_type, embedding).await?
                }
                None => resolver.resolve(user_id, &sanitized.sanitized_text, mentioned.entity_type).await?,
            };
            let edge = Edge::new(*decision.id.as_uuid(), *resolved.entity_id.as_uuid(), EdgeType::Involves)
                .with_property("relationship_role", mentioned.role)
                .with_property("resolution_stage", format!("{:?}", resolved.stage));
            self.put_edge(&edge).await?;
        }

        for file_path in tool_call_files {
            self.attach_affected_file(&decision, AffectedFile { file_path, source: AffectsSource::ToolCall }).await?;
        }
        for file_path in infer_file_mentions(&decision.context) {
            self.attach_affected_file(&decision, AffectedFile { file_path, source: AffectsSource::Inferred }).await?;
        }

        self.analyze_evolution(user_id, &decision).await?;

        Ok(decision)
    }

    async fn attach_affected_file(&self, decision: &Decision, file: AffectedFile) -> Result<()> {
        let key = continuum_types::CodeEntityKey {
            file_path: file.file_path.clone(),
            user_id: decision.user_id.clone(),
        };
        let storage = self.storage.clone();
        let existing = {
            let key = key.clone();
            tokio::task::spawn_blocking(move || storage.get_code_entity(&key))
                .await
                .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))??
        };
        if existing.is_none() {
            let entity = continuum_types::CodeEntity::new(key.clone());
            let storage = self.storage.clone();
            let put_key = key.clone();
            tokio::task::spawn_blocking(move || storage.put_code_entity(&entity, &put_key))
                .await
                .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))??;
        }

        let source_str = match file.source {
            AffectsSource::ToolCall => "tool_call",
            AffectsSource::Inferred => "inferred",
        };
        let code_entity_uuid = code_entity_key_uuid(&key);
        let edge = Edge::new(*decision.id.as_uuid(), code_entity_uuid, EdgeType::Affects)
            .with_property("source", source_str)
            .with_property("file_path", file.file_path);
        self.put_edge(&edge).await
    }

    async fn analyze_evolution(&self, user_id: &UserId, decision: &Decision) -> Result<()> {
        let Some(new_embedding) = decision.embedding.as_ref() else { return Ok(()) };

        let storage = self.storage.clone();
        let user_id_owned = user_id.clone();
        let all_decisions = tokio::task::spawn_blocking(move || storage.list_decisions(&user_id_owned))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))??;

        let new_involves = self.involved_entity_ids(decision).await?;

        let mut candidates: Vec<&Decision> = Vec::new();
        for prior in &all_decisions {
            if prior.id == decision.id {
                continue;
            }
            let prior_involves = self.involved_entity_ids(prior).await?;
            if prior_involves.iter().any(|id| new_involves.contains(id)) {
                candidates.push(prior);
            }
        }
        candidates.sort_by_key(|d| std::cmp::Reverse(d.created_at));
        candidates.truncate(EVOLUTION_CANDIDATE_WINDOW);

        for prior in candidates {
            if let Some(prior_embedding) = prior.embedding.as_ref() {
                let similarity = cosine_similarity(new_embedding, prior_embedding);
                if similarity >= self.similarity_threshold {
                    let edge = Edge::new(*decision.id.as_uuid(), *prior.id.as_uuid(), EdgeType::SimilarTo)
                        .with_property("similarity", similarity.to_string());
                    self.put_edge(&edge).await?;
                }
            }

            if let Ok(verdict) = self.classify_evolution(&decision.agent_decision, &prior.agent_decision).await {
                if verdict.confidence < MIN_EVOLUTION_CONFIDENCE {
                    continue;
                }
                let edge_type = match verdict.relationship.to_uppercase().as_str() {
                    "SUPERSEDES" => Some(EdgeType::Supersedes),
                    "CONTRADICTS" => Some(EdgeType::Contradicts),
                    "SIMILAR_TO" => Some(EdgeType::SimilarTo),
                    _ => None,
                };
                if let Some(edge_type) = edge_type {
                    let edge = Edge::new(*decision.id.as_uuid(), *prior.id.as_uuid(), edge_type)
                        .with_property("confidence", verdict.confidence.to_string());
                    self.put_edge(&edge).await?;
                }
            }
        }
        Ok(())
    }

    async fn classify_evolution(&self, new_decision: &str, prior_decision: &str) -> Result<EvolutionVerdict> {
        let prompt = paired_evolution_prompt(new_decision, prior_decision);
        let messages = [ChatMessage::user(prompt)];
        let (response, _) = self.llm.generate("system", &messages, 0.0, 300, "evolution-v1").await?;
        let value = crate::extraction::extract_json_from_response(&response, false)
            .ok_or_else(|| CoreError::Internal("evolution classifier returned no JSON".to_string()))?;
        serde_json::from_value(value).map_err(CoreError::from)
    }

    async fn involved_entity_ids(&self, decision: &Decision) -> Result<Vec<Uuid>> {
        let storage = self.storage.clone();
        let decision_uuid = *decision.id.as_uuid();
        let edges = tokio::task::spawn_blocking(move || storage.outgoing_edges(decision_uuid))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))??;
        Ok(edges
            .into_iter()
            .filter(|e| e.edge_type == EdgeType::Involves)
            .map(|e| e.to)
            .collect())
    }

    async fn put_decision(&self, decision: &Decision) -> Result<()> {
        let storage = self.storage.clone();
        let decision = decision.clone();
        tokio::task::spawn_blocking(move || storage.put_decision(&decision))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))?
    }

    async fn put_candidate(&self, candidate: &CandidateDecision) -> Result<()> {
        let storage = self.storage.clone();
        let candidate = candidate.clone();
        tokio::task::spawn_blocking(move || storage.put_candidate(&candidate))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))?
    }

    async fn put_edge(&self, edge: &Edge) -> Result<()> {
        let storage = self.storage.clone();
        let edge = edge.clone();
        tokio::task::spawn_blocking(move || storage.put_edge(&edge))
            .await
            .map_err(|e| CoreError::Internal(format!("blocking task join failed: {e}")))?
    }
}

/// Deterministic UUID for a `CodeEntity`'s composite key, so `AFFECTS` edges
/// can target it as a plain `Uuid` the same way decisions and entities do.
/// `pub(crate)` so the commit linker (`analyzers::commit_linker`) can derive
/// the same node id for a commit's changed files without a reverse lookup.
pub(crate) fn code_entity_key_uuid(key: &continuum_types::CodeEntityKey) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, key.to_string().as_bytes())
}

const FILE_PATH_PATTERN_CHARS: &[char] = &['/', '.'];

/// Crude file-path inference over decision context text (spec §4.5's
/// "optionally ... inferred from the text"): looks for path-shaped tokens
/// containing a slash or a recognized source extension.
fn infer_file_mentions(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|tok| tok.trim_matches(|c: char| !c.is_alphanumeric() && !FILE_PATH_PATTERN_CHARS.contains(&c)))
        .filter(|tok| {
            tok.contains('/')
                && (tok.ends_with(".rs")
                    || tok.ends_with(".py")
                    || tok.ends_with(".ts")
                    || tok.ends_with(".js")
                    || tok.ends_with(".go")
                    || tok.ends_with(".java"))
        })
        .map(ToString::to_string)
        .collect()
}
