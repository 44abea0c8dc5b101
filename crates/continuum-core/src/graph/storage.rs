//! The storage backend trait (spec §3's data model persisted, §6's
//! "labeled-property graph store").
//!
//! Generalizes the teacher's `StorageBackend` trait
//! (`src/storage/mod.rs`) from its single `Node`/`Edge` pair to Continuum's
//! five node kinds. Kept synchronous like the teacher's trait: `sled` is an
//! embedded, non-async store, and wrapping every call in `spawn_blocking`
//! is left to callers that run on an async runtime (the graph writer does
//! this; see `writer.rs`).

use continuum_types::{
    CandidateDecision, CandidateId, CodeEntity, CodeEntityKey, CommitNode, CommitSha, Decision,
    DecisionId, Edge, EdgeId, Entity, EntityId, Result, UserId,
};
use uuid::Uuid;

/// Aggregate counts exposed by `/api/agent/summary` and admin tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageStats {
    /// Number of `Decision` nodes.
    pub decision_count: u64,
    /// Number of `Entity` nodes.
    pub entity_count: u64,
    /// Number of `CandidateDecision` nodes.
    pub candidate_count: u64,
    /// Number of `CodeEntity` nodes.
    pub code_entity_count: u64,
    /// Number of `CommitNode` nodes.
    pub commit_count: u64,
    /// Number of edges of any type.
    pub edge_count: u64,
    /// On-disk size in bytes, as reported by the backend.
    pub storage_bytes: u64,
}

/// Every persistence operation the graph writer, analyzers, and entity
/// resolver need, across all five node kinds plus edges (spec §3).
pub trait GraphStorage: Send + Sync {
    /// Insert or overwrite a decision by id (merge-on-key, spec §4.5).
    fn put_decision(&self, decision: &Decision) -> Result<()>;
    /// Fetch a decision by id.
    fn get_decision(&self, id: &DecisionId) -> Result<Option<Decision>>;
    /// List every decision owned by `user_id`, oldest first.
    fn list_decisions(&self, user_id: &UserId) -> Result<Vec<Decision>>;
    /// Delete a decision (cascades to nothing; edges are deleted separately).
    fn delete_decision(&self, id: &DecisionId) -> Result<()>;

    /// Insert or overwrite an entity by id.
    fn put_entity(&self, entity: &Entity) -> Result<()>;
    /// Fetch an entity by id.
    fn get_entity(&self, id: &EntityId) -> Result<Option<Entity>>;
    /// Case-insensitive exact match on canonical name within `user_id`'s scope.
    fn find_entity_by_exact_name(
        &self,
        user_id: &UserId,
        canonical_name: &str,
    ) -> Result<Option<Entity>>;
    /// Lookup by recorded alias (spec §4.3 stage 3).
    fn find_entity_by_alias(&self, user_id: &UserId, mention: &str) -> Result<Option<Entity>>;
    /// List every entity owned by `user_id` (used for fuzzy/embedding fallback stages).
    fn list_entities(&self, user_id: &UserId) -> Result<Vec<Entity>>;

    /// Insert or overwrite a candidate decision.
    fn put_candidate(&self, candidate: &CandidateDecision) -> Result<()>;
    /// Fetch a candidate by id.
    fn get_candidate(&self, id: &CandidateId) -> Result<Option<CandidateDecision>>;
    /// List every candidate owned by `user_id` (dormant-alternative detector).
    fn list_candidates(&self, user_id: &UserId) -> Result<Vec<CandidateDecision>>;

    /// Insert or overwrite a code entity, keyed by `(file_path, user_id)`.
    fn put_code_entity(&self, entity: &CodeEntity, key: &CodeEntityKey) -> Result<()>;
    /// Fetch a code entity by key.
    fn get_code_entity(&self, key: &CodeEntityKey) -> Result<Option<CodeEntity>>;

    /// Insert or overwrite a commit, keyed by SHA.
    fn put_commit(&self, commit: &CommitNode) -> Result<()>;
    /// Fetch a commit by SHA.
    fn get_commit(&self, sha: &CommitSha) -> Result<Option<CommitNode>>;

    /// Insert or overwrite an edge.
    fn put_edge(&self, edge: &Edge) -> Result<()>;
    /// Fetch an edge by id.
    fn get_edge(&self, id: &EdgeId) -> Result<Option<Edge>>;
    /// Delete an edge.
    fn delete_edge(&self, id: &EdgeId) -> Result<()>;
    /// Edges whose `from` is `node_id`.
    fn outgoing_edges(&self, node_id: Uuid) -> Result<Vec<Edge>>;
    /// Edges whose `to` is `node_id`.
    fn incoming_edges(&self, node_id: Uuid) -> Result<Vec<Edge>>;

    /// Force pending writes to durable storage.
    fn flush(&self) -> Result<()>;
    /// Aggregate counts across every tree.
    fn stats(&self) -> Result<StorageStats>;
}
