//! `sled`-backed implementation of [`GraphStorage`].
//!
//! No teacher source survives for this file (`src/storage/sled_backend.rs`
//! is declared by `mod.rs` but absent from the pack), so the tree layout
//! below is designed fresh against the teacher's `StorageBackend` trait
//! contract: one tree per node kind, plus small secondary-index trees for
//! the lookups the entity resolver and graph writer actually issue
//! (by-user listing, by-name, by-alias, outgoing/incoming edge scans).
//! Values are encoded with [`serialization::encode`]; keys are built so that
//! `sled`'s prefix scan (`scan_prefix`) does the filtering instead of a
//! full-tree walk followed by in-memory filtering.

use super::serialization::{decode, encode};
use super::storage::{GraphStorage, StorageStats};
use continuum_types::{
    CandidateDecision, CandidateId, CodeEntity, CodeEntityKey, CommitNode, CommitSha, Decision,
    DecisionId, Edge, EdgeId, Entity, EntityId, Result, UserId,
};
use continuum_types::CoreError;
use sled::{Db, Tree};
use uuid::Uuid;

const SEP: u8 = 0x00;

fn user_prefix(user_id: &UserId) -> Vec<u8> {
    let mut key = user_id.0.as_bytes().to_vec();
    key.push(SEP);
    key
}

fn user_keyed(user_id: &UserId, id_bytes: &[u8]) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(id_bytes);
    key
}

fn user_text_key(user_id: &UserId, text: &str) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(text.trim().to_lowercase().as_bytes());
    key
}

/// An embedded, durable implementation of [`GraphStorage`] over a single
/// `sled::Db`. Opens (or creates) one tree per node kind plus the indexes
/// above; `GraphWriter` is responsible for wrapping calls in
/// `spawn_blocking` since `sled`'s API is synchronous (spec §5's suspension
/// points include "graph I/O", but the blocking happens at the OS page
/// cache, not inside this struct).
pub struct SledGraphStorage {
    db: Db,
    decisions: Tree,
    decisions_by_user: Tree,
    entities: Tree,
    entities_by_user: Tree,
    entities_by_name: Tree,
    entities_by_alias: Tree,
    candidates: Tree,
    candidates_by_user: Tree,
    code_entities: Tree,
    commits: Tree,
    edges: Tree,
    edges_out: Tree,
    edges_in: Tree,
}

impl SledGraphStorage {
    /// Open (or create) a `sled` database at `path`.
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| CoreError::StorageFailure(format!("sled open failed: {e}")))?;
        Self::from_db(db)
    }

    /// Open a temporary, process-local database (tests, single-shot CLI runs).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| CoreError::StorageFailure(format!("sled open failed: {e}")))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        let open_tree = |name: &str| -> Result<Tree> {
            db.open_tree(name)
                .map_err(|e| CoreError::StorageFailure(format!("open tree {name} failed: {e}")))
        };
        Ok(Self {
            decisions: open_tree("decisions")?,
            decisions_by_user: open_tree("decisions_by_user")?,
            entities: open_tree("entities")?,
            entities_by_user: open_tree("entities_by_user")?,
            entities_by_name: open_tree("entities_by_name")?,
            entities_by_alias: open_tree("entities_by_alias")?,
            candidates: open_tree("candidates")?,
            candidates_by_user: open_tree("candidates_by_user")?,
            code_entities: open_tree("code_entities")?,
            commits: open_tree("commits")?,
            edges: open_tree("edges")?,
            edges_out: open_tree("edges_out")?,
            edges_in: open_tree("edges_in")?,
            db,
        })
    }

    fn insert_indexed(tree: &Tree, key: &[u8], value: &[u8]) -> Result<()> {
        tree.insert(key, value)
            .map_err(|e| CoreError::StorageFailure(format!("sled insert failed: {e}")))?;
        Ok(())
    }

    fn scan_decoded<T: serde::de::DeserializeOwned>(tree: &Tree, prefix: &[u8]) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix) {
            let (_, value) =
                item.map_err(|e| CoreError::StorageFailure(format!("sled scan failed: {e}")))?;
            out.push(decode(&value)?);
        }
        Ok(out)
    }
}

impl GraphStorage for SledGraphStorage {
    fn put_decision(&self, decision: &Decision) -> Result<()> {
        let id_bytes = decision.id.as_uuid().as_bytes().to_vec();
        let bytes = encode(decision)?;
        Self::insert_indexed(&self.decisions, &id_bytes, &bytes)?;
        let index_key = user_keyed(&decision.user_id, &id_bytes);
        Self::insert_indexed(&self.decisions_by_user, &index_key, &id_bytes)?;
        Ok(())
    }

    fn get_decision(&self, id: &DecisionId) -> Result<Option<Decision>> {
        let maybe = self
            .decisions
            .get(id.as_uuid().as_bytes())
            .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?;
        maybe.map(|v| decode(&v)).transpose()
    }

    fn list_decisions(&self, user_id: &UserId) -> Result<Vec<Decision>> {
        let prefix = user_prefix(user_id);
        let mut out = Vec::new();
        for item in self.decisions_by_user.scan_prefix(&prefix) {
            let (_, id_bytes) =
                item.map_err(|e| CoreError::StorageFailure(format!("sled scan failed: {e}")))?;
            let uuid = Uuid::from_slice(&id_bytes)
                .map_err(|e| CoreError::StorageFailure(format!("corrupt id index: {e}")))?;
            if let Some(decision) = self.get_decision(&DecisionId::from_uuid(uuid))? {
                out.push(decision);
            }
        }
        out.sort_by_key(|d| d.created_at);
        Ok(out)
    }

    fn delete_decision(&self, id: &DecisionId) -> Result<()> {
        if let Some(decision) = self.get_decision(id)? {
            let id_bytes = id.as_uuid().as_bytes().to_vec();
            let index_key = user_keyed(&decision.user_id, &id_bytes);
            self.decisions_by_user
                .remove(&index_key)
                .map_err(|e| CoreError::StorageFailure(format!("sled remove failed: {e}")))?;
        }
        self.decisions
            .remove(id.as_uuid().as_bytes())
            .map_err(|e| CoreError::StorageFailure(format!("sled remove failed: {e}")))?;
        Ok(())
    }

    fn put_entity(&self, entity: &Entity) -> Result<()> {
        let id_bytes = entity.id.as_uuid().as_bytes().to_vec();
        let bytes = encode(entity)?;
        Self::insert_indexed(&self.entities, &id_bytes, &bytes)?;
        Self::insert_indexed(
            &self.entities_by_user,
            &user_keyed(&entity.user_id, &id_bytes),
            &id_bytes,
        )?;
        Self::insert_indexed(
            &self.entities_by_name,
            &user_text_key(&entity.user_id, &entity.canonical_name),
            &id_bytes,
        )?;
        for alias in &entity.aliases {
            Self::insert_indexed(
                &self.entities_by_alias,
                &user_text_key(&entity.user_id, alias),
                &id_bytes,
            )?;
        }
        Ok(())
    }

    fn get_entity(&self, id: &EntityId) -> Result<Option<Entity>> {
        let maybe = self
            .entities
            .get(id.as_uuid().as_bytes())
            .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?;
        maybe.map(|v| decode(&v)).transpose()
    }

    fn find_entity_by_exact_name(
        &self,
        user_id: &UserId,
        canonical_name: &str,
    ) -> Result<Option<Entity>> {
        let key = user_text_key(user_id, canonical_name);
        let maybe = self
            .entities_by_name
            .get(&key)
            .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?;
        match maybe {
            None => Ok(None),
            Some(id_bytes) => {
                let uuid = Uuid::from_slice(&id_bytes)
                    .map_err(|e| CoreError::StorageFailure(format!("corrupt id index: {e}")))?;
                self.get_entity(&EntityId::from_uuid(uuid))
            }
        }
    }

    fn find_entity_by_alias(&self, user_id: &UserId, mention: &str) -> Result<Option<Entity>> {
        let key = user_text_key(user_id, mention);
        let maybe = self
            .entities_by_alias
            .get(&key)
            .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?;
        match maybe {
            None => Ok(None),
            Some(id_bytes) => {
                let uuid = Uuid::from_slice(&id_bytes)
                    .map_err(|e| CoreError::StorageFailure(format!("corrupt id index: {e}")))?;
                self.get_entity(&EntityId::from_uuid(uuid))
            }
        }
    }

    fn list_entities(&self, user_id: &UserId) -> Result<Vec<Entity>> {
        let prefix = user_prefix(user_id);
        let mut out = Vec::new();
        for item in self.entities_by_user.scan_prefix(&prefix) {
            let (_, id_bytes) =
                item.map_err(|e| CoreError::StorageFailure(format!("sled scan failed: {e}")))?;
            let uuid = Uuid::from_slice(&id_bytes)
                .map_err(|e| CoreError::StorageFailure(format!("corrupt id index: {e}")))?;
            if let Some(entity) = self.get_entity(&EntityId::from_uuid(uuid))? {
                out.push(entity);
            }
        }
        Ok(out)
    }

    fn put_candidate(&self, candidate: &CandidateDecision) -> Result<()> {
        let id_bytes = candidate.id.as_uuid().as_bytes().to_vec();
        let bytes = encode(candidate)?;
        Self::insert_indexed(&self.candidates, &id_bytes, &bytes)?;
        Self::insert_indexed(
            &self.candidates_by_user,
            &user_keyed(&candidate.user_id, &id_bytes),
            &id_bytes,
        )?;
        Ok(())
    }

    fn get_candidate(&self, id: &CandidateId) -> Result<Option<CandidateDecision>> {
        let maybe = self
            .candidates
            .get(id.as_uuid().as_bytes())
            .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?;
        maybe.map(|v| decode(&v)).transpose()
    }

    fn list_candidates(&self, user_id: &UserId) -> Result<Vec<CandidateDecision>> {
        let prefix = user_prefix(user_id);
        let mut out = Vec::new();
        for item in self.candidates_by_user.scan_prefix(&prefix) {
            let (_, id_bytes) =
                item.map_err(|e| CoreError::StorageFailure(format!("sled scan failed: {e}")))?;
            let uuid = Uuid::from_slice(&id_bytes)
                .map_err(|e| CoreError::StorageFailure(format!("corrupt id index: {e}")))?;
            if let Some(candidate) = self.get_candidate(&CandidateId::from_uuid(uuid))? {
                out.push(candidate);
            }
        }
        Ok(out)
    }

    fn put_code_entity(&self, entity: &CodeEntity, key: &CodeEntityKey) -> Result<()> {
        let bytes = encode(entity)?;
        let tree_key = format!("{key}");
        Self::insert_indexed(&self.code_entities, tree_key.as_bytes(), &bytes)
    }

    fn get_code_entity(&self, key: &CodeEntityKey) -> Result<Option<CodeEntity>> {
        let tree_key = format!("{key}");
        let maybe = self
            .code_entities
            .get(tree_key.as_bytes())
            .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?;
        maybe.map(|v| decode(&v)).transpose()
    }

    fn put_commit(&self, commit: &CommitNode) -> Result<()> {
        let bytes = encode(commit)?;
        Self::insert_indexed(&self.commits, commit.sha.0.as_bytes(), &bytes)
    }

    fn get_commit(&self, sha: &CommitSha) -> Result<Option<CommitNode>> {
        let maybe = self
            .commits
            .get(sha.0.as_bytes())
            .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?;
        maybe.map(|v| decode(&v)).transpose()
    }

    fn put_edge(&self, edge: &Edge) -> Result<()> {
        let id_bytes = edge.id.as_uuid().as_bytes().to_vec();
        let bytes = encode(edge)?;
        Self::insert_indexed(&self.edges, &id_bytes, &bytes)?;

        let mut out_key = edge.from.as_bytes().to_vec();
        out_key.extend_from_slice(&id_bytes);
        Self::insert_indexed(&self.edges_out, &out_key, &id_bytes)?;

        let mut in_key = edge.to.as_bytes().to_vec();
        in_key.extend_from_slice(&id_bytes);
        Self::insert_indexed(&self.edges_in, &in_key, &id_bytes)?;
        Ok(())
    }

    fn get_edge(&self, id: &EdgeId) -> Result<Option<Edge>> {
        let maybe = self
            .edges
            .get(id.as_uuid().as_bytes())
            .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?;
        maybe.map(|v| decode(&v)).transpose()
    }

    fn delete_edge(&self, id: &EdgeId) -> Result<()> {
        if let Some(edge) = self.get_edge(id)? {
            let id_bytes = id.as_uuid().as_bytes().to_vec();
            let mut out_key = edge.from.as_bytes().to_vec();
            out_key.extend_from_slice(&id_bytes);
            self.edges_out
                .remove(&out_key)
                .map_err(|e| CoreError::StorageFailure(format!("sled remove failed: {e}")))?;

            let mut in_key = edge.to.as_bytes().to_vec();
            in_key.extend_from_slice(&id_bytes);
            self.edges_in
                .remove(&in_key)
                .map_err(|e| CoreError::StorageFailure(format!("sled remove failed: {e}")))?;
        }
        self.edges
            .remove(id.as_uuid().as_bytes())
            .map_err(|e| CoreError::StorageFailure(format!("sled remove failed: {e}")))?;
        Ok(())
    }

    fn outgoing_edges(&self, node_id: Uuid) -> Result<Vec<Edge>> {
        Self::scan_decoded_edges(&self.edges, &self.edges_out, node_id.as_bytes())
    }

    fn incoming_edges(&self, node_id: Uuid) -> Result<Vec<Edge>> {
        Self::scan_decoded_edges(&self.edges, &self.edges_in, node_id.as_bytes())
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| CoreError::StorageFailure(format!("sled flush failed: {e}")))?;
        Ok(())
    }

    fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            decision_count: self.decisions.len() as u64,
            entity_count: self.entities.len() as u64,
            candidate_count: self.candidates.len() as u64,
            code_entity_count: self.code_entities.len() as u64,
            commit_count: self.commits.len() as u64,
            edge_count: self.edges.len() as u64,
            storage_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }
}

impl SledGraphStorage {
    fn scan_decoded_edges(edges: &Tree, index: &Tree, prefix: &[u8]) -> Result<Vec<Edge>> {
        let mut out = Vec::new();
        for item in index.scan_prefix(prefix) {
            let (_, id_bytes) =
                item.map_err(|e| CoreError::StorageFailure(format!("sled scan failed: {e}")))?;
            if let Some(bytes) = edges
                .get(&id_bytes)
                .map_err(|e| CoreError::StorageFailure(format!("sled get failed: {e}")))?
            {
                out.push(decode(&bytes)?);
            }
        }
        Ok(out)
    }
}
