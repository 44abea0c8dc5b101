//! Edge types connecting nodes in the decision-memory graph (spec §3).

use crate::ids::EdgeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Every edge kind the graph layer writes (spec §3's edge table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// Decision → Entity: decision mentions/uses entity.
    Involves,
    /// CandidateDecision → Decision: this alternative was considered and not chosen.
    RejectedBy,
    /// Decision_new → Decision_old: newer decision replaces older one.
    Supersedes,
    /// Decision ↔ Decision: two decisions disagree and are unresolved.
    Contradicts,
    /// Decision ↔ Decision: cosine similarity ≥ threshold (undirected in semantics).
    SimilarTo,
    /// Decision → CodeEntity: decision touches this file.
    Affects,
    /// Decision → CommitNode: commit likely implements this decision.
    ImplementedBy,
    /// CommitNode → CodeEntity: commit modified this file.
    Touches,
    /// Decision_inv → Decision_old: a later decision invalidates an earlier assumption.
    AssumptionInvalidated,
    /// Decision → Decision: temporal adjacency, forward direction.
    Follows,
    /// Decision → Decision: temporal adjacency, backward direction.
    Precedes,
}

impl EdgeType {
    /// Edge types whose semantics are symmetric even though storage is
    /// directed (`CONTRADICTS`, `SIMILAR_TO` per spec §3).
    #[must_use]
    pub fn is_symmetric(self) -> bool {
        matches!(self, Self::Contradicts | Self::SimilarTo)
    }
}

/// Role an entity plays within a decision it `INVOLVES` (free-form but
/// recorded for telemetry, spec §3's "relationship-role attribute").
pub type RelationshipRole = String;

/// How an `AFFECTS` edge was derived (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectsSource {
    /// Derived from the session's recorded tool calls.
    ToolCall,
    /// Inferred from file-path mentions in the decision text.
    Inferred,
}

/// A directed edge instance, carrying type-specific properties in a flat
/// string map (mirrors the teacher's `Edge::properties` shape) plus a few
/// typed convenience fields used by the analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge id.
    pub id: EdgeId,
    /// Source node id (opaque — interpretation depends on `edge_type`).
    pub from: uuid::Uuid,
    /// Target node id.
    pub to: uuid::Uuid,
    /// Relationship kind.
    pub edge_type: EdgeType,
    /// When the edge was created.
    pub created_at: DateTime<Utc>,
    /// Free-form properties (relationship role, score, detected assumption text, etc).
    pub properties: HashMap<String, String>,
}

impl Edge {
    /// Create an edge with no properties.
    #[must_use]
    pub fn new(from: uuid::Uuid, to: uuid::Uuid, edge_type: EdgeType) -> Self {
        Self {
            id: EdgeId::new(),
            from,
            to,
            edge_type,
            created_at: Utc::now(),
            properties: HashMap::new(),
        }
    }

    /// Create an edge with an initial property set.
    #[must_use]
    pub fn with_properties(
        from: uuid::Uuid,
        to: uuid::Uuid,
        edge_type: EdgeType,
        properties: HashMap<String, String>,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            from,
            to,
            edge_type,
            created_at: Utc::now(),
            properties,
        }
    }

    /// Set a property, returning `self` for chaining at construction sites.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Read a numeric property (e.g. `score`, `similarity`) if present and parseable.
    #[must_use]
    pub fn numeric_property(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(|v| v.parse().ok())
    }
}
