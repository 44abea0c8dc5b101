//! Core data model for Continuum: decisions, entities, evolution edges, and
//! the configuration/error types shared across every other crate in the
//! workspace.

#![warn(clippy::all)]

mod config;
mod edges;
mod error;
mod ids;
mod nodes;
mod notification;

pub use config::{ConfidenceCalibrationMethod, Config, SecretString};
pub use edges::{AffectsSource, Edge, EdgeType, RelationshipRole};
pub use error::{CoreError, Result};
pub use ids::{
    CandidateId, CodeEntityKey, CommitSha, DecisionId, EdgeId, EntityId, NotificationId,
    SessionId, UserId,
};
pub use nodes::{
    CandidateDecision, CandidateStatus, CodeEntity, CommitNode, Decision, DecisionScope,
    DecisionSource, Entity, EntityType, Grounding, HumanOverride, Provenance, SourceRef, Span,
};
pub use notification::{Notification, NotificationKind};
