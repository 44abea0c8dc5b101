//! Contract types for the Decision Memory Agent.
//!
//! These mirror `continuum_types`'s node shapes where the domain overlaps
//! (`DecisionScope`, `DecisionSource`) and add the audit-envelope fields
//! specific to this agent's capture pipeline.

use chrono::{DateTime, Utc};
use continuum_types::{DecisionScope, DecisionSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// Decision result types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionResultType {
    /// Decision executed successfully
    Success,
    /// Decision failed
    Failure,
    /// Partial execution
    Partial,
    /// Execution deferred
    Deferred,
}

/// Artifact types for reasoning capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningArtifactType {
    /// Prompt template used
    PromptTemplate,
    /// Chain of thought reasoning
    ChainOfThought,
    /// Evaluation criteria applied
    EvaluationCriteria,
    /// Constraints that were considered
    Constraints,
    /// Snapshot of context at decision time
    ContextSnapshot,
    /// Tool execution trace
    ToolTrace,
}

/// Graph node types for decision memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionNodeType {
    /// Decision node
    Decision,
    /// Outcome node
    Outcome,
    /// Artifact node
    Artifact,
    /// Conversation node the decision was captured from
    Conversation,
}

/// Graph edge types for decision memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionEdgeType {
    /// Decision has an outcome
    HasOutcome,
    /// Decision has an artifact
    HasArtifact,
    /// Decision follows another decision
    Follows,
    /// Node is part of a conversation
    PartOf,
    /// Artifact derived from another
    DerivedFrom,
}

/// Constraints applied during decision capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionConstraint {
    /// Conversation boundary constraint
    ConversationBoundary,
    /// Maximum artifacts limit
    MaxArtifacts,
    /// Content size limit
    ContentSizeLimit,
    /// PII redaction applied
    PiiRedaction,
    /// Retention policy constraint
    RetentionPolicy,
}

/// Deployment environment the capture ran in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentType {
    /// Development environment
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Outcome metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeMetrics {
    /// Time between the decision and its recorded outcome, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Total tokens consumed by the extraction/capture call, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_consumed: Option<u64>,
    /// Number of retry attempts the capture required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Estimated cost in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_estimate_usd: Option<f64>,
}

/// Decision outcome, recorded after the fact by a follow-up capture.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DecisionOutcome {
    /// Unique identifier for this outcome
    pub outcome_id: Uuid,
    /// Reference to the decision this outcome relates to
    pub decision_ref: Uuid,
    /// Type of outcome result
    pub result_type: DecisionResultType,
    /// Outcome-specific result payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_data: Option<serde_json::Value>,
    /// Outcome metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<OutcomeMetrics>,
    /// When the outcome was recorded
    pub recorded_at: DateTime<Utc>,
}

/// A piece of evidence grounding a decision's rationale — a prompt
/// template, a chain-of-thought excerpt, a tool trace. Conceptually the
/// same "grounding" idea as `continuum_types::Grounding`, but structured as
/// a first-class, independently addressable node so several artifacts can
/// attach to one decision and reference each other (`parent_artifact_id`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReasoningArtifact {
    /// Unique identifier for this artifact
    pub artifact_id: Uuid,
    /// Type of reasoning artifact
    pub artifact_type: ReasoningArtifactType,
    /// SHA-256 hash of the artifact content
    #[validate(length(equal = 64))]
    pub content_hash: String,
    /// Reference to artifact content in an external content store, if the
    /// content itself is too large to inline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_ref: Option<String>,
    /// Reference to parent artifact for lineage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_artifact_id: Option<Uuid>,
    /// When the artifact was created
    pub created_at: DateTime<Utc>,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Envelope metadata for a decision capture: where it came from, which
/// conversation it belongs to, and what agent/environment produced it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DecisionContext {
    /// Conversation (or log episode) this decision was captured from
    pub conversation_id: Uuid,
    /// Coding agent that produced the decision (e.g. `"claude-code"`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Previous decision in the chain, if this one follows from it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predecessor_decision_id: Option<Uuid>,
    /// Turn number in the conversation the decision appeared at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_turn: Option<u32>,
    /// Project this decision belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Where this capture originated
    pub source: DecisionSource,
    /// Owning user (anonymized/hashed upstream if required)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Deployment environment this capture ran in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentType>,
}

/// Decision memory input: the decision itself plus its capture envelope.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DecisionMemoryInput {
    /// Unique identifier for the decision being captured
    pub decision_id: Uuid,
    /// Type/category of decision (always `decision_memory_capture` once
    /// through the agent; kept as an input field so replay can re-tag it)
    #[validate(length(min = 1))]
    pub decision_type: String,
    /// Capture envelope
    #[validate]
    pub context: DecisionContext,
    /// What prompted the decision
    pub trigger: String,
    /// Surrounding context for the decision
    pub context_text: String,
    /// The choice that was made
    pub agent_decision: String,
    /// Why it was made
    pub agent_rationale: String,
    /// Nonempty ordered list of options considered
    #[validate(length(min = 1))]
    pub options: Vec<String>,
    /// Assumptions this decision depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assumptions: Vec<String>,
    /// Staleness/evolution scope
    pub scope: DecisionScope,
    /// Extraction confidence in [0, 1]
    pub confidence: f32,
    /// Artifacts capturing the reasoning process
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasoning_artifacts: Vec<ReasoningArtifact>,
    /// Decision outcome, if this capture is a follow-up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DecisionOutcome>,
    /// Tags for categorization and retrieval
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Graph node created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNodeCreated {
    /// Node identifier
    pub node_id: Uuid,
    /// Node type
    pub node_type: DecisionNodeType,
}

/// Graph edge created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdgeCreated {
    /// Edge identifier
    pub edge_id: Uuid,
    /// Edge type
    pub edge_type: DecisionEdgeType,
    /// Source node
    pub from_node_id: Uuid,
    /// Target node
    pub to_node_id: Uuid,
}

/// Decision memory output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionMemoryOutput {
    /// Decision identifier
    pub decision_id: Uuid,
    /// Nodes created in the graph (audit view; the durable record lives in
    /// `continuum-core`'s own entity/edge tables)
    pub nodes_created: Vec<GraphNodeCreated>,
    /// Edges created in the graph
    pub edges_created: Vec<GraphEdgeCreated>,
    /// Number of artifacts stored
    pub artifacts_stored: usize,
    /// When the capture occurred
    pub capture_timestamp: DateTime<Utc>,
    /// References to externally stored artifact content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifact_refs: Vec<String>,
}

/// Decision event telemetry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionEventTelemetry {
    /// Processing duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Memory bytes used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
    /// Graph persistence latency in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_latency_ms: Option<u64>,
}

/// Decision event — the audit envelope persisted alongside the decision
/// itself. Exactly one of these is emitted per `capture()` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Agent identifier (always "decision-memory-agent")
    pub agent_id: String,
    /// Agent version (semver)
    pub agent_version: String,
    /// Decision type (always "decision_memory_capture")
    pub decision_type: String,
    /// SHA-256 hash of the input payload
    pub inputs_hash: String,
    /// Original input
    pub input: DecisionMemoryInput,
    /// Output from processing
    pub outputs: DecisionMemoryOutput,
    /// Confidence score (association strength between the decision and its
    /// captured artifacts/outcome — distinct from `input.confidence`, which
    /// is the extraction confidence of the decision text itself)
    pub confidence: f64,
    /// Constraints applied during processing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints_applied: Vec<DecisionConstraint>,
    /// Unique execution reference
    pub execution_ref: Uuid,
    /// UTC timestamp
    pub timestamp: DateTime<Utc>,
    /// Telemetry data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<DecisionEventTelemetry>,
}

impl DecisionEvent {
    /// Create a new DecisionEvent builder
    pub fn builder() -> DecisionEventBuilder {
        DecisionEventBuilder::default()
    }
}

/// Builder for DecisionEvent
#[derive(Debug, Default)]
pub struct DecisionEventBuilder {
    input: Option<DecisionMemoryInput>,
    outputs: Option<DecisionMemoryOutput>,
    confidence: Option<f64>,
    constraints_applied: Vec<DecisionConstraint>,
    telemetry: Option<DecisionEventTelemetry>,
}

impl DecisionEventBuilder {
    /// Set the input
    pub fn input(mut self, input: DecisionMemoryInput) -> Self {
        self.input = Some(input);
        self
    }

    /// Set the outputs
    pub fn outputs(mut self, outputs: DecisionMemoryOutput) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Set confidence score
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Add a constraint
    pub fn constraint(mut self, constraint: DecisionConstraint) -> Self {
        self.constraints_applied.push(constraint);
        self
    }

    /// Set telemetry
    pub fn telemetry(mut self, telemetry: DecisionEventTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the DecisionEvent
    pub fn build(self, inputs_hash: String) -> Result<DecisionEvent, &'static str> {
        let input = self.input.ok_or("input is required")?;
        let outputs = self.outputs.ok_or("outputs is required")?;
        let confidence = self.confidence.ok_or("confidence is required")?;

        Ok(DecisionEvent {
            agent_id: crate::constants::AGENT_ID.to_string(),
            agent_version: crate::constants::AGENT_VERSION.to_string(),
            decision_type: crate::constants::DECISION_TYPE.to_string(),
            inputs_hash,
            input,
            outputs,
            confidence,
            constraints_applied: self.constraints_applied,
            execution_ref: Uuid::new_v4(),
            timestamp: Utc::now(),
            telemetry: self.telemetry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_result_type_serialization() {
        let success = DecisionResultType::Success;
        let json = serde_json::to_string(&success).unwrap();
        assert_eq!(json, "\"success\"");

        let deserialized: DecisionResultType = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, DecisionResultType::Success);
    }

    fn sample_context() -> DecisionContext {
        DecisionContext {
            conversation_id: Uuid::new_v4(),
            agent_id: None,
            predecessor_decision_id: None,
            conversation_turn: Some(1),
            project: Some("continuum".to_string()),
            source: DecisionSource::Api,
            user_id: None,
            environment: Some(EnvironmentType::Production),
        }
    }

    #[test]
    fn test_decision_context_validation() {
        assert!(sample_context().validate().is_ok());
    }

    fn sample_input() -> DecisionMemoryInput {
        DecisionMemoryInput {
            decision_id: Uuid::new_v4(),
            decision_type: "test_decision".to_string(),
            context: sample_context(),
            trigger: "trigger".to_string(),
            context_text: "context".to_string(),
            agent_decision: "use postgres".to_string(),
            agent_rationale: "durable".to_string(),
            options: vec!["use postgres".to_string(), "use mysql".to_string()],
            assumptions: vec![],
            scope: DecisionScope::Architectural,
            confidence: 0.9,
            reasoning_artifacts: vec![],
            outcome: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_decision_event_builder() {
        let input = sample_input();

        let output = DecisionMemoryOutput {
            decision_id: input.decision_id,
            nodes_created: vec![],
            edges_created: vec![],
            artifacts_stored: 0,
            capture_timestamp: Utc::now(),
            artifact_refs: vec![],
        };

        let event = DecisionEvent::builder()
            .input(input)
            .outputs(output)
            .confidence(0.95)
            .constraint(DecisionConstraint::ConversationBoundary)
            .build("a".repeat(64))
            .unwrap();

        assert_eq!(event.agent_id, "decision-memory-agent");
        assert_eq!(event.decision_type, "decision_memory_capture");
        assert_eq!(event.confidence, 0.95);
        assert_eq!(event.constraints_applied.len(), 1);
    }
}
