//! Persistence adapter bridging the capture pipeline to `continuum-core`.
//!
//! The agent never touches the storage backend directly; all entity
//! resolution, evolution-edge analysis, and staleness scheduling live in
//! `continuum_core::Continuum`. This module wraps it behind the same
//! pluggable-service trait the capture pipeline was already written
//! against, so tests can swap in an in-memory double (see
//! `tests/integration_tests.rs`) without constructing a full `Continuum`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use continuum_core::extraction::ExtractedDecision;
use continuum_core::Continuum;
use continuum_types::UserId;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::contracts::DecisionEvent;
use crate::error::{AgentError, AgentResult};

/// Result of persisting a decision event.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoreResponse {
    /// Opaque reference the caller can use to retrieve the event later.
    pub ref_id: String,
    /// Whether the store succeeded.
    pub success: bool,
    /// Human-readable location hint (backend name, not a real URL).
    pub location: Option<String>,
}

/// Result of retrieving a previously stored decision event.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetrieveResponse<T> {
    /// The stored payload.
    pub data: T,
    /// Reference used to retrieve it.
    pub ref_id: String,
    /// When the retrieval happened.
    pub retrieved_at: String,
}

/// Filters for querying previously captured decision events.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DecisionEventQuery {
    /// Restrict to a single conversation.
    pub conversation_id: Option<Uuid>,
    /// Restrict to a single decision.
    pub decision_id: Option<Uuid>,
    /// Lower timestamp bound (inclusive).
    pub from_timestamp: Option<DateTime<Utc>>,
    /// Upper timestamp bound (inclusive).
    pub to_timestamp: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Number of results to skip.
    pub offset: Option<u32>,
}

/// Pluggable persistence boundary the capture pipeline talks to. Production
/// deployments back this with [`ContinuumPersistence`]; tests back it with
/// an in-memory double.
#[async_trait]
pub trait GraphPersistenceService: Send + Sync {
    /// Persist a decision event. Exactly one call per `capture()` invocation.
    async fn store_decision_event(&self, event: &DecisionEvent) -> AgentResult<StoreResponse>;

    /// Retrieve a previously stored decision event by its execution reference.
    async fn retrieve_decision_event(&self, execution_ref: &Uuid) -> AgentResult<RetrieveResponse<DecisionEvent>>;

    /// Query stored decision events by filter.
    async fn query_decision_events(&self, query: &DecisionEventQuery) -> AgentResult<Vec<DecisionEvent>>;
}

/// Persists decision events by delegating the underlying decision to a
/// shared [`Continuum`] instance (which runs entity resolution, evolution
/// analysis, and notification side effects) while keeping its own audit
/// log of the full envelope (inputs hash, telemetry, constraints applied)
/// for `retrieve`/`query`/`replay`, since that bookkeeping has no home in
/// `continuum-core`'s own `Decision` node.
pub struct ContinuumPersistence {
    continuum: Arc<Continuum>,
    user_id: UserId,
    audit_log: RwLock<Vec<DecisionEvent>>,
}

impl ContinuumPersistence {
    /// Wrap a shared `Continuum` instance for a single owning user.
    pub fn new(continuum: Arc<Continuum>, user_id: UserId) -> Self {
        Self { continuum, user_id, audit_log: RwLock::new(Vec::new()) }
    }
}

#[async_trait]
impl GraphPersistenceService for ContinuumPersistence {
    async fn store_decision_event(&self, event: &DecisionEvent) -> AgentResult<StoreResponse> {
        let input = &event.input;
        let extracted = ExtractedDecision {
            trigger: input.trigger.clone(),
            context: input.context_text.clone(),
            agent_decision: input.agent_decision.clone(),
            agent_rationale: input.agent_rationale.clone(),
            options: input.options.clone(),
            assumptions: input.assumptions.clone(),
            scope: input.scope,
            confidence: input.confidence,
            grounding: None,
            provenance: Default::default(),
        };

        self.continuum
            .remember(&self.user_id, input.context.project.clone(), extracted, vec![])
            .await
            .map_err(|e| AgentError::graph_write(e.to_string()))?;

        self.audit_log.write().expect("audit log lock poisoned").push(event.clone());

        Ok(StoreResponse {
            ref_id: event.execution_ref.to_string(),
            success: true,
            location: Some("continuum-core://graph".to_string()),
        })
    }

    async fn retrieve_decision_event(&self, execution_ref: &Uuid) -> AgentResult<RetrieveResponse<DecisionEvent>> {
        let log = self.audit_log.read().expect("audit log lock poisoned");
        for event in log.iter() {
            if event.execution_ref == *execution_ref {
                return Ok(RetrieveResponse {
                    data: event.clone(),
                    ref_id: event.execution_ref.to_string(),
                    retrieved_at: Utc::now().to_rfc3339(),
                });
            }
        }
        Err(AgentError::new(crate::error::AgentErrorCode::DecisionNotFound, "decision event not found"))
    }

    async fn query_decision_events(&self, query: &DecisionEventQuery) -> AgentResult<Vec<DecisionEvent>> {
        let log = self.audit_log.read().expect("audit log lock poisoned");
        let mut results: Vec<DecisionEvent> = log
            .iter()
            .filter(|event| {
                if let Some(conversation_id) = query.conversation_id {
                    if event.input.context.conversation_id != conversation_id {
                        return false;
                    }
                }
                if let Some(decision_id) = query.decision_id {
                    if event.input.decision_id != decision_id {
                        return false;
                    }
                }
                if let Some(from) = query.from_timestamp {
                    if event.timestamp < from {
                        return false;
                    }
                }
                if let Some(to) = query.to_timestamp {
                    if event.timestamp > to {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        if let Some(offset) = query.offset {
            results = results.into_iter().skip(offset as usize).collect();
        }
        if let Some(limit) = query.limit {
            results.truncate(limit as usize);
        }

        Ok(results)
    }
}
