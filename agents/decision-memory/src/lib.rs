//! Decision Memory Agent
//!
//! This agent captures architectural decisions, the reasoning artifacts
//! behind them, and their eventual outcomes, persisting them into
//! Continuum's knowledge graph for audit and learning. It is classified as
//! MEMORY_WRITE and operates strictly on structured memory data.
//!
//! # Classification
//! - **Type**: MEMORY_WRITE
//! - **decision_type**: decision_memory_capture
//!
//! # Contract
//! - Validates all inputs and outputs against contracts
//! - Emits telemetry compatible with the host's tracing subscriber
//! - Emits exactly ONE DecisionEvent to the graph per invocation
//! - Exposes CLI/HTTP-invokable endpoints (inspect / retrieve / replay)
//! - Deployable as a standalone edge function in front of a shared `Continuum`
//! - Returns deterministic, machine-readable output
//!
//! # Non-Responsibilities (MUST NEVER)
//! - Modify system behavior
//! - Trigger remediation
//! - Trigger retries
//! - Emit alerts
//! - Enforce policies
//! - Perform orchestration
//! - Bypass `continuum-core` to touch the storage backend directly

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod agent;
pub mod contracts;
pub mod error;
pub mod handler;
pub mod persistence;
pub mod telemetry;

// Re-exports
pub use agent::DecisionMemoryAgent;
pub use contracts::*;
pub use error::{AgentError, AgentResult};
pub use handler::EdgeFunctionHandler;
pub use persistence::ContinuumPersistence;

/// Agent metadata constants
pub mod constants {
    /// Agent identifier
    pub const AGENT_ID: &str = "decision-memory-agent";
    /// Current version following semver
    pub const AGENT_VERSION: &str = "1.0.0";
    /// Decision type for this agent
    pub const DECISION_TYPE: &str = "decision_memory_capture";
    /// Agent classification
    pub const CLASSIFICATION: &str = "MEMORY_WRITE";
}
