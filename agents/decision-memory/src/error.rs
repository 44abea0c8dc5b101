//! Error types for the Decision Memory Agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Agent error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentErrorCode {
    /// Input validation failed
    ValidationError,
    /// Cannot reach the graph persistence backend
    GraphConnectionError,
    /// Failed to write to the graph persistence backend
    GraphWriteError,
    /// Internal agent error
    InternalError,
    /// Rate limit exceeded
    RateLimitExceeded,
    /// Input hash mismatch
    InputHashMismatch,
    /// Conversation not found
    ConversationNotFound,
    /// Decision not found
    DecisionNotFound,
}

impl fmt::Display for AgentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError => write!(f, "VALIDATION_ERROR"),
            Self::GraphConnectionError => write!(f, "GRAPH_CONNECTION_ERROR"),
            Self::GraphWriteError => write!(f, "GRAPH_WRITE_ERROR"),
            Self::InternalError => write!(f, "INTERNAL_ERROR"),
            Self::RateLimitExceeded => write!(f, "RATE_LIMIT_EXCEEDED"),
            Self::InputHashMismatch => write!(f, "INPUT_HASH_MISMATCH"),
            Self::ConversationNotFound => write!(f, "CONVERSATION_NOT_FOUND"),
            Self::DecisionNotFound => write!(f, "DECISION_NOT_FOUND"),
        }
    }
}

/// Agent error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentError {
    /// Error code
    pub error_code: AgentErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Execution reference for this error
    pub execution_ref: Uuid,
    /// When the error occurred
    pub timestamp: DateTime<Utc>,
}

impl AgentError {
    /// Create a new agent error
    pub fn new(code: AgentErrorCode, message: impl Into<String>) -> Self {
        Self {
            error_code: code,
            message: message.into(),
            details: None,
            execution_ref: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new agent error with details
    pub fn with_details(code: AgentErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            error_code: code,
            message: message.into(),
            details: Some(details),
            execution_ref: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AgentErrorCode::ValidationError, message)
    }

    /// Create a graph connection error
    pub fn graph_connection(message: impl Into<String>) -> Self {
        Self::new(AgentErrorCode::GraphConnectionError, message)
    }

    /// Create a graph write error
    pub fn graph_write(message: impl Into<String>) -> Self {
        Self::new(AgentErrorCode::GraphWriteError, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AgentErrorCode::InternalError, message)
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(AgentErrorCode::RateLimitExceeded, message)
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code, self.message)
    }
}

impl std::error::Error for AgentError {}

impl From<continuum_types::CoreError> for AgentError {
    fn from(err: continuum_types::CoreError) -> Self {
        match err {
            continuum_types::CoreError::Validation { field, message } => {
                AgentError::validation(format!("{field}: {message}"))
            }
            continuum_types::CoreError::NotFound(msg) => AgentError::new(AgentErrorCode::DecisionNotFound, msg),
            other => AgentError::graph_write(other.to_string()),
        }
    }
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Internal error type for detailed error handling
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Graph persistence error
    #[error("Graph persistence error: {0}")]
    Graph(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InternalError> for AgentError {
    fn from(err: InternalError) -> Self {
        match err {
            InternalError::Validation(msg) => AgentError::validation(msg),
            InternalError::Serialization(e) => AgentError::internal(format!("Serialization error: {e}")),
            InternalError::Io(e) => AgentError::internal(format!("IO error: {e}")),
            InternalError::Graph(msg) => AgentError::graph_write(msg),
            InternalError::Config(msg) => AgentError::internal(format!("Config error: {msg}")),
        }
    }
}
