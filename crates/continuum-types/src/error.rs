//! Shared error taxonomy for Continuum (SPEC_FULL.md §11).
//!
//! HTTP status mapping is documented on each variant for the external
//! routing collaborator's benefit; this crate never constructs an HTTP
//! response itself (routing is out of scope, spec §1).

use serde::Serialize;

/// Result type alias used throughout Continuum.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error kinds, grouped by the taxonomy in spec §7.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum CoreError {
    /// Malformed input, size limit, or out-of-range value. Maps to 400/422.
    #[error("validation failed for {field}: {message}")]
    Validation {
        /// Offending field name.
        field: String,
        /// Human-readable explanation.
        message: String,
    },

    /// Missing or invalid bearer token. Maps to 401.
    #[error("authentication required: {0}")]
    Auth(String),

    /// Authenticated but scoped out of the resource. Maps to 403.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Owner-scoped not-found; never reveals cross-tenant existence. Maps to 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// Relationship or cross-tenant conflict (e.g. blocked entity delete). Maps to 409.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limiter tripped. Maps to 429; carries retry-after seconds.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the caller may retry.
        retry_after_secs: u64,
    },

    /// LLM/embedding provider failed with a transient status (429/500/502/
    /// 503/504) or a transport-level error. Retryable. Maps to 503.
    #[error("upstream service failure: {0}")]
    UpstreamFailure(String),

    /// LLM/embedding provider rejected the request with a non-transient
    /// HTTP status (e.g. 400/401/404). Not retryable — the same request
    /// would fail again. Maps to 502: the upstream is unusable for this
    /// call, but the fault isn't the caller's.
    #[error("upstream rejected request (status {status}): {message}")]
    UpstreamRejected {
        /// Raw HTTP status returned by the upstream provider.
        status: u16,
        /// Upstream-provided error body or message.
        message: String,
    },

    /// Storage pool/query failure after exhausting retries. Maps to 503.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// Circuit breaker is open for a named dependency. Maps to 503; carries
    /// the time until a probe request may pass.
    #[error("circuit open for {dependency}, retry after {retry_after_ms}ms")]
    CircuitOpen {
        /// Name of the guarded dependency.
        dependency: String,
        /// Milliseconds until a half-open probe is permitted.
        retry_after_ms: u64,
    },

    /// Estimated prompt size exceeds the model's effective window and could
    /// not be compressed. Maps to 413/400.
    #[error("prompt too large: {estimated_tokens} tokens exceeds limit of {limit}")]
    PromptTooLarge {
        /// Estimated token count of the assembled prompt.
        estimated_tokens: usize,
        /// Effective maximum allowed.
        limit: usize,
    },

    /// Retries exhausted for a retryable operation without a more specific
    /// cause available.
    #[error("retry exhausted after {attempts} attempts: {message}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last observed error message.
        message: String,
    },

    /// Unexpected internal error; details never leak provider bodies or
    /// tokens. Maps to 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable error tag suitable for client branching (spec §7's
    /// "user-visible behavior").
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Auth(_) => "auth",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::RateLimited { .. } => "rate_limited",
            Self::UpstreamFailure(_) => "upstream_failure",
            Self::UpstreamRejected { .. } => "upstream_rejected",
            Self::StorageFailure(_) => "storage_failure",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::PromptTooLarge { .. } => "prompt_too_large",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::Internal(_) => "internal",
        }
    }

    /// The HTTP status code an external router should map this to. Provided
    /// as a convenience for the collaborator described in spec §6; the core
    /// never issues this code itself.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::PromptTooLarge { .. } => 422,
            Self::Auth(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::RateLimited { .. } => 429,
            Self::UpstreamFailure(_) | Self::StorageFailure(_) | Self::CircuitOpen { .. } => 503,
            Self::UpstreamRejected { .. } => 502,
            Self::RetryExhausted { .. } => 503,
            Self::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Internal(format!("serialization error: {err}"))
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Internal(format!("io error: {err}"))
    }
}
