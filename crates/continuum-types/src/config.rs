//! Flat runtime configuration, loaded from environment variables
//! (SPEC_FULL.md §10.3). Resolves the "duplicate config key" open question
//! (§9) by giving each key exactly one field fed by exactly one env var.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A secret value whose `Debug`/`Display` never render the contents, so it
/// is safe to carry inside structs that get logged or included in error
/// context (spec §6: "secrets held in a wrapper that never renders in logs
/// or errors").
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Explicit, deliberate access to the underlying value (e.g. to attach
    /// an `Authorization` header). Named to stand out at call sites.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Confidence calibration strategy for extracted decisions (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceCalibrationMethod {
    /// Length/completeness heuristic signals.
    Heuristic,
    /// Fixed scalar temperature scaling.
    Temperature,
    /// Data-driven composite without ground truth.
    Composite,
}

/// The single flat configuration object described in spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `SIMILAR_TO` cosine cutoff. Default 0.85.
    pub similarity_threshold: f32,
    /// Embedding request batch size. Default 32.
    pub embedding_batch_size: usize,
    /// LLM response cache TTL, seconds. Default 86400 (24h).
    pub llm_cache_ttl_secs: u64,
    /// Max LLM retry attempts. Default 3.
    pub llm_max_retries: u32,
    /// Base delay for exponential backoff, seconds. Default 1.0.
    pub llm_retry_base_delay_secs: f64,
    /// Optional fallback model identifier.
    pub llm_fallback_model: Option<String>,
    /// Whether fallback-on-unretryable-error is enabled.
    pub llm_fallback_enabled: bool,
    /// Confidence calibration method.
    pub confidence_calibration_method: ConfidenceCalibrationMethod,
    /// Whether verbatim grounding spans are computed.
    pub verbatim_grounding_enabled: bool,
    /// Whether temporal/evolution-edge reasoning runs.
    pub temporal_reasoning_enabled: bool,
    /// Whether the reranker hook is invoked in hybrid search.
    pub bge_reranking_enabled: bool,
    /// Top-k passed to the reranker.
    pub bge_reranking_top_k: usize,
    /// Entity cache TTL, seconds. Default 300 (5 min).
    pub entity_cache_ttl_secs: u64,
    /// Message batcher flush size. Default 10.
    pub message_batch_size: usize,
    /// Message batcher flush timeout, milliseconds. Default 2000.
    pub message_batch_timeout_ms: u64,
    /// Commit-link lookback window, hours. Default 2.
    pub git_commit_link_window_hours: i64,
    /// Commit-link Jaccard score threshold. Default 0.3.
    pub git_commit_link_score_threshold: f32,
    /// Days after which an untouched file is considered stale. Default 90.
    pub git_stale_file_threshold_days: i64,
    /// Inter-turn gap that splits a conversation into episodes, minutes. Default 10.
    pub episode_gap_minutes: i64,
    /// Rate limiter budget: requests per window.
    pub rate_limit_requests: u32,
    /// Rate limiter window, seconds. Default 60.
    pub rate_limit_window_secs: u64,
    /// Graph storage connection-pool size.
    pub graph_pool_size: u32,
    /// Relational storage connection-pool size.
    pub sql_pool_size: u32,
    /// Cache connection-pool size.
    pub cache_pool_size: u32,
    /// Embedding vector dimension (fixed per deployment, spec §3). Default 2048.
    pub embedding_dimension: usize,
    /// Minimum days a rejected candidate must sit before it is eligible for
    /// dormant-alternative surfacing.
    pub min_days_dormant: i64,
    /// LLM provider API key.
    pub llm_api_key: Option<SecretString>,
    /// LLM provider base URL.
    pub llm_base_url: String,
    /// Fuzzy-match ratio threshold for entity resolution stage 4. Default 0.85.
    pub fuzzy_match_threshold: f32,
    /// Embedding cosine threshold for entity resolution stage 5. Default 0.90.
    pub embedding_match_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            embedding_batch_size: 32,
            llm_cache_ttl_secs: 86_400,
            llm_max_retries: 3,
            llm_retry_base_delay_secs: 1.0,
            llm_fallback_model: None,
            llm_fallback_enabled: false,
            confidence_calibration_method: ConfidenceCalibrationMethod::Composite,
            verbatim_grounding_enabled: true,
            temporal_reasoning_enabled: true,
            bge_reranking_enabled: false,
            bge_reranking_top_k: 10,
            entity_cache_ttl_secs: 300,
            message_batch_size: 10,
            message_batch_timeout_ms: 2_000,
            git_commit_link_window_hours: 2,
            git_commit_link_score_threshold: 0.3,
            git_stale_file_threshold_days: 90,
            episode_gap_minutes: 10,
            rate_limit_requests: 60,
            rate_limit_window_secs: 60,
            graph_pool_size: 10,
            sql_pool_size: 10,
            cache_pool_size: 10,
            embedding_dimension: 2048,
            min_days_dormant: 14,
            llm_api_key: None,
            llm_base_url: "https://api.example-llm-provider.invalid/v1".to_string(),
            fuzzy_match_threshold: 0.85,
            embedding_match_threshold: 0.90,
        }
    }
}

impl Config {
    /// Load from environment variables, falling back to defaults for any
    /// key that is unset or fails to parse. Each key is read exactly once
    /// (resolves the "duplicate declaration" open question, §9).
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        macro_rules! env_parse {
            ($field:expr, $key:expr) => {
                if let Ok(raw) = std::env::var($key) {
                    if let Ok(parsed) = raw.parse() {
                        $field = parsed;
                    } else {
                        tracing::warn!(key = $key, value = %raw, "failed to parse config value, keeping default");
                    }
                }
            };
        }
        env_parse!(cfg.similarity_threshold, "CONTINUUM_SIMILARITY_THRESHOLD");
        env_parse!(cfg.embedding_batch_size, "CONTINUUM_EMBEDDING_BATCH_SIZE");
        env_parse!(cfg.llm_cache_ttl_secs, "CONTINUUM_LLM_CACHE_TTL_SECS");
        env_parse!(cfg.llm_max_retries, "CONTINUUM_LLM_MAX_RETRIES");
        env_parse!(
            cfg.llm_retry_base_delay_secs,
            "CONTINUUM_LLM_RETRY_BASE_DELAY_SECS"
        );
        env_parse!(cfg.llm_fallback_enabled, "CONTINUUM_LLM_FALLBACK_ENABLED");
        env_parse!(
            cfg.verbatim_grounding_enabled,
            "CONTINUUM_VERBATIM_GROUNDING_ENABLED"
        );
        env_parse!(
            cfg.temporal_reasoning_enabled,
            "CONTINUUM_TEMPORAL_REASONING_ENABLED"
        );
        env_parse!(cfg.bge_reranking_enabled, "CONTINUUM_BGE_RERANKING_ENABLED");
        env_parse!(cfg.bge_reranking_top_k, "CONTINUUM_BGE_RERANKING_TOP_K");
        env_parse!(cfg.entity_cache_ttl_secs, "CONTINUUM_ENTITY_CACHE_TTL_SECS");
        env_parse!(cfg.message_batch_size, "CONTINUUM_MESSAGE_BATCH_SIZE");
        env_parse!(
            cfg.message_batch_timeout_ms,
            "CONTINUUM_MESSAGE_BATCH_TIMEOUT_MS"
        );
        env_parse!(
            cfg.git_commit_link_window_hours,
            "CONTINUUM_GIT_COMMIT_LINK_WINDOW_HOURS"
        );
        env_parse!(
            cfg.git_commit_link_score_threshold,
            "CONTINUUM_GIT_COMMIT_LINK_SCORE_THRESHOLD"
        );
        env_parse!(
            cfg.git_stale_file_threshold_days,
            "CONTINUUM_GIT_STALE_FILE_THRESHOLD_DAYS"
        );
        env_parse!(cfg.episode_gap_minutes, "CONTINUUM_EPISODE_GAP_MINUTES");
        env_parse!(cfg.rate_limit_requests, "CONTINUUM_RATE_LIMIT_REQUESTS");
        env_parse!(
            cfg.rate_limit_window_secs,
            "CONTINUUM_RATE_LIMIT_WINDOW_SECS"
        );
        env_parse!(cfg.graph_pool_size, "CONTINUUM_GRAPH_POOL_SIZE");
        env_parse!(cfg.sql_pool_size, "CONTINUUM_SQL_POOL_SIZE");
        env_parse!(cfg.cache_pool_size, "CONTINUUM_CACHE_POOL_SIZE");
        env_parse!(cfg.embedding_dimension, "CONTINUUM_EMBEDDING_DIMENSION");
        env_parse!(cfg.min_days_dormant, "CONTINUUM_MIN_DAYS_DORMANT");
        env_parse!(cfg.fuzzy_match_threshold, "CONTINUUM_FUZZY_MATCH_THRESHOLD");
        env_parse!(
            cfg.embedding_match_threshold,
            "CONTINUUM_EMBEDDING_MATCH_THRESHOLD"
        );

        if let Ok(url) = std::env::var("CONTINUUM_LLM_BASE_URL") {
            cfg.llm_base_url = url;
        }
        if let Ok(model) = std::env::var("CONTINUUM_LLM_FALLBACK_MODEL") {
            cfg.llm_fallback_model = Some(model);
        }
        if let Ok(key) = std::env::var("CONTINUUM_LLM_API_KEY") {
            cfg.llm_api_key = Some(SecretString::new(key));
        }

        cfg
    }
}
