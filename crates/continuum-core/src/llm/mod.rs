//! LLM client shared by the extractor (§4.2), entity resolver (§4.3),
//! graph writer's evolution analysis (§4.5), and the ontology updater
//! (§4.6). Grounded on
//! `original_source/apps/api/services/llm_providers/{nvidia,bedrock}.py`
//! for the provider shape and `utils/{circuit_breaker,retry,cache}.py` for
//! the resilience wiring, reusing this crate's own `resilience` module
//! instead of reimplementing it.

pub mod client;
pub mod prompts;

pub use client::{
    ChatMessage, ChatRole, EmbeddingProvider, LlmCallRecord, LlmProvider, LlmUsage,
    ObservabilityHook, ResilientLlmClient, ResilientLlmConfig, StructuredLogHook,
};
pub use prompts::{
    decision_extraction_system_prompt, decision_extraction_user_prompt,
    decision_type_classification_prompt, paired_evolution_prompt, turn_compression_prompt,
    EXTRACTION_PROMPT_VERSION,
};
