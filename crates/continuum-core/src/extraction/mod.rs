//! Conversation ingestion and decision extraction (spec §4.1-§4.4, §4.7):
//! parsing raw logs into turns, pulling structured JSON out of LLM
//! responses, defending prompts against injected instructions, resolving
//! entity mentions, and embedding text.

pub mod embedder;
pub mod entity_resolver;
pub mod extractor;
pub mod json;
pub mod parser;
pub mod sanitizer;

pub use embedder::{DecisionEmbeddingFields, Embedder};
pub use entity_resolver::{AliasDictionary, EntityResolver, EntityStore, Resolved, ResolutionStage, ResolverThresholds};
pub use extractor::{DecisionExtractor, ExtractedDecision};
pub use json::extract_json_from_response;
pub use parser::{parse_conversation_log, Conversation, Role, Turn};
pub use sanitizer::{sanitize_prompt, InjectionRiskLevel, SanitizationResult};
