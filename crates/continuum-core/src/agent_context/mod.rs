//! The agent-facing query surface (spec §2's query-path data flow, §6's
//! `/api/agent/*` routes): hybrid search, project summaries enriched with
//! analyzer findings, per-entity context, and the prior-art check an agent
//! runs before committing to a new decision.

pub mod check;
pub mod context;
pub mod search;
pub mod summary;

pub use check::{check_prior_art, PriorArtVerdict};
pub use context::{entity_context, EntityContext};
pub use search::{hybrid_search, hybrid_search_with_reranker, NoopReranker, Reranker, ScoredDecision};
pub use summary::{build_summary, AgentSummary};
