//! Hybrid search: lexical full-text plus vector cosine, falling back to a
//! `CONTAINS` scan when the store has no full-text hit (spec §2's query-path
//! data flow, §6's `GET /api/search` "full-text with CONTAINS fallback",
//! §9's note on mapping exception-driven fallbacks to explicit result
//! types). `sled` has no native full-text index, so the "full-text" stage
//! here *is* the `CONTAINS` scan — there is only one lexical path, not two,
//! which is why it never needs an exception to fall back from.

use crate::extraction::embedder::cosine_similarity;
use crate::graph::{contains_search_for_user, GraphStorage};
use continuum_types::{Decision, Result, UserId};

/// One scored hit from a hybrid search.
#[derive(Debug, Clone)]
pub struct ScoredDecision {
    pub decision: Decision,
    /// Lexical hit contributes 1.0, vector similarity contributes its
    /// cosine score; a decision matching both is scored by the max.
    pub score: f32,
}

/// Optional re-ranking pass over hybrid search's top-k hits
/// (`bge_reranking_enabled` / `bge_reranking_top_k`, spec §6's
/// configuration list, elaborated nowhere else — SPEC_FULL.md §12).
/// Grounded as an extension point only: no BGE client is implemented here,
/// since bringing one in would mean fabricating a provider dependency the
/// teacher never carries.
pub trait Reranker: Send + Sync {
    fn rerank(&self, query: &str, hits: Vec<ScoredDecision>) -> Vec<ScoredDecision>;
}

/// Leaves ordering untouched. Used whenever `bge_reranking_enabled` is
/// `false` or no reranker is configured.
pub struct NoopReranker;

impl Reranker for NoopReranker {
    fn rerank(&self, _query: &str, hits: Vec<ScoredDecision>) -> Vec<ScoredDecision> {
        hits
    }
}

/// Lexical `CONTAINS` search plus, when a query embedding is supplied,
/// cosine similarity against every reachable decision's embedding. Results
/// are deduplicated by decision id, scored by the higher of the two
/// signals, sorted descending, then optionally re-ranked before the
/// `limit` cut.
pub fn hybrid_search(
    storage: &dyn GraphStorage,
    user_id: &UserId,
    query: &str,
    query_embedding: Option<&[f32]>,
    limit: usize,
) -> Result<Vec<ScoredDecision>> {
    hybrid_search_with_reranker(storage, user_id, query, query_embedding, limit, &NoopReranker)
}

/// Same as [`hybrid_search`] but takes an explicit reranker, applied to the
/// top `bge_reranking_top_k`-equivalent window (here, simply the full
/// scored set — callers that want the registry's configured top-k window
/// can slice before calling).
pub fn hybrid_search_with_reranker(
    storage: &dyn GraphStorage,
    user_id: &UserId,
    query: &str,
    query_embedding: Option<&[f32]>,
    limit: usize,
    reranker: &dyn Reranker,
) -> Result<Vec<ScoredDecision>> {
    let lexical_hits = contains_search_for_user(storage, user_id, query)?;
    let mut scored: Vec<ScoredDecision> = lexical_hits
        .into_iter()
        .map(|decision| ScoredDecision { decision, score: 1.0 })
        .collect();

    if let Some(embedding) = query_embedding {
        let all_decisions = storage.list_decisions(user_id)?;
        for decision in all_decisions {
            let Some(decision_embedding) = decision.embedding.as_deref() else {
                continue;
            };
            let similarity = cosine_similarity(embedding, decision_embedding);
            if similarity <= 0.0 {
                continue;
            }
            if let Some(existing) = scored.iter_mut().find(|s| s.decision.id == decision.id) {
                existing.score = existing.score.max(similarity);
            } else {
                scored.push(ScoredDecision { decision, score: similarity });
            }
        }
    }

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    let mut reranked = reranker.rerank(query, scored);
    reranked.truncate(limit);
    Ok(reranked)
}
