//! `POST /api/agent/check` — prior-art check: before an agent commits to a
//! decision, ask whether something like it already exists (spec §6).
//! Returns one of three verdicts the caller branches on, following §9's
//! guidance to model exception-like control flow as an explicit sum type
//! instead of raising.

use crate::agent_context::search::hybrid_search;
use continuum_types::{Decision, EdgeType, Result, UserId};

/// Cosine/lexical score above which an existing decision counts as a
/// near-duplicate worth surfacing (mirrors the writer's `SIMILAR_TO`
/// cutoff, spec §4.5's `similarity_threshold` default).
const REVIEW_SIMILARITY_THRESHOLD: f32 = 0.85;

#[derive(Debug, Clone)]
pub enum PriorArtVerdict {
    /// No sufficiently similar prior decision; safe to proceed.
    Proceed,
    /// One or more prior decisions are similar enough to warrant review
    /// before recording a new one.
    ReviewSimilar(Vec<Decision>),
    /// The closest matching decision already sits on an unresolved
    /// `CONTRADICTS` edge (written by the evolution analyzer, spec §4.5) —
    /// recording another similar decision here would add to a dispute
    /// instead of resolving it.
    ResolveContradiction(Decision),
}

/// Check `proposed_text` (and optional embedding) against the user's
/// existing decisions before the caller records a new one.
pub fn check_prior_art(
    storage: &dyn crate::graph::GraphStorage,
    user_id: &UserId,
    proposed_text: &str,
    proposed_embedding: Option<&[f32]>,
) -> Result<PriorArtVerdict> {
    let hits = hybrid_search(storage, user_id, proposed_text, proposed_embedding, 20)?;

    let similar: Vec<Decision> = hits
        .iter()
        .filter(|h| h.score >= REVIEW_SIMILARITY_THRESHOLD)
        .map(|h| h.decision.clone())
        .collect();

    let Some(closest) = similar.first() else {
        return Ok(PriorArtVerdict::Proceed);
    };

    let node_id = *closest.id.as_uuid();
    let has_unresolved_contradiction = storage
        .outgoing_edges(node_id)?
        .iter()
        .chain(storage.incoming_edges(node_id)?.iter())
        .any(|e| e.edge_type == EdgeType::Contradicts);

    if has_unresolved_contradiction {
        Ok(PriorArtVerdict::ResolveContradiction(closest.clone()))
    } else {
        Ok(PriorArtVerdict::ReviewSimilar(similar))
    }
}
