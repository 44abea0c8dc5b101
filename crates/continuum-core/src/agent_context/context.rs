//! `GET /api/agent/context/{name}` — "everything about one entity": the
//! canonical entity, every decision that `INVOLVES` it, and its two-hop
//! subgraph neighborhood (spec §6, §2's "subgraph expansion" query-path
//! step).

use crate::graph::{expand_subgraph, GraphStorage, Subgraph};
use continuum_types::{Decision, Entity, EntityType, Result, UserId};

/// Depth the entity-context endpoint expands to by default. Two hops
/// surfaces an entity's direct decisions plus what those decisions in turn
/// connect to (other entities, candidates, superseded decisions) without
/// pulling in the whole graph.
const CONTEXT_EXPANSION_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct EntityContext {
    pub entity: Entity,
    pub involving_decisions: Vec<Decision>,
    pub subgraph: Subgraph,
}

/// Resolve `name` to its canonical entity within `user_id`'s scope and
/// collect everything connected to it. Returns `Ok(None)` when no entity
/// with that canonical name exists — callers map this to 404 (spec §7).
pub fn entity_context(
    storage: &dyn GraphStorage,
    user_id: &UserId,
    name: &str,
) -> Result<Option<EntityContext>> {
    let Some(entity) = storage.find_entity_by_exact_name(user_id, name)? else {
        return Ok(None);
    };

    let involving_decisions = storage
        .incoming_edges(*entity.id.as_uuid())?
        .into_iter()
        .filter(|e| e.edge_type == continuum_types::EdgeType::Involves)
        .filter_map(|e| storage.get_decision(&continuum_types::DecisionId::from_uuid(e.from)).ok().flatten())
        .collect();

    let subgraph = expand_subgraph(storage, *entity.id.as_uuid(), CONTEXT_EXPANSION_DEPTH)?;

    Ok(Some(EntityContext { entity, involving_decisions, subgraph }))
}

#[allow(dead_code)]
fn entity_type_label(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Technology => "technology",
        EntityType::Pattern => "pattern",
        EntityType::System => "system",
        EntityType::Person => "person",
        EntityType::Organization => "organization",
        EntityType::Concept => "concept",
    }
}
