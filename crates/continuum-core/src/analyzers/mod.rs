//! Background analyzers that reason over the persisted graph after the
//! write path has run (spec §4.6): dormant-alternative detection,
//! assumption-violation monitoring, commit linking, staleness
//! classification, and ontology (alias dictionary) updates.

pub mod assumption_monitor;
pub mod commit_linker;
pub mod dormant;
pub mod ontology_updater;
pub mod staleness;

pub use assumption_monitor::{assumption_contradicted_by, scan_for_invalidated_assumptions, scan_user_decisions, InvalidatedAssumption};
pub use commit_linker::{link_commit, CommitLink};
pub use dormant::{find_dormant_alternatives, DormantAlternative};
pub use ontology_updater::{refresh as refresh_ontology, DEFAULT_SEED_NAMES};
pub use staleness::{classify_stale, StaleDecision};
