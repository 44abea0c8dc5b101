//! Commit linker (spec §4.6). On a commit webhook, persists the `CommitNode`
//! and `TOUCHES` edges, then links decisions whose `AFFECTS`ed files
//! overlap the commit's changed files above a Jaccard threshold with
//! `IMPLEMENTED_BY`. No surviving original-language file for this analyzer;
//! grounded on spec prose plus the file-key-to-`Uuid` convention `writer.rs`
//! already established for `AFFECTS` edges.

use crate::graph::writer::code_entity_key_uuid;
use crate::graph::GraphStorage;
use chrono::{DateTime, Duration, Utc};
use continuum_types::{CodeEntityKey, CommitNode, CommitSha, Edge, EdgeType, Result};
use std::collections::HashSet;
use uuid::Uuid;

/// Deterministic node id for a `CommitNode`, the same convention
/// `code_entity_key_uuid` uses for `CodeEntity` — `AFFECTS`/`TOUCHES`/
/// `IMPLEMENTED_BY` edges all need a plain `Uuid`, and a commit's natural
/// key is its SHA, not a minted id.
fn commit_node_uuid(sha: &CommitSha) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, sha.0.as_bytes())
}

/// A decision linked to a commit because its `AFFECTS`ed files overlap the
/// commit's changed files above the configured score threshold.
#[derive(Debug, Clone)]
pub struct CommitLink {
    pub decision_id: String,
    pub commit_sha: String,
    pub jaccard_score: f32,
}

/// Jaccard similarity of two file-path sets.
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// Persist `commit` plus a `TOUCHES` edge to each of its changed files, then
/// link it to decisions in the lookback window whose affected files overlap
/// it by at least `score_threshold` (spec §4.6's default 0.3).
pub fn link_commit(
    storage: &dyn GraphStorage,
    commit: &CommitNode,
    session_start: DateTime<Utc>,
    window_hours: i64,
    score_threshold: f32,
) -> Result<Vec<CommitLink>> {
    storage.put_commit(commit)?;

    let commit_files: HashSet<String> = commit.files_changed.iter().cloned().collect();
    for file_path in &commit.files_changed {
        let target = code_entity_key_uuid(&CodeEntityKey {
            file_path: file_path.clone(),
            user_id: commit.user_id.clone(),
        });
        storage.put_edge(&Edge::new(commit_node_uuid(&commit.sha), target, EdgeType::Touches))?;
    }

    let window_start = session_start - Duration::hours(window_hours);
    let mut links = Vec::new();

    for decision in storage.list_decisions(&commit.user_id)? {
        if decision.created_at < window_start || decision.created_at > commit.committed_at {
            continue;
        }

        let mut affected_files = HashSet::new();
        for edge in storage.outgoing_edges(*decision.id.as_uuid())? {
            if edge.edge_type != EdgeType::Affects {
                continue;
            }
            if let Some(path) = edge.properties.get("file_path") {
                affected_files.insert(path.clone());
            }
        }
        if affected_files.is_empty() {
            continue;
        }

        let score = jaccard(&affected_files, &commit_files);
        if score >= score_threshold {
            storage.put_edge(&Edge::with_properties(
                *decision.id.as_uuid(),
                commit_node_uuid(&commit.sha),
                EdgeType::ImplementedBy,
                std::collections::HashMap::from([("jaccard_score".to_string(), score.to_string())]),
            ))?;
            links.push(CommitLink {
                decision_id: decision.id.to_string(),
                commit_sha: commit.sha.to_string(),
                jaccard_score: score,
            });
        }
    }

    Ok(links)
}

/// Stale-file-aware variant for future use: files untouched since
/// `threshold_days` ago within a user's decisions (left for the staleness
/// classifier to call when it wants file-level, not just decision-level,
/// staleness — not wired in yet).
#[allow(dead_code)]
pub fn is_candidate_for_staleness(last_commit_days_ago: i64, threshold_days: i64) -> bool {
    last_commit_days_ago >= threshold_days
}
