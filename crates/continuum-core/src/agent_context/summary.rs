//! Project overview for `GET /api/agent/summary`: graph counts enriched
//! with dormant alternatives and stale decisions (spec §6), so an agent
//! opening a session gets "what exists and what needs attention" in one
//! call instead of three.

use crate::analyzers::{classify_stale, find_dormant_alternatives, DormantAlternative, StaleDecision};
use crate::graph::{GraphStorage, StorageStats};
use continuum_types::{Result, UserId};

/// Default dormant-alternative threshold used by the summary endpoint
/// (spec §4.6's `min_days_dormant`, default 14).
const SUMMARY_MIN_DAYS_DORMANT: i64 = 14;
const SUMMARY_DORMANT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct AgentSummary {
    pub stats: StorageStats,
    pub dormant_alternatives: Vec<DormantAlternative>,
    pub stale_decisions: Vec<StaleDecision>,
}

/// Build the project overview for a user: counts plus the two analyzer
/// passes a human or agent would otherwise have to request separately.
pub fn build_summary(storage: &dyn GraphStorage, user_id: &UserId) -> Result<AgentSummary> {
    let stats = storage.stats()?;
    let dormant_alternatives =
        find_dormant_alternatives(storage, user_id, SUMMARY_MIN_DAYS_DORMANT, SUMMARY_DORMANT_LIMIT)?;
    let decisions = storage.list_decisions(user_id)?;
    let stale_decisions = classify_stale(&decisions);
    Ok(AgentSummary { stats, dormant_alternatives, stale_decisions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SledGraphStorage;
    use continuum_types::{Decision, DecisionScope, DecisionSource, Provenance};

    #[test]
    fn summary_reports_zero_counts_for_an_empty_graph() {
        let storage = SledGraphStorage::open_temporary().unwrap();
        let user = UserId::from("alice");
        let summary = build_summary(&storage, &user).unwrap();
        assert_eq!(summary.stats.decision_count, 0);
        assert!(summary.dormant_alternatives.is_empty());
        assert!(summary.stale_decisions.is_empty());
    }

    #[test]
    fn summary_surfaces_a_stale_decision() {
        let storage = SledGraphStorage::open_temporary().unwrap();
        let user = UserId::from("alice");
        let mut d = Decision::new(
            user.clone(),
            None,
            "trigger".to_string(),
            "context".to_string(),
            "decision".to_string(),
            "rationale".to_string(),
            vec!["decision".to_string()],
            DecisionScope::Tactical,
            vec![],
            DecisionSource::Manual,
            Provenance::default(),
        );
        d.edited_at = chrono::Utc::now() - chrono::Duration::days(40);
        storage.put_decision(&d).unwrap();

        let summary = build_summary(&storage, &user).unwrap();
        assert_eq!(summary.stats.decision_count, 1);
        assert_eq!(summary.stale_decisions.len(), 1);
    }
}
