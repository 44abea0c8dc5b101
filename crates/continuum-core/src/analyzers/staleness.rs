//! Staleness classifier (spec §4.6). Per-scope thresholds flag a decision
//! as stale once it has gone unedited longer than its scope allows —
//! `DecisionScope::staleness_threshold_days` already carries the thresholds
//! (tactical 30d, strategic 180d, architectural 365d, unknown 180d), this
//! module is the sweep that applies them.

use chrono::Utc;
use continuum_types::Decision;
use serde::Serialize;

/// A decision flagged as stale relative to its scope's threshold.
#[derive(Debug, Clone, Serialize)]
pub struct StaleDecision {
    pub decision_id: String,
    pub scope: String,
    pub days_since_activity: i64,
    pub threshold_days: i64,
}

/// Flag every decision in `decisions` whose days-since-last-activity
/// (`edited_at`, which starts equal to `created_at` and advances on every
/// `touch()`) exceeds its scope's threshold.
#[must_use]
pub fn classify_stale(decisions: &[Decision]) -> Vec<StaleDecision> {
    let now = Utc::now();
    decisions
        .iter()
        .filter_map(|d| {
            let threshold = d.scope.staleness_threshold_days();
            let days = (now - d.edited_at).num_days();
            if days >= threshold {
                Some(StaleDecision {
                    decision_id: d.id.to_string(),
                    scope: format!("{:?}", d.scope),
                    days_since_activity: days,
                    threshold_days: threshold,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use continuum_types::{DecisionScope, DecisionSource, Provenance, UserId};

    fn decision_aged(scope: DecisionScope, days_old: i64) -> Decision {
        let mut d = Decision::new(
            UserId::from("alice"),
            None,
            "trigger".into(),
            "context".into(),
            "decision".into(),
            "rationale".into(),
            vec!["decision".into()],
            scope,
            vec![],
            DecisionSource::ClaudeLog,
            Provenance::default(),
        );
        let backdated = Utc::now() - Duration::days(days_old);
        d.created_at = backdated;
        d.edited_at = backdated;
        d
    }

    #[test]
    fn tactical_decision_stale_past_30_days() {
        let fresh = decision_aged(DecisionScope::Tactical, 10);
        let stale = decision_aged(DecisionScope::Tactical, 40);
        let flagged = classify_stale(&[fresh, stale]);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].threshold_days, 30);
    }

    #[test]
    fn architectural_decision_tolerates_a_year() {
        let d = decision_aged(DecisionScope::Architectural, 200);
        assert!(classify_stale(&[d]).is_empty());
    }

    #[test]
    fn touch_resets_the_staleness_clock() {
        let mut d = decision_aged(DecisionScope::Tactical, 60);
        d.touch();
        assert!(classify_stale(&[d]).is_empty());
    }
}
