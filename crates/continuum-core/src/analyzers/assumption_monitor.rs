//! Assumption-violation monitor (spec §4.6). Grounded on
//! `original_source/apps/api/services/assumption_monitor.py`'s
//! `_assumption_contradicted_by`/`scan_project` — the "sleeping decision"
//! problem: a decision made under assumption X now runs on a codebase
//! where X no longer holds.

use continuum_types::{Decision, Result, UserId};
use std::sync::OnceLock;

/// An assumption of one decision contradicted by a later one.
#[derive(Debug, Clone)]
pub struct InvalidatedAssumption {
    pub decision_id: String,
    pub assumption: String,
    pub invalidating_decision_id: String,
    pub invalidating_text: String,
    pub confidence: f32,
}

const NEGATION_PHRASES: &[&str] = &[
    "no longer",
    "deprecated",
    "replaced by",
    "removed",
    "migrated away from",
    "switched from",
    "moved away from",
    "abandoned",
    "dropped support for",
];

const ANTONYM_PAIRS: &[(&str, &str)] = &[
    ("monolith", "microservice"),
    ("synchronous", "async"),
    ("sql", "nosql"),
    ("rest", "graphql"),
    ("rest", "grpc"),
    ("single tenant", "multi tenant"),
    ("single-tenant", "multi-tenant"),
    ("postgres", "mongodb"),
    ("postgres", "cassandra"),
    ("jwt", "session"),
    ("class", "functional"),
    ("oop", "functional"),
    ("on-premise", "cloud"),
    ("on-prem", "cloud"),
];

fn scale_unit_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"\b(\d[\d,]*)\s*(req|rps|users|records|gb|mb|kb|ms)\b").unwrap()
    })
}

/// Does `later_text` contradict `assumption`? Returns `(true, confidence)`
/// on the first matching heuristic, highest-confidence heuristic tried
/// first is not required — stages run in the order the original checks
/// them: negation, antonym, scale.
#[must_use]
pub fn assumption_contradicted_by(assumption: &str, later_text: &str) -> (bool, f32) {
    let assumption_lower = assumption.to_lowercase();
    let later_lower = later_text.to_lowercase();

    for phrase in NEGATION_PHRASES {
        if later_lower.contains(phrase) {
            let hits_keyword = assumption_lower
                .split_whitespace()
                .filter(|w| w.len() > 4)
                .any(|w| later_lower.contains(w));
            if hits_keyword {
                return (true, 0.75);
            }
        }
    }

    for (a, b) in ANTONYM_PAIRS {
        if assumption_lower.contains(a) && later_lower.contains(b) {
            return (true, 0.80);
        }
        if assumption_lower.contains(b) && later_lower.contains(a) {
            return (true, 0.80);
        }
    }

    let re = scale_unit_regex();
    let assumption_numbers: Vec<(f64, String)> = re
        .captures_iter(&assumption_lower)
        .filter_map(|c| {
            let num: f64 = c[1].replace(',', "").parse().ok()?;
            Some((num, c[2].to_string()))
        })
        .collect();
    let later_numbers: Vec<(f64, String)> = re
        .captures_iter(&later_lower)
        .filter_map(|c| {
            let num: f64 = c[1].replace(',', "").parse().ok()?;
            Some((num, c[2].to_string()))
        })
        .collect();
    for (a_num, a_unit) in &assumption_numbers {
        for (l_num, l_unit) in &later_numbers {
            if a_unit == l_unit && *l_num >= *a_num * 10.0 {
                return (true, 0.70);
            }
        }
    }

    (false, 0.0)
}

/// Scan every decision with nonempty `assumptions[]` against every
/// later-in-time decision the user owns, flagging the first invalidating
/// match per assumption (spec §4.6: "records `ASSUMPTION_INVALIDATED`
/// edges with `detected_at` and the offending assumption string" — this
/// function returns what the caller should persist as those edges; writing
/// them is the caller's job since it needs a `GraphWriter`/storage handle).
pub fn scan_for_invalidated_assumptions(decisions: &[Decision]) -> Vec<InvalidatedAssumption> {
    let mut invalidated = Vec::new();

    for decision in decisions {
        if decision.assumptions.is_empty() {
            continue;
        }
        let later: Vec<&Decision> = decisions
            .iter()
            .filter(|d| d.created_at > decision.created_at)
            .collect();

        for assumption in &decision.assumptions {
            if assumption.trim().len() < 5 {
                continue;
            }
            for candidate in &later {
                let combined = format!(
                    "{} {} {}",
                    candidate.trigger, candidate.context, candidate.agent_decision
                );
                let (contradicted, confidence) = assumption_contradicted_by(assumption, &combined);
                if contradicted {
                    invalidated.push(InvalidatedAssumption {
                        decision_id: decision.id.to_string(),
                        assumption: assumption.clone(),
                        invalidating_decision_id: candidate.id.to_string(),
                        invalidating_text: combined.chars().take(300).collect(),
                        confidence,
                    });
                    break;
                }
            }
        }
    }

    invalidated.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
    invalidated
}

/// Convenience wrapper that loads all of a user's decisions then scans
/// them, for callers that only have a storage handle.
pub fn scan_user_decisions(
    storage: &dyn crate::graph::GraphStorage,
    user_id: &UserId,
) -> Result<Vec<InvalidatedAssumption>> {
    let decisions = storage.list_decisions(user_id)?;
    Ok(scan_for_invalidated_assumptions(&decisions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_phrase_near_shared_keyword_contradicts() {
        let (hit, confidence) =
            assumption_contradicted_by("We rely on the legacy billing service", "The legacy service was deprecated last month");
        assert!(hit);
        assert!((confidence - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn antonym_pair_contradicts_in_either_direction() {
        let (hit, _) = assumption_contradicted_by("We run a monolith", "Moved to a microservice architecture");
        assert!(hit);
        let (hit2, _) = assumption_contradicted_by("We use microservices", "Consolidated into a monolith");
        assert!(hit2);
    }

    #[test]
    fn scale_growth_of_ten_x_contradicts() {
        let (hit, confidence) =
            assumption_contradicted_by("Traffic is under 100 req/s", "We now handle 5,000 req/s");
        assert!(hit);
        assert!((confidence - 0.70).abs() < f32::EPSILON);
    }

    #[test]
    fn unrelated_text_does_not_contradict() {
        let (hit, _) = assumption_contradicted_by("We use Postgres for storage", "Added a new marketing page");
        assert!(!hit);
    }

    #[test]
    fn scan_reports_only_the_first_invalidating_decision_per_assumption() {
        use chrono::Duration;
        use continuum_types::{DecisionScope, DecisionSource, Provenance};

        let mut base = Decision::new(
            UserId::from("alice"),
            None,
            "trigger".into(),
            "context".into(),
            "decision".into(),
            "rationale".into(),
            vec!["decision".into()],
            DecisionScope::Strategic,
            vec!["We run a monolith".into()],
            DecisionSource::ClaudeLog,
            Provenance::default(),
        );
        base.created_at = chrono::Utc::now() - Duration::days(30);

        let mut later1 = Decision::new(
            UserId::from("alice"),
            None,
            "split services".into(),
            "scaling pains".into(),
            "Moved to a microservice architecture".into(),
            "rationale".into(),
            vec!["Moved to a microservice architecture".into()],
            DecisionScope::Strategic,
            vec![],
            DecisionSource::ClaudeLog,
            Provenance::default(),
        );
        later1.created_at = chrono::Utc::now() - Duration::days(10);

        let mut later2 = later1.clone();
        later2.created_at = chrono::Utc::now() - Duration::days(5);

        let invalidated = scan_for_invalidated_assumptions(&[base.clone(), later1.clone(), later2]);
        assert_eq!(invalidated.len(), 1);
        assert_eq!(invalidated[0].invalidating_decision_id, later1.id.to_string());
    }
}
