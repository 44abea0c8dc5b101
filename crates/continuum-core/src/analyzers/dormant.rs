//! Dormant-alternative detector (spec §4.6). Grounded on
//! `original_source/apps/api/services/dormant_detector.py`'s
//! `DormantAlternativeDetector.find_dormant_alternatives`.

use crate::graph::GraphStorage;
use chrono::Utc;
use continuum_types::{CandidateDecision, CandidateStatus, Result, UserId};
use serde::Serialize;

/// A rejected alternative that has never resurfaced in a later decision.
#[derive(Debug, Clone, Serialize)]
pub struct DormantAlternative {
    pub candidate_id: String,
    pub text: String,
    pub days_dormant: i64,
    pub rejected_by_decision_id: String,
    pub original_decision: String,
    /// `0.6 * age_score + 0.4 * (1 - original_confidence)`, spec §4.6.
    pub reconsider_score: f64,
}

/// Load every rejected candidate at least `min_days_dormant` old whose text
/// does not appear, in either containment direction, in any decision made
/// after the one that rejected it. Results are ranked by `reconsider_score`
/// descending.
pub fn find_dormant_alternatives(
    storage: &dyn GraphStorage,
    user_id: &UserId,
    min_days_dormant: i64,
    limit: usize,
) -> Result<Vec<DormantAlternative>> {
    let candidates: Vec<CandidateDecision> = storage
        .list_candidates(user_id)?
        .into_iter()
        .filter(|c| c.status == CandidateStatus::Rejected)
        .collect();
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let decisions = storage.list_decisions(user_id)?;
    let now = Utc::now();
    let mut dormant = Vec::new();

    for candidate in candidates {
        let days_dormant = (now - candidate.created_at).num_days();
        if days_dormant < min_days_dormant {
            continue;
        }

        let rejecting = decisions.iter().find(|d| d.id == candidate.rejected_by_decision_id);
        let Some(rejecting) = rejecting else { continue };

        let candidate_lower = candidate.text.to_lowercase();
        let resurfaced = decisions.iter().any(|later| {
            later.created_at > rejecting.created_at && {
                let later_lower = later.agent_decision.to_lowercase();
                later_lower.contains(&candidate_lower) || candidate_lower.contains(&later_lower)
            }
        });
        if resurfaced {
            continue;
        }

        let age_score = (days_dormant as f64 / 365.0).min(1.0);
        let confidence_penalty = 1.0 - rejecting.confidence as f64;
        let reconsider_score = age_score * 0.6 + confidence_penalty * 0.4;

        dormant.push(DormantAlternative {
            candidate_id: candidate.id.to_string(),
            text: candidate.text,
            days_dormant,
            rejected_by_decision_id: rejecting.id.to_string(),
            original_decision: rejecting.agent_decision.clone(),
            reconsider_score,
        });
    }

    dormant.sort_by(|a, b| b.reconsider_score.partial_cmp(&a.reconsider_score).unwrap());
    dormant.truncate(limit);
    Ok(dormant)
}
