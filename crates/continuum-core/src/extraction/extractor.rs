//! Orchestrates decision extraction from a parsed conversation (spec §4.2):
//! budgets the transcript into the model's effective window (compressing
//! older turns on overflow), sanitizes it, runs the structured-extraction
//! prompt, recovers JSON from the response, classifies decision type, and
//! calibrates confidence per field. Grounded on
//! `original_source/apps/api/tests/services/test_extractor.py`'s pipeline
//! shape and `agents/decision-memory/src/agent.rs`'s existing
//! extraction-call structure.

use crate::extraction::json::extract_json_from_response;
use crate::extraction::parser::{Conversation, Role, Turn};
use crate::extraction::sanitizer::get_safe_prompt;
use crate::llm::{
    decision_extraction_system_prompt, decision_extraction_user_prompt, decision_type_classification_prompt,
    turn_compression_prompt, ChatMessage, ResilientLlmClient, EXTRACTION_PROMPT_VERSION,
};
use crate::telemetry::sanitize_user_id;
use continuum_types::{ConfidenceCalibrationMethod, CoreError, DecisionScope, Grounding, Provenance, SourceRef, Span};
use serde::Deserialize;
use serde_json::Value;

/// Raw decision shape the extraction prompt is instructed to emit.
#[derive(Debug, Clone, Deserialize, Default)]
struct RawDecisionJson {
    #[serde(default)]
    trigger: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    decision: String,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    assumptions: Vec<String>,
}

/// A fully-processed candidate decision, ready for the graph writer (spec
/// §4.2's output contract, one step short of `Decision::new` so the caller
/// attaches `user_id`/`project`).
#[derive(Debug, Clone)]
pub struct ExtractedDecision {
    pub trigger: String,
    pub context: String,
    pub agent_decision: String,
    pub agent_rationale: String,
    pub options: Vec<String>,
    pub assumptions: Vec<String>,
    pub scope: DecisionScope,
    pub confidence: f32,
    pub grounding: Option<Grounding>,
    pub provenance: Provenance,
}

/// Classification label the type-detection step assigns (spec §4.2 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionTypeLabel {
    TechnologyChoice,
    PatternChoice,
    Architecture,
    Process,
    Other,
}

impl DecisionTypeLabel {
    /// Maps a decision-type label onto the staleness `DecisionScope` the
    /// graph actually persists (spec §3 doesn't carry a separate "type"
    /// field on `Decision`; the classifier's output feeds scope instead).
    #[must_use]
    pub fn to_scope(self) -> DecisionScope {
        match self {
            Self::Architecture => DecisionScope::Architectural,
            Self::TechnologyChoice | Self::PatternChoice => DecisionScope::Strategic,
            Self::Process => DecisionScope::Tactical,
            Self::Other => DecisionScope::Unknown,
        }
    }

    fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "technology-choice" => Some(Self::TechnologyChoice),
            "pattern-choice" => Some(Self::PatternChoice),
            "architecture" => Some(Self::Architecture),
            "process" => Some(Self::Process),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

const ARCHITECTURE_KEYWORDS: &[&str] = &["architecture", "microservice", "monolith", "service boundary", "system design"];
const PATTERN_KEYWORDS: &[&str] = &["design pattern", "repository pattern", "observer pattern", "factory pattern", "middleware"];
const PROCESS_KEYWORDS: &[&str] = &["workflow", "ci/cd", "pipeline", "code review process", "release process"];

/// Cheap keyword classification, avoiding a classifier LLM call on the
/// common case (spec §4.2 step 5: "keyword rules ... classifier prompt when
/// inconclusive").
#[must_use]
pub fn detect_decision_type_keywords(decision_text: &str, rationale: &str) -> Option<DecisionTypeLabel> {
    let combined = format!("{decision_text} {rationale}").to_lowercase();
    if ARCHITECTURE_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return Some(DecisionTypeLabel::Architecture);
    }
    if PATTERN_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return Some(DecisionTypeLabel::PatternChoice);
    }
    if PROCESS_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return Some(DecisionTypeLabel::Process);
    }
    None
}

fn heuristic_confidence(decision: &RawDecisionJson) -> f32 {
    let checks: [(bool, f32); 6] = [
        (!decision.trigger.trim().is_empty(), 0.15),
        (!decision.context.trim().is_empty(), 0.15),
        (!decision.decision.trim().is_empty(), 0.25),
        (!decision.rationale.trim().is_empty(), 0.25),
        (decision.options.len() >= 2, 0.1),
        (!decision.assumptions.is_empty(), 0.1),
    ];
    checks.iter().filter(|(present, _)| *present).map(|(_, weight)| weight).sum()
}

/// Blend field-completeness and sampling-temperature signals into a single
/// `[0, 1]` confidence per `Config::confidence_calibration_method` (spec
/// §4.2's three named strategies: heuristic, temperature, composite).
fn calibrate_confidence(method: ConfidenceCalibrationMethod, decision: &RawDecisionJson, temperature: f32) -> f32 {
    let heuristic = heuristic_confidence(decision);
    let temperature_scaled = (1.0 - temperature * 0.5).clamp(0.0, 1.0);
    match method {
        ConfidenceCalibrationMethod::Heuristic => heuristic,
        ConfidenceCalibrationMethod::Temperature => temperature_scaled,
        ConfidenceCalibrationMethod::Composite => ((heuristic + temperature_scaled) / 2.0).clamp(0.0, 1.0),
    }
}

/// Locate `needle` verbatim in one of `turns`, returning the byte offsets
/// within that turn's content and the owning turn index (spec §3's
/// `Grounding`/`Span`). `None` if the model paraphrased rather than quoted.
fn find_grounding_span(turns: &[Turn], needle: &str) -> Option<Span> {
    let needle = needle.trim();
    if needle.is_empty() {
        return None;
    }
    turns.iter().enumerate().find_map(|(index, turn)| {
        turn.content
            .find(needle)
            .map(|pos| Span { start_char: pos, end_char: pos + needle.len(), turn_index: index })
    })
}

fn build_grounding(turns: &[Turn], decision_text: &str, trigger: &str, rationale: &str) -> Grounding {
    let decision_span = find_grounding_span(turns, decision_text);
    Grounding {
        verbatim_decision: decision_span.is_some().then(|| decision_text.to_string()),
        verbatim_trigger: find_grounding_span(turns, trigger).is_some().then(|| trigger.to_string()),
        verbatim_rationale: find_grounding_span(turns, rationale).is_some().then(|| rationale.to_string()),
        decision_span,
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

fn transcript_of(turns: &[Turn]) -> String {
    turns.iter().map(|t| format!("{}: {}", role_label(t.role), t.content)).collect::<Vec<_>>().join("\n")
}

fn estimate_tokens_rough(text: &str) -> usize {
    text.len() / 4
}

/// Orchestrates end-to-end decision extraction for one conversation.
pub struct DecisionExtractor<'a> {
    llm: &'a ResilientLlmClient,
    confidence_method: ConfidenceCalibrationMethod,
    verbatim_grounding_enabled: bool,
    effective_window_tokens: usize,
}

impl<'a> DecisionExtractor<'a> {
    #[must_use]
    pub fn new(
        llm: &'a ResilientLlmClient,
        confidence_method: ConfidenceCalibrationMethod,
        verbatim_grounding_enabled: bool,
        effective_window_tokens: usize,
    ) -> Self {
        Self { llm, confidence_method, verbatim_grounding_enabled, effective_window_tokens }
    }

    /// Extract every decision from `conversation` for `user_id`, compressing
    /// the transcript first if it would overflow 85% of the model's window
    /// (spec §4.2 step 1).
    pub async fn extract(&self, user_id: &str, conversation: &Conversation) -> Result<Vec<ExtractedDecision>, CoreError> {
        if conversation.is_empty() {
            return Ok(Vec::new());
        }

        let budget_tokens = (self.effective_window_tokens as f64 * 0.85) as usize;
        let sanitized_turns: Vec<Turn> = conversation
            .turns
            .iter()
            .map(|t| {
                let mut turn = t.clone();
                turn.content = get_safe_prompt(&t.content, "[redacted: unsafe content removed]");
                turn
            })
            .collect();

        let transcript = self.budget_transcript(user_id, &sanitized_turns, budget_tokens).await?;

        let system = decision_extraction_system_prompt();
        let user = decision_extraction_user_prompt(&transcript);
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let (response, usage) = self.llm.generate(user_id, &messages, 0.2, 4096, EXTRACTION_PROMPT_VERSION).await?;

        let Some(value) = extract_json_from_response(&response, true) else {
            tracing::warn!(user_id = %sanitize_user_id(user_id), "decision extraction produced no parseable JSON");
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            tracing::warn!(user_id = %sanitize_user_id(user_id), "decision extraction response was not a JSON array after promotion");
            return Ok(Vec::new());
        };

        let mut decisions = Vec::new();
        for item in items {
            let raw: RawDecisionJson = match serde_json::from_value(item) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(user_id = %sanitize_user_id(user_id), error = %err, "skipping malformed decision object");
                    continue;
                }
            };
            if raw.decision.trim().is_empty() {
                continue;
            }

            let mut options = raw.options.clone();
            if options.iter().all(|o| !o.trim().eq_ignore_ascii_case(raw.decision.trim())) {
                options.push(raw.decision.clone());
            }

            let scope = match detect_decision_type_keywords(&raw.decision, &raw.rationale) {
                Some(label) => label.to_scope(),
                None => self.classify_type_via_llm(user_id, &raw.decision).await.unwrap_or(DecisionTypeLabel::Other).to_scope(),
            };

            let confidence = calibrate_confidence(self.confidence_method, &raw, 0.2);
            let grounding = self
                .verbatim_grounding_enabled
                .then(|| build_grounding(&sanitized_turns, &raw.decision, &raw.trigger, &raw.rationale));

            let provenance = Provenance {
                extraction_method: "llm_structured_extraction".to_string(),
                model_name: Some(self.llm.model_name().to_string()),
                prompt_template_version: Some(EXTRACTION_PROMPT_VERSION.to_string()),
                input_tokens: Some(usage.prompt_tokens),
                output_tokens: Some(usage.completion_tokens),
                retry_count: 0,
                validation_flags: Vec::new(),
                source_ref: SourceRef::new(None, None, Some(conversation.session_timestamp), None),
            };

            decisions.push(ExtractedDecision {
                trigger: raw.trigger,
                context: raw.context,
                agent_decision: raw.decision,
                agent_rationale: raw.rationale,
                options,
                assumptions: raw.assumptions,
                scope,
                confidence,
                grounding,
                provenance,
            });
        }

        Ok(decisions)
    }

    async fn classify_type_via_llm(&self, user_id: &str, decision_text: &str) -> Result<DecisionTypeLabel, CoreError> {
        let prompt = decision_type_classification_prompt(decision_text);
        let messages = vec![ChatMessage::user(prompt)];
        let (response, _) = self.llm.generate(user_id, &messages, 0.0, 16, EXTRACTION_PROMPT_VERSION).await?;
        Ok(DecisionTypeLabel::parse(response.trim()).unwrap_or(DecisionTypeLabel::Other))
    }

    /// Fit `turns` within `budget_tokens`, summarizing the older half of the
    /// conversation through the LLM if the raw transcript would overflow
    /// (spec §4.2 step 1). Falls back to a hard character truncation if even
    /// the compressed transcript overflows.
    async fn budget_transcript(&self, user_id: &str, turns: &[Turn], budget_tokens: usize) -> Result<String, CoreError> {
        let full = transcript_of(turns);
        if estimate_tokens_rough(&full) <= budget_tokens || turns.len() < 2 {
            return Ok(full);
        }

        let split = turns.len() / 2;
        let (older, recent) = turns.split_at(split.max(1));
        let older_text = transcript_of(older);
        let prompt = turn_compression_prompt(&older_text);
        let messages = vec![ChatMessage::user(prompt)];
        let (summary, _) = self.llm.generate(user_id, &messages, 0.3, 1024, EXTRACTION_PROMPT_VERSION).await?;

        let recent_text = transcript_of(recent);
        let compressed = format!("[earlier conversation summarized]\n{summary}\n\n{recent_text}");
        if estimate_tokens_rough(&compressed) <= budget_tokens {
            Ok(compressed)
        } else {
            let char_budget = budget_tokens * 4;
            Ok(compressed.chars().take(char_budget).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_detection_finds_architecture() {
        let label = detect_decision_type_keywords("switch to a microservice architecture", "");
        assert_eq!(label, Some(DecisionTypeLabel::Architecture));
    }

    #[test]
    fn keyword_detection_finds_process() {
        let label = detect_decision_type_keywords("adopt a new ci/cd pipeline", "");
        assert_eq!(label, Some(DecisionTypeLabel::Process));
    }

    #[test]
    fn keyword_detection_is_none_when_inconclusive() {
        assert_eq!(detect_decision_type_keywords("use PostgreSQL", "fits our workload"), None);
    }

    #[test]
    fn decision_type_label_parses_known_labels() {
        assert_eq!(DecisionTypeLabel::parse("technology-choice"), Some(DecisionTypeLabel::TechnologyChoice));
        assert_eq!(DecisionTypeLabel::parse("Architecture"), Some(DecisionTypeLabel::Architecture));
        assert_eq!(DecisionTypeLabel::parse("nonsense"), None);
    }

    #[test]
    fn decision_type_maps_to_expected_scope() {
        assert_eq!(DecisionTypeLabel::Architecture.to_scope(), DecisionScope::Architectural);
        assert_eq!(DecisionTypeLabel::Process.to_scope(), DecisionScope::Tactical);
        assert_eq!(DecisionTypeLabel::Other.to_scope(), DecisionScope::Unknown);
    }

    #[test]
    fn heuristic_confidence_rewards_complete_fields() {
        let complete = RawDecisionJson {
            trigger: "need a datastore".to_string(),
            context: "greenfield service".to_string(),
            decision: "PostgreSQL".to_string(),
            rationale: "best fit".to_string(),
            options: vec!["PostgreSQL".to_string(), "MongoDB".to_string()],
            assumptions: vec!["low write volume".to_string()],
        };
        let sparse = RawDecisionJson { decision: "PostgreSQL".to_string(), ..Default::default() };
        assert!(calibrate_confidence(ConfidenceCalibrationMethod::Heuristic, &complete, 0.2) > calibrate_confidence(ConfidenceCalibrationMethod::Heuristic, &sparse, 0.2));
    }

    #[test]
    fn temperature_calibration_favors_lower_temperature() {
        let raw = RawDecisionJson { decision: "x".to_string(), ..Default::default() };
        let low_temp = calibrate_confidence(ConfidenceCalibrationMethod::Temperature, &raw, 0.0);
        let high_temp = calibrate_confidence(ConfidenceCalibrationMethod::Temperature, &raw, 1.0);
        assert!(low_temp > high_temp);
    }

    #[test]
    fn grounding_finds_verbatim_quote_and_its_turn() {
        let turns = vec![
            Turn { role: Role::User, content: "let's use PostgreSQL for this".to_string(), timestamp: chrono::Utc::now(), tool_calls: vec![] },
            Turn { role: Role::Assistant, content: "sounds good".to_string(), timestamp: chrono::Utc::now(), tool_calls: vec![] },
        ];
        let grounding = build_grounding(&turns, "PostgreSQL", "missing trigger text", "missing rationale text");
        assert_eq!(grounding.verbatim_decision, Some("PostgreSQL".to_string()));
        assert_eq!(grounding.decision_span.as_ref().unwrap().turn_index, 0);
        assert_eq!(grounding.verbatim_trigger, None);
    }

    #[test]
    fn transcript_of_formats_role_prefixed_lines() {
        let turns = vec![Turn { role: Role::User, content: "hello".to_string(), timestamp: chrono::Utc::now(), tool_calls: vec![] }];
        assert_eq!(transcript_of(&turns), "user: hello");
    }
}
