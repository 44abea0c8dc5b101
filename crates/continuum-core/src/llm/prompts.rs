//! Prompt templates for the four LLM-backed operations in the pipeline:
//! decision extraction (§4.2), decision-type classification (§4.2 step 5),
//! paired evolution analysis (§4.5), and turn-compression for oversize
//! conversations (§4.2 step 1). Kept as plain functions rather than a
//! template engine, matching the teacher's preference for small focused
//! modules over a templating dependency.

/// Current prompt version, embedded in cache keys so a prompt change
/// invalidates stale cached responses (spec §4.2's cache key).
pub const EXTRACTION_PROMPT_VERSION: &str = "v1";

/// System prompt instructing the model to emit a JSON array of decision
/// objects. The extractor tolerates the response being wrapped in fenced
/// code blocks or a single bare object (§4.2 step 2 / `extraction::json`).
#[must_use]
pub fn decision_extraction_system_prompt() -> String {
    "You are an expert software architect reviewing a conversation between a \
developer and an AI coding agent. Identify every architectural decision that \
was made, considering the following fields for each: trigger (what prompted \
the decision), context, options (every alternative considered, including the \
one chosen), decision (the option chosen, verbatim where possible), \
rationale, and assumptions (any stated or implied constraints the decision \
relies on). Respond with a JSON array of objects with these exact keys: \
trigger, context, options, decision, rationale, assumptions. If no decisions \
were made, respond with an empty array. Do not include any text outside the \
JSON array.".to_string()
}

/// User-turn prompt wrapping the (already sanitized, possibly compressed)
/// conversation transcript.
#[must_use]
pub fn decision_extraction_user_prompt(transcript: &str) -> String {
    format!("Conversation transcript:\n\n{transcript}\n\nExtract all architectural decisions as a JSON array.")
}

/// Cheap classifier prompt for step 5's decision-type detection, used only
/// when keyword rules (`extraction::extractor::detect_decision_type`) are
/// inconclusive.
#[must_use]
pub fn decision_type_classification_prompt(decision_text: &str) -> String {
    format!(
        "Classify the following architectural decision into exactly one of: \
technology-choice, pattern-choice, architecture, process, other. Respond with \
only the single matching label.\n\nDecision: {decision_text}"
    )
}

/// Paired-analysis prompt for the evolution analyzer (§4.5): asks the model
/// to classify the relationship between a newly created decision and one of
/// the user's prior decisions sharing at least one entity.
#[must_use]
pub fn paired_evolution_prompt(new_decision: &str, prior_decision: &str) -> String {
    format!(
        "Compare these two architectural decisions from the same project. \
Classify their relationship as exactly one of: SUPERSEDES (the new decision \
replaces the prior one), CONTRADICTS (they conflict), SIMILAR_TO (they \
address the same concern compatibly), or UNRELATED. Respond with a JSON \
object: {{\"relationship\": <label>, \"confidence\": <0-1 float>, \
\"reasoning\": <one sentence>}}.\n\nNew decision: {new_decision}\n\n\
Prior decision: {prior_decision}"
    )
}

/// Summarization prompt used when a conversation exceeds the model's
/// effective context window (§4.2 step 1). Instructs the model to preserve
/// verbatim quotes for identified critical constraints rather than
/// paraphrasing them away.
#[must_use]
pub fn turn_compression_prompt(turns: &str) -> String {
    format!(
        "Summarize the following older portion of a conversation, preserving \
verbatim any sentence that states a hard constraint, requirement, or \
numeric limit (quote it exactly). Everything else may be condensed.\n\n{turns}"
    )
}
