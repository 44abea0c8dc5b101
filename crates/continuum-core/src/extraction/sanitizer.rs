//! Prompt-injection defense applied to conversation text before it enters
//! any LLM prompt (spec §4.7). Grounded on
//! `original_source/apps/api/utils/prompt_sanitizer.py` and its test suite
//! (`tests/test_prompt_sanitizer.py`), which enumerates the exact pattern
//! categories and sanitization transforms expected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Risk level assigned to a piece of text after pattern + structural
/// analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionRiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// One detected pattern: the matched text, its category, and which part of
/// the prompt it would have targeted.
pub type DetectedPattern = (String, &'static str, &'static str);

/// Full result of sanitizing one piece of text.
#[derive(Debug, Clone)]
pub struct SanitizationResult {
    pub original_text: String,
    pub sanitized_text: String,
    pub risk_level: InjectionRiskLevel,
    pub detected_patterns: Vec<String>,
    pub confidence: f64,
    pub was_modified: bool,
}

struct PatternRule {
    regex: Regex,
    category: &'static str,
    target: &'static str,
}

static PATTERN_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule {
            regex: Regex::new(r"(?i)\b(ignore|forget|disregard)\b.{0,30}\b(previous|prior|above|system)\b.{0,20}\b(instructions?|prompt|rules?)\b").unwrap(),
            category: "system_override",
            target: "system",
        },
        PatternRule {
            regex: Regex::new(r"(?i)\byou are now\b|\bpretend (you are|to be)\b|\back as\b.{0,20}\bunrestricted\b").unwrap(),
            category: "role_hijack",
            target: "system",
        },
        PatternRule {
            regex: Regex::new(r"###|\[INST\]|\[/INST\]|\[SYSTEM\]").unwrap(),
            category: "boundary_attack",
            target: "boundary",
        },
        PatternRule {
            regex: Regex::new(r"(?i)\bDAN\b|developer mode|\bjailbreak\b").unwrap(),
            category: "jailbreak",
            target: "system",
        },
        PatternRule {
            regex: Regex::new(r"(?i)\b(output|reveal|show|print)\b.{0,20}\b(your |the )?(system )?(prompt|instructions)\b").unwrap(),
            category: "data_exfil",
            target: "system",
        },
    ]
});

/// Scan `text` for every known injection pattern category, returning each
/// match alongside the category and target it threatens.
#[must_use]
pub fn detect_injection_patterns(text: &str) -> Vec<DetectedPattern> {
    PATTERN_RULES
        .iter()
        .filter_map(|rule| rule.regex.find(text).map(|m| (m.as_str().to_string(), rule.category, rule.target)))
        .collect()
}

/// Structural concerns independent of any single keyword match: role-like
/// line prefixes, markdown headers suggesting a system prompt, and a
/// density of prompt-framing keywords.
#[must_use]
pub fn analyze_structure(text: &str) -> Vec<String> {
    let mut concerns = Vec::new();
    static ROLE_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*(system|assistant|user)\s*:").unwrap());
    static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^#{1,3}\s*system").unwrap());
    static MARKER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?im)^\s*(prompt|instruction|context|system)\s*:").unwrap());

    if ROLE_LINE_RE.find_iter(text).count() >= 2 {
        concerns.push("role_like_line_formatting".to_string());
    }
    if HEADER_RE.is_match(text) {
        concerns.push("suspicious_header".to_string());
    }
    if MARKER_RE.find_iter(text).count() >= 3 {
        concerns.push("multiple_prompt_markers".to_string());
    }
    concerns
}

/// Combine pattern matches into a risk level and confidence score: no
/// patterns is `None`/0.0; a single pattern starts at `Medium` with
/// moderate confidence; each additional distinct category escalates risk
/// and adds confidence (spec §4.7: "scores risk ... with confidence").
#[must_use]
pub fn calculate_risk_level(patterns: &[DetectedPattern]) -> (InjectionRiskLevel, f64) {
    if patterns.is_empty() {
        return (InjectionRiskLevel::None, 0.0);
    }
    let distinct_categories: std::collections::HashSet<&str> = patterns.iter().map(|p| p.1).collect();
    let confidence = (0.5 + 0.15 * (patterns.len() as f64 - 1.0)).min(0.95);
    let risk = match distinct_categories.len() {
        1 => InjectionRiskLevel::Medium,
        2 => InjectionRiskLevel::High,
        _ => InjectionRiskLevel::Critical,
    };
    (risk, confidence)
}

/// Strip zero-width and other invisible characters sometimes used to hide
/// injected instructions.
#[must_use]
pub fn remove_invisible_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{2060}'))
        .collect()
}

/// Escape role-like markers (`System:`, `Assistant:`) so they render as
/// quoted data rather than structural prompt syntax.
#[must_use]
pub fn escape_role_markers(text: &str) -> String {
    static ROLE_PREFIX_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?im)^(\s*)(system|assistant|user)(\s*:)").unwrap());
    ROLE_PREFIX_RE.replace_all(text, "$1\"$2$3").into_owned()
}

/// Neutralize boundary-injection tokens by wrapping them in an explanatory
/// marker instead of deleting them outright (keeps the reported content
/// visible to a reviewer while defusing its structural effect).
#[must_use]
pub fn neutralize_boundary_attacks(text: &str) -> String {
    static BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"###|\[INST\]|\[/INST\]|\[SYSTEM\]").unwrap());
    BOUNDARY_RE.replace_all(text, "(user mentioned a boundary marker)").into_owned()
}

/// Full sanitization pipeline (spec §4.7's `{sanitized_text, risk_level,
/// detected_patterns[], was_modified}` contract). Never raises: malformed
/// or adversarial input always yields a result, not an error.
#[must_use]
pub fn sanitize_prompt(text: &str) -> SanitizationResult {
    let patterns = detect_injection_patterns(text);
    let structural = analyze_structure(text);
    let (mut risk, confidence) = calculate_risk_level(&patterns);
    if risk == InjectionRiskLevel::None && !structural.is_empty() {
        risk = InjectionRiskLevel::Low;
    }

    let mut sanitized = text.to_string();
    let mut was_modified = false;

    let without_invisible = remove_invisible_characters(&sanitized);
    if without_invisible != sanitized {
        sanitized = without_invisible;
        was_modified = true;
    }

    if risk >= InjectionRiskLevel::Medium {
        let escaped = escape_role_markers(&sanitized);
        if escaped != sanitized {
            sanitized = escaped;
            was_modified = true;
        }
        let neutralized = neutralize_boundary_attacks(&sanitized);
        if neutralized != sanitized {
            sanitized = neutralized;
            was_modified = true;
        }
    }

    let detected_patterns: Vec<String> = patterns.iter().map(|(m, cat, _)| format!("{cat}:{m}")).collect();

    SanitizationResult {
        original_text: text.to_string(),
        sanitized_text: sanitized,
        risk_level: risk,
        detected_patterns,
        confidence,
        was_modified,
    }
}

/// `true` unless `text`'s risk exceeds `max_risk` (default callers should
/// pass `InjectionRiskLevel::Low`).
#[must_use]
pub fn is_safe_for_llm(text: &str, max_risk: InjectionRiskLevel) -> bool {
    sanitize_prompt(text).risk_level <= max_risk
}

/// Returns the sanitized text if the risk is within tolerance, otherwise a
/// `fallback` string substituted in its place (spec §4.7's policy: text at
/// or above `high` risk is substituted, never raised as an exception).
#[must_use]
pub fn get_safe_prompt(text: &str, fallback: &str) -> String {
    let result = sanitize_prompt(text);
    if result.risk_level >= InjectionRiskLevel::High {
        fallback.to_string()
    } else {
        result.sanitized_text
    }
}
