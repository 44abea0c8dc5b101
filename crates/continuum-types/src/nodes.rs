//! Core node types of the decision-memory graph (spec §3).

use crate::ids::{CandidateId, CodeEntityKey, CommitSha, DecisionId, EntityId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a decision record originated (spec §3, "Source").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Extracted from a captured Claude (or other agent) conversation log.
    ClaudeLog,
    /// Entered via an interview/manual-capture flow.
    Interview,
    /// Hand-entered through the API or CLI with no extraction step.
    Manual,
    /// Bulk-imported from an external ledger.
    Import,
    /// Written directly through `/api/agent/remember`.
    Api,
    /// Originated outside the system entirely (e.g. a linked ticket).
    External,
}

/// Staleness category controlling per-scope staleness thresholds (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionScope {
    /// Short-lived, easily reversed choices. Staleness threshold: 30 days.
    Tactical,
    /// Medium-term choices affecting a subsystem. Threshold: 180 days.
    Strategic,
    /// Foundational, hard-to-reverse choices. Threshold: 365 days.
    Architectural,
    /// Scope could not be classified.
    Unknown,
}

impl DecisionScope {
    /// Default staleness threshold in days for this scope (spec §4.6).
    #[must_use]
    pub fn staleness_threshold_days(self) -> i64 {
        match self {
            Self::Tactical => 30,
            Self::Strategic => 180,
            Self::Architectural => 365,
            Self::Unknown => 180,
        }
    }
}

/// Character-offset + turn-index grounding span (spec §3, "Grounding").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start offset, inclusive, within the source text.
    pub start_char: usize,
    /// End offset, exclusive.
    pub end_char: usize,
    /// Index of the conversation turn the span falls within.
    pub turn_index: usize,
}

/// Exact-substring grounding for a decision's key fields, when
/// `verbatim_grounding_enabled` (spec §3, §6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grounding {
    /// Verbatim substring backing `agent_decision`.
    pub verbatim_decision: Option<String>,
    /// Verbatim substring backing `trigger`.
    pub verbatim_trigger: Option<String>,
    /// Verbatim substring backing `agent_rationale`.
    pub verbatim_rationale: Option<String>,
    /// Offsets for `verbatim_decision` within the source conversation.
    pub decision_span: Option<Span>,
}

/// Where in the source a decision was found (spec §3, "Provenance").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Path of the log file the decision was extracted from, if any.
    pub file_path: Option<String>,
    /// Line number (for file sources) or turn index (for live sessions).
    pub line_or_turn_index: Option<usize>,
    /// Original wall-clock timestamp of the triggering message.
    pub original_timestamp: Option<DateTime<Utc>>,
    /// Short excerpt (≤ 500 chars) of the surrounding text.
    pub snippet: Option<String>,
}

impl SourceRef {
    /// Maximum length of `snippet` (spec §3).
    pub const MAX_SNIPPET_LEN: usize = 500;

    /// Construct, truncating `snippet` to the 500-char ceiling.
    #[must_use]
    pub fn new(
        file_path: Option<String>,
        line_or_turn_index: Option<usize>,
        original_timestamp: Option<DateTime<Utc>>,
        snippet: Option<String>,
    ) -> Self {
        let snippet = snippet.map(|s| {
            if s.len() > Self::MAX_SNIPPET_LEN {
                s.chars().take(Self::MAX_SNIPPET_LEN).collect()
            } else {
                s
            }
        });
        Self {
            file_path,
            line_or_turn_index,
            original_timestamp,
            snippet,
        }
    }
}

/// Extraction lineage attached to a decision (spec §3, "Provenance").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    /// Name of the extraction method (e.g. `"llm_structured_extraction"`, `"manual"`).
    pub extraction_method: String,
    /// Model name used, if any.
    pub model_name: Option<String>,
    /// Version of the prompt template used for extraction.
    pub prompt_template_version: Option<String>,
    /// Prompt token count.
    pub input_tokens: Option<u32>,
    /// Completion token count.
    pub output_tokens: Option<u32>,
    /// Number of retries the extraction call required.
    pub retry_count: u32,
    /// Structured validation warnings recorded during extraction.
    pub validation_flags: Vec<String>,
    /// Where in the source material this decision was found.
    pub source_ref: SourceRef,
}

/// A human correction to an extracted decision (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanOverride {
    /// The human's corrected decision text.
    pub human_decision: String,
    /// The human's corrected rationale.
    pub human_rationale: Option<String>,
}

/// The primary record of the graph: an architectural/technical decision
/// (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Globally unique id.
    pub id: DecisionId,
    /// Owning user.
    pub user_id: UserId,
    /// Optional project label.
    pub project: Option<String>,

    /// What prompted the decision.
    pub trigger: String,
    /// Surrounding context.
    pub context: String,
    /// The choice that was made.
    pub agent_decision: String,
    /// Why it was made.
    pub agent_rationale: String,
    /// Nonempty ordered list of options considered; `agent_decision` is one of them.
    pub options: Vec<String>,
    /// Confidence in [0, 1].
    pub confidence: f32,
    /// Staleness/evolution scope.
    pub scope: DecisionScope,
    /// Short assumption strings this decision depends on.
    pub assumptions: Vec<String>,

    /// Where this decision came from.
    pub source: DecisionSource,
    /// Extraction lineage.
    pub provenance: Provenance,
    /// A human's correction, if one was applied.
    pub human_override: Option<HumanOverride>,
    /// Verbatim grounding, if enabled and found.
    pub grounding: Option<Grounding>,

    /// Dense embedding vector, dimension fixed per deployment (spec §3).
    pub embedding: Option<Vec<f32>>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-edit timestamp; equals `created_at` until the first `update`.
    pub edited_at: DateTime<Utc>,
    /// Incremented by every `update` call.
    pub edit_count: u32,
}

impl Decision {
    /// Construct a new decision with clamped confidence and a nonempty
    /// options check left to the caller's validation layer (extraction
    /// produces drafts before this invariant is enforced; the graph writer
    /// enforces it before persistence).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        project: Option<String>,
        trigger: String,
        context: String,
        agent_decision: String,
        agent_rationale: String,
        options: Vec<String>,
        scope: DecisionScope,
        assumptions: Vec<String>,
        source: DecisionSource,
        provenance: Provenance,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DecisionId::new(),
            user_id,
            project,
            trigger,
            context,
            agent_decision,
            agent_rationale,
            options,
            confidence: 0.0,
            scope,
            assumptions,
            source,
            provenance,
            human_override: None,
            grounding: None,
            embedding: None,
            created_at: now,
            edited_at: now,
            edit_count: 0,
        }
    }

    /// Set confidence, clamping to `[0, 1]` (spec §3 invariant).
    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = confidence.clamp(0.0, 1.0);
    }

    /// Apply a human correction. Increments `edit_count` and stamps `edited_at`
    /// (spec §3: "mutated only through a controlled update").
    pub fn apply_human_override(&mut self, human_decision: String, human_rationale: Option<String>) {
        self.human_override = Some(HumanOverride {
            human_decision,
            human_rationale,
        });
        self.touch();
    }

    /// Record an edit: bump the counter and stamp the timestamp. Any mutator
    /// that changes persisted content should call this.
    pub fn touch(&mut self) {
        self.edit_count += 1;
        self.edited_at = Utc::now();
    }

    /// Is `option` the chosen one, per the case-insensitive, whitespace-trimmed
    /// comparison mandated by spec §3/§4.5?
    #[must_use]
    pub fn is_chosen_option(&self, option: &str) -> bool {
        option.trim().eq_ignore_ascii_case(self.agent_decision.trim())
    }

    /// Options that were not chosen — the set for which a `CandidateDecision`
    /// must exist (spec §3 invariant #1, §4.5).
    #[must_use]
    pub fn rejected_options(&self) -> Vec<&str> {
        self.options
            .iter()
            .map(String::as_str)
            .filter(|o| !self.is_chosen_option(o))
            .collect()
    }
}

/// Category of an `Entity` (spec §3: "technology/concept/pattern/system/person/organization").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A library, language, database, or other piece of technology.
    Technology,
    /// An abstract idea or principle.
    Concept,
    /// A design or architectural pattern.
    Pattern,
    /// A named system or service.
    System,
    /// A person.
    Person,
    /// An organization.
    Organization,
}

/// A technology/concept/pattern/system/person/organization referenced by
/// decisions (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique id.
    pub id: EntityId,
    /// Owning user scope (entities are shared across a user's decisions
    /// only, per spec §3's "the user's reachable set").
    pub user_id: UserId,
    /// The single preferred spelling.
    pub canonical_name: String,
    /// Category.
    pub entity_type: EntityType,
    /// Alternate spellings that resolve to this entity.
    pub aliases: Vec<String>,
    /// Optional embedding for stage-5 similarity resolution (spec §4.3).
    pub embedding: Option<Vec<f32>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// Mint a new canonical entity.
    #[must_use]
    pub fn new(user_id: UserId, canonical_name: String, entity_type: EntityType) -> Self {
        Self {
            id: EntityId::new(),
            user_id,
            canonical_name,
            entity_type,
            aliases: Vec::new(),
            embedding: None,
            created_at: Utc::now(),
        }
    }

    /// Does `mention`, case-folded, match the canonical name or any alias?
    #[must_use]
    pub fn matches_exact(&self, mention: &str) -> bool {
        let folded = mention.trim().to_lowercase();
        self.canonical_name.to_lowercase() == folded
            || self.aliases.iter().any(|a| a.to_lowercase() == folded)
    }

    /// Text used for embedding this entity: `"type: name"` (spec §4.4).
    #[must_use]
    pub fn embedding_text(&self) -> String {
        let type_str = match self.entity_type {
            EntityType::Technology => "technology",
            EntityType::Concept => "concept",
            EntityType::Pattern => "pattern",
            EntityType::System => "system",
            EntityType::Person => "person",
            EntityType::Organization => "organization",
        };
        format!("{type_str}: {}", self.canonical_name)
    }
}

/// Lifecycle status of a `CandidateDecision` (spec §3 fixes this to
/// `rejected`; modeled as an enum so the invariant is visible in the type
/// rather than a bare string literal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// The only status a `CandidateDecision` currently takes.
    Rejected,
}

/// A rejected alternative, materialized as its own node for dormant-
/// alternative analysis (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDecision {
    /// Unique id.
    pub id: CandidateId,
    /// Verbatim option text.
    pub text: String,
    /// Creation timestamp (equals the owning decision's creation time).
    pub created_at: DateTime<Utc>,
    /// Owning user.
    pub user_id: UserId,
    /// Always `Rejected` today; kept as an enum for forward compatibility.
    pub status: CandidateStatus,
    /// The decision this candidate was rejected in favor of. The
    /// `REJECTED_BY` edge mirrors this field in the graph store.
    pub rejected_by_decision_id: DecisionId,
}

impl CandidateDecision {
    /// Create a candidate for `option`, rejected in favor of `decision`.
    #[must_use]
    pub fn new(option: String, decision: &Decision) -> Self {
        Self {
            id: CandidateId::new(),
            text: option,
            created_at: decision.created_at,
            user_id: decision.user_id.clone(),
            status: CandidateStatus::Rejected,
            rejected_by_decision_id: decision.id,
        }
    }
}

/// A tracked file path within the owning user's repository (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntity {
    /// Composite key: file path + owning user.
    pub key: CodeEntityKey,
    /// Detected language, if known.
    pub language: Option<String>,
    /// Line count at last index.
    pub line_count: Option<u64>,
    /// Size in bytes at last index.
    pub size_bytes: Option<u64>,
    /// When this file was last indexed.
    pub indexed_at: Option<DateTime<Utc>>,
}

impl CodeEntity {
    /// Construct an unindexed code entity stub for `key`.
    #[must_use]
    pub fn new(key: CodeEntityKey) -> Self {
        Self {
            key,
            language: None,
            line_count: None,
            size_bytes: None,
            indexed_at: None,
        }
    }
}

/// Git commit metadata (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitNode {
    /// Full commit SHA — the node's key.
    pub sha: CommitSha,
    /// 7-character short SHA.
    pub short_sha: String,
    /// Subject line only, truncated to 120 chars.
    pub message: String,
    /// Author identity (name or email, as reported by the webhook).
    pub author: String,
    /// When the commit was authored/committed.
    pub committed_at: DateTime<Utc>,
    /// Relative file paths touched by the commit.
    pub files_changed: Vec<String>,
    /// Owning user.
    pub user_id: UserId,
}

impl CommitNode {
    /// Maximum length of `message` (spec §3).
    pub const MAX_MESSAGE_LEN: usize = 120;

    /// Construct from webhook fields, truncating the subject line.
    #[must_use]
    pub fn new(
        sha: CommitSha,
        message: String,
        author: String,
        committed_at: DateTime<Utc>,
        files_changed: Vec<String>,
        user_id: UserId,
    ) -> Self {
        let short_sha = sha.short().to_string();
        let message = if message.len() > Self::MAX_MESSAGE_LEN {
            message.chars().take(Self::MAX_MESSAGE_LEN).collect()
        } else {
            message
        };
        Self {
            sha,
            short_sha,
            message,
            author,
            committed_at,
            files_changed,
            user_id,
        }
    }
}
