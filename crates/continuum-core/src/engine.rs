//! `Continuum`: the facade tying extraction, graph storage, resilience,
//! analyzers, and notifications together (spec §1's three subsystems,
//! §6's HTTP surface). This is the one type a host binary (the CLI, or an
//! HTTP layer outside this crate's scope) needs to construct and call.

use crate::agent_context::{check_prior_art, entity_context, hybrid_search, EntityContext, PriorArtVerdict, ScoredDecision};
use crate::analyzers::{
    classify_stale, find_dormant_alternatives, link_commit, refresh_ontology, scan_user_decisions, CommitLink,
    DormantAlternative, InvalidatedAssumption, StaleDecision,
};
use crate::extraction::{
    parse_conversation_log, sanitize_prompt, AliasDictionary, Conversation, DecisionExtractor, ExtractedDecision,
    ResolverThresholds,
};
use crate::graph::writer::MentionedEntity;
use crate::graph::{GraphStorage, GraphWriter, SledGraphStorage};
use crate::llm::{EmbeddingProvider, LlmProvider, ObservabilityHook, ResilientLlmClient, ResilientLlmConfig, StructuredLogHook};
use crate::notifications::NotificationService;
use crate::resilience::{CachePrefix, CircuitBreaker, CircuitBreakerConfig, RateLimiter, RateLimiterConfig, RetryConfig, TenantCache};
use continuum_types::{Config, Decision, DecisionSource, EntityType, Result, UserId};
use std::path::Path;
use std::sync::Arc;

/// Everything the service needs to serve a request, built once at startup
/// and shared behind `Arc` (or owned outright) by the host binary.
pub struct Continuum {
    storage: Arc<dyn GraphStorage>,
    llm: Arc<ResilientLlmClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    writer: GraphWriter,
    alias_dict: AliasDictionary,
    resolver_thresholds: ResolverThresholds,
    notifications: NotificationService,
    config: Config,
}

impl Continuum {
    /// Assemble a `Continuum` from already-constructed collaborators. Use
    /// this when the host wants explicit control over the LLM provider
    /// (e.g. a test double) or an in-memory storage backend.
    #[must_use]
    pub fn new(
        config: Config,
        storage: Arc<dyn GraphStorage>,
        primary_provider: Arc<dyn LlmProvider>,
        fallback_provider: Option<Arc<dyn LlmProvider>>,
        embedder: Arc<dyn EmbeddingProvider>,
        observability_hook: Arc<dyn ObservabilityHook>,
    ) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(
            "llm-primary",
            CircuitBreakerConfig::default(),
        ));
        let limiter = Arc::new(RateLimiter::new(RateLimiterConfig {
            max_requests: config.rate_limit_requests,
            window: std::time::Duration::from_secs(config.rate_limit_window_secs),
        }));
        let llm_cache = TenantCache::new(CachePrefix::LlmResponse);
        let llm = Arc::new(ResilientLlmClient::new(
            primary_provider,
            fallback_provider,
            breaker,
            limiter,
            llm_cache,
            observability_hook,
            ResilientLlmConfig {
                retry: RetryConfig {
                    max_attempts: config.llm_max_retries,
                    base_delay_secs: config.llm_retry_base_delay_secs,
                    ..RetryConfig::default()
                },
                effective_max_prompt_tokens: 100_000,
                cache_enabled: config.llm_cache_ttl_secs > 0,
            },
        ));

        let writer = GraphWriter::new(storage.clone(), llm.clone(), embedder.clone(), config.similarity_threshold);
        let resolver_thresholds = ResolverThresholds {
            fuzzy: f64::from(config.fuzzy_match_threshold),
            embedding: config.embedding_match_threshold,
        };

        Self {
            storage,
            llm,
            embedder,
            writer,
            alias_dict: AliasDictionary::with_defaults(),
            resolver_thresholds,
            notifications: NotificationService::in_memory(),
            config,
        }
    }

    /// Open (or create) an embedded `sled` store at `path` and assemble a
    /// `Continuum` around it with a structured-logging observability hook.
    pub fn open(
        path: &Path,
        config: Config,
        primary_provider: Arc<dyn LlmProvider>,
        fallback_provider: Option<Arc<dyn LlmProvider>>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let storage: Arc<dyn GraphStorage> = Arc::new(SledGraphStorage::open(path)?);
        Ok(Self::new(config, storage, primary_provider, fallback_provider, embedder, Arc::new(StructuredLogHook)))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn GraphStorage> {
        &self.storage
    }

    /// Find decision/candidate mentions of a known entity name in free
    /// text, using the alias dictionary's canonical vocabulary as a cheap
    /// stand-in for a dedicated mention-extraction prompt (spec §4.2's
    /// "candidate entity mentions as free text" — the full-sentence
    /// extraction step is out of scope here; this covers the common case
    /// where a decision's text already names the technology by its
    /// canonical or aliased spelling).
    fn derive_mentions(&self, text: &str) -> Vec<MentionedEntity> {
        let lowered = text.to_lowercase();
        self.alias_dict
            .canonical_names()
            .into_iter()
            .filter(|name| lowered.contains(&name.to_lowercase()))
            .map(|mention| MentionedEntity { mention, entity_type: EntityType::Technology, role: "mentioned".to_string() })
            .collect()
    }

    /// `POST /api/agent/remember` (spec §6): record a decision supplied
    /// directly through the API, skipping the LLM extraction step but
    /// running the same entity-resolution, affected-file, and
    /// evolution-analysis pipeline as the ingest path.
    pub async fn remember(
        &self,
        user_id: &UserId,
        project: Option<String>,
        extracted: ExtractedDecision,
        tool_call_files: Vec<String>,
    ) -> Result<Decision> {
        let mentions = self.derive_mentions(&format!("{} {}", extracted.agent_decision, extracted.context));
        self.writer
            .persist_decision(
                user_id,
                project,
                DecisionSource::Api,
                extracted,
                mentions,
                tool_call_files,
                &self.alias_dict,
                self.resolver_thresholds,
            )
            .await
    }

    /// Ingest path (spec §2's "Data flow (ingest path)"): parse a raw log,
    /// extract decision drafts, and persist each through the graph writer.
    pub async fn ingest(&self, user_id: &UserId, project_name: &str, raw_jsonl: &str) -> Result<Vec<Decision>> {
        let episode_gap = chrono::Duration::minutes(self.config.episode_gap_minutes);
        let conversations = parse_conversation_log(project_name, raw_jsonl, episode_gap)?;
        let mut persisted = Vec::new();
        for conversation in conversations {
            persisted.extend(self.ingest_conversation(user_id, &conversation).await?);
        }
        Ok(persisted)
    }

    async fn ingest_conversation(&self, user_id: &UserId, conversation: &Conversation) -> Result<Vec<Decision>> {
        let extractor = DecisionExtractor::new(
            &self.llm,
            self.config.confidence_calibration_method,
            self.config.verbatim_grounding_enabled,
            self.config.embedding_dimension,
        );
        let drafts = extractor.extract(&user_id.0, conversation).await?;

        let tool_call_files: Vec<String> = conversation
            .turns
            .iter()
            .flat_map(|t| t.tool_calls.iter())
            .flat_map(|tc| tc.file_paths.iter().cloned())
            .collect();

        let mut persisted = Vec::new();
        for draft in drafts {
            let sanitized_decision = sanitize_prompt(&draft.agent_decision);
            if sanitized_decision.risk_level >= crate::extraction::InjectionRiskLevel::High {
                continue;
            }
            let mentions = self.derive_mentions(&format!("{} {}", draft.agent_decision, draft.context));
            let decision = self
                .writer
                .persist_decision(
                    user_id,
                    Some(conversation.project_name.clone()),
                    DecisionSource::ClaudeLog,
                    draft,
                    mentions,
                    tool_call_files.clone(),
                    &self.alias_dict,
                    self.resolver_thresholds,
                )
                .await?;
            persisted.push(decision);
        }
        Ok(persisted)
    }

    /// `GET /api/search` (spec §6).
    pub fn search(&self, user_id: &UserId, query: &str, query_embedding: Option<&[f32]>, limit: usize) -> Result<Vec<ScoredDecision>> {
        hybrid_search(self.storage.as_ref(), user_id, query, query_embedding, limit)
    }

    /// `POST /api/agent/context` (spec §6).
    pub fn agent_search(&self, user_id: &UserId, query: &str, query_embedding: Option<&[f32]>, limit: usize) -> Result<Vec<ScoredDecision>> {
        self.search(user_id, query, query_embedding, limit)
    }

    /// `GET /api/agent/context/{name}` (spec §6).
    pub fn entity_context(&self, user_id: &UserId, name: &str) -> Result<Option<EntityContext>> {
        entity_context(self.storage.as_ref(), user_id, name)
    }

    /// `POST /api/agent/check` (spec §6).
    pub fn check(&self, user_id: &UserId, proposed_text: &str, proposed_embedding: Option<&[f32]>) -> Result<PriorArtVerdict> {
        check_prior_art(self.storage.as_ref(), user_id, proposed_text, proposed_embedding)
    }

    /// `GET /api/agent/summary` (spec §6).
    pub fn summary(&self, user_id: &UserId) -> Result<crate::agent_context::AgentSummary> {
        crate::agent_context::build_summary(self.storage.as_ref(), user_id)
    }

    /// Runs the dormant-alternative detector (spec §4.6) and notifies the
    /// user of each fresh finding.
    pub fn run_dormant_alternative_scan(&self, user_id: &UserId) -> Result<Vec<DormantAlternative>> {
        let found = find_dormant_alternatives(self.storage.as_ref(), user_id, self.config.min_days_dormant, 50)?;
        for alternative in &found {
            let _ = self.notifications.notify(
                user_id.clone(),
                continuum_types::NotificationKind::DormantAlternative,
                "Dormant alternative may be worth reconsidering".to_string(),
                alternative.text.clone(),
                serde_json::json!({ "candidate_id": alternative.candidate_id, "reconsider_score": alternative.reconsider_score }),
            );
        }
        Ok(found)
    }

    /// Runs the assumption-violation monitor (spec §4.6) and notifies.
    pub fn run_assumption_monitor(&self, user_id: &UserId) -> Result<Vec<InvalidatedAssumption>> {
        let found = scan_user_decisions(self.storage.as_ref(), user_id)?;
        for invalidated in &found {
            let _ = self.notifications.notify(
                user_id.clone(),
                continuum_types::NotificationKind::AssumptionInvalidated,
                "An assumption behind a prior decision may be stale".to_string(),
                invalidated.assumption.clone(),
                serde_json::json!({ "decision_id": invalidated.decision_id, "invalidating_decision_id": invalidated.invalidating_decision_id }),
            );
        }
        Ok(found)
    }

    /// Runs the staleness classifier (spec §4.6) and notifies.
    pub fn run_staleness_scan(&self, user_id: &UserId) -> Result<Vec<StaleDecision>> {
        let decisions = self.storage.list_decisions(user_id)?;
        let stale = classify_stale(&decisions);
        for s in &stale {
            let _ = self.notifications.notify(
                user_id.clone(),
                continuum_types::NotificationKind::StaleDecision,
                "Decision has exceeded its staleness threshold".to_string(),
                format!("{} days since activity (threshold {})", s.days_since_activity, s.threshold_days),
                serde_json::json!({ "decision_id": s.decision_id }),
            );
        }
        Ok(stale)
    }

    /// `POST /api/git/commit` (spec §6): commit webhook → link-decisions job.
    pub fn link_commit(&self, commit: &continuum_types::CommitNode, session_start: chrono::DateTime<chrono::Utc>) -> Result<Vec<CommitLink>> {
        link_commit(
            self.storage.as_ref(),
            commit,
            session_start,
            self.config.git_commit_link_window_hours,
            self.config.git_commit_link_score_threshold,
        )
    }

    /// Runs the ontology updater (spec §4.6) against a seed list, merging
    /// any new aliases directly into the live alias dictionary.
    pub async fn refresh_ontology(&self, client: &reqwest::Client, seed_names: &[String]) -> Result<usize> {
        let entities = self.storage.list_entities(&UserId::from("anonymous"))?;
        let mut existing = std::collections::HashMap::new();
        let added = refresh_ontology(client, seed_names, &entities, &mut existing).await;
        for (alias, canonical) in existing {
            self.alias_dict.insert_if_absent(&alias, &canonical);
        }
        Ok(added)
    }
}
