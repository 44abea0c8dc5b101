//! Command-line interface for Continuum, the decision-memory knowledge
//! graph.
//!
//! This tool exposes the same surface as the `/api/agent/*` HTTP routes
//! (spec §6) directly against an embedded `sled` graph:
//! - Recording and ingesting decisions
//! - Hybrid search and entity context lookups
//! - Project summaries and prior-art checks
//! - Notification inspection
//! - Markdown decision-log export
//! - Multiple output formats (text, JSON, YAML, table)

mod commands;
mod llm_http;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use continuum_core::{Config, Continuum};
use std::path::PathBuf;
use std::sync::Arc;

use commands::CommandContext;
use continuum_types::UserId;
use llm_http::{HttpEmbeddingProvider, HttpLlmProvider};
use output::OutputFormat;

/// Continuum CLI - query and maintain a decision-memory knowledge graph
#[derive(Parser)]
#[command(name = "continuum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the graph storage directory
    #[arg(short, long, default_value = "./data")]
    db_path: PathBuf,

    /// Output format (text, json, yaml, table)
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// User id to scope the command to (decisions/entities are per-user)
    #[arg(short, long, default_value = "cli-user")]
    user: String,

    /// Base URL of the OpenAI-compatible LLM/embedding endpoint
    #[arg(long, env = "CONTINUUM_LLM_BASE_URL", default_value = "https://api.example-llm-provider.invalid/v1")]
    llm_base_url: String,

    /// API key for the LLM/embedding endpoint
    #[arg(long, env = "CONTINUUM_LLM_API_KEY")]
    llm_api_key: Option<String>,

    /// Chat model name used for decision extraction
    #[arg(long, env = "CONTINUUM_LLM_MODEL", default_value = "gpt-4o-mini")]
    llm_model: String,

    /// Embedding model name
    #[arg(long, env = "CONTINUUM_EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    embedding_model: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show graph statistics
    Stats,

    /// Decision capture commands
    #[command(subcommand)]
    Decision(DecisionCommands),

    /// Entity lookup commands
    #[command(subcommand)]
    Entity(EntityCommands),

    /// Hybrid search over decisions
    Search {
        /// Search text
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Agent-facing summary and prior-art checks
    #[command(subcommand)]
    Agent(AgentCommands),

    /// Notification inspection
    #[command(subcommand)]
    Notification(NotificationCommands),

    /// Export decisions to a markdown log
    Export {
        /// Restrict to one project; omit to export every decision
        #[arg(short, long)]
        project: Option<String>,

        /// Directory to write the decisions log into
        #[arg(short, long, default_value = "./export")]
        output_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum DecisionCommands {
    /// Record a decision directly, skipping LLM extraction
    Remember {
        /// Project label
        #[arg(long)]
        project: Option<String>,

        /// What prompted the decision
        #[arg(long)]
        trigger: String,

        /// Surrounding context
        #[arg(long)]
        context: String,

        /// The choice that was made
        #[arg(long)]
        decision: String,

        /// Why it was made
        #[arg(long)]
        rationale: String,

        /// Options considered (repeatable); the decision must be one of them
        #[arg(long = "option")]
        options: Vec<String>,

        /// Assumption strings this decision depends on (repeatable)
        #[arg(long = "assumption")]
        assumptions: Vec<String>,

        /// Staleness/evolution scope: tactical, strategic, architectural
        #[arg(long, default_value = "unknown")]
        scope: String,

        /// Confidence in [0, 1]
        #[arg(long, default_value_t = 1.0)]
        confidence: f32,

        /// Files touched by the tool calls around this decision (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
    },

    /// Parse a raw conversation log and extract/persist its decisions
    Ingest {
        /// Project label for the conversations in this log
        #[arg(long)]
        project: String,

        /// Path to the raw conversation log
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum EntityCommands {
    /// Fetch an entity plus the decisions that involve it
    Context {
        /// Canonical or alias name of the entity
        name: String,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// Project overview: counts, dormant alternatives, stale decisions
    Summary,

    /// Prior-art check before recording a new decision
    Check {
        /// The decision text being proposed
        text: String,
    },
}

#[derive(Subcommand)]
enum NotificationCommands {
    /// List notifications, unread first
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Acknowledge (mark read) a notification
    Ack {
        /// Notification id (UUID)
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::default();
    let user_id = UserId::from(cli.user.clone());

    let llm_provider = Arc::new(HttpLlmProvider::new(cli.llm_base_url.clone(), cli.llm_api_key.clone(), cli.llm_model.clone()));
    let embedding_provider = Arc::new(HttpEmbeddingProvider::new(
        cli.llm_base_url.clone(),
        cli.llm_api_key.clone(),
        cli.embedding_model.clone(),
        config.embedding_dimension,
    ));

    let continuum = Continuum::open(&cli.db_path, config, llm_provider, None, embedding_provider)?;
    let ctx = CommandContext::new(&continuum, &cli.format, &user_id);

    match cli.command {
        Commands::Stats => commands::stats::handle_stats(&ctx).await?,

        Commands::Decision(decision_cmd) => match decision_cmd {
            DecisionCommands::Remember {
                project,
                trigger,
                context,
                decision,
                rationale,
                options,
                assumptions,
                scope,
                confidence,
                files,
            } => {
                commands::decision::handle_decision_remember(
                    &ctx, project, trigger, context, decision, rationale, options, assumptions, scope, confidence, files,
                )
                .await?;
            }
            DecisionCommands::Ingest { project, input } => {
                commands::decision::handle_decision_ingest(&ctx, project, input).await?;
            }
        },

        Commands::Entity(entity_cmd) => match entity_cmd {
            EntityCommands::Context { name } => commands::entity::handle_entity_context(&ctx, &name).await?,
        },

        Commands::Search { query, limit } => commands::search::handle_search(&ctx, &query, limit).await?,

        Commands::Agent(agent_cmd) => match agent_cmd {
            AgentCommands::Summary => commands::agent::handle_agent_summary(&ctx).await?,
            AgentCommands::Check { text } => commands::agent::handle_agent_check(&ctx, &text).await?,
        },

        Commands::Notification(notification_cmd) => match notification_cmd {
            NotificationCommands::List { limit } => commands::notification::handle_notification_list(&ctx, limit)?,
            NotificationCommands::Ack { id } => commands::notification::handle_notification_ack(&ctx, &id)?,
        },

        Commands::Export { project, output_dir } => commands::export::handle_export_decisions(&ctx, project, output_dir).await?,
    }

    Ok(())
}
