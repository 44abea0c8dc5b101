//! Decision capture commands: `remember` records a single decision
//! directly, `ingest` replays a raw conversation log through extraction
//! (spec §2's two data-flow paths, §6's `/api/agent/remember` and the
//! ingest pipeline).

use anyhow::{Context, Result};
use colored::Colorize;
use continuum_core::extraction::ExtractedDecision;
use continuum_types::{DecisionScope, Provenance};
use std::path::PathBuf;

use super::CommandContext;
use crate::output::{OutputFormat, TableBuilder};

fn parse_scope(s: &str) -> DecisionScope {
    match s.to_lowercase().as_str() {
        "tactical" => DecisionScope::Tactical,
        "strategic" => DecisionScope::Strategic,
        "architectural" => DecisionScope::Architectural,
        _ => DecisionScope::Unknown,
    }
}

/// Handle `decision remember`: record a decision supplied directly on the
/// command line, skipping LLM extraction.
#[allow(clippy::too_many_arguments)]
pub async fn handle_decision_remember(
    ctx: &CommandContext<'_>,
    project: Option<String>,
    trigger: String,
    context: String,
    agent_decision: String,
    agent_rationale: String,
    options: Vec<String>,
    assumptions: Vec<String>,
    scope: String,
    confidence: f32,
    tool_call_files: Vec<String>,
) -> Result<()> {
    let extracted = ExtractedDecision {
        trigger,
        context,
        agent_decision,
        agent_rationale,
        options,
        assumptions,
        scope: parse_scope(&scope),
        confidence,
        grounding: None,
        provenance: Provenance {
            extraction_method: "manual".to_string(),
            model_name: None,
            prompt_template_version: None,
            input_tokens: None,
            output_tokens: None,
        },
    };

    let decision = ctx
        .continuum
        .remember(ctx.user_id, project, extracted, tool_call_files)
        .await
        .context("failed to record decision")?;

    match ctx.format {
        OutputFormat::Text | OutputFormat::Table => {
            println!("{} Decision recorded: {}", "\u{2713}".green().bold(), decision.id.to_string().cyan());
            println!("  {}", decision.agent_decision);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decision)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&decision)?),
    }

    Ok(())
}

/// Handle `decision ingest`: parse a raw conversation log (Claude Code's
/// `stream-json` transcript shape) and extract/persist every decision
/// found in it (spec §2's ingest path).
pub async fn handle_decision_ingest(ctx: &CommandContext<'_>, project: String, input: PathBuf) -> Result<()> {
    let raw_jsonl = std::fs::read_to_string(&input).with_context(|| format!("failed to read {}", input.display()))?;

    let decisions = ctx
        .continuum
        .ingest(ctx.user_id, &project, &raw_jsonl)
        .await
        .context("failed to ingest conversation log")?;

    match ctx.format {
        OutputFormat::Text | OutputFormat::Table => {
            println!(
                "{} {} decision(s) extracted from {}",
                "\u{2713}".green().bold(),
                decisions.len(),
                input.display()
            );
            if matches!(ctx.format, OutputFormat::Table) {
                let mut builder = TableBuilder::new().header(vec!["ID", "Decision", "Scope"]);
                for d in &decisions {
                    builder = builder.row(vec![d.id.to_string(), d.agent_decision.clone(), format!("{:?}", d.scope)]);
                }
                builder.display();
            }
        }
        OutputFormat::Json => {
            let result = serde_json::json!({ "ingested": decisions.len(), "decisions": decisions });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Yaml => {
            let result = serde_json::json!({ "ingested": decisions.len(), "decisions": decisions });
            println!("{}", serde_yaml::to_string(&result)?);
        }
    }

    Ok(())
}
