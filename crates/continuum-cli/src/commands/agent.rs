//! Agent-facing commands: `summary` (project overview) and `check`
//! (prior-art check before recording a new decision) — spec §6's
//! `GET /api/agent/summary` and `POST /api/agent/check`.

use anyhow::Result;
use colored::Colorize;
use continuum_core::agent_context::PriorArtVerdict;

use super::CommandContext;
use crate::output::{OutputFormat, TableBuilder};

pub async fn handle_agent_summary(ctx: &CommandContext<'_>) -> Result<()> {
    let summary = ctx.continuum.summary(ctx.user_id)?;

    match ctx.format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "stats": summary.stats,
                "dormant_alternatives": summary.dormant_alternatives,
                "stale_decisions": summary.stale_decisions,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Yaml => {
            let payload = serde_json::json!({
                "stats": summary.stats,
                "dormant_alternatives": summary.dormant_alternatives,
                "stale_decisions": summary.stale_decisions,
            });
            println!("{}", serde_yaml::to_string(&payload)?);
        }
        OutputFormat::Table => {
            TableBuilder::new()
                .header(vec!["Metric", "Count"])
                .row(vec!["Decisions".to_string(), summary.stats.decision_count.to_string()])
                .row(vec!["Entities".to_string(), summary.stats.entity_count.to_string()])
                .row(vec!["Dormant alternatives".to_string(), summary.dormant_alternatives.len().to_string()])
                .row(vec!["Stale decisions".to_string(), summary.stale_decisions.len().to_string()])
                .display();
        }
        OutputFormat::Text => {
            println!("{}", "Project Summary".bold().green());
            println!("{:25} {}", "Decisions:", summary.stats.decision_count);
            println!("{:25} {}", "Entities:", summary.stats.entity_count);
            println!("{:25} {}", "Dormant alternatives:", summary.dormant_alternatives.len());
            println!("{:25} {}", "Stale decisions:", summary.stale_decisions.len());
        }
    }

    Ok(())
}

pub async fn handle_agent_check(ctx: &CommandContext<'_>, proposed_text: &str) -> Result<()> {
    let verdict = ctx.continuum.check(ctx.user_id, proposed_text, None)?;

    match ctx.format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let payload = match &verdict {
                PriorArtVerdict::Proceed => serde_json::json!({ "verdict": "proceed" }),
                PriorArtVerdict::ReviewSimilar(decisions) => serde_json::json!({
                    "verdict": "review_similar",
                    "similar_decisions": decisions,
                }),
                PriorArtVerdict::ResolveContradiction(decision) => serde_json::json!({
                    "verdict": "resolve_contradiction",
                    "contradicting_decision": decision,
                }),
            };
            if matches!(ctx.format, OutputFormat::Json) {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{}", serde_yaml::to_string(&payload)?);
            }
        }
        OutputFormat::Table | OutputFormat::Text => match &verdict {
            PriorArtVerdict::Proceed => println!("{}", "No prior art found; safe to proceed.".green()),
            PriorArtVerdict::ReviewSimilar(decisions) => {
                println!("{}", format!("{} similar decision(s) found; review before proceeding:", decisions.len()).yellow());
                for d in decisions {
                    println!("  - {}", d.agent_decision);
                }
            }
            PriorArtVerdict::ResolveContradiction(decision) => {
                println!("{}", "An unresolved contradiction already covers this area:".red());
                println!("  - {}", decision.agent_decision);
            }
        },
    }

    Ok(())
}
