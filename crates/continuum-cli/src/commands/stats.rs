//! Graph statistics command

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::output::{OutputFormat, TableBuilder};

/// Handle the stats command
pub async fn handle_stats(ctx: &CommandContext<'_>) -> Result<()> {
    let stats = ctx.continuum.storage().stats()?;

    match ctx.format {
        OutputFormat::Json => {
            let stats_json = serde_json::json!({
                "decision_count": stats.decision_count,
                "entity_count": stats.entity_count,
                "candidate_count": stats.candidate_count,
                "code_entity_count": stats.code_entity_count,
                "commit_count": stats.commit_count,
            });
            println!("{}", serde_json::to_string_pretty(&stats_json)?);
        }
        OutputFormat::Yaml => {
            let stats_yaml = serde_json::json!({
                "decision_count": stats.decision_count,
                "entity_count": stats.entity_count,
                "candidate_count": stats.candidate_count,
                "code_entity_count": stats.code_entity_count,
                "commit_count": stats.commit_count,
            });
            println!("{}", serde_yaml::to_string(&stats_yaml)?);
        }
        OutputFormat::Table => {
            TableBuilder::new()
                .header(vec!["Metric", "Count"])
                .row(vec!["Decisions".to_string(), stats.decision_count.to_string()])
                .row(vec!["Entities".to_string(), stats.entity_count.to_string()])
                .row(vec!["Candidates".to_string(), stats.candidate_count.to_string()])
                .row(vec!["Code entities".to_string(), stats.code_entity_count.to_string()])
                .row(vec!["Commits".to_string(), stats.commit_count.to_string()])
                .display();
        }
        OutputFormat::Text => {
            println!("{}", "Graph Statistics".bold().green());
            println!("{}", "================".green());
            println!("{:20} {}", "Decisions:", stats.decision_count.to_string().cyan());
            println!("{:20} {}", "Entities:", stats.entity_count.to_string().cyan());
            println!("{:20} {}", "Candidates:", stats.candidate_count.to_string().cyan());
            println!("{:20} {}", "Code entities:", stats.code_entity_count.to_string().cyan());
            println!("{:20} {}", "Commits:", stats.commit_count.to_string().cyan());
        }
    }

    Ok(())
}
