//! `search query` — hybrid lexical/vector search over a user's decisions
//! (spec §6's `GET /api/search`).

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::output::{OutputFormat, TableBuilder};

pub async fn handle_search(ctx: &CommandContext<'_>, query: &str, limit: usize) -> Result<()> {
    // The CLI has no embedding client of its own wired to this command;
    // the vector leg of the hybrid search is skipped in favor of the
    // lexical/CONTAINS path (spec §2's fallback behavior).
    let hits = ctx.continuum.search(ctx.user_id, query, None, limit)?;

    match ctx.format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "query": query,
                "count": hits.len(),
                "results": hits.iter().map(|h| serde_json::json!({
                    "decision": h.decision,
                    "score": h.score,
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Yaml => {
            let result = serde_json::json!({
                "query": query,
                "count": hits.len(),
                "results": hits.iter().map(|h| serde_json::json!({
                    "decision": h.decision,
                    "score": h.score,
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_yaml::to_string(&result)?);
        }
        OutputFormat::Table => {
            let mut builder = TableBuilder::new().header(vec!["Score", "Decision", "Project"]);
            for hit in &hits {
                builder = builder.row(vec![
                    format!("{:.3}", hit.score),
                    hit.decision.agent_decision.clone(),
                    hit.decision.project.clone().unwrap_or_default(),
                ]);
            }
            builder.display();
        }
        OutputFormat::Text => {
            println!("{}", format!("{} result(s) for \"{}\"", hits.len(), query).bold().green());
            for hit in &hits {
                println!("  [{:.3}] {}", hit.score, hit.decision.agent_decision);
            }
        }
    }

    Ok(())
}
