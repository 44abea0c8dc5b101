//! `entity context` — fetch an entity plus the decisions that involve it
//! and its local subgraph neighborhood (spec §6's
//! `GET /api/agent/context/{name}`).

use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::output::{OutputFormat, TableBuilder};

pub async fn handle_entity_context(ctx: &CommandContext<'_>, name: &str) -> Result<()> {
    let Some(context) = ctx.continuum.entity_context(ctx.user_id, name)? else {
        ctx.format.error(&format!("entity not found: {name}"));
        std::process::exit(1);
    };

    let subgraph_node_count = context.subgraph.graph.node_count();
    let subgraph_edge_count = context.subgraph.graph.edge_count();

    match ctx.format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let payload = serde_json::json!({
                "entity": context.entity,
                "involving_decisions": context.involving_decisions,
                "subgraph_node_count": subgraph_node_count,
                "subgraph_edge_count": subgraph_edge_count,
            });
            if matches!(ctx.format, OutputFormat::Json) {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{}", serde_yaml::to_string(&payload)?);
            }
        }
        OutputFormat::Table => {
            let mut builder = TableBuilder::new().header(vec!["Decision", "Scope"]);
            for d in &context.involving_decisions {
                builder = builder.row(vec![d.agent_decision.clone(), format!("{:?}", d.scope)]);
            }
            builder.display();
        }
        OutputFormat::Text => {
            println!("{}", format!("Entity: {}", context.entity.canonical_name).bold().green());
            println!("{:15} {:?}", "Type:", context.entity.entity_type);
            if !context.entity.aliases.is_empty() {
                println!("{:15} {}", "Aliases:", context.entity.aliases.join(", "));
            }
            println!("{:15} {} node(s), {} edge(s)", "Subgraph:", subgraph_node_count, subgraph_edge_count);
            println!("\n{}", "Involving decisions:".bold());
            for d in &context.involving_decisions {
                println!("  - {}", d.agent_decision);
            }
        }
    }

    Ok(())
}
