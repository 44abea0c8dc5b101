//! `export decisions` — write a project's decisions out as a markdown
//! decisions log (spec §6, `continuum_core::export::markdown`).

use anyhow::{Context, Result};
use colored::Colorize;
use continuum_core::export::write_decisions_log;
use std::path::PathBuf;

use super::CommandContext;
use crate::output::OutputFormat;

pub async fn handle_export_decisions(ctx: &CommandContext<'_>, project: Option<String>, output_dir: PathBuf) -> Result<()> {
    let decisions: Vec<_> = ctx
        .continuum
        .storage()
        .list_decisions(ctx.user_id)?
        .into_iter()
        .filter(|d| project.is_none() || d.project == project)
        .collect();

    std::fs::create_dir_all(&output_dir).context("failed to create export directory")?;
    let project_label = project.clone().unwrap_or_else(|| "all".to_string());
    let written = write_decisions_log(&output_dir, &project_label, &decisions).context("failed to write decisions log")?;

    match ctx.format {
        OutputFormat::Text | OutputFormat::Table => {
            println!(
                "{} {} decision(s) exported to {}",
                "\u{2713}".green().bold(),
                decisions.len(),
                written.display()
            );
        }
        OutputFormat::Json => {
            let result = serde_json::json!({
                "status": "success",
                "output_file": written.display().to_string(),
                "decision_count": decisions.len(),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Yaml => {
            let result = serde_json::json!({
                "status": "success",
                "output_file": written.display().to_string(),
                "decision_count": decisions.len(),
            });
            println!("{}", serde_yaml::to_string(&result)?);
        }
    }

    Ok(())
}
