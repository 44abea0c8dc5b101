//! Markdown export (spec §6's "Markdown export format" contract,
//! SPEC_FULL.md §12). Grounded on
//! `original_source/apps/api/services/markdown_exporter.py`'s two outputs:
//! a per-project `DECISIONS.md` log and one `<timestamp>.md` file per
//! exported conversation. Stable layout (fixed field order, fixed heading
//! levels) is required so exports diff cleanly in git.

use continuum_types::Decision;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::extraction::parser::{Conversation, Role};

fn project_dir(output_dir: &Path, project_name: &str) -> io::Result<PathBuf> {
    let dir = output_dir.join(project_name);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn render_decision_block(heading_level: &str, index: usize, decision: &Decision) -> String {
    let mut block = String::new();
    block.push_str(&format!("{heading_level} Decision {index}\n\n"));
    block.push_str(&format!("**Trigger**: {}\n\n", decision.trigger));
    block.push_str(&format!("**Context**: {}\n\n", decision.context));
    block.push_str("**Options Considered**:\n");
    for option in &decision.options {
        block.push_str(&format!("- {option}\n"));
    }
    block.push('\n');
    block.push_str(&format!("**Decision**: {}\n\n", decision.agent_decision));
    block.push_str(&format!("**Rationale**: {}\n\n", decision.agent_rationale));
    block.push_str(&format!("**Confidence**: {:.2}\n\n", decision.confidence));

    if let Some(span) = decision.grounding.as_ref().and_then(|g| g.decision_span.as_ref()) {
        block.push_str(&format!("**Turn Index**: {}\n\n", span.turn_index));
    }

    if let Some(verbatim) = decision.grounding.as_ref().and_then(|g| g.verbatim_decision.as_ref()) {
        block.push_str("**Verbatim Quote**:\n\n");
        block.push_str(&format!("> {verbatim}\n\n"));
    }

    block.push_str("---\n\n");
    block
}

/// Write (overwrite) `<output_dir>/<project_name>/DECISIONS.md` from the
/// full, currently-accumulated set of decisions for that project — callers
/// pass the whole list each time, same as the original exporter; the
/// "append" in spec §6 describes the log's growth over calls, not a
/// file-level append operation.
pub fn write_decisions_log(output_dir: &Path, project_name: &str, decisions: &[Decision]) -> io::Result<PathBuf> {
    let dir = project_dir(output_dir, project_name)?;
    let filepath = dir.join("DECISIONS.md");

    let mut content = format!("# Decisions: {project_name}\n\n---\n\n");
    for (i, decision) in decisions.iter().enumerate() {
        content.push_str(&render_decision_block("##", i + 1, decision));
    }

    fs::write(&filepath, content)?;
    Ok(filepath)
}

/// Write one `<timestamp>.md` file for a single exported conversation,
/// including its turns and (optionally) the decisions extracted from it.
pub fn export_conversation(output_dir: &Path, conversation: &Conversation, decisions: &[Decision]) -> io::Result<PathBuf> {
    let dir = project_dir(output_dir, &conversation.project_name)?;
    let timestamp = conversation.session_timestamp.format("%Y%m%d-%H%M%S");
    let filepath = dir.join(format!("{timestamp}.md"));

    let mut content = format!(
        "# Conversation: {}\n\n**Date**: {}\n\n---\n\n## Conversation\n\n",
        conversation.project_name,
        conversation.session_timestamp.format("%Y-%m-%d %H:%M:%S"),
    );

    for (i, turn) in conversation.turns.iter().enumerate() {
        let role = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        };
        content.push_str(&format!("### Turn {i}: {role}\n\n{}\n\n", turn.content));
    }

    if !decisions.is_empty() {
        content.push_str("---\n\n## Extracted Decisions\n\n");
        for (i, decision) in decisions.iter().enumerate() {
            content.push_str(&render_decision_block("###", i + 1, decision));
        }
    }

    fs::write(&filepath, content)?;
    Ok(filepath)
}
