//! Notification commands: `list` (spec §6's `GET /api/notifications`,
//! unread-first listing) and `ack` (mark one read).

use anyhow::{Context, Result};
use colored::Colorize;
use continuum_types::NotificationId;

use super::CommandContext;
use crate::output::{OutputFormat, TableBuilder};

pub fn handle_notification_list(ctx: &CommandContext<'_>, limit: usize) -> Result<()> {
    let notifications = ctx.continuum.notifications().list(ctx.user_id, limit)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&notifications)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&notifications)?),
        OutputFormat::Table => {
            let mut builder = TableBuilder::new().header(vec!["ID", "Kind", "Title", "Read"]);
            for n in &notifications {
                builder = builder.row(vec![n.id.to_string(), format!("{:?}", n.kind), n.title.clone(), n.read.to_string()]);
            }
            builder.display();
        }
        OutputFormat::Text => {
            println!("{}", format!("{} notification(s)", notifications.len()).bold().green());
            for n in &notifications {
                let marker = if n.read { " " } else { "*" };
                println!("{} [{:?}] {} — {}", marker, n.kind, n.title, n.body);
            }
        }
    }

    Ok(())
}

pub fn handle_notification_ack(ctx: &CommandContext<'_>, id: &str) -> Result<()> {
    let id: NotificationId = id.parse().context("invalid notification id (must be a UUID)")?;
    ctx.continuum.notifications().ack(&id)?;
    ctx.format.success(&format!("notification {id} acknowledged"));
    Ok(())
}
