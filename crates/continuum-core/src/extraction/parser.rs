//! Parses line-delimited conversation logs (one JSON record per message,
//! matching the JSONL transcripts `services/file_watcher.py` watches) into
//! an ordered `Conversation` (spec §4.1). Pure producer: no I/O beyond
//! reading the source, no LLM or graph access.

use chrono::{DateTime, Duration, Utc};
use continuum_types::CoreError;
use serde::Deserialize;

/// A turn's speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A reference to a tool invocation mentioned in a turn, carried through
/// untouched for the extractor/graph-writer to consult (spec §4.5's
/// "file paths derived from the session's tool calls").
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallRef {
    pub name: String,
    #[serde(default)]
    pub file_paths: Vec<String>,
}

/// One line of the raw log.
#[derive(Debug, Clone, Deserialize)]
struct RawRecord {
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    tool_calls: Vec<ToolCallRef>,
}

/// A single conversational turn.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub tool_calls: Vec<ToolCallRef>,
}

/// An ordered sequence of turns belonging to one capture episode.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub project_name: String,
    pub session_timestamp: DateTime<Utc>,
    pub turns: Vec<Turn>,
}

impl Conversation {
    /// Concatenated turn text, `role: content` per line, for prompting.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| {
                let role = match t.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => "system",
                };
                format!("{role}: {}", t.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Splits raw JSONL turns into one or more `Conversation` episodes, cutting
/// a new episode whenever the inter-turn gap exceeds `episode_gap`
/// (spec §4.1 default: 10 minutes, `Config::episode_gap_minutes`).
pub fn parse_conversation_log(
    project_name: &str,
    raw_jsonl: &str,
    episode_gap: Duration,
) -> Result<Vec<Conversation>, CoreError> {
    let mut turns = Vec::new();
    for (line_no, line) in raw_jsonl.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: RawRecord = serde_json::from_str(line).map_err(|e| CoreError::Validation {
            field: format!("line[{line_no}]"),
            message: format!("malformed conversation record: {e}"),
        })?;
        turns.push(Turn {
            role: record.role,
            content: record.content,
            timestamp: record.timestamp,
            tool_calls: record.tool_calls,
        });
    }

    if turns.is_empty() {
        return Ok(Vec::new());
    }

    let mut episodes: Vec<Vec<Turn>> = Vec::new();
    let mut current: Vec<Turn> = vec![turns.remove(0)];
    for turn in turns {
        let gap = turn.timestamp - current.last().expect("current episode is never empty").timestamp;
        if gap > episode_gap {
            episodes.push(std::mem::take(&mut current));
        }
        current.push(turn);
    }
    episodes.push(current);

    Ok(episodes
        .into_iter()
        .map(|turns| Conversation {
            project_name: project_name.to_string(),
            session_timestamp: turns[0].timestamp,
            turns,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(role: &str, content: &str, ts: &str) -> String {
        format!(r#"{{"role":"{role}","content":"{content}","timestamp":"{ts}"}}"#)
    }

    #[test]
    fn parses_turns_in_order() {
        let jsonl = [
            record("user", "let's use postgres", "2026-01-01T00:00:00Z"),
            record("assistant", "sounds good", "2026-01-01T00:01:00Z"),
        ]
        .join("\n");
        let episodes = parse_conversation_log("demo", &jsonl, Duration::minutes(10)).unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].turns.len(), 2);
        assert_eq!(episodes[0].turns[0].role, Role::User);
    }

    #[test]
    fn splits_episode_on_gap_exceeding_threshold() {
        let jsonl = [
            record("user", "first session", "2026-01-01T00:00:00Z"),
            record("assistant", "ack", "2026-01-01T00:01:00Z"),
            record("user", "second session much later", "2026-01-02T00:00:00Z"),
        ]
        .join("\n");
        let episodes = parse_conversation_log("demo", &jsonl, Duration::minutes(10)).unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].turns.len(), 2);
        assert_eq!(episodes[1].turns.len(), 1);
    }

    #[test]
    fn empty_log_yields_no_episodes() {
        let episodes = parse_conversation_log("demo", "", Duration::minutes(10)).unwrap();
        assert!(episodes.is_empty());
    }

    #[test]
    fn malformed_line_is_a_typed_validation_error() {
        let err = parse_conversation_log("demo", "not json", Duration::minutes(10)).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let jsonl = format!("\n{}\n\n", record("user", "hi", "2026-01-01T00:00:00Z"));
        let episodes = parse_conversation_log("demo", &jsonl, Duration::minutes(10)).unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].turns.len(), 1);
    }
}
