//! A durable, user-facing notification record (spec §4.9). Kept separate
//! from `nodes.rs`'s labeled-property-graph entities since notifications
//! are a durable table, not a graph node — no edges ever point at one.

use crate::ids::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of graph event a notification reports (spec §4.9's
/// "contradiction detected, assumption invalidated, stale decision
/// surfaced, dormant alternative found").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ContradictionDetected,
    AssumptionInvalidated,
    StaleDecision,
    DormantAlternative,
}

/// One row of the durable notification table: `{id, user_id, type, title,
/// body, payload, read, created_at}` (spec §4.9), indexed conceptually by
/// `(user_id, read, created_at desc)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Free-form structured payload (e.g. the decision/entity ids involved),
    /// so websocket clients can deep-link without a follow-up fetch.
    pub payload: Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Construct an unread notification stamped with the current time.
    #[must_use]
    pub fn new(user_id: UserId, kind: NotificationKind, title: String, body: String, payload: Value) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            title,
            body,
            payload,
            read: false,
            created_at: Utc::now(),
        }
    }

    /// Mark as read. Idempotent.
    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_notification_starts_unread() {
        let n = Notification::new(
            UserId::from("alice"),
            NotificationKind::StaleDecision,
            "Decision is stale".to_string(),
            "Your tactical decision has not been touched in 30 days".to_string(),
            serde_json::json!({"decision_id": "abc"}),
        );
        assert!(!n.read);
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut n = Notification::new(
            UserId::from("alice"),
            NotificationKind::DormantAlternative,
            "title".to_string(),
            "body".to_string(),
            Value::Null,
        );
        n.mark_read();
        n.mark_read();
        assert!(n.read);
    }
}
