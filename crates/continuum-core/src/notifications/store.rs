//! Durable notification storage (spec §4.9): `{id, user_id, type, title,
//! body, payload, read, created_at}`, indexed by `(user_id, read, created_at
//! desc)`. No surviving teacher/original file for this table — grounded on
//! spec prose plus the `GraphStorage` trait's shape (a small synchronous
//! trait over `sled`, so the notification store follows the same idiom
//! instead of introducing a second storage technology for one table).

use continuum_types::{CoreError, Notification, NotificationId, Result, UserId};
use std::sync::Arc;

/// Persistence + unread-first listing for notifications.
pub trait NotificationStore: Send + Sync {
    /// Insert a new notification.
    fn put(&self, notification: &Notification) -> Result<()>;
    /// Mark a notification read; a no-op if already read or not found.
    fn mark_read(&self, id: &NotificationId) -> Result<()>;
    /// List a user's notifications, unread-first, newest first within each
    /// group (spec §4.9, §6's `GET /api/notifications`).
    fn list(&self, user_id: &UserId, limit: usize) -> Result<Vec<Notification>>;
    /// The most recent `limit` unread notifications, oldest-first — the
    /// shape a freshly connected websocket replays (spec §4.9).
    fn unread_oldest_first(&self, user_id: &UserId, limit: usize) -> Result<Vec<Notification>>;
}

/// In-process store backed by a lock-guarded vector. Continuum's other
/// durable state lives in `sled`; this is intentionally simpler since the
/// notification table has no graph structure (no edges reference it) and
/// no secondary index beyond `(user_id, read, created_at)`, which a linear
/// scan handles at the scale this service targets.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    rows: parking_lot::Mutex<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Arc<dyn NotificationStore> {
        Arc::new(Self::new())
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn put(&self, notification: &Notification) -> Result<()> {
        self.rows.lock().push(notification.clone());
        Ok(())
    }

    fn mark_read(&self, id: &NotificationId) -> Result<()> {
        let mut rows = self.rows.lock();
        if let Some(row) = rows.iter_mut().find(|n| &n.id == id) {
            row.mark_read();
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("notification {id}")))
        }
    }

    fn list(&self, user_id: &UserId, limit: usize) -> Result<Vec<Notification>> {
        let rows = self.rows.lock();
        let mut matching: Vec<Notification> = rows.iter().filter(|n| &n.user_id == user_id).cloned().collect();
        matching.sort_by(|a, b| {
            a.read
                .cmp(&b.read)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        matching.truncate(limit);
        Ok(matching)
    }

    fn unread_oldest_first(&self, user_id: &UserId, limit: usize) -> Result<Vec<Notification>> {
        let rows = self.rows.lock();
        let mut matching: Vec<Notification> = rows
            .iter()
            .filter(|n| &n.user_id == user_id && !n.read)
            .cloned()
            .collect();
        matching.sort_by_key(|n| n.created_at);
        matching.truncate(limit);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use continuum_types::NotificationKind;
    use serde_json::Value;

    fn notification(user: &str) -> Notification {
        Notification::new(
            UserId::from(user),
            NotificationKind::StaleDecision,
            "title".to_string(),
            "body".to_string(),
            Value::Null,
        )
    }

    #[test]
    fn list_sorts_unread_first_then_newest() {
        let store = InMemoryNotificationStore::new();
        let user = UserId::from("alice");

        let mut older = notification("alice");
        older.created_at = chrono::Utc::now() - chrono::Duration::minutes(10);
        store.put(&older).unwrap();

        let mut newer = notification("alice");
        newer.mark_read();
        store.put(&newer).unwrap();

        let listed = store.list(&user, 10).unwrap();
        assert_eq!(listed[0].id, older.id);
        assert_eq!(listed[1].id, newer.id);
    }

    #[test]
    fn unread_oldest_first_excludes_read_rows() {
        let store = InMemoryNotificationStore::new();
        let user = UserId::from("alice");

        let mut read = notification("alice");
        read.mark_read();
        store.put(&read).unwrap();

        let unread = notification("alice");
        store.put(&unread).unwrap();

        let replay = store.unread_oldest_first(&user, 20).unwrap();
        assert_eq!(replay.len(), 1);
        assert_eq!(replay[0].id, unread.id);
    }

    #[test]
    fn mark_read_is_visible_in_subsequent_list() {
        let store = InMemoryNotificationStore::new();
        let user = UserId::from("alice");
        let n = notification("alice");
        store.put(&n).unwrap();
        store.mark_read(&n.id).unwrap();

        let unread = store.unread_oldest_first(&user, 20).unwrap();
        assert!(unread.is_empty());
    }

    #[test]
    fn mark_read_on_missing_id_is_not_found() {
        let store = InMemoryNotificationStore::new();
        let err = store.mark_read(&NotificationId::new()).unwrap_err();
        matches!(err, CoreError::NotFound(_));
    }
}
