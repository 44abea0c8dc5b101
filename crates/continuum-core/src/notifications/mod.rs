//! Notification fan-out (spec §4.9): analyzers and the write path raise
//! events, this module persists them durably and best-effort pushes them to
//! any live connection for the owning user. Replay of up-to-20 unread
//! notifications happens on connect; acking a notification marks it read in
//! the durable store.

pub mod sink;
pub mod store;

pub use sink::{ConnectionRegistry, LoggingSink, NotificationSink};
pub use store::{InMemoryNotificationStore, NotificationStore};

use continuum_types::{Notification, NotificationId, NotificationKind, Result, UserId};
use serde_json::Value;
use std::sync::Arc;

/// How many unread notifications a freshly connected client is replayed
/// (spec §4.9: "on connect, replay up to 20 unread notifications").
pub const REPLAY_LIMIT: usize = 20;

/// Ties the durable store to the live-connection registry. This is the
/// handle `Continuum` (`engine.rs`) hands to analyzers and the write path.
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    registry: Arc<ConnectionRegistry>,
}

impl NotificationService {
    #[must_use]
    pub fn new(store: Arc<dyn NotificationStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(InMemoryNotificationStore::shared(), Arc::new(ConnectionRegistry::new()))
    }

    /// Persist a notification and best-effort push it to any live
    /// connection for its owner. Analyzers call this once per finding
    /// (dormant alternative, invalidated assumption, stale decision,
    /// contradiction).
    pub fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        title: String,
        body: String,
        payload: Value,
    ) -> Result<Notification> {
        let notification = Notification::new(user_id, kind, title, body, payload);
        self.store.put(&notification)?;
        self.registry.push(&notification.user_id, &notification);
        Ok(notification)
    }

    /// Register a newly connected sink and return the unread backlog it
    /// should replay immediately (spec §4.9).
    pub fn connect(&self, user_id: UserId, sink: Arc<dyn NotificationSink>) -> Result<Vec<Notification>> {
        let backlog = self.store.unread_oldest_first(&user_id, REPLAY_LIMIT)?;
        self.registry.connect(user_id, sink);
        Ok(backlog)
    }

    /// Handle a client's `{"ack": "<id>"}` message: mark read.
    pub fn ack(&self, id: &NotificationId) -> Result<()> {
        self.store.mark_read(id)
    }

    /// `GET /api/notifications` (spec §6): unread-first listing.
    pub fn list(&self, user_id: &UserId, limit: usize) -> Result<Vec<Notification>> {
        self.store.list(user_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(Arc<AtomicUsize>);

    impl NotificationSink for CountingSink {
        fn send(&self, _notification: &Notification) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn notify_pushes_to_a_connected_sink() {
        let service = NotificationService::in_memory();
        let user = UserId::from("alice");
        let count = Arc::new(AtomicUsize::new(0));
        service
            .connect(user.clone(), Arc::new(CountingSink(count.clone())))
            .unwrap();

        service
            .notify(
                user,
                NotificationKind::StaleDecision,
                "title".to_string(),
                "body".to_string(),
                Value::Null,
            )
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connect_replays_unread_backlog_up_to_the_limit() {
        let service = NotificationService::in_memory();
        let user = UserId::from("alice");
        for _ in 0..25 {
            service
                .notify(
                    user.clone(),
                    NotificationKind::DormantAlternative,
                    "t".to_string(),
                    "b".to_string(),
                    Value::Null,
                )
                .unwrap();
        }

        let backlog = service
            .connect(user, Arc::new(LoggingSink))
            .unwrap();

        assert_eq!(backlog.len(), REPLAY_LIMIT);
    }

    #[test]
    fn ack_marks_read_and_removes_from_future_backlog() {
        let service = NotificationService::in_memory();
        let user = UserId::from("alice");
        let n = service
            .notify(
                user.clone(),
                NotificationKind::ContradictionDetected,
                "t".to_string(),
                "b".to_string(),
                Value::Null,
            )
            .unwrap();

        service.ack(&n.id).unwrap();

        let backlog = service.connect(user, Arc::new(LoggingSink)).unwrap();
        assert!(backlog.is_empty());
    }
}
