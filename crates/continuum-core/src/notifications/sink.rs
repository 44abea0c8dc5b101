//! The live-delivery side of notifications: a pluggable per-connection sink
//! trait, modeled directly on `llm::client::ObservabilityHook` — the same
//! "small trait, `Arc<dyn Trait>`, best-effort fan-out" shape, just applied
//! to websocket connections instead of LLM call records. The actual
//! websocket wire protocol is the HTTP layer's concern (spec §1, §6); this
//! module only defines what a connected client looks like from the engine's
//! side and how many such clients one user can have open at once.

use continuum_types::{Notification, UserId};
use dashmap::DashMap;
use std::sync::Arc;

/// One live client connection capable of receiving a push.
///
/// `send` returns `false` when the connection is gone (socket closed, send
/// buffer full and dropped, etc.) so the registry can evict it instead of
/// leaking a dead entry.
pub trait NotificationSink: Send + Sync {
    fn send(&self, notification: &Notification) -> bool;
}

/// Logs instead of pushing. Used where no websocket layer is wired up yet
/// (tests, the CLI, a headless worker) — the structured-logging analogue of
/// `StructuredLogHook`.
pub struct LoggingSink;

impl NotificationSink for LoggingSink {
    fn send(&self, notification: &Notification) -> bool {
        tracing::info!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            kind = ?notification.kind,
            "notification delivered"
        );
        true
    }
}

/// Per-user registry of live connections. A user may have more than one
/// open (multiple tabs/devices), so each user maps to a small set of sinks
/// rather than a single slot.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserId, Vec<Arc<dyn NotificationSink>>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly connected sink for a user.
    pub fn connect(&self, user_id: UserId, sink: Arc<dyn NotificationSink>) {
        self.connections.entry(user_id).or_default().push(sink);
    }

    /// Best-effort push to every live connection for a user. Connections
    /// whose `send` returns `false` are dropped from the registry so a
    /// closed socket doesn't accumulate forever.
    pub fn push(&self, user_id: &UserId, notification: &Notification) {
        if let Some(mut sinks) = self.connections.get_mut(user_id) {
            sinks.retain(|sink| sink.send(notification));
        }
    }

    /// Number of live connections for a user, for tests and diagnostics.
    #[must_use]
    pub fn connection_count(&self, user_id: &UserId) -> usize {
        self.connections.get(user_id).map_or(0, |s| s.len())
    }
}
