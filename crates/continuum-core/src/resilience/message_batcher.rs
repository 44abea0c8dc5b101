//! Per-session write-batching queue for inbound message streams (spec
//! §4.10, §5, §8 property 7). Grounded on
//! `original_source/apps/api/services/message_queue.py`'s
//! `SessionMessageQueue`/`MessageQueueManager`.

use continuum_types::{CoreError, SessionId};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A flush sink: persists a batch of messages for a session. Failures
/// re-prepend the batch (spec §4.10: "on failure the batch is re-prepended
/// and surfaced").
#[async_trait::async_trait]
pub trait BatchSink<M>: Send + Sync {
    /// Persist `messages` transactionally. `Err` causes the batch to be
    /// re-queued at the front.
    async fn flush_batch(&self, session_id: &SessionId, messages: Vec<M>) -> Result<(), CoreError>;
}

struct SessionQueue<M> {
    pending: Mutex<Vec<M>>,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

impl<M> SessionQueue<M> {
    fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            flush_task: Mutex::new(None),
        }
    }
}

/// Tunables: batch size `B` and flush timer `T` (spec §4.10 defaults 10 / 2s).
#[derive(Debug, Clone, Copy)]
pub struct BatcherConfig {
    /// Flush once this many messages have accumulated.
    pub batch_size: usize,
    /// Flush this long after the last arrival if size isn't reached first.
    pub flush_timeout: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_timeout: Duration::from_secs(2),
        }
    }
}

/// Manages one `SessionQueue` per active capture session (spec §4.10).
/// `M` is the message payload type; generic so the batcher can be reused
/// for different capture surfaces (interactive sessions, log-replay, etc).
pub struct MessageQueueManager<M, S>
where
    M: Send + Clone + 'static,
    S: BatchSink<M> + 'static,
{
    config: BatcherConfig,
    sink: Arc<S>,
    sessions: Arc<DashMap<SessionId, Arc<SessionQueue<M>>>>,
}

impl<M, S> MessageQueueManager<M, S>
where
    M: Send + Clone + 'static,
    S: BatchSink<M> + 'static,
{
    /// Construct a manager flushing through `sink`.
    #[must_use]
    pub fn new(config: BatcherConfig, sink: Arc<S>) -> Self {
        Self {
            config,
            sink,
            sessions: Arc::new(DashMap::new()),
        }
    }

    fn queue_for(&self, session_id: SessionId) -> Arc<SessionQueue<M>> {
        self.sessions
            .entry(session_id)
            .or_insert_with(|| Arc::new(SessionQueue::new()))
            .clone()
    }

    /// Append `message` to `session_id`'s pending batch. Flushes
    /// immediately if the batch reaches `batch_size`; otherwise
    /// (re)schedules a delayed flush at `flush_timeout` from now, cancelling
    /// any previously scheduled one (spec §4.10: "a delayed flush task is
    /// (re-)scheduled on each enqueue").
    pub async fn add_message(&self, session_id: SessionId, message: M) -> Result<(), CoreError> {
        let queue = self.queue_for(session_id);
        let should_flush_now = {
            let mut pending = queue.pending.lock().await;
            pending.push(message);
            pending.len() >= self.config.batch_size
        };

        if should_flush_now {
            self.cancel_scheduled_flush(&queue).await;
            self.flush_queue(session_id, &queue).await
        } else {
            self.schedule_flush(session_id, queue);
            Ok(())
        }
    }

    async fn cancel_scheduled_flush(&self, queue: &SessionQueue<M>) {
        if let Some(handle) = queue.flush_task.lock().await.take() {
            handle.abort();
        }
    }

    fn schedule_flush(&self, session_id: SessionId, queue: Arc<SessionQueue<M>>) {
        let config = self.config;
        let sink = self.sink.clone();
        let task_queue = queue.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(config.flush_timeout).await;
            let messages: Vec<M> = {
                let mut pending = task_queue.pending.lock().await;
                std::mem::take(&mut *pending)
            };
            if messages.is_empty() {
                return;
            }
            if let Err(err) = sink.flush_batch(&session_id, messages.clone()).await {
                tracing::warn!(session_id = %session_id, error = %err, "timed batch flush failed, re-queuing");
                let mut pending = task_queue.pending.lock().await;
                pending.splice(0..0, messages);
            }
        });
        // Replace any previously scheduled flush task for this session.
        // `add_message` already cancelled it under `cancel_scheduled_flush`
        // before this point when a flush happened synchronously; for the
        // timer-reschedule path we simply swap the handle in.
        if let Ok(mut slot) = queue.flush_task.try_lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Force-flush one session's pending batch immediately, used by
    /// `complete_session`.
    pub async fn flush_session(&self, session_id: SessionId) -> Result<(), CoreError> {
        if let Some(entry) = self.sessions.get(&session_id) {
            let queue = entry.clone();
            drop(entry);
            self.cancel_scheduled_flush(&queue).await;
            self.flush_queue(session_id, &queue).await?;
        }
        Ok(())
    }

    async fn flush_queue(&self, session_id: SessionId, queue: &SessionQueue<M>) -> Result<(), CoreError> {
        let messages: Vec<M> = {
            let mut pending = queue.pending.lock().await;
            std::mem::take(&mut *pending)
        };
        if messages.is_empty() {
            return Ok(());
        }
        match self.sink.flush_batch(&session_id, messages.clone()).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let mut pending = queue.pending.lock().await;
                pending.splice(0..0, messages);
                Err(err)
            }
        }
    }

    /// Remove a completed session's queue entirely (after a final flush).
    pub async fn remove_session(&self, session_id: SessionId) -> Result<(), CoreError> {
        self.flush_session(session_id).await?;
        self.sessions.remove(&session_id);
        Ok(())
    }

    /// Force-flush every session, used on graceful shutdown (spec §4.10,
    /// §5's drain deadline).
    pub async fn flush_all(&self) -> Result<(), CoreError> {
        let session_ids: Vec<SessionId> = self.sessions.iter().map(|e| *e.key()).collect();
        for session_id in session_ids {
            self.flush_session(session_id).await?;
        }
        Ok(())
    }

    /// Count of sessions with pending (unflushed) messages, for stats.
    pub async fn pending_session_count(&self) -> usize {
        let mut count = 0;
        for entry in self.sessions.iter() {
            if !entry.value().pending.lock().await.is_empty() {
                count += 1;
            }
        }
        count
    }
}
