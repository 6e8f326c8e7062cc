use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "snake_case")]
pub enum GenerationEvent {
    RunStarted { chunk_count: usize },
    ChunkCompleted { chunk_index: usize, cards_created: usize },
    ChunkFailed { chunk_index: usize, error: String },
    RunCompleted { cards_total: usize, chunks_failed: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub session_id: Uuid,
    pub event: GenerationEvent,
}

/// Lossy progress fan-out: events are dropped when nobody listens and must
/// never block generation.
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, session_id: Uuid, event: GenerationEvent) {
        let session_event = SessionEvent { session_id, event };
        if self.tx.send(session_event).is_err() {
            debug!("No event subscribers, progress event dropped");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}
