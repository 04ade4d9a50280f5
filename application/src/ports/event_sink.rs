//! Event sink port
//!
//! The orchestrator emits every [`ChatEvent`] of a request through one
//! [`EventSink`]. Each `emit` is awaited before the next event is produced,
//! so a sink observes events in exactly the order they were generated.

use async_trait::async_trait;
use conclave_domain::ChatEvent;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Destination for the ordered event stream of one request or session.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    ///
    /// Infallible by contract: a vanished consumer must not abort the run.
    async fn emit(&self, event: ChatEvent);
}

/// Sink backed by a bounded `mpsc` channel.
///
/// Back-pressure from a slow consumer suspends the producer; a dropped
/// receiver is tolerated and the run continues without output.
pub struct ChannelSink {
    tx: mpsc::Sender<ChatEvent>,
    closed: AtomicBool,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ChatEvent>) -> Self {
        Self {
            tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Create a sink and the receiver that consumes it.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: ChatEvent) {
        if self.tx.send(event).await.is_err() && !self.closed.swap(true, Ordering::Relaxed) {
            debug!("Event receiver dropped; continuing without output");
        }
    }
}

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ChatEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events emitted so far.
    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Concatenated text of every `chunk` event.
    pub fn chunk_text(&self) -> String {
        self.events()
            .iter()
            .filter_map(|e| e.chunk_text().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: ChatEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
