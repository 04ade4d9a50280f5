//! Session publish/subscribe hub
//!
//! A caller binds a session id before starting an A2A run and receives every
//! event the run publishes under that id. Each session owns one tokio
//! `broadcast` channel, so several subscribers may watch the same debate.

use async_trait::async_trait;
use conclave_application::{EventSink, SessionPublisher};
use conclave_domain::{ChatEvent, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Events buffered per session before slow subscribers start lagging.
pub const DEFAULT_SESSION_CAPACITY: usize = 256;

pub struct SessionHub {
    sessions: Mutex<HashMap<SessionId, broadcast::Sender<ChatEvent>>>,
    capacity: usize,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}

impl SessionHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Bind `session` (if not already bound) and subscribe to it.
    pub fn bind(&self, session: &SessionId) -> broadcast::Receiver<ChatEvent> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        sessions
            .entry(session.clone())
            .or_insert_with(|| {
                debug!("Session {} bound", session);
                broadcast::channel(self.capacity).0
            })
            .subscribe()
    }

    /// Drop the binding; existing receivers see the channel close.
    pub fn unbind(&self, session: &SessionId) -> bool {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(session)
            .is_some();
        if removed {
            debug!("Session {} unbound", session);
        }
        removed
    }

    pub fn is_bound(&self, session: &SessionId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(session)
    }
}

impl SessionPublisher for SessionHub {
    fn sink_for(&self, session: &SessionId) -> Option<Arc<dyn EventSink>> {
        let sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        let tx = sessions.get(session)?.clone();
        Some(Arc::new(BroadcastSink {
            session: session.clone(),
            tx,
        }))
    }
}

struct BroadcastSink {
    session: SessionId,
    tx: broadcast::Sender<ChatEvent>,
}

#[async_trait]
impl EventSink for BroadcastSink {
    async fn emit(&self, event: ChatEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session {} has no subscribers", self.session);
        }
    }
}
