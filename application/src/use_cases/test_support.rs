//! Scripted provider adapters for use-case tests.

use crate::ports::provider_adapter::{GatewayError, ProviderAdapter, StreamHandle};
use async_trait::async_trait;
use conclave_domain::util::typing_chunks;
use conclave_domain::{Message, ProviderId, StreamEvent};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

pub(crate) fn id(s: &str) -> ProviderId {
    ProviderId::new(s).unwrap()
}

enum Behaviour {
    /// Scripted replies; once exhausted, echo a numbered default.
    Replies(Mutex<VecDeque<Option<String>>>),
    /// Deliver one delta, then fail the stream, or close it without a
    /// terminal event when `error` is `None`.
    BrokenStream { partial: String, error: Option<String> },
}

pub(crate) struct MockAdapter {
    id: ProviderId,
    behaviour: Behaviour,
    streaming: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl MockAdapter {
    fn with(provider: &str, behaviour: Behaviour) -> Self {
        Self {
            id: id(provider),
            behaviour,
            streaming: false,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(provider: &str, replies: &[&str]) -> Self {
        Self::with(
            provider,
            Behaviour::Replies(Mutex::new(
                replies.iter().map(|r| Some(r.to_string())).collect(),
            )),
        )
    }

    /// Always answers with `"<id> reply <n>"`.
    pub fn echo(provider: &str) -> Self {
        Self::replying(provider, &[])
    }

    /// Every call yields nothing.
    pub fn failing(provider: &str) -> Self {
        Self::with(
            provider,
            Behaviour::Replies(Mutex::new(std::iter::repeat_n(None, 64).collect())),
        )
    }

    pub fn broken_stream(provider: &str, partial: &str) -> Self {
        Self::cut_stream(provider, partial, Some("connection reset"))
    }

    /// Streams one delta, then drops the channel without `Completed`.
    pub fn truncated_stream(provider: &str, partial: &str) -> Self {
        Self::cut_stream(provider, partial, None)
    }

    fn cut_stream(provider: &str, partial: &str, error: Option<&str>) -> Self {
        let mut adapter = Self::with(
            provider,
            Behaviour::BrokenStream {
                partial: partial.to_string(),
                error: error.map(str::to_string),
            },
        );
        adapter.streaming = true;
        adapter
    }

    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages of every call, in call order.
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    fn next_reply(&self, messages: &[Message]) -> Option<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(messages.to_vec());
        match &self.behaviour {
            Behaviour::Replies(replies) => replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Some(format!("{} reply {}", self.id, n))),
            Behaviour::BrokenStream { .. } => None,
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn id(&self) -> &ProviderId {
        &self.id
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    async fn chat(&self, messages: &[Message]) -> Option<String> {
        self.next_reply(messages)
    }

    async fn stream_chat(&self, messages: &[Message]) -> Result<StreamHandle, GatewayError> {
        if let Behaviour::BrokenStream { partial, error } = &self.behaviour {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = mpsc::channel(4);
            tx.send(StreamEvent::Delta(partial.clone())).await.unwrap();
            if let Some(error) = error {
                tx.send(StreamEvent::Error(error.clone())).await.unwrap();
            }
            return Ok(StreamHandle::new(rx));
        }

        let text = self
            .next_reply(messages)
            .ok_or_else(|| GatewayError::EmptyResponse(self.id.to_string()))?;
        let pieces = typing_chunks(&text);
        let (tx, rx) = mpsc::channel(pieces.len() + 1);
        for piece in pieces {
            tx.send(StreamEvent::Delta(piece.to_string())).await.unwrap();
        }
        tx.send(StreamEvent::Completed(text.clone())).await.unwrap();
        Ok(StreamHandle::new(rx))
    }
}
