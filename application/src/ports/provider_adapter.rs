//! Provider adapter port
//!
//! Defines the uniform call contract every vendor adapter implements, and the
//! registry the orchestrator resolves adapters from.

use async_trait::async_trait;
use conclave_domain::{Message, ProviderId, StreamEvent};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during a provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider {0} returned no usable output")]
    EmptyResponse(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Timeout")]
    Timeout,
}

/// Reason reported when a stream's channel closes before `Completed`.
pub const STREAM_CLOSED: &str = "stream closed before completion";

/// Handle for receiving streaming events from a provider call.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// A stream that yields `text` as its only (terminal) event.
    pub fn completed(text: String) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // capacity 1 and a fresh channel: try_send cannot fail
        let _ = tx.try_send(StreamEvent::Completed(text));
        Self::new(rx)
    }

    /// Consume the stream and collect all text into a single string.
    ///
    /// A channel that closes before `Completed` is an interrupted stream.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::StreamInterrupted(e));
                }
            }
        }
        Err(GatewayError::StreamInterrupted(STREAM_CLOSED.to_string()))
    }
}

/// Uniform call contract for one external LLM provider
///
/// Implementations (adapters) live in the infrastructure layer. Each adapter
/// normalizes system messages into its vendor's placement and extracts plain
/// text from the vendor's response shape.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Id of the provider this adapter talks to.
    fn id(&self) -> &ProviderId;

    /// Whether `stream_chat` delivers incremental deltas.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// False when the adapter lacks credentials; such providers are never selected.
    fn is_configured(&self) -> bool {
        true
    }

    /// Non-streaming call.
    ///
    /// Failures are logged by the adapter and reported as `None`, the
    /// sentinel for "provider produced nothing usable".
    async fn chat(&self, messages: &[Message]) -> Option<String>;

    /// Streaming call.
    ///
    /// Default implementation calls `chat()` and wraps the result in a single
    /// `Completed` event.
    async fn stream_chat(&self, messages: &[Message]) -> Result<StreamHandle, GatewayError> {
        match self.chat(messages).await {
            Some(text) => Ok(StreamHandle::completed(text)),
            None => Err(GatewayError::EmptyResponse(self.id().to_string())),
        }
    }
}

/// Adapters keyed by provider id.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own id, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.id().clone(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, id: &ProviderId) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(id).cloned()
    }

    /// Registered and holding credentials.
    pub fn is_usable(&self, id: &ProviderId) -> bool {
        self.adapters.get(id).is_some_and(|a| a.is_configured())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        id: ProviderId,
        reply: Option<String>,
    }

    #[async_trait]
    impl ProviderAdapter for Fixed {
        fn id(&self) -> &ProviderId {
            &self.id
        }

        async fn chat(&self, _messages: &[Message]) -> Option<String> {
            self.reply.clone()
        }
    }

    fn fixed(id: &str, reply: Option<&str>) -> Arc<dyn ProviderAdapter> {
        Arc::new(Fixed {
            id: ProviderId::new(id).unwrap(),
            reply: reply.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn default_stream_chat_wraps_chat() {
        let adapter = fixed("claude", Some("hello"));
        let handle = adapter.stream_chat(&[Message::user("hi")]).await.unwrap();
        assert_eq!(handle.collect_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn default_stream_chat_maps_none_to_empty_response() {
        let adapter = fixed("claude", None);
        let result = adapter.stream_chat(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(GatewayError::EmptyResponse(id)) if id == "claude"));
    }

    #[tokio::test]
    async fn collect_text_prefers_deltas() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta("a".into())).await.unwrap();
        tx.send(StreamEvent::Delta("b".into())).await.unwrap();
        tx.send(StreamEvent::Completed("ab".into())).await.unwrap();
        assert_eq!(StreamHandle::new(rx).collect_text().await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn collect_text_surfaces_stream_error() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta("a".into())).await.unwrap();
        tx.send(StreamEvent::Error("reset".into())).await.unwrap();
        assert_eq!(
            StreamHandle::new(rx).collect_text().await,
            Err(GatewayError::StreamInterrupted("reset".into()))
        );
    }

    #[tokio::test]
    async fn collect_text_rejects_stream_closed_early() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta("half an ans".into())).await.unwrap();
        drop(tx);
        assert_eq!(
            StreamHandle::new(rx).collect_text().await,
            Err(GatewayError::StreamInterrupted(STREAM_CLOSED.to_string()))
        );
    }

    #[test]
    fn registry_lookup() {
        let registry = ProviderRegistry::new()
            .with(fixed("openai", Some("x")))
            .with(fixed("claude", None));
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&ProviderId::new("openai").unwrap()).is_some());
        assert!(registry.is_usable(&ProviderId::new("claude").unwrap()));
        assert!(!registry.is_usable(&ProviderId::new("gemini").unwrap()));
    }
}
