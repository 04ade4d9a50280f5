//! Chat service use case.
//!
//! Caller-side wrapper around the [`StreamingOrchestrator`]: announces the
//! conversation id, stores the user prompt, runs the orchestrator and stores
//! the final reply under its provider tag.

use crate::ports::conversation_store::{
    ConversationStore, ConversationStoreError, NoConversationStore,
};
use crate::ports::event_sink::EventSink;
use crate::use_cases::orchestrate::{OrchestrateError, OrchestrationOutcome, StreamingOrchestrator};
use conclave_domain::{ChatEvent, ChatRequest, Role};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ChatServiceError {
    #[error(transparent)]
    Orchestrate(#[from] OrchestrateError),

    #[error("Failed to persist conversation: {0}")]
    Store(#[from] ConversationStoreError),
}

/// New random conversation id.
pub fn new_conversation_id() -> String {
    format!("conv-{:016x}", rand::random::<u64>())
}

pub struct ChatService {
    orchestrator: Arc<StreamingOrchestrator>,
    store: Arc<dyn ConversationStore>,
}

impl ChatService {
    pub fn new(orchestrator: Arc<StreamingOrchestrator>) -> Self {
        Self {
            orchestrator,
            store: Arc::new(NoConversationStore),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = store;
        self
    }

    /// Answer `request` within conversation `conversation_id` (a fresh id
    /// when `None`).
    ///
    /// Emits `conversationId` first, then the orchestrator's stream.
    pub async fn send(
        &self,
        conversation_id: Option<&str>,
        request: &ChatRequest,
        sink: &dyn EventSink,
    ) -> Result<OrchestrationOutcome, ChatServiceError> {
        let conversation_id = conversation_id
            .map(str::to_string)
            .unwrap_or_else(new_conversation_id);

        sink.emit(ChatEvent::ConversationId {
            conversation_id: conversation_id.clone(),
        })
        .await;

        if let Err(e) = self
            .store
            .add_message(&conversation_id, Role::User, &request.prompt, None)
            .await
        {
            warn!("Could not store prompt for {}: {}", conversation_id, e);
            sink.emit(ChatEvent::error(e.to_string())).await;
            return Err(e.into());
        }

        let outcome = self.orchestrator.orchestrate(request, sink).await?;

        self.store
            .add_message(
                &conversation_id,
                Role::Assistant,
                &outcome.content,
                Some(&outcome.provider_tag),
            )
            .await
            .inspect_err(|e| warn!("Could not store reply for {}: {}", conversation_id, e))?;

        info!(
            "Stored {} reply in conversation {}",
            outcome.provider_tag, conversation_id
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DebateLineup, OrchestratorConfig};
    use crate::ports::event_sink::RecordingSink;
    use crate::ports::provider_adapter::ProviderRegistry;
    use crate::ports::provider_settings::StaticProviderSettings;
    use crate::services::breaker_registry::CircuitBreakerRegistry;
    use crate::use_cases::test_support::{MockAdapter, id};
    use async_trait::async_trait;
    use conclave_domain::{Provider, ProviderCatalog, ProviderProfile};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<(String, Role, String, Option<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl ConversationStore for MemoryStore {
        async fn add_message(
            &self,
            conversation_id: &str,
            role: Role,
            content: &str,
            provider_tag: Option<&str>,
        ) -> Result<(), ConversationStoreError> {
            if self.fail {
                return Err(ConversationStoreError::Unavailable("disk full".into()));
            }
            self.rows.lock().unwrap().push((
                conversation_id.to_string(),
                role,
                content.to_string(),
                provider_tag.map(str::to_string),
            ));
            Ok(())
        }
    }

    fn service(store: Arc<MemoryStore>, adapter: MockAdapter) -> ChatService {
        let catalog = Arc::new(ProviderCatalog::new(
            vec![ProviderProfile::new(id("openai"), "GPT")],
            id("openai"),
        ));
        let settings = StaticProviderSettings::new(vec![Provider::new(id("openai"), "GPT")]);
        let lineup = DebateLineup::new(
            ["openai", "openai", "openai", "openai"].map(id),
            id("openai"),
            id("openai"),
        );
        let orchestrator = StreamingOrchestrator::new(
            catalog,
            ProviderRegistry::new().with(Arc::new(adapter)),
            Arc::new(settings),
            Arc::new(CircuitBreakerRegistry::default()),
            OrchestratorConfig::new(vec![id("openai")], lineup).with_typing_delay(Duration::ZERO),
        );
        ChatService::new(Arc::new(orchestrator)).with_store(store)
    }

    #[tokio::test]
    async fn announces_conversation_and_persists_both_sides() {
        let store = Arc::new(MemoryStore::default());
        let service = service(store.clone(), MockAdapter::replying("openai", &["hi there"]));
        let sink = RecordingSink::new();

        service
            .send(Some("c-1"), &ChatRequest::new("hello"), &sink)
            .await
            .unwrap();

        let events = sink.events();
        assert_eq!(
            events[0],
            ChatEvent::ConversationId {
                conversation_id: "c-1".to_string()
            }
        );
        assert!(matches!(events.last(), Some(ChatEvent::Complete { .. })));

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ("c-1".into(), Role::User, "hello".into(), None));
        assert_eq!(
            rows[1],
            (
                "c-1".into(),
                Role::Assistant,
                "hi there".into(),
                Some("openai".into())
            )
        );
    }

    #[tokio::test]
    async fn generates_conversation_id_when_missing() {
        let store = Arc::new(MemoryStore::default());
        let service = service(store.clone(), MockAdapter::echo("openai"));
        let sink = RecordingSink::new();

        service.send(None, &ChatRequest::new("x"), &sink).await.unwrap();
        match &sink.events()[0] {
            ChatEvent::ConversationId { conversation_id } => {
                assert!(conversation_id.starts_with("conv-"));
            }
            other => panic!("unexpected first event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_reply_is_not_persisted() {
        let store = Arc::new(MemoryStore::default());
        let service = service(store.clone(), MockAdapter::failing("openai"));
        let sink = RecordingSink::new();

        let result = service.send(Some("c"), &ChatRequest::new("x"), &sink).await;
        assert!(matches!(result, Err(ChatServiceError::Orchestrate(_))));
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_stops_before_orchestration() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..Default::default()
        });
        let service = service(store, MockAdapter::echo("openai"));
        let sink = RecordingSink::new();

        let result = service.send(Some("c"), &ChatRequest::new("x"), &sink).await;
        assert!(matches!(result, Err(ChatServiceError::Store(_))));
        let kinds: Vec<_> = sink.events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["conversationId", "error"]);
    }
}
