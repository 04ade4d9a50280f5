//! Application layer for conclave
//!
//! This crate contains use cases, services, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DebateLineup, OrchestratorConfig};
pub use ports::{
    conversation_store::{ConversationStore, ConversationStoreError, NoConversationStore},
    event_sink::{ChannelSink, EventSink, RecordingSink},
    provider_adapter::{GatewayError, ProviderAdapter, ProviderRegistry, StreamHandle},
    provider_settings::{ProviderSettingsSource, StaticProviderSettings},
    session_publisher::SessionPublisher,
};
pub use services::{
    breaker_registry::{BreakerPolicy, CircuitBreakerRegistry, FallbackReason},
    selector::ProviderSelector,
};
pub use use_cases::chat::{ChatService, ChatServiceError, new_conversation_id};
pub use use_cases::debate::{A2A_PROVIDER_TAG, CoordinatorError, DebateCoordinator};
pub use use_cases::orchestrate::{
    MIX_PROVIDER_TAG, OrchestrateError, OrchestrationOutcome, StreamingOrchestrator,
};
