//! Infrastructure layer for conclave
//!
//! Adapters implementing the ports defined in the application layer:
//! vendor HTTP clients, runtime provider settings, conversation persistence,
//! session publish/subscribe, and configuration file loading.

pub mod config;
pub mod conversation;
pub mod providers;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileDebateConfig, FileMixConfig,
    FileOrchestratorConfig, FileProviderConfig, FileSelectionConfig,
};
pub use conversation::JsonlConversationStore;
pub use providers::{
    AnthropicAdapter, GeminiAdapter, HttpSettings, OpenAiCompatibleAdapter, ProviderKind,
    build_registry, http_client,
};
pub use session::SessionHub;
pub use settings::InMemorySettingsStore;
