//! Conversation persistence port.
//!
//! The orchestration core never stores messages itself; the chat service
//! hands the user prompt and the final reply to this collaborator.

use async_trait::async_trait;
use conclave_domain::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversationStoreError {
    #[error("Conversation store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write message: {0}")]
    WriteFailed(String),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one message to a conversation.
    ///
    /// `provider_tag` records who produced an assistant message
    /// (a provider id, `mix` or `a2a`).
    async fn add_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        provider_tag: Option<&str>,
    ) -> Result<(), ConversationStoreError>;
}

/// No-op implementation for tests and when persistence is disabled.
pub struct NoConversationStore;

#[async_trait]
impl ConversationStore for NoConversationStore {
    async fn add_message(
        &self,
        _conversation_id: &str,
        _role: Role,
        _content: &str,
        _provider_tag: Option<&str>,
    ) -> Result<(), ConversationStoreError> {
        Ok(())
    }
}
