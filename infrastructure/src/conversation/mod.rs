//! Conversation persistence
//!
//! Implements the [`ConversationStore`] port.

mod jsonl_store;

pub use jsonl_store::JsonlConversationStore;
