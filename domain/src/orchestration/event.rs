//! Outbound chat events.
//!
//! [`ChatEvent`] is the tagged event stream the orchestrator emits to its
//! caller. Events for one request are strictly ordered; the caller encodes
//! them onto its output channel (SSE, NDJSON, console, ...).
//!
//! Serialized form is `{"type": "<camelCase variant>", ...camelCase fields}`.

use crate::core::provider::ProviderId;
use crate::orchestration::entities::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChatEvent {
    /// A piece of reply text.
    Chunk {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderId>,
    },
    /// A provider begins its turn.
    AgentStart {
        provider: ProviderId,
        provider_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase: Option<Phase>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u8>,
    },
    /// A provider finished its turn; `content` is what entered the transcript.
    AgentComplete {
        provider: ProviderId,
        provider_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase: Option<Phase>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u8>,
        content: String,
        success: bool,
    },
    /// A debate round begins.
    Phase { phase: Phase, round: u8 },
    /// Identifies the conversation the reply will be stored under.
    ConversationId { conversation_id: String },
    /// Terminal success: the full reply and the provider tag it is stored with.
    Complete { content: String, provider: String },
    /// Terminal failure.
    Error { message: String },
}

impl ChatEvent {
    pub fn chunk(content: impl Into<String>, provider: Option<ProviderId>) -> Self {
        ChatEvent::Chunk {
            content: content.into(),
            provider,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ChatEvent::Error {
            message: message.into(),
        }
    }

    /// Wire name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::Chunk { .. } => "chunk",
            ChatEvent::AgentStart { .. } => "agentStart",
            ChatEvent::AgentComplete { .. } => "agentComplete",
            ChatEvent::Phase { .. } => "phase",
            ChatEvent::ConversationId { .. } => "conversationId",
            ChatEvent::Complete { .. } => "complete",
            ChatEvent::Error { .. } => "error",
        }
    }

    /// `complete` and `error` end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::Complete { .. } | ChatEvent::Error { .. })
    }

    pub fn chunk_text(&self) -> Option<&str> {
        match self {
            ChatEvent::Chunk { content, .. } => Some(content),
            _ => None,
        }
    }
}
