//! Chat request and session identifiers.

use crate::core::error::DomainError;
use crate::core::provider::ProviderId;
use crate::orchestration::mode::ChatMode;
use crate::session::entities::{Message, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_SESSION_ID_LEN: usize = 128;

/// Caller-supplied identifier scoping every event of one debate run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// 1–128 characters of `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SESSION_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(DomainError::InvalidSessionId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// A single chat request handed to the orchestrator
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Prior conversation, oldest first.
    pub messages: Vec<Message>,
    /// The raw user prompt, already screened by guardrails.
    pub prompt: String,
    pub mode: ChatMode,
    /// Skips selection in normal mode when the provider is known.
    pub preferred_provider: Option<ProviderId>,
    /// Required in a2a mode; validated by the debate coordinator.
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_history(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_preferred_provider(mut self, provider: ProviderId) -> Self {
        self.preferred_provider = Some(provider);
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// History followed by the prompt as the final user message.
    ///
    /// The prompt is not appended again when the history already ends with it.
    pub fn conversation(&self) -> Vec<Message> {
        let mut messages = self.messages.clone();
        let already_last = messages
            .last()
            .is_some_and(|m| m.role == Role::User && m.content == self.prompt);
        if !already_last {
            messages.push(Message::user(self.prompt.clone()));
        }
        messages
    }
}
