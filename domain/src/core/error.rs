//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid provider id: {0:?}")]
    InvalidProviderId(String),

    #[error("Invalid provider weight for {provider}: {weight}")]
    InvalidWeight { provider: String, weight: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("Unknown chat mode: {0}")]
    UnknownMode(String),

    #[error("Unknown intent category: {0}")]
    UnknownCategory(String),

    #[error("Debate transition from terminal stage")]
    DebateFinished,
}
