//! Domain layer for conclave
//!
//! This crate contains the core types and pure logic of the orchestration
//! core. It performs no I/O and has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! - **Provider**: one external LLM chat API with a weight and an active flag
//! - **Circuit Breaker**: per-provider failure isolation state machine
//! - **Intent**: advisory category derived from prompt keywords
//! - **Chat Mode**: normal (one provider), mix (sequential aggregation) or
//!   a2a (fixed-phase multi-agent debate)
//! - **Chat Event**: the ordered, tagged event stream emitted to callers

pub mod core;
pub mod intent;
pub mod orchestration;
pub mod prompt;
pub mod resilience;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    provider::{
        DEFAULT_WEIGHT, Provider, ProviderCatalog, ProviderId, ProviderProfile, is_valid_weight,
    },
};
pub use intent::{IntentAnalyzer, IntentCategory};
pub use orchestration::{
    entities::{DebateSession, DebateStage, Phase, TranscriptEntry},
    event::ChatEvent,
    mode::ChatMode,
    request::{ChatRequest, SessionId},
};
pub use prompt::{MixFrame, Notice, PromptTemplate};
pub use resilience::{Admission, CircuitBreaker, CircuitState};
pub use session::{
    entities::{Message, Role, joined_system_prompt},
    stream::StreamEvent,
};
