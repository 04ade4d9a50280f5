//! Application-level configuration.
//!
//! - [`OrchestratorConfig`] — mode-level settings of the streaming orchestrator
//! - [`DebateLineup`] — the fixed cast of an a2a debate

pub mod orchestrator;

pub use orchestrator::{DEFAULT_TYPING_DELAY, DebateLineup, OrchestratorConfig};
