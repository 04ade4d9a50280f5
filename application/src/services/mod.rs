//! Shared services used by the orchestration use cases.
//!
//! - [`breaker_registry::CircuitBreakerRegistry`] — per-provider breakers and guarded calls
//! - [`selector::ProviderSelector`] — weighted, intent-aware provider selection

pub mod breaker_registry;
pub mod selector;
