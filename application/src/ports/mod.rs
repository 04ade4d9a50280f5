//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_store;
pub mod event_sink;
pub mod provider_adapter;
pub mod provider_settings;
pub mod session_publisher;
