//! Orchestration domain
//!
//! Request/response vocabulary shared by all three response-production modes
//! and the debate state machine.

pub mod entities;
pub mod event;
pub mod mode;
pub mod request;
