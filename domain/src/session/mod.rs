//! Provider conversation domain.
//!
//! - [`entities::Message`] — a single role-tagged chat message
//! - [`stream::StreamEvent`] — adapter-level streaming events

pub mod entities;
pub mod stream;
