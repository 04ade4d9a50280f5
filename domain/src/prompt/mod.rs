//! Prompt domain
//!
//! Templates for debate prompts, reply signatures, mix-mode framing and the
//! notices substituted for failed provider turns.

mod frame;
mod template;

pub use frame::{MixFrame, Notice};
pub use template::PromptTemplate;
