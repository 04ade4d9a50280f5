//! Presentation layer for conclave
//!
//! CLI definitions and encoders that turn the chat event stream into
//! terminal text or NDJSON.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, ModeArg, OutputFormat};
pub use output::console::ConsoleRenderer;
pub use output::formatter::{EventFormatter, JsonLinesFormatter};
