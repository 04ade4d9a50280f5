//! Console renderer for the chat event stream

use crate::output::formatter::EventFormatter;
use colored::Colorize;
use conclave_domain::ChatEvent;

/// Renders events as colored terminal text.
///
/// Chunks are written verbatim so streamed replies appear as they arrive;
/// structural events (phases, debate turns, completion) get their own lines.
pub struct ConsoleRenderer {
    at_line_start: bool,
    show_conversation: bool,
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self {
            at_line_start: true,
            show_conversation: true,
        }
    }

    /// Hide the `conversation <id>` banner.
    pub fn without_conversation_banner(mut self) -> Self {
        self.show_conversation = false;
        self
    }

    /// Newline needed to start a fresh line, if any.
    fn break_line(&self) -> &'static str {
        if self.at_line_start { "" } else { "\n" }
    }

    fn render(&self, event: &ChatEvent) -> Option<String> {
        match event {
            ChatEvent::ConversationId { conversation_id } => self
                .show_conversation
                .then(|| format!("{}\n", format!("conversation {}", conversation_id).dimmed())),
            ChatEvent::Phase { phase, round } => Some(format!(
                "{}\n{}\n{}\n",
                self.break_line(),
                format!("== {} · round {} ==", phase.display_name(), round)
                    .cyan()
                    .bold(),
                "-".repeat(40)
            )),
            // Mix turns carry their own header chunk
            ChatEvent::AgentStart {
                provider_name,
                phase: Some(_),
                ..
            } => Some(format!(
                "{}\n{}\n",
                self.break_line(),
                format!("── {} ──", provider_name).yellow().bold()
            )),
            ChatEvent::AgentStart { .. } => None,
            ChatEvent::Chunk { content, .. } => Some(content.clone()),
            ChatEvent::AgentComplete {
                provider_name,
                success,
                ..
            } => {
                if *success {
                    Some(self.break_line().to_string())
                } else {
                    Some(format!(
                        "{}{}\n",
                        self.break_line(),
                        format!("({} failed)", provider_name).red()
                    ))
                }
            }
            ChatEvent::Complete { provider, .. } => Some(format!(
                "{}\n{}\n",
                self.break_line(),
                format!("answered by {}", provider).dimmed()
            )),
            ChatEvent::Error { message } => Some(format!(
                "{}{} {}\n",
                self.break_line(),
                "Error:".red().bold(),
                message
            )),
        }
    }
}

impl EventFormatter for ConsoleRenderer {
    fn format(&mut self, event: &ChatEvent) -> Option<String> {
        let text = self.render(event).filter(|t| !t.is_empty())?;
        self.at_line_start = text.ends_with('\n');
        Some(text)
    }
}
