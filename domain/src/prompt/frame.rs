//! Mix-mode block framing and failure notices.

/// Markdown framing of one provider's block in a mix-mode reply.
///
/// A block is `header + body + footer`; the aggregate reply is the ordered
/// concatenation of all blocks.
pub struct MixFrame;

impl MixFrame {
    pub fn header(provider_name: &str) -> String {
        format!("### {provider_name}\n\n")
    }

    pub fn footer() -> &'static str {
        "\n\n---\n\n"
    }

    /// Body placed in a block whose provider failed.
    pub fn error_body(provider_name: &str, reason: &str) -> String {
        format!("> ⚠️ {provider_name} could not answer: {reason}")
    }

    pub fn block(provider_name: &str, body: &str) -> String {
        format!("{}{}{}", Self::header(provider_name), body, Self::footer())
    }
}

/// User-facing notices substituted for missing provider output.
pub struct Notice;

impl Notice {
    /// Transcript entry for a debate turn that produced nothing.
    pub fn turn_failed(provider_name: &str) -> String {
        format!("⚠️ {provider_name} could not respond in this round.")
    }

    /// Emitted when both synthesis providers failed.
    pub fn synthesis_failed() -> &'static str {
        "⚠️ The final synthesis could not be generated. The discussion above is the best available answer."
    }

    /// Terminal error when no provider produced anything usable.
    pub fn no_output() -> &'static str {
        "No provider produced a response. Please try again later."
    }
}
