//! Prompt templates for the debate flow

/// Templates for generating prompts at each debate phase
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for a collaboration-round turn
    pub fn collaboration_system(provider_name: &str, round: u8) -> String {
        let focus = if round <= 1 {
            "Give your own answer to the question. Where earlier participants already answered, build on their points instead of repeating them."
        } else {
            "Refine the group's answer. Fill gaps, correct mistakes and merge overlapping points into a stronger shared answer."
        };
        format!(
            r#"You are {provider_name}, one of several AI assistants collaborating on a user's question.
This is collaboration round {round}.
{focus}
Be concise and concrete.
End your reply with the signature line: {signature}"#,
            signature = Self::signature(provider_name),
        )
    }

    /// System prompt for a debate-round turn
    pub fn debate_system(provider_name: &str, round: u8) -> String {
        let focus = if round <= 1 {
            "Critically examine the answers so far. Point out weak arguments, factual errors and missing perspectives, and defend positions you believe are correct."
        } else {
            "Respond to the critiques raised in the previous round. Concede points that were refuted and state which positions survive scrutiny."
        };
        format!(
            r#"You are {provider_name}, one of several AI assistants debating a user's question.
This is debate round {round}.
{focus}
Be direct but fair.
End your reply with the signature line: {signature}"#,
            signature = Self::signature(provider_name),
        )
    }

    /// System prompt for the synthesis turn
    pub fn synthesis_system() -> &'static str {
        r#"You are the moderator of a discussion between several AI assistants.
Your task is to:
1. Identify where the participants agreed
2. Weigh the disagreements and decide which positions are better supported
3. Write one final answer for the user that keeps the strongest points

Answer the user directly; do not narrate the discussion."#
    }

    /// User prompt for a debater's turn
    pub fn turn_prompt(question: &str, transcript: &str) -> String {
        if transcript.trim().is_empty() {
            return format!(
                r#"Question from the user:

{question}

You are the first to answer."#
            );
        }
        format!(
            r#"Question from the user:

{question}

Discussion so far:

{transcript}
Continue the discussion."#
        )
    }

    /// User prompt for the synthesis turn
    pub fn synthesis_prompt(question: &str, transcript: &str) -> String {
        format!(
            r#"Question from the user:

{question}

Full discussion transcript:

{transcript}
Write the final answer."#
        )
    }

    /// Signature line every debate reply ends with
    pub fn signature(provider_name: &str) -> String {
        format!("— {provider_name}")
    }

    /// Append the signature when the reply does not already end with it
    /// (trailing whitespace aside). The reply itself is kept verbatim.
    pub fn ensure_signature(content: &str, provider_name: &str) -> String {
        let signature = Self::signature(provider_name);
        if content.trim_end().ends_with(&signature) {
            content.to_string()
        } else {
            format!("{content}\n\n{signature}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_prompts_name_the_provider() {
        let collab = PromptTemplate::collaboration_system("Claude", 1);
        assert!(collab.contains("You are Claude"));
        assert!(collab.contains("collaboration round 1"));
        assert!(collab.contains("— Claude"));

        let debate = PromptTemplate::debate_system("Gemini", 2);
        assert!(debate.contains("debate round 2"));
        assert!(debate.contains("— Gemini"));
        assert_ne!(
            PromptTemplate::debate_system("Gemini", 1),
            PromptTemplate::debate_system("Gemini", 2)
        );
    }

    #[test]
    fn test_turn_prompt_includes_transcript() {
        let first = PromptTemplate::turn_prompt("What is Rust?", "");
        assert!(first.contains("first to answer"));

        let later = PromptTemplate::turn_prompt("What is Rust?", "[Collaboration · Round 1] A:\nx\n\n");
        assert!(later.contains("Discussion so far"));
        assert!(later.contains("Round 1] A"));
    }

    #[test]
    fn test_ensure_signature() {
        assert_eq!(
            PromptTemplate::ensure_signature("Answer.\n\n— Claude\n", "Claude"),
            "Answer.\n\n— Claude\n"
        );
        assert_eq!(
            PromptTemplate::ensure_signature("Answer.", "Claude"),
            "Answer.\n\n— Claude"
        );
    }

    #[test]
    fn test_ensure_signature_keeps_reply_verbatim() {
        let reply = "```\ncode\n```  \n";
        assert_eq!(
            PromptTemplate::ensure_signature(reply, "Gemini"),
            "```\ncode\n```  \n\n\n— Gemini"
        );
        let signed = "Done.\n\n— Gemini \n\n";
        assert_eq!(PromptTemplate::ensure_signature(signed, "Gemini"), signed);
    }

    #[test]
    fn test_synthesis_prompt() {
        let prompt = PromptTemplate::synthesis_prompt("Q?", "transcript body\n");
        assert!(prompt.contains("Q?"));
        assert!(prompt.contains("transcript body"));
        assert!(PromptTemplate::synthesis_system().contains("moderator"));
    }
}
