//! Response-production mode for a chat request.
//!
//! - **Normal** (default): one provider answers
//! - **Mix**: a fixed list of providers answer in turn, aggregated into one reply
//! - **A2a**: the fixed-phase agent-to-agent debate

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Normal,
    Mix,
    A2a,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Normal => "normal",
            ChatMode::Mix => "mix",
            ChatMode::A2a => "a2a",
        }
    }

    /// Whether more than one provider contributes to the reply.
    pub fn is_multi_provider(&self) -> bool {
        !matches!(self, ChatMode::Normal)
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" | "single" => Ok(ChatMode::Normal),
            "mix" => Ok(ChatMode::Mix),
            "a2a" | "debate" => Ok(ChatMode::A2a),
            other => Err(DomainError::UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_normal() {
        assert_eq!(ChatMode::default(), ChatMode::Normal);
        assert!(!ChatMode::Normal.is_multi_provider());
        assert!(ChatMode::A2a.is_multi_provider());
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("mix".parse::<ChatMode>().unwrap(), ChatMode::Mix);
        assert_eq!("A2A".parse::<ChatMode>().unwrap(), ChatMode::A2a);
        assert_eq!("debate".parse::<ChatMode>().unwrap(), ChatMode::A2a);
        assert!("solo".parse::<ChatMode>().is_err());
        assert_eq!(ChatMode::A2a.to_string(), "a2a");
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&ChatMode::A2a).unwrap(), "\"a2a\"");
        let mode: ChatMode = serde_json::from_str("\"mix\"").unwrap();
        assert_eq!(mode, ChatMode::Mix);
    }
}
