//! Intent analysis
//!
//! Maps raw prompt text to an advisory [`IntentCategory`] via keyword sets.
//! The analysis is pure: no I/O, deterministic, side-effect free. The hint
//! only biases provider selection; it never forces it.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Advisory category derived from prompt keywords.
///
/// Declaration order is the tie-break order when two categories score equally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentCategory {
    /// Programming, debugging, tooling
    Code,
    /// Up-to-date facts, sources, news
    Research,
    /// Stories, poems, marketing copy
    Creative,
    /// Reasoning, comparison, math
    Analysis,
}

impl IntentCategory {
    pub const ALL: [IntentCategory; 4] = [
        IntentCategory::Code,
        IntentCategory::Research,
        IntentCategory::Creative,
        IntentCategory::Analysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Code => "code",
            IntentCategory::Research => "research",
            IntentCategory::Creative => "creative",
            IntentCategory::Analysis => "analysis",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            IntentCategory::Code => &[
                "code", "coding", "function", "bug", "debug", "compile", "compiler", "error",
                "exception", "stacktrace", "rust", "python", "javascript", "typescript", "java",
                "sql", "api", "implement", "refactor", "regex", "script", "algorithm",
            ],
            IntentCategory::Research => &[
                "latest", "news", "today", "current", "recent", "search", "source", "sources",
                "cite", "citation", "price", "weather", "release", "announced", "2024", "2025",
            ],
            IntentCategory::Creative => &[
                "story", "poem", "poetry", "lyrics", "novel", "creative", "fiction", "slogan",
                "tagline", "character", "imagine", "brainstorm",
            ],
            IntentCategory::Analysis => &[
                "analyze", "analyse", "analysis", "compare", "comparison", "reason", "reasoning",
                "explain", "math", "proof", "prove", "logic", "evaluate", "tradeoff", "tradeoffs",
            ],
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "code" => Ok(IntentCategory::Code),
            "research" => Ok(IntentCategory::Research),
            "creative" => Ok(IntentCategory::Creative),
            "analysis" => Ok(IntentCategory::Analysis),
            other => Err(DomainError::UnknownCategory(other.to_string())),
        }
    }
}

/// Keyword-set intent analyzer
pub struct IntentAnalyzer;

impl IntentAnalyzer {
    /// Score each category by the number of distinct keywords present in the
    /// prompt and return the best one, or `None` when nothing matches.
    pub fn analyze(prompt: &str) -> Option<IntentCategory> {
        let lowered = prompt.to_lowercase();
        let words: HashSet<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut best: Option<(IntentCategory, usize)> = None;
        for category in IntentCategory::ALL {
            let score = category
                .keywords()
                .iter()
                .filter(|k| words.contains(*k))
                .count();
            // strict `>` keeps the earlier category on ties
            if score > 0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((category, score));
            }
        }
        best.map(|(category, _)| category)
    }
}
