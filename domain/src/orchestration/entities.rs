//! Debate domain entities
//!
//! The agent-to-agent debate runs a fixed stage sequence:
//!
//! ```text
//! Init → Collaboration R1 → Collaboration R2 → Debate R1 → Debate R2 → Synthesis → Done
//! ```
//!
//! [`DebateSession`] walks that sequence and accumulates the transcript of a
//! single run. It never outlives the run that created it.

use crate::core::error::DomainError;
use crate::core::provider::ProviderId;
use crate::orchestration::request::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a debate run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Debaters build on each other's answers
    Collaboration,
    /// Debaters critique the collaborative result
    Debate,
    /// One provider writes the final answer
    Synthesis,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Collaboration => "collaboration",
            Phase::Debate => "debate",
            Phase::Synthesis => "synthesis",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Collaboration => "Collaboration",
            Phase::Debate => "Debate",
            Phase::Synthesis => "Synthesis",
        }
    }

    /// Number of rounds the phase runs.
    pub fn rounds(&self) -> u8 {
        match self {
            Phase::Collaboration | Phase::Debate => 2,
            Phase::Synthesis => 1,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Position in the debate state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebateStage {
    Init,
    Collaboration1,
    Collaboration2,
    Debate1,
    Debate2,
    Synthesis,
    Done,
}

impl DebateStage {
    /// Next stage; `Done` is terminal.
    pub fn next(self) -> Result<DebateStage, DomainError> {
        Ok(match self {
            DebateStage::Init => DebateStage::Collaboration1,
            DebateStage::Collaboration1 => DebateStage::Collaboration2,
            DebateStage::Collaboration2 => DebateStage::Debate1,
            DebateStage::Debate1 => DebateStage::Debate2,
            DebateStage::Debate2 => DebateStage::Synthesis,
            DebateStage::Synthesis => DebateStage::Done,
            DebateStage::Done => return Err(DomainError::DebateFinished),
        })
    }

    pub fn phase(self) -> Option<Phase> {
        match self {
            DebateStage::Collaboration1 | DebateStage::Collaboration2 => Some(Phase::Collaboration),
            DebateStage::Debate1 | DebateStage::Debate2 => Some(Phase::Debate),
            DebateStage::Synthesis => Some(Phase::Synthesis),
            DebateStage::Init | DebateStage::Done => None,
        }
    }

    /// 1-based round within the phase.
    pub fn round(self) -> Option<u8> {
        match self {
            DebateStage::Collaboration1 | DebateStage::Debate1 | DebateStage::Synthesis => Some(1),
            DebateStage::Collaboration2 | DebateStage::Debate2 => Some(2),
            DebateStage::Init | DebateStage::Done => None,
        }
    }

    pub fn is_done(self) -> bool {
        self == DebateStage::Done
    }
}

/// One turn's contribution to the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub provider: ProviderId,
    pub provider_name: String,
    /// Verbatim reply, or the failure notice when the turn failed.
    pub content: String,
    pub phase: Phase,
    pub round: u8,
    pub success: bool,
}

/// State of one debate run (Entity)
#[derive(Debug, Clone)]
pub struct DebateSession {
    id: SessionId,
    stage: DebateStage,
    transcript: Vec<TranscriptEntry>,
}

impl DebateSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            stage: DebateStage::Init,
            transcript: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn stage(&self) -> DebateStage {
        self.stage
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.stage.phase()
    }

    pub fn current_round(&self) -> Option<u8> {
        self.stage.round()
    }

    /// Move to the next stage.
    pub fn advance(&mut self) -> Result<DebateStage, DomainError> {
        self.stage = self.stage.next()?;
        Ok(self.stage)
    }

    pub fn record(&mut self, entry: TranscriptEntry) {
        self.transcript.push(entry);
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// True once at least one turn produced real content.
    pub fn has_usable_output(&self) -> bool {
        self.transcript.iter().any(|e| e.success)
    }

    /// Transcript rendered as context for the next debater.
    pub fn render_for_prompt(&self) -> String {
        let mut out = String::new();
        for entry in &self.transcript {
            out.push_str(&format!(
                "[{} · Round {}] {}:\n{}\n\n",
                entry.phase.display_name(),
                entry.round,
                entry.provider_name,
                entry.content.trim_end()
            ));
        }
        out
    }

    /// Markdown transcript handed to persistence once the run completes.
    pub fn final_transcript(&self) -> String {
        let mut out = String::new();
        let mut current: Option<(Phase, u8)> = None;

        for entry in &self.transcript {
            if current != Some((entry.phase, entry.round)) {
                if entry.phase == Phase::Synthesis {
                    out.push_str("## Synthesis\n\n");
                } else {
                    out.push_str(&format!(
                        "## {} · Round {}\n\n",
                        entry.phase.display_name(),
                        entry.round
                    ));
                }
                current = Some((entry.phase, entry.round));
            }
            out.push_str(&format!(
                "### {}\n\n{}\n\n",
                entry.provider_name,
                entry.content.trim_end()
            ));
        }
        out.trim_end().to_string()
    }
}
