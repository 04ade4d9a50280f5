//! Orchestrator configuration.
//!
//! These are use-case parameters, not domain policy. The infrastructure
//! config loader builds them from the validated file configuration.

use conclave_domain::ProviderId;
use std::time::Duration;

/// Delay between replayed words when a non-streaming reply is typed out.
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(20);

/// Providers taking part in an a2a debate.
///
/// Exactly four debaters speak in every collaboration and debate round, in
/// array order. The synthesizer writes the final answer; the fallback gets
/// one attempt when the synthesizer fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateLineup {
    pub debaters: [ProviderId; 4],
    pub synthesizer: ProviderId,
    pub synthesis_fallback: ProviderId,
}

impl DebateLineup {
    pub fn new(
        debaters: [ProviderId; 4],
        synthesizer: ProviderId,
        synthesis_fallback: ProviderId,
    ) -> Self {
        Self {
            debaters,
            synthesizer,
            synthesis_fallback,
        }
    }

    /// Build from a slice, rejecting any count other than four.
    pub fn from_slice(
        debaters: &[ProviderId],
        synthesizer: ProviderId,
        synthesis_fallback: ProviderId,
    ) -> Option<Self> {
        let debaters: [ProviderId; 4] = debaters.to_vec().try_into().ok()?;
        Some(Self::new(debaters, synthesizer, synthesis_fallback))
    }

    /// Every provider the lineup references, debaters first.
    pub fn all(&self) -> impl Iterator<Item = &ProviderId> {
        self.debaters
            .iter()
            .chain([&self.synthesizer, &self.synthesis_fallback])
    }
}

/// Mode-level settings of the streaming orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause between replayed words for non-streaming providers.
    pub typing_delay: Duration,
    /// Ordered providers queried in mix mode.
    pub mix_providers: Vec<ProviderId>,
    pub debate: DebateLineup,
}

impl OrchestratorConfig {
    pub fn new(mix_providers: Vec<ProviderId>, debate: DebateLineup) -> Self {
        Self {
            typing_delay: DEFAULT_TYPING_DELAY,
            mix_providers,
            debate,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = delay;
        self
    }
}
