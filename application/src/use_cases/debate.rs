//! A2A debate use case.
//!
//! Runs the fixed-phase multi-agent protocol:
//!
//! | Phase         | Rounds | Speakers                          |
//! |---------------|--------|-----------------------------------|
//! | Collaboration | 2      | the 4 debaters, in lineup order   |
//! | Debate        | 2      | the 4 debaters, in lineup order   |
//! | Synthesis     | 1      | synthesizer, then fallback once   |
//!
//! That is 17 primary turns plus at most one fallback synthesis turn. Turns
//! are strictly sequential; each speaker sees the whole transcript so far.
//!
//! Provider failures are recoverable: the failing turn keeps its slot and a
//! notice replaces its content. Only coordinator-level problems (missing or
//! invalid session id, unbound session) abort the run, after exactly one
//! `error` event.

use crate::config::DebateLineup;
use crate::ports::event_sink::EventSink;
use crate::ports::provider_adapter::ProviderRegistry;
use crate::ports::session_publisher::SessionPublisher;
use crate::services::breaker_registry::CircuitBreakerRegistry;
use crate::use_cases::shared::ProviderCaller;
use async_trait::async_trait;
use conclave_domain::util::truncate_str;
use conclave_domain::{
    ChatEvent, DebateSession, DomainError, Message, Notice, Phase, PromptTemplate, ProviderCatalog,
    ProviderId, SessionId, TranscriptEntry,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Provider tag under which a debate result is stored.
pub const A2A_PROVIDER_TAG: &str = "a2a";

/// Errors that end a debate run before it completes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("A debate requires a session id")]
    MissingSessionId,

    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("Session {0} is not bound to a channel")]
    UnboundSession(String),

    #[error("No provider produced a response")]
    NoOutput,

    #[error("Debate state error: {0}")]
    State(#[from] DomainError),
}

/// Sends every event to the caller's sink and the session's channel.
struct SessionSink<'a> {
    caller: &'a dyn EventSink,
    session: Option<Arc<dyn EventSink>>,
}

#[async_trait]
impl EventSink for SessionSink<'_> {
    async fn emit(&self, event: ChatEvent) {
        if let Some(session) = &self.session {
            session.emit(event.clone()).await;
        }
        self.caller.emit(event).await;
    }
}

/// One speaking slot of the debate.
struct Turn<'a> {
    provider: &'a ProviderId,
    phase: Phase,
    round: u8,
    messages: Vec<Message>,
    /// Content recorded when the provider fails.
    failure_notice: String,
}

/// Coordinates one a2a debate per call to [`run`](Self::run).
pub struct DebateCoordinator {
    catalog: Arc<ProviderCatalog>,
    adapters: ProviderRegistry,
    breakers: Arc<CircuitBreakerRegistry>,
    lineup: DebateLineup,
    publisher: Option<Arc<dyn SessionPublisher>>,
}

impl DebateCoordinator {
    pub fn new(
        catalog: Arc<ProviderCatalog>,
        adapters: ProviderRegistry,
        breakers: Arc<CircuitBreakerRegistry>,
        lineup: DebateLineup,
    ) -> Self {
        Self {
            catalog,
            adapters,
            breakers,
            lineup,
            publisher: None,
        }
    }

    /// Require runs to be bound to a session channel of `publisher`.
    pub fn with_publisher(mut self, publisher: Arc<dyn SessionPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn lineup(&self) -> &DebateLineup {
        &self.lineup
    }

    /// Run a full debate on `question`.
    ///
    /// `history` is the prior conversation without the question itself. On
    /// success the final transcript has been emitted as `complete` and is
    /// returned; on error exactly one `error` event has been emitted.
    pub async fn run(
        &self,
        question: &str,
        history: &[Message],
        session_id: Option<&str>,
        sink: &dyn EventSink,
    ) -> Result<String, CoordinatorError> {
        let (session_id, channel) = match self.bind(session_id) {
            Ok(bound) => bound,
            Err(e) => {
                warn!("Debate rejected: {}", e);
                sink.emit(ChatEvent::error(e.to_string())).await;
                return Err(e);
            }
        };
        let sink = SessionSink {
            caller: sink,
            session: channel,
        };

        info!(
            "Starting debate {}: {}",
            session_id,
            truncate_str(question, 100)
        );

        let mut session = DebateSession::new(session_id);
        loop {
            let stage = session.advance()?;
            let (Some(phase), Some(round)) = (stage.phase(), stage.round()) else {
                break;
            };

            info!("Debate {}: {} round {}", session.id(), phase, round);
            sink.emit(ChatEvent::Phase { phase, round }).await;

            if phase == Phase::Synthesis {
                self.run_synthesis(&mut session, question, history, &sink)
                    .await;
            } else {
                for provider in &self.lineup.debaters {
                    let turn = self.debater_turn(&session, provider, phase, round, question, history);
                    self.run_turn(&mut session, turn, &sink).await;
                }
            }
        }

        if !session.has_usable_output() {
            warn!("Debate {} produced no usable output", session.id());
            sink.emit(ChatEvent::error(Notice::no_output())).await;
            return Err(CoordinatorError::NoOutput);
        }

        let content = session.final_transcript();
        info!(
            "Debate {} complete ({} turns)",
            session.id(),
            session.transcript().len()
        );
        sink.emit(ChatEvent::Complete {
            content: content.clone(),
            provider: A2A_PROVIDER_TAG.to_string(),
        })
        .await;
        Ok(content)
    }

    /// Validate the session id and resolve its channel.
    fn bind(
        &self,
        session_id: Option<&str>,
    ) -> Result<(SessionId, Option<Arc<dyn EventSink>>), CoordinatorError> {
        let raw = session_id.ok_or(CoordinatorError::MissingSessionId)?;
        let id = SessionId::parse(raw)
            .map_err(|_| CoordinatorError::InvalidSessionId(raw.to_string()))?;

        let channel = match &self.publisher {
            Some(publisher) => Some(
                publisher
                    .sink_for(&id)
                    .ok_or_else(|| CoordinatorError::UnboundSession(id.to_string()))?,
            ),
            None => None,
        };
        Ok((id, channel))
    }

    fn debater_turn<'a>(
        &self,
        session: &DebateSession,
        provider: &'a ProviderId,
        phase: Phase,
        round: u8,
        question: &str,
        history: &[Message],
    ) -> Turn<'a> {
        let name = self.catalog.display_name(provider);
        let system = match phase {
            Phase::Debate => PromptTemplate::debate_system(&name, round),
            _ => PromptTemplate::collaboration_system(&name, round),
        };
        let prompt = PromptTemplate::turn_prompt(question, &session.render_for_prompt());
        Turn {
            provider,
            phase,
            round,
            messages: turn_messages(system, history, prompt),
            failure_notice: Notice::turn_failed(&name),
        }
    }

    async fn run_synthesis(
        &self,
        session: &mut DebateSession,
        question: &str,
        history: &[Message],
        sink: &dyn EventSink,
    ) {
        let prompt = PromptTemplate::synthesis_prompt(question, &session.render_for_prompt());
        let messages = turn_messages(
            PromptTemplate::synthesis_system().to_string(),
            history,
            prompt,
        );

        let primary = &self.lineup.synthesizer;
        let turn = Turn {
            provider: primary,
            phase: Phase::Synthesis,
            round: 1,
            messages: messages.clone(),
            failure_notice: Notice::turn_failed(&self.catalog.display_name(primary)),
        };
        if self.run_turn(session, turn, sink).await {
            return;
        }

        let fallback = &self.lineup.synthesis_fallback;
        info!(
            "Synthesis by {} failed, retrying with {}",
            primary, fallback
        );
        let turn = Turn {
            provider: fallback,
            phase: Phase::Synthesis,
            round: 1,
            messages,
            failure_notice: Notice::synthesis_failed().to_string(),
        };
        self.run_turn(session, turn, sink).await;
    }

    /// Run one turn and record it. Returns whether the provider answered.
    async fn run_turn(&self, session: &mut DebateSession, turn: Turn<'_>, sink: &dyn EventSink) -> bool {
        let provider = turn.provider;
        let name = self.catalog.display_name(provider);

        sink.emit(ChatEvent::AgentStart {
            provider: provider.clone(),
            provider_name: name.clone(),
            phase: Some(turn.phase),
            round: Some(turn.round),
        })
        .await;

        let caller = ProviderCaller::new(&self.adapters, &self.breakers);
        let (content, success) = match caller.collect(provider, &turn.messages).await {
            Ok(text) => (PromptTemplate::ensure_signature(&text, &name), true),
            Err(reason) => {
                warn!(
                    "{} turn by {} failed: {}",
                    turn.phase,
                    provider,
                    reason.describe()
                );
                (turn.failure_notice, false)
            }
        };
        debug!(
            "{} round {} turn by {}: {} bytes",
            turn.phase,
            turn.round,
            provider,
            content.len()
        );

        sink.emit(ChatEvent::chunk(content.clone(), Some(provider.clone())))
            .await;
        sink.emit(ChatEvent::AgentComplete {
            provider: provider.clone(),
            provider_name: name.clone(),
            phase: Some(turn.phase),
            round: Some(turn.round),
            content: content.clone(),
            success,
        })
        .await;

        session.record(TranscriptEntry {
            provider: provider.clone(),
            provider_name: name,
            content,
            phase: turn.phase,
            round: turn.round,
            success,
        });
        success
    }
}

/// System prompt, then the prior conversation, then the turn prompt.
fn turn_messages(system: String, history: &[Message], prompt: String) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system));
    messages.extend(history.iter().filter(|m| !m.is_system()).cloned());
    messages.push(Message::user(prompt));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::event_sink::RecordingSink;
    use crate::ports::provider_adapter::ProviderAdapter;
    use crate::services::breaker_registry::BreakerPolicy;
    use crate::use_cases::test_support::{MockAdapter, id};
    use conclave_domain::{ProviderProfile, Role};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const DEBATERS: [&str; 4] = ["openai", "claude", "gemini", "perplexity"];

    fn catalog() -> Arc<ProviderCatalog> {
        Arc::new(ProviderCatalog::new(
            vec![
                ProviderProfile::new(id("openai"), "GPT"),
                ProviderProfile::new(id("claude"), "Claude"),
                ProviderProfile::new(id("gemini"), "Gemini"),
                ProviderProfile::new(id("perplexity"), "Perplexity"),
            ],
            id("openai"),
        ))
    }

    fn lineup() -> DebateLineup {
        DebateLineup::new(DEBATERS.map(id), id("claude"), id("openai"))
    }

    struct Fixture {
        adapters: HashMap<&'static str, Arc<MockAdapter>>,
        coordinator: DebateCoordinator,
    }

    fn fixture(overrides: Vec<(&'static str, MockAdapter)>) -> Fixture {
        let mut adapters: HashMap<&'static str, Arc<MockAdapter>> = DEBATERS
            .iter()
            .map(|p| (*p, Arc::new(MockAdapter::echo(p))))
            .collect();
        for (name, adapter) in overrides {
            adapters.insert(name, Arc::new(adapter));
        }
        let mut registry = ProviderRegistry::new();
        for adapter in adapters.values() {
            registry.register(adapter.clone());
        }
        let coordinator = DebateCoordinator::new(
            catalog(),
            registry,
            Arc::new(CircuitBreakerRegistry::new(BreakerPolicy::default())),
            lineup(),
        );
        Fixture {
            adapters,
            coordinator,
        }
    }

    fn turn_starts(events: &[ChatEvent]) -> Vec<(String, Phase, u8)> {
        events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::AgentStart {
                    provider,
                    phase: Some(phase),
                    round: Some(round),
                    ..
                } => Some((provider.to_string(), *phase, *round)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn full_run_has_seventeen_turns_in_fixed_order() {
        let f = fixture(vec![]);
        let sink = RecordingSink::new();

        let content = f
            .coordinator
            .run("What is Rust?", &[], Some("session-1"), &sink)
            .await
            .unwrap();

        let events = sink.events();
        let mut expected = Vec::new();
        for (phase, round) in [
            (Phase::Collaboration, 1),
            (Phase::Collaboration, 2),
            (Phase::Debate, 1),
            (Phase::Debate, 2),
        ] {
            for p in DEBATERS {
                expected.push((p.to_string(), phase, round));
            }
        }
        expected.push(("claude".to_string(), Phase::Synthesis, 1));
        assert_eq!(turn_starts(&events), expected);

        let phases: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::Phase { phase, round } => Some((*phase, *round)),
                _ => None,
            })
            .collect();
        assert_eq!(phases.len(), 5);

        let terminals: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
        assert_eq!(terminals.len(), 1);
        assert!(matches!(
            events.last(),
            Some(ChatEvent::Complete { provider, .. }) if provider == A2A_PROVIDER_TAG
        ));
        assert!(content.starts_with("## Collaboration · Round 1"));
        assert!(content.contains("## Synthesis"));

        // 4 rounds of 4 debaters plus one synthesis call
        assert_eq!(f.adapters["openai"].calls(), 4);
        assert_eq!(f.adapters["claude"].calls(), 5);
    }

    #[tokio::test]
    async fn every_turn_is_start_chunk_complete() {
        let f = fixture(vec![]);
        let sink = RecordingSink::new();
        f.coordinator.run("q", &[], Some("s"), &sink).await.unwrap();

        let kinds: Vec<&str> = sink
            .events()
            .iter()
            .map(|e| e.kind())
            .filter(|k| *k != "phase")
            .collect();
        let turns = &kinds[..kinds.len() - 1];
        assert_eq!(turns.len(), 17 * 3);
        for triple in turns.chunks(3) {
            assert_eq!(triple, ["agentStart", "chunk", "agentComplete"]);
        }
    }

    #[tokio::test]
    async fn replies_are_signed() {
        let f = fixture(vec![(
            "gemini",
            MockAdapter::replying("gemini", &["Already signed\n\n— Gemini"]),
        )]);
        let sink = RecordingSink::new();
        f.coordinator.run("q", &[], Some("s"), &sink).await.unwrap();

        for event in sink.events() {
            if let ChatEvent::AgentComplete {
                content,
                provider_name,
                success: true,
                ..
            } = event
            {
                let signature = format!("— {provider_name}");
                assert!(content.ends_with(&signature), "{content}");
                assert_eq!(content.matches(&signature).count(), 1);
            }
        }
    }

    #[tokio::test]
    async fn later_turns_see_the_transcript() {
        let f = fixture(vec![]);
        let sink = RecordingSink::new();
        let history = vec![Message::user("earlier"), Message::assistant("reply")];
        f.coordinator
            .run("the question", &history, Some("s"), &sink)
            .await
            .unwrap();

        let seen = f.adapters["openai"].seen();
        let first = &seen[0];
        assert_eq!(first[0].role, Role::System);
        assert_eq!(first[1], Message::user("earlier"));
        assert!(first.last().unwrap().content.contains("You are the first to answer"));

        let second = &seen[1];
        let prompt = &second.last().unwrap().content;
        assert!(prompt.contains("[Collaboration · Round 1] Perplexity:"));
        assert!(prompt.contains("the question"));
    }

    #[tokio::test]
    async fn failing_provider_keeps_its_slots() {
        let f = fixture(vec![("gemini", MockAdapter::failing("gemini"))]);
        let sink = RecordingSink::new();
        f.coordinator.run("q", &[], Some("s"), &sink).await.unwrap();

        let events = sink.events();
        assert_eq!(turn_starts(&events).len(), 17);

        let gemini_turns: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::AgentComplete {
                    provider,
                    content,
                    success,
                    ..
                } if provider.as_str() == "gemini" => Some((content.clone(), *success)),
                _ => None,
            })
            .collect();
        assert_eq!(gemini_turns.len(), 4);
        for (content, success) in gemini_turns {
            assert!(!success);
            assert_eq!(content, Notice::turn_failed("Gemini"));
        }
        assert!(matches!(events.last(), Some(ChatEvent::Complete { .. })));
        // breaker opens after three failures; the fourth turn is short-circuited
        assert_eq!(f.adapters["gemini"].calls(), 3);
    }

    fn coordinator_with(adapters: Vec<Arc<dyn ProviderAdapter>>) -> DebateCoordinator {
        let mut registry = ProviderRegistry::new();
        for adapter in adapters {
            registry.register(adapter);
        }
        DebateCoordinator::new(
            catalog(),
            registry,
            Arc::new(CircuitBreakerRegistry::default()),
            lineup(),
        )
    }

    #[tokio::test]
    async fn synthesis_falls_back_once() {
        let coordinator = coordinator_with(vec![
            Arc::new(MockAdapter::echo("openai")),
            Arc::new(MockAdapter::echo("gemini")),
            Arc::new(MockAdapter::echo("perplexity")),
            // four debate turns, then the synthesis call fails
            Arc::new(ScriptedThenFail::new("claude", 4)),
        ]);
        let sink = RecordingSink::new();
        coordinator.run("q", &[], Some("s"), &sink).await.unwrap();

        let starts = turn_starts(&sink.events());
        assert_eq!(starts.len(), 18);
        assert_eq!(starts[16], ("claude".to_string(), Phase::Synthesis, 1));
        assert_eq!(starts[17], ("openai".to_string(), Phase::Synthesis, 1));
    }

    #[tokio::test]
    async fn both_synthesizers_failing_emits_notice_and_completes() {
        let coordinator = coordinator_with(vec![
            Arc::new(ScriptedThenFail::new("openai", 4)),
            Arc::new(MockAdapter::echo("gemini")),
            Arc::new(MockAdapter::echo("perplexity")),
            Arc::new(ScriptedThenFail::new("claude", 4)),
        ]);

        let sink = RecordingSink::new();
        let content = coordinator.run("q", &[], Some("s"), &sink).await.unwrap();
        assert!(content.ends_with(Notice::synthesis_failed()));
        assert!(matches!(sink.events().last(), Some(ChatEvent::Complete { .. })));
    }

    #[tokio::test]
    async fn all_failing_ends_with_error() {
        let f = fixture(
            DEBATERS
                .iter()
                .map(|p| (*p, MockAdapter::failing(p)))
                .collect(),
        );
        let sink = RecordingSink::new();
        let result = f.coordinator.run("q", &[], Some("s"), &sink).await;
        assert_eq!(result, Err(CoordinatorError::NoOutput));
        let events = sink.events();
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(matches!(events.last(), Some(ChatEvent::Error { .. })));
    }

    #[tokio::test]
    async fn missing_or_invalid_session_is_fatal() {
        let f = fixture(vec![]);

        let sink = RecordingSink::new();
        let result = f.coordinator.run("q", &[], None, &sink).await;
        assert_eq!(result, Err(CoordinatorError::MissingSessionId));
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].kind(), "error");

        let sink = RecordingSink::new();
        let result = f.coordinator.run("q", &[], Some("bad id!"), &sink).await;
        assert!(matches!(result, Err(CoordinatorError::InvalidSessionId(_))));
        assert_eq!(sink.events().len(), 1);
        assert_eq!(f.adapters["openai"].calls(), 0);
    }

    struct OneSession {
        id: SessionId,
        sink: Arc<RecordingSink>,
    }

    impl SessionPublisher for OneSession {
        fn sink_for(&self, session: &SessionId) -> Option<Arc<dyn EventSink>> {
            (session == &self.id).then(|| self.sink.clone() as Arc<dyn EventSink>)
        }
    }

    #[tokio::test]
    async fn unbound_session_is_fatal() {
        let f = fixture(vec![]);
        let publisher = Arc::new(OneSession {
            id: SessionId::parse("bound").unwrap(),
            sink: Arc::new(RecordingSink::new()),
        });
        let coordinator = f.coordinator.with_publisher(publisher.clone());

        let sink = RecordingSink::new();
        let result = coordinator.run("q", &[], Some("other"), &sink).await;
        assert_eq!(
            result,
            Err(CoordinatorError::UnboundSession("other".to_string()))
        );
        assert_eq!(sink.events().len(), 1);
        assert!(publisher.sink.events().is_empty());
    }

    #[tokio::test]
    async fn bound_session_receives_every_event() {
        let f = fixture(vec![]);
        let publisher = Arc::new(OneSession {
            id: SessionId::parse("bound").unwrap(),
            sink: Arc::new(RecordingSink::new()),
        });
        let coordinator = f.coordinator.with_publisher(publisher.clone());

        let sink = RecordingSink::new();
        coordinator.run("q", &[], Some("bound"), &sink).await.unwrap();
        assert_eq!(publisher.sink.events(), sink.events());
    }

    /// Answers `n` times, then yields nothing.
    struct ScriptedThenFail {
        inner: MockAdapter,
        answers: usize,
        calls: Mutex<usize>,
    }

    impl ScriptedThenFail {
        fn new(provider: &str, answers: usize) -> Self {
            Self {
                inner: MockAdapter::echo(provider),
                answers,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedThenFail {
        fn id(&self) -> &ProviderId {
            self.inner.id()
        }

        async fn chat(&self, messages: &[Message]) -> Option<String> {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if n > self.answers {
                None
            } else {
                self.inner.chat(messages).await
            }
        }
    }
}
