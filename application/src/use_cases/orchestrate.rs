//! Streaming orchestrator use case.
//!
//! Dispatches a [`ChatRequest`] to one of three response-production modes and
//! emits the resulting [`ChatEvent`] stream:
//!
//! - **normal**: one provider (preferred override or selector choice),
//!   streamed live or replayed word by word
//! - **mix**: a fixed provider list queried in order, each reply framed as a
//!   markdown block; failures become inline error blocks
//! - **a2a**: delegated to the [`DebateCoordinator`]
//!
//! Every call and every emission is awaited before the next begins, so a
//! sink observes one strictly ordered stream ending in exactly one
//! `complete` or `error`.

use crate::config::OrchestratorConfig;
use crate::ports::event_sink::EventSink;
use crate::ports::provider_adapter::ProviderRegistry;
use crate::ports::provider_settings::ProviderSettingsSource;
use crate::ports::session_publisher::SessionPublisher;
use crate::services::breaker_registry::CircuitBreakerRegistry;
use crate::services::selector::ProviderSelector;
use crate::use_cases::debate::{A2A_PROVIDER_TAG, CoordinatorError, DebateCoordinator};
use crate::use_cases::shared::{ProviderCaller, replay_typing};
use conclave_domain::util::truncate_str;
use conclave_domain::{
    ChatEvent, ChatMode, ChatRequest, IntentAnalyzer, MixFrame, Notice, ProviderCatalog,
    ProviderId,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Provider tag under which a mix result is stored.
pub const MIX_PROVIDER_TAG: &str = "mix";

/// Errors that can occur during orchestration.
///
/// The matching `error` event has already been emitted when one of these is
/// returned.
#[derive(Error, Debug)]
pub enum OrchestrateError {
    #[error("{provider} could not answer: {reason}")]
    ProviderFailed { provider: ProviderId, reason: String },

    #[error("No provider produced a response")]
    NoOutput,

    #[error("Debate failed: {0}")]
    Debate(#[from] CoordinatorError),
}

/// Final reply of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationOutcome {
    pub content: String,
    /// Provider id, `mix` or `a2a`.
    pub provider_tag: String,
}

/// Use case producing the event stream for one chat request.
pub struct StreamingOrchestrator {
    catalog: Arc<ProviderCatalog>,
    adapters: ProviderRegistry,
    settings: Arc<dyn ProviderSettingsSource>,
    breakers: Arc<CircuitBreakerRegistry>,
    selector: ProviderSelector,
    coordinator: DebateCoordinator,
    config: OrchestratorConfig,
}

impl StreamingOrchestrator {
    pub fn new(
        catalog: Arc<ProviderCatalog>,
        adapters: ProviderRegistry,
        settings: Arc<dyn ProviderSettingsSource>,
        breakers: Arc<CircuitBreakerRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        let selector = ProviderSelector::new(catalog.clone(), settings.clone(), breakers.clone())
            .with_adapters(adapters.clone());
        let coordinator = DebateCoordinator::new(
            catalog.clone(),
            adapters.clone(),
            breakers.clone(),
            config.debate.clone(),
        );
        Self {
            catalog,
            adapters,
            settings,
            breakers,
            selector,
            coordinator,
            config,
        }
    }

    /// Route a2a events to session channels of `publisher`.
    pub fn with_session_publisher(mut self, publisher: Arc<dyn SessionPublisher>) -> Self {
        self.coordinator = self.coordinator.with_publisher(publisher);
        self
    }

    /// Seed the selector's RNG for reproducible draws.
    pub fn with_selection_seed(mut self, seed: u64) -> Self {
        self.selector = ProviderSelector::new(
            self.catalog.clone(),
            self.settings.clone(),
            self.breakers.clone(),
        )
        .with_adapters(self.adapters.clone())
        .with_seed(seed);
        self
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Produce the reply to `request`, emitting its events to `sink`.
    pub async fn orchestrate(
        &self,
        request: &ChatRequest,
        sink: &dyn EventSink,
    ) -> Result<OrchestrationOutcome, OrchestrateError> {
        info!(
            "Orchestrating {} request: {}",
            request.mode,
            truncate_str(&request.prompt, 100)
        );

        match request.mode {
            ChatMode::Normal => self.run_normal(request, sink).await,
            ChatMode::Mix => self.run_mix(request, sink).await,
            ChatMode::A2a => self.run_a2a(request, sink).await,
        }
    }

    async fn run_normal(
        &self,
        request: &ChatRequest,
        sink: &dyn EventSink,
    ) -> Result<OrchestrationOutcome, OrchestrateError> {
        // a preferred provider is honoured only while it is eligible for selection
        let provider = match &request.preferred_provider {
            Some(preferred) if self.selector.accepts(preferred).await => preferred.clone(),
            Some(preferred) => {
                debug!("Preferred provider {} unavailable, selecting", preferred);
                self.select(request).await
            }
            None => self.select(request).await,
        };
        let name = self.catalog.display_name(&provider);
        info!("Normal mode answered by {}", provider);

        let caller = ProviderCaller::new(&self.adapters, &self.breakers);
        match caller
            .stream_to(
                &provider,
                &request.conversation(),
                sink,
                self.config.typing_delay,
            )
            .await
        {
            Ok(content) => {
                sink.emit(ChatEvent::Complete {
                    content: content.clone(),
                    provider: provider.to_string(),
                })
                .await;
                Ok(OrchestrationOutcome {
                    content,
                    provider_tag: provider.to_string(),
                })
            }
            Err(reason) => {
                let error = OrchestrateError::ProviderFailed {
                    provider,
                    reason: reason.describe(),
                };
                sink.emit(ChatEvent::error(format!(
                    "{name} could not answer: {}",
                    reason.describe()
                )))
                .await;
                Err(error)
            }
        }
    }

    async fn select(&self, request: &ChatRequest) -> ProviderId {
        let hint = IntentAnalyzer::analyze(&request.prompt);
        if let Some(category) = hint {
            debug!("Intent hint: {}", category);
        }
        self.selector.select_provider(hint).await
    }

    async fn run_mix(
        &self,
        request: &ChatRequest,
        sink: &dyn EventSink,
    ) -> Result<OrchestrationOutcome, OrchestrateError> {
        let messages = request.conversation();
        let caller = ProviderCaller::new(&self.adapters, &self.breakers);
        let mut aggregate = String::new();
        let mut answered = 0usize;

        for provider in &self.config.mix_providers {
            let name = self.catalog.display_name(provider);
            sink.emit(ChatEvent::AgentStart {
                provider: provider.clone(),
                provider_name: name.clone(),
                phase: None,
                round: None,
            })
            .await;

            let (body, success) = match caller.collect(provider, &messages).await {
                Ok(text) => (text, true),
                Err(reason) => {
                    warn!("Mix: {} failed: {}", provider, reason.describe());
                    (MixFrame::error_body(&name, &reason.describe()), false)
                }
            };
            if success {
                answered += 1;
            }

            sink.emit(ChatEvent::chunk(MixFrame::header(&name), Some(provider.clone())))
                .await;
            replay_typing(sink, &body, Some(provider), self.config.typing_delay).await;
            sink.emit(ChatEvent::chunk(MixFrame::footer(), Some(provider.clone())))
                .await;
            sink.emit(ChatEvent::AgentComplete {
                provider: provider.clone(),
                provider_name: name.clone(),
                phase: None,
                round: None,
                content: body.clone(),
                success,
            })
            .await;

            aggregate.push_str(&MixFrame::block(&name, &body));
        }

        if answered == 0 {
            warn!("Mix: no provider answered");
            sink.emit(ChatEvent::error(Notice::no_output())).await;
            return Err(OrchestrateError::NoOutput);
        }

        info!(
            "Mix complete: {}/{} providers answered",
            answered,
            self.config.mix_providers.len()
        );
        sink.emit(ChatEvent::Complete {
            content: aggregate.clone(),
            provider: MIX_PROVIDER_TAG.to_string(),
        })
        .await;
        Ok(OrchestrationOutcome {
            content: aggregate,
            provider_tag: MIX_PROVIDER_TAG.to_string(),
        })
    }

    async fn run_a2a(
        &self,
        request: &ChatRequest,
        sink: &dyn EventSink,
    ) -> Result<OrchestrationOutcome, OrchestrateError> {
        let mut history = request.conversation();
        history.pop();

        let content = self
            .coordinator
            .run(
                &request.prompt,
                &history,
                request.session_id.as_deref(),
                sink,
            )
            .await?;
        Ok(OrchestrationOutcome {
            content,
            provider_tag: A2A_PROVIDER_TAG.to_string(),
        })
    }
}
