//! Shared utilities for use cases.
//!
//! Contains the breaker-guarded provider call used by every orchestration
//! mode, and the typing replay that turns a complete reply into word-sized
//! chunk events.

use crate::ports::event_sink::EventSink;
use crate::ports::provider_adapter::{
    GatewayError, ProviderAdapter, ProviderRegistry, STREAM_CLOSED,
};
use crate::services::breaker_registry::{CircuitBreakerRegistry, FallbackReason};
use conclave_domain::util::typing_chunks;
use conclave_domain::{ChatEvent, Message, ProviderId, StreamEvent};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Calls providers through their circuit breakers.
pub(crate) struct ProviderCaller<'a> {
    pub adapters: &'a ProviderRegistry,
    pub breakers: &'a CircuitBreakerRegistry,
}

impl<'a> ProviderCaller<'a> {
    pub fn new(adapters: &'a ProviderRegistry, breakers: &'a CircuitBreakerRegistry) -> Self {
        Self { adapters, breakers }
    }

    /// Full reply of `provider`, emitting nothing.
    ///
    /// An empty or whitespace-only reply counts as a failed call.
    pub async fn collect(
        &self,
        provider: &ProviderId,
        messages: &[Message],
    ) -> Result<String, FallbackReason> {
        let adapter = self.adapter(provider)?;
        self.breakers
            .execute(
                provider,
                || async {
                    let text = if adapter.supports_streaming() {
                        adapter.stream_chat(messages).await?.collect_text().await?
                    } else {
                        adapter
                            .chat(messages)
                            .await
                            .ok_or_else(|| GatewayError::EmptyResponse(provider.to_string()))?
                    };
                    usable(text, provider).map(Ok)
                },
                |reason| async move { Err(reason) },
            )
            .await
    }

    /// Reply of `provider`, forwarded to `sink` as chunk events while it is
    /// produced.
    ///
    /// Streaming adapters forward their deltas as they arrive. Other
    /// adapters are awaited in full and then replayed word by word with
    /// `typing_delay` between words. Either way the emitted chunks
    /// concatenate to the returned text.
    pub async fn stream_to(
        &self,
        provider: &ProviderId,
        messages: &[Message],
        sink: &dyn EventSink,
        typing_delay: Duration,
    ) -> Result<String, FallbackReason> {
        let adapter = self.adapter(provider)?;
        if !adapter.supports_streaming() {
            let text = self.collect(provider, messages).await?;
            replay_typing(sink, &text, Some(provider), typing_delay).await;
            return Ok(text);
        }

        // only waits on the provider are timed; time spent in the sink is not
        let wait = self.breakers.policy().call_timeout;
        self.breakers
            .execute_untimed(
                provider,
                || async {
                    let mut handle = within(wait, adapter.stream_chat(messages)).await??;
                    let mut text = String::new();
                    loop {
                        match within(wait, handle.receiver.recv()).await? {
                            Some(StreamEvent::Delta(delta)) => {
                                if delta.is_empty() {
                                    continue;
                                }
                                text.push_str(&delta);
                                sink.emit(ChatEvent::chunk(delta, Some(provider.clone())))
                                    .await;
                            }
                            Some(StreamEvent::Completed(full)) => {
                                // adapters that deliver everything in the terminal event
                                if text.is_empty() && !full.is_empty() {
                                    sink.emit(ChatEvent::chunk(full.clone(), Some(provider.clone())))
                                        .await;
                                    text = full;
                                }
                                break;
                            }
                            Some(StreamEvent::Error(e)) => {
                                return Err(GatewayError::StreamInterrupted(e));
                            }
                            None => {
                                return Err(GatewayError::StreamInterrupted(
                                    STREAM_CLOSED.to_string(),
                                ));
                            }
                        }
                    }
                    usable(text, provider).map(Ok)
                },
                |reason| async move { Err(reason) },
            )
            .await
    }

    fn adapter(&self, provider: &ProviderId) -> Result<Arc<dyn ProviderAdapter>, FallbackReason> {
        self.adapters
            .get(provider)
            .filter(|adapter| adapter.is_configured())
            .ok_or_else(|| {
                FallbackReason::Failed(GatewayError::ProviderUnavailable(provider.to_string()))
            })
    }
}

async fn within<F: Future>(limit: Duration, fut: F) -> Result<F::Output, GatewayError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| GatewayError::Timeout)
}

fn usable(text: String, provider: &ProviderId) -> Result<String, GatewayError> {
    if text.trim().is_empty() {
        Err(GatewayError::EmptyResponse(provider.to_string()))
    } else {
        Ok(text)
    }
}

/// Emit `text` as word-sized chunk events, pausing `delay` between words.
pub(crate) async fn replay_typing(
    sink: &dyn EventSink,
    text: &str,
    provider: Option<&ProviderId>,
    delay: Duration,
) {
    for (i, piece) in typing_chunks(text).into_iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        sink.emit(ChatEvent::chunk(piece, provider.cloned())).await;
    }
}
