//! OpenAI-compatible chat-completions adapter
//!
//! Serves OpenAI itself and any vendor speaking the same wire format
//! (Perplexity, local gateways) through a configurable base URL.

use super::sse::{DONE_MARKER, SseDecoder};
use super::{HttpSettings, check_status, request_error};
use async_trait::async_trait;
use conclave_application::{GatewayError, ProviderAdapter, StreamHandle};
use conclave_domain::{Message, ProviderId, StreamEvent};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const STREAM_CHANNEL_CAPACITY: usize = 64;

pub struct OpenAiCompatibleAdapter {
    settings: HttpSettings,
    client: reqwest::Client,
}

impl OpenAiCompatibleAdapter {
    pub fn new(settings: HttpSettings, client: reqwest::Client) -> Self {
        Self { settings, client }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }

    async fn send(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response, GatewayError> {
        let key = self.settings.require_key()?;
        let body = request_body(&self.settings.model, messages, self.settings.max_tokens, stream);
        debug!(model = %self.settings.model, stream, "Calling {}", self.settings.id);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&self.settings.id, e))?;
        check_status(&self.settings.id, response).await
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, GatewayError> {
        let response = self.send(messages, false).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("{}: {}", self.settings.id, e)))?;
        parse_completion(&body).ok_or_else(|| GatewayError::EmptyResponse(self.settings.id.to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn id(&self) -> &ProviderId {
        &self.settings.id
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn chat(&self, messages: &[Message]) -> Option<String> {
        self.complete(messages)
            .await
            .inspect_err(|e| warn!("{} chat failed: {}", self.settings.id, e))
            .ok()
    }

    async fn stream_chat(&self, messages: &[Message]) -> Result<StreamHandle, GatewayError> {
        let response = self.send(messages, true).await?;
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let provider = self.settings.id.clone();
        tokio::spawn(pump_stream(provider, response, tx));
        Ok(StreamHandle::new(rx))
    }
}

/// Forward SSE deltas from `response` until `[DONE]`, an error or EOF.
async fn pump_stream(provider: ProviderId, response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut bytes = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut full = String::new();

    while let Some(chunk) = bytes.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("{} stream broke: {}", provider, e);
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return;
            }
        };
        for payload in decoder.push(&chunk) {
            match apply_payload(&payload, &mut full) {
                Step::Continue(None) => {}
                Step::Continue(Some(delta)) => {
                    if tx.send(StreamEvent::Delta(delta)).await.is_err() {
                        debug!("{} stream receiver dropped", provider);
                        return;
                    }
                }
                Step::Done => {
                    let _ = tx.send(StreamEvent::Completed(full)).await;
                    return;
                }
                Step::Failed(message) => {
                    warn!("{} stream error: {}", provider, message);
                    let _ = tx.send(StreamEvent::Error(message)).await;
                    return;
                }
            }
        }
    }

    if let Some(payload) = decoder.finish()
        && let Step::Continue(Some(delta)) = apply_payload(&payload, &mut full)
    {
        let _ = tx.send(StreamEvent::Delta(delta)).await;
    }
    let _ = tx.send(StreamEvent::Completed(full)).await;
}

#[derive(Debug, PartialEq)]
enum Step {
    Continue(Option<String>),
    Done,
    Failed(String),
}

/// Interpret one SSE payload, appending any delta text to `full`.
fn apply_payload(payload: &str, full: &mut String) -> Step {
    if payload.trim() == DONE_MARKER {
        return Step::Done;
    }
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!("Skipping unparseable stream payload: {}", e);
            return Step::Continue(None);
        }
    };
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Step::Failed(message);
    }
    match value["choices"][0]["delta"]["content"].as_str() {
        Some(delta) if !delta.is_empty() => {
            full.push_str(delta);
            Step::Continue(Some(delta.to_string()))
        }
        _ => Step::Continue(None),
    }
}

fn request_body(model: &str, messages: &[Message], max_tokens: u32, stream: bool) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();
    json!({
        "model": model,
        "messages": messages,
        "max_tokens": max_tokens,
        "stream": stream,
    })
}

fn parse_completion(body: &Value) -> Option<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}
