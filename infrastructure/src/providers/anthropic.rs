//! Anthropic messages API adapter

use super::{HttpSettings, check_status, request_error};
use async_trait::async_trait;
use conclave_application::{GatewayError, ProviderAdapter};
use conclave_domain::{Message, ProviderId, Role, joined_system_prompt};
use serde_json::{Value, json};
use tracing::{debug, warn};

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    settings: HttpSettings,
    client: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(settings: HttpSettings, client: reqwest::Client) -> Self {
        Self { settings, client }
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, GatewayError> {
        let key = self.settings.require_key()?;
        let body = request_body(&self.settings.model, messages, self.settings.max_tokens);
        debug!(model = %self.settings.model, "Calling {}", self.settings.id);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.settings.base_url))
            .header("x-api-key", key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&self.settings.id, e))?;
        let response = check_status(&self.settings.id, response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("{}: {}", self.settings.id, e)))?;
        parse_response(&body).ok_or_else(|| GatewayError::EmptyResponse(self.settings.id.to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn id(&self) -> &ProviderId {
        &self.settings.id
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
}

/// System messages move to the top-level `system` field.
fn request_body(model: &str, messages: &[Message], max_tokens: u32) -> Value {
    let turns: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();
    let mut body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": turns,
    });
    if let Some(system) = joined_system_prompt(messages) {
        body["system"] = Value::String(system);
    }
    body
}

/// Concatenate every text block of the response.
fn parse_response(body: &Value) -> Option<String> {
    let text: String = body["content"]
        .as_array()?
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect();
    (!text.trim().is_empty()).then_some(text)
}
