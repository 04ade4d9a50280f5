//! Google Gemini generateContent adapter

use super::{HttpSettings, check_status, request_error};
use async_trait::async_trait;
use conclave_application::{GatewayError, ProviderAdapter};
use conclave_domain::{Message, ProviderId, Role, joined_system_prompt};
use serde_json::{Value, json};
use tracing::{debug, warn};

pub struct GeminiAdapter {
    settings: HttpSettings,
    client: reqwest::Client,
}

impl GeminiAdapter {
    pub fn new(settings: HttpSettings, client: reqwest::Client) -> Self {
        Self { settings, client }
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, GatewayError> {
        let key = self.settings.require_key()?;
        let body = request_body(messages, self.settings.max_tokens);
        debug!(model = %self.settings.model, "Calling {}", self.settings.id);

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.settings.base_url, self.settings.model
            ))
            .header("x-goog-api-key", key)
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
impl ProviderAdapter for GeminiAdapter {
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

fn request_body(messages: &[Message], max_tokens: u32) -> Value {
    let contents: Vec<Value> = messages
        .iter()
        .filter_map(|m| {
            let role = match m.role {
                Role::System => return None,
                Role::User => "user",
                Role::Assistant => "model",
            };
            Some(json!({ "role": role, "parts": [{ "text": m.content }] }))
        })
        .collect();
    let mut body = json!({
        "contents": contents,
        "generationConfig": { "maxOutputTokens": max_tokens },
    });
    if let Some(system) = joined_system_prompt(messages) {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

fn parse_response(body: &Value) -> Option<String> {
    let text: String = body["candidates"][0]["content"]["parts"]
        .as_array()?
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    (!text.trim().is_empty()).then_some(text)
}
