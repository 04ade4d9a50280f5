//! HTTP provider adapters
//!
//! One adapter per vendor wire format, all implementing the application's
//! [`ProviderAdapter`] port:
//!
//! - [`OpenAiCompatibleAdapter`]: chat-completions API (OpenAI, Perplexity, ...) with SSE streaming
//! - [`AnthropicAdapter`]: messages API, system prompt in the top-level `system` field
//! - [`GeminiAdapter`]: generateContent API, system prompt as `systemInstruction`

pub mod anthropic;
pub mod gemini;
pub mod openai;
mod sse;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiCompatibleAdapter;

use crate::config::{ConfigValidationError, FileConfig, FileProviderConfig};
use conclave_application::{GatewayError, ProviderAdapter, ProviderRegistry};
use conclave_domain::ProviderId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default response budget when a provider sets no `max_tokens`.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Shared HTTP client for every adapter, bounded by the per-call timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("conclave/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Wire format of a provider's API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

/// Connection settings shared by every HTTP adapter
#[derive(Clone)]
pub struct HttpSettings {
    pub id: ProviderId,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
}

impl HttpSettings {
    /// Resolve settings from config, reading the API key from the environment.
    pub fn from_config(config: &FileProviderConfig) -> Result<Self, ConfigValidationError> {
        let id = ProviderId::new(config.id.as_str())
            .map_err(|_| ConfigValidationError::InvalidProviderId(config.id.clone()))?;
        let api_key = std::env::var(config.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty());
        Ok(Self {
            id,
            model: config.model.clone(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key,
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    /// API key, or `ProviderUnavailable` when none is configured.
    fn require_key(&self) -> Result<&str, GatewayError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| GatewayError::ProviderUnavailable(format!("{}: no API key", self.id)))
    }
}

impl std::fmt::Debug for HttpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSettings")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Build one adapter per configured provider.
///
/// Providers whose API key variable is unset are still registered; they
/// report `is_configured() == false` and are never selected.
pub fn build_registry(
    config: &FileConfig,
    client: reqwest::Client,
) -> Result<ProviderRegistry, ConfigValidationError> {
    let mut registry = ProviderRegistry::new();
    for provider in &config.providers {
        let settings = HttpSettings::from_config(provider)?;
        if settings.api_key.is_none() {
            warn!(
                "Provider {} has no API key (set {}); it will be skipped",
                settings.id,
                provider.api_key_env()
            );
        } else {
            debug!("Provider {} configured ({})", settings.id, provider.kind.as_str());
        }

        let adapter: Arc<dyn ProviderAdapter> = match provider.kind {
            ProviderKind::OpenAi => Arc::new(OpenAiCompatibleAdapter::new(settings, client.clone())),
            ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(settings, client.clone())),
            ProviderKind::Gemini => Arc::new(GeminiAdapter::new(settings, client.clone())),
        };
        registry.register(adapter);
    }
    info!("{} provider adapters registered", registry.len());
    Ok(registry)
}

/// Map a reqwest failure onto the gateway taxonomy.
fn request_error(provider: &ProviderId, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::RequestFailed(format!("{}: {}", provider, e))
    }
}

/// Turn a non-success HTTP status into an error, keeping a bit of the body.
async fn check_status(
    provider: &ProviderId,
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::RequestFailed(format!(
        "{}: HTTP {} {}",
        provider,
        status.as_u16(),
        conclave_domain::util::truncate_str(body.trim(), 300)
    )))
}
