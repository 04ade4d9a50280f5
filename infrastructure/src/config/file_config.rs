//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.
//!
//! ```toml
//! [[providers]]
//! id = "openai"
//! display_name = "GPT"
//! kind = "openai"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//! weight = 2.0
//! categories = ["code"]
//!
//! [selection]
//! fallback_provider = "openai"
//!
//! [mix]
//! providers = ["openai", "claude"]
//!
//! [debate]
//! debaters = ["openai", "claude", "gemini", "perplexity"]
//! synthesizer = "claude"
//! synthesis_fallback = "openai"
//!
//! [orchestrator]
//! typing_delay_ms = 20
//! timeout_seconds = 60
//! ```

use crate::providers::ProviderKind;
use conclave_application::{DebateLineup, OrchestratorConfig};
use conclave_domain::{
    DEFAULT_WEIGHT, IntentCategory, Provider, ProviderCatalog, ProviderId, ProviderProfile,
    is_valid_weight,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("provider {0}: model name cannot be empty")]
    EmptyModelName(String),

    #[error("invalid provider id '{0}'")]
    InvalidProviderId(String),

    #[error("provider {0} is configured more than once")]
    DuplicateProvider(String),

    #[error("provider {provider}: weight must be a positive number, got {weight}")]
    InvalidWeight { provider: String, weight: f64 },

    #[error("{section} refers to unknown provider '{provider}'")]
    UnknownProvider { section: String, provider: String },

    #[error("debate.debaters must list exactly 4 providers, got {0}")]
    WrongDebaterCount(usize),
}

/// One `[[providers]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProviderConfig {
    pub id: String,
    /// Human-readable name used in events and transcripts (defaults to the id)
    #[serde(default)]
    pub display_name: Option<String>,
    /// Wire format of the vendor API
    pub kind: ProviderKind,
    pub model: String,
    /// Overrides the vendor's default endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key (defaults per kind)
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Intent categories this provider is preferred for
    #[serde(default)]
    pub categories: Vec<IntentCategory>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

fn default_active() -> bool {
    true
}

impl FileProviderConfig {
    fn new(id: &str, display_name: &str, kind: ProviderKind, model: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: Some(display_name.to_string()),
            kind,
            model: model.to_string(),
            base_url: None,
            api_key_env: None,
            weight: DEFAULT_WEIGHT,
            active: true,
            categories: Vec::new(),
            max_tokens: None,
        }
    }

    fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    fn with_api_key_env(mut self, var: &str) -> Self {
        self.api_key_env = Some(var.to_string());
        self
    }

    fn with_categories(mut self, categories: Vec<IntentCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Environment variable holding the key, falling back to the kind's default.
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.kind.default_api_key_env())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }
}

/// `[selection]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSelectionConfig {
    /// Last-resort provider when nothing is eligible
    pub fallback_provider: String,
}

impl Default for FileSelectionConfig {
    fn default() -> Self {
        Self {
            fallback_provider: "openai".to_string(),
        }
    }
}

/// `[mix]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMixConfig {
    /// Providers queried in order
    pub providers: Vec<String>,
}

impl Default for FileMixConfig {
    fn default() -> Self {
        Self {
            providers: ids(&["openai", "claude", "gemini", "perplexity"]),
        }
    }
}

/// `[debate]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDebateConfig {
    pub debaters: Vec<String>,
    pub synthesizer: String,
    pub synthesis_fallback: String,
}

impl Default for FileDebateConfig {
    fn default() -> Self {
        Self {
            debaters: ids(&["openai", "claude", "gemini", "perplexity"]),
            synthesizer: "claude".to_string(),
            synthesis_fallback: "openai".to_string(),
        }
    }
}

/// `[orchestrator]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// Pause between replayed words of non-streaming replies
    pub typing_delay_ms: u64,
    /// Per-call provider timeout
    pub timeout_seconds: u64,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: 20,
            timeout_seconds: 60,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub providers: Vec<FileProviderConfig>,
    pub selection: FileSelectionConfig,
    pub mix: FileMixConfig,
    pub debate: FileDebateConfig,
    pub orchestrator: FileOrchestratorConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            providers: vec![
                FileProviderConfig::new("openai", "GPT", ProviderKind::OpenAi, "gpt-4o-mini")
                    .with_categories(vec![IntentCategory::Code]),
                FileProviderConfig::new(
                    "claude",
                    "Claude",
                    ProviderKind::Anthropic,
                    "claude-sonnet-4-20250514",
                )
                .with_categories(vec![IntentCategory::Analysis]),
                FileProviderConfig::new(
                    "gemini",
                    "Gemini",
                    ProviderKind::Gemini,
                    "gemini-2.0-flash",
                )
                .with_categories(vec![IntentCategory::Creative]),
                FileProviderConfig::new(
                    "perplexity",
                    "Perplexity",
                    ProviderKind::OpenAi,
                    "sonar",
                )
                .with_base_url("https://api.perplexity.ai")
                .with_api_key_env("PERPLEXITY_API_KEY")
                .with_categories(vec![IntentCategory::Research]),
            ],
            selection: FileSelectionConfig::default(),
            mix: FileMixConfig::default(),
            debate: FileDebateConfig::default(),
            orchestrator: FileOrchestratorConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate the configuration, reporting the first problem found
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.orchestrator.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if ProviderId::new(provider.id.as_str()).is_err() {
                return Err(ConfigValidationError::InvalidProviderId(
                    provider.id.clone(),
                ));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(ConfigValidationError::DuplicateProvider(
                    provider.id.clone(),
                ));
            }
            if provider.model.trim().is_empty() {
                return Err(ConfigValidationError::EmptyModelName(provider.id.clone()));
            }
            if !is_valid_weight(provider.weight) {
                return Err(ConfigValidationError::InvalidWeight {
                    provider: provider.id.clone(),
                    weight: provider.weight,
                });
            }
        }

        if self.debate.debaters.len() != 4 {
            return Err(ConfigValidationError::WrongDebaterCount(
                self.debate.debaters.len(),
            ));
        }

        let references = std::iter::once(("selection.fallback_provider", &self.selection.fallback_provider))
            .chain(self.mix.providers.iter().map(|p| ("mix.providers", p)))
            .chain(self.debate.debaters.iter().map(|p| ("debate.debaters", p)))
            .chain([
                ("debate.synthesizer", &self.debate.synthesizer),
                ("debate.synthesis_fallback", &self.debate.synthesis_fallback),
            ]);
        for (section, provider) in references {
            if !seen.contains(provider.as_str()) {
                return Err(ConfigValidationError::UnknownProvider {
                    section: section.to_string(),
                    provider: provider.clone(),
                });
            }
        }

        Ok(())
    }

    /// Provider profiles and last-resort default
    pub fn catalog(&self) -> Result<ProviderCatalog, ConfigValidationError> {
        let profiles = self
            .providers
            .iter()
            .map(|p| {
                Ok(ProviderProfile::new(provider_id(&p.id)?, p.display_name())
                    .with_categories(p.categories.clone()))
            })
            .collect::<Result<Vec<_>, ConfigValidationError>>()?;
        Ok(ProviderCatalog::new(
            profiles,
            provider_id(&self.selection.fallback_provider)?,
        ))
    }

    /// Initial weight and active flag of every provider
    pub fn provider_settings(&self) -> Result<Vec<Provider>, ConfigValidationError> {
        self.providers
            .iter()
            .map(|p| {
                let mut provider = Provider::new(provider_id(&p.id)?, p.display_name())
                    .with_weight(p.weight)
                    .map_err(|_| ConfigValidationError::InvalidWeight {
                        provider: p.id.clone(),
                        weight: p.weight,
                    })?;
                provider.active = p.active;
                Ok(provider)
            })
            .collect()
    }

    /// Orchestrator settings
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig, ConfigValidationError> {
        let debaters = self
            .debate
            .debaters
            .iter()
            .map(|d| provider_id(d))
            .collect::<Result<Vec<_>, _>>()?;
        let lineup = DebateLineup::from_slice(
            &debaters,
            provider_id(&self.debate.synthesizer)?,
            provider_id(&self.debate.synthesis_fallback)?,
        )
        .ok_or(ConfigValidationError::WrongDebaterCount(debaters.len()))?;
        let mix = self
            .mix
            .providers
            .iter()
            .map(|p| provider_id(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OrchestratorConfig::new(mix, lineup)
            .with_typing_delay(Duration::from_millis(self.orchestrator.typing_delay_ms)))
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.orchestrator.timeout_seconds)
    }
}

fn provider_id(raw: &str) -> Result<ProviderId, ConfigValidationError> {
    ProviderId::new(raw).map_err(|_| ConfigValidationError::InvalidProviderId(raw.to_string()))
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.providers.len(), 4);
        assert_eq!(config.debate.debaters.len(), 4);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[[providers]]
id = "openai"
kind = "openai"
model = "gpt-4o"
weight = 2.5
categories = ["code", "analysis"]

[[providers]]
id = "claude"
display_name = "Claude"
kind = "anthropic"
model = "claude-sonnet-4-20250514"
active = false

[selection]
fallback_provider = "claude"

[mix]
providers = ["claude", "openai"]

[debate]
debaters = ["openai", "claude", "openai", "claude"]
synthesizer = "claude"
synthesis_fallback = "openai"

[orchestrator]
typing_delay_ms = 0
timeout_seconds = 30
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].weight, 2.5);
        assert_eq!(config.providers[0].display_name(), "openai");
        assert_eq!(config.providers[0].api_key_env(), "OPENAI_API_KEY");
        assert!(!config.providers[1].active);
        assert_eq!(config.call_timeout(), Duration::from_secs(30));

        let catalog = config.catalog().unwrap();
        assert_eq!(
            catalog.provider_for(IntentCategory::Analysis),
            Some(&ProviderId::new("openai").unwrap())
        );
        assert_eq!(catalog.fallback().as_str(), "claude");

        let orchestrator = config.orchestrator_config().unwrap();
        assert_eq!(orchestrator.typing_delay, Duration::ZERO);
        assert_eq!(orchestrator.mix_providers[0].as_str(), "claude");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml_str = r#"
[orchestrator]
typing_delay_ms = 5
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.orchestrator.typing_delay_ms, 5);
        assert_eq!(config.orchestrator.timeout_seconds, 60);
        assert_eq!(config.providers.len(), 4);
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = FileConfig::default();
        config.orchestrator.timeout_seconds = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validate_bad_weight() {
        let mut config = FileConfig::default();
        config.providers[1].weight = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidWeight { provider, .. }) if provider == "claude"
        ));
    }

    #[test]
    fn test_validate_duplicate_provider() {
        let mut config = FileConfig::default();
        let copy = config.providers[0].clone();
        config.providers.push(copy);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::DuplicateProvider("openai".into()))
        );
    }

    #[test]
    fn test_validate_empty_model_name() {
        let mut config = FileConfig::default();
        config.providers[2].model = " ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyModelName("gemini".into()))
        );
    }

    #[test]
    fn test_validate_unknown_reference() {
        let mut config = FileConfig::default();
        config.mix.providers.push("mistral".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::UnknownProvider { section, .. }) if section == "mix.providers"
        ));
    }

    #[test]
    fn test_validate_debater_count() {
        let mut config = FileConfig::default();
        config.debate.debaters.pop();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::WrongDebaterCount(3))
        );
    }

    #[test]
    fn test_provider_settings_follow_config() {
        let mut config = FileConfig::default();
        config.providers[3].active = false;
        let settings = config.provider_settings().unwrap();
        assert_eq!(settings.len(), 4);
        assert!(!settings[3].active);
        assert_eq!(settings[0].display_name, "GPT");
    }
}
