//! Provider value objects and the provider catalog.
//!
//! A [`Provider`] is one external LLM chat API as seen by selection: an id,
//! a display name, a relative weight and an active flag. The
//! [`ProviderCatalog`] is the loaded-once table that maps provider ids to
//! their presentation and routing metadata, so orchestration code never
//! needs vendor-specific string literals.

use crate::core::error::DomainError;
use crate::intent::IntentCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default selection weight for a provider with no explicit setting.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Identifier of an external LLM provider (Value Object)
///
/// Lowercase ASCII letters, digits, `-` and `_`; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if valid {
            Ok(Self(id))
        } else {
            Err(DomainError::InvalidProviderId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProviderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProviderId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.0
    }
}

/// Selection-relevant settings of a provider (Entity)
///
/// Owned by the configuration collaborator; read-only to orchestration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub display_name: String,
    /// Relative selection probability mass. Must be positive.
    pub weight: f64,
    pub active: bool,
}

impl Provider {
    pub fn new(id: ProviderId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            weight: DEFAULT_WEIGHT,
            active: true,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Result<Self, DomainError> {
        if !is_valid_weight(weight) {
            return Err(DomainError::InvalidWeight {
                provider: self.id.to_string(),
                weight: weight.to_string(),
            });
        }
        self.weight = weight;
        Ok(self)
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Active and carrying a usable weight.
    pub fn is_selectable(&self) -> bool {
        self.active && is_valid_weight(self.weight)
    }
}

/// Weights must be finite and strictly positive.
pub fn is_valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}

/// Presentation and routing metadata for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: ProviderId,
    pub display_name: String,
    /// Intent categories this provider is the preferred handler for.
    #[serde(default)]
    pub categories: Vec<IntentCategory>,
}

impl ProviderProfile {
    pub fn new(id: ProviderId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            categories: Vec::new(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<IntentCategory>) -> Self {
        self.categories = categories;
        self
    }
}

/// Loaded-once table of provider profiles keyed by id.
///
/// Profile order is the configured order; it decides which provider wins
/// when two profiles claim the same intent category.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    profiles: Vec<ProviderProfile>,
    fallback: ProviderId,
}

impl ProviderCatalog {
    /// `fallback` is the last-resort provider returned when nothing is eligible.
    pub fn new(profiles: Vec<ProviderProfile>, fallback: ProviderId) -> Self {
        Self { profiles, fallback }
    }

    pub fn get(&self, id: &ProviderId) -> Option<&ProviderProfile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &ProviderId) -> bool {
        self.get(id).is_some()
    }

    /// Display name for `id`, falling back to the raw id.
    pub fn display_name(&self, id: &ProviderId) -> String {
        self.get(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// First provider (in catalog order) that serves `category`.
    pub fn provider_for(&self, category: IntentCategory) -> Option<&ProviderId> {
        self.profiles
            .iter()
            .find(|p| p.categories.contains(&category))
            .map(|p| &p.id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ProviderId> {
        self.profiles.iter().map(|p| &p.id)
    }

    pub fn profiles(&self) -> &[ProviderProfile] {
        &self.profiles
    }

    pub fn fallback(&self) -> &ProviderId {
        &self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ProviderId {
        ProviderId::new(s).unwrap()
    }

    #[test]
    fn test_provider_id_validation() {
        assert!(ProviderId::new("openai").is_ok());
        assert!(ProviderId::new("my-local_llm2").is_ok());
        assert!(ProviderId::new("").is_err());
        assert!(ProviderId::new("OpenAI").is_err());
        assert!(ProviderId::new("open ai").is_err());
    }

    #[test]
    fn test_provider_id_deserialize_rejects_invalid() {
        let ok: Result<ProviderId, _> = serde_json::from_str("\"claude\"");
        assert_eq!(ok.unwrap(), id("claude"));

        let bad: Result<ProviderId, _> = serde_json::from_str("\"Not Valid\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_provider_weight_rules() {
        let p = Provider::new(id("gemini"), "Gemini");
        assert_eq!(p.weight, DEFAULT_WEIGHT);
        assert!(p.is_selectable());

        assert!(p.clone().with_weight(0.0).is_err());
        assert!(p.clone().with_weight(-1.0).is_err());
        assert!(p.clone().with_weight(f64::NAN).is_err());
        assert_eq!(p.clone().with_weight(2.5).unwrap().weight, 2.5);

        assert!(!p.inactive().is_selectable());
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = ProviderCatalog::new(
            vec![
                ProviderProfile::new(id("openai"), "ChatGPT")
                    .with_categories(vec![IntentCategory::Code]),
                ProviderProfile::new(id("perplexity"), "Perplexity")
                    .with_categories(vec![IntentCategory::Research]),
                ProviderProfile::new(id("claude"), "Claude")
                    .with_categories(vec![IntentCategory::Code, IntentCategory::Creative]),
            ],
            id("openai"),
        );

        assert_eq!(catalog.display_name(&id("claude")), "Claude");
        assert_eq!(catalog.display_name(&id("unknown")), "unknown");
        assert_eq!(catalog.provider_for(IntentCategory::Code), Some(&id("openai")));
        assert_eq!(
            catalog.provider_for(IntentCategory::Creative),
            Some(&id("claude"))
        );
        assert_eq!(catalog.provider_for(IntentCategory::Analysis), None);
        assert_eq!(catalog.fallback(), &id("openai"));
        assert_eq!(catalog.ids().count(), 3);
    }
}
