//! Provider selection (weight manager)
//!
//! Picks the provider that answers a normal-mode request:
//!
//! 1. Filter the configured providers to the eligible set: active, positive
//!    weight, breaker available (not open, no trial in flight), and (when
//!    adapters are attached) an adapter holding credentials.
//! 2. If the intent hint maps through the catalog to an eligible provider,
//!    return it.
//! 3. Otherwise draw from the eligible set with probability proportional to
//!    weight. The set is sorted by id first so a seeded RNG reproduces draws.
//! 4. With nothing eligible, return the catalog's last-resort provider.

use crate::ports::provider_adapter::ProviderRegistry;
use crate::ports::provider_settings::ProviderSettingsSource;
use crate::services::breaker_registry::CircuitBreakerRegistry;
use conclave_domain::{IntentCategory, Provider, ProviderCatalog, ProviderId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub struct ProviderSelector {
    catalog: Arc<ProviderCatalog>,
    settings: Arc<dyn ProviderSettingsSource>,
    breakers: Arc<CircuitBreakerRegistry>,
    adapters: Option<ProviderRegistry>,
    rng: Mutex<StdRng>,
}

impl ProviderSelector {
    pub fn new(
        catalog: Arc<ProviderCatalog>,
        settings: Arc<dyn ProviderSettingsSource>,
        breakers: Arc<CircuitBreakerRegistry>,
    ) -> Self {
        Self {
            catalog,
            settings,
            breakers,
            adapters: None,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Only select providers with a registered, configured adapter.
    pub fn with_adapters(mut self, adapters: ProviderRegistry) -> Self {
        self.adapters = Some(adapters);
        self
    }

    /// Deterministic draws for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Choose a provider, optionally biased by an intent hint.
    pub async fn select_provider(&self, hint: Option<IntentCategory>) -> ProviderId {
        let eligible = self.eligible().await;

        if eligible.is_empty() {
            let fallback = self.catalog.fallback().clone();
            warn!(
                "No eligible provider; failing open to default provider {}",
                fallback
            );
            return fallback;
        }

        if let Some(category) = hint
            && let Some(preferred) = self.catalog.provider_for(category)
            && eligible.iter().any(|p| &p.id == preferred)
        {
            debug!("Intent {} routed to {}", category, preferred);
            return preferred.clone();
        }

        let chosen = self.weighted_pick(&eligible);
        debug!(
            "Weighted draw over {} providers chose {}",
            eligible.len(),
            chosen
        );
        chosen
    }

    /// Eligible providers, ascending by id, without duplicates.
    pub async fn eligible(&self) -> Vec<Provider> {
        let mut eligible: Vec<Provider> = self
            .settings
            .providers()
            .await
            .into_iter()
            .filter(|p| self.is_eligible(p))
            .collect();
        eligible.sort_by(|a, b| a.id.cmp(&b.id));
        eligible.dedup_by(|a, b| a.id == b.id);
        eligible
    }

    /// Whether `provider` is configured and currently eligible.
    pub async fn accepts(&self, provider: &ProviderId) -> bool {
        self.settings
            .providers()
            .await
            .iter()
            .any(|p| &p.id == provider && self.is_eligible(p))
    }

    fn is_eligible(&self, provider: &Provider) -> bool {
        provider.is_selectable()
            && self.breakers.is_available(&provider.id)
            && self
                .adapters
                .as_ref()
                .is_none_or(|adapters| adapters.is_usable(&provider.id))
    }

    /// Weighted draw over a non-empty, id-sorted slice of valid weights.
    fn weighted_pick(&self, eligible: &[Provider]) -> ProviderId {
        // scaled into (0, 1] so the total stays finite for any valid weights
        let max = eligible.iter().map(|p| p.weight).fold(0.0, f64::max);
        let scaled: Vec<f64> = eligible.iter().map(|p| p.weight / max).collect();
        let total: f64 = scaled.iter().sum();
        let point = {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            rng.random_range(0.0..total)
        };

        let mut cumulative = 0.0;
        for (provider, weight) in eligible.iter().zip(&scaled) {
            cumulative += weight;
            if point < cumulative {
                return provider.id.clone();
            }
        }
        // float rounding can leave `point` at the very top of the range
        eligible[eligible.len() - 1].id.clone()
    }
}
