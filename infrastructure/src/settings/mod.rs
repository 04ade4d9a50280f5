//! Runtime provider settings
//!
//! [`InMemorySettingsStore`] is seeded from the loaded config and can be
//! adjusted while the process runs; the selector reads it on every draw.

use async_trait::async_trait;
use conclave_application::ProviderSettingsSource;
use conclave_domain::{DomainError, Provider, ProviderId};
use std::sync::RwLock;
use tracing::info;

#[derive(Default)]
pub struct InMemorySettingsStore {
    providers: RwLock<Vec<Provider>>,
}

impl InMemorySettingsStore {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self {
            providers: RwLock::new(providers),
        }
    }

    /// Change a provider's selection weight.
    ///
    /// Rejects non-finite and non-positive weights, and unknown providers.
    pub fn set_weight(&self, provider: &ProviderId, weight: f64) -> Result<(), DomainError> {
        self.update(provider, |p| {
            *p = p.clone().with_weight(weight)?;
            Ok(())
        })?;
        info!("Weight of {} set to {}", provider, weight);
        Ok(())
    }

    pub fn set_active(&self, provider: &ProviderId, active: bool) -> Result<(), DomainError> {
        self.update(provider, |p| {
            p.active = active;
            Ok(())
        })?;
        info!(
            "{} {}",
            provider,
            if active { "activated" } else { "deactivated" }
        );
        Ok(())
    }

    fn update(
        &self,
        provider: &ProviderId,
        f: impl FnOnce(&mut Provider) -> Result<(), DomainError>,
    ) -> Result<(), DomainError> {
        let mut providers = self.providers.write().unwrap_or_else(|p| p.into_inner());
        let entry = providers
            .iter_mut()
            .find(|p| &p.id == provider)
            .ok_or_else(|| DomainError::UnknownProvider(provider.to_string()))?;
        f(entry)
    }
}

#[async_trait]
impl ProviderSettingsSource for InMemorySettingsStore {
    async fn providers(&self) -> Vec<Provider> {
        self.providers
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}
