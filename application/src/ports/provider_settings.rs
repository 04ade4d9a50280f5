//! Provider settings port
//!
//! Per-provider weight and active flag, read from the external configuration
//! collaborator on every selection so that changes apply without a restart.

use async_trait::async_trait;
use conclave_domain::Provider;

#[async_trait]
pub trait ProviderSettingsSource: Send + Sync {
    /// Current settings of every known provider.
    async fn providers(&self) -> Vec<Provider>;
}

/// Fixed settings snapshot.
pub struct StaticProviderSettings {
    providers: Vec<Provider>,
}

impl StaticProviderSettings {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl ProviderSettingsSource for StaticProviderSettings {
    async fn providers(&self) -> Vec<Provider> {
        self.providers.clone()
    }
}
