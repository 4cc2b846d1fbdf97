use super::{HttpBackendAdapter, PlatformAdapter, StubAdapter};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Platform, PlatformTarget};
use std::sync::Arc;

/// Fixed platform → adapter table, built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    /// Build a registry from adapters in iteration order.
    ///
    /// A platform registered twice keeps its first adapter.
    pub fn new(adapters: Vec<Arc<dyn PlatformAdapter>>) -> Self {
        let mut unique: Vec<Arc<dyn PlatformAdapter>> = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            if unique.iter().any(|a| a.platform() == adapter.platform()) {
                tracing::warn!(platform = %adapter.platform(), "Duplicate adapter ignored");
                continue;
            }
            unique.push(adapter);
        }
        Self { adapters: unique }
    }

    /// Email always talks to its back-end; chat platforms fall back to stubs
    /// unless a back-end URL is configured.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let adapters = Platform::ALL
            .into_iter()
            .map(|platform| -> Arc<dyn PlatformAdapter> {
                let url = match platform {
                    Platform::Email => Some(config.email_adapter_url.clone()),
                    Platform::Slack => config.slack_adapter_url.clone(),
                    Platform::Whatsapp => config.whatsapp_adapter_url.clone(),
                };
                match url {
                    Some(url) => {
                        tracing::info!(%platform, %url, "Registering HTTP back-end adapter");
                        Arc::new(HttpBackendAdapter::new(platform, client.clone(), url))
                    }
                    None => {
                        tracing::info!(%platform, "Registering stub adapter");
                        Arc::new(StubAdapter::new(platform))
                    }
                }
            })
            .collect();

        Self::new(adapters)
    }

    pub fn get(&self, platform: Platform) -> Result<Arc<dyn PlatformAdapter>> {
        self.adapters
            .iter()
            .find(|adapter| adapter.platform() == platform)
            .cloned()
            .ok_or_else(|| AppError::UnsupportedPlatform(platform.to_string()))
    }

    /// Adapters addressed by `target`; `All` yields every adapter in registry order.
    pub fn resolve(&self, target: PlatformTarget) -> Result<Vec<Arc<dyn PlatformAdapter>>> {
        match target {
            PlatformTarget::All => Ok(self.adapters.clone()),
            PlatformTarget::One(platform) => self.get(platform).map(|adapter| vec![adapter]),
        }
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.adapters.iter().map(|adapter| adapter.platform()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_registry() -> AdapterRegistry {
        AdapterRegistry::new(vec![
            Arc::new(StubAdapter::new(Platform::Email)),
            Arc::new(StubAdapter::new(Platform::Slack)),
            Arc::new(StubAdapter::new(Platform::Whatsapp)),
        ])
    }

    #[test]
    fn test_resolve_all_is_complete_and_stable() {
        let registry = stub_registry();

        let first: Vec<Platform> = registry
            .resolve(PlatformTarget::All)
            .unwrap()
            .iter()
            .map(|a| a.platform())
            .collect();
        let second: Vec<Platform> = registry
            .resolve(PlatformTarget::All)
            .unwrap()
            .iter()
            .map(|a| a.platform())
            .collect();

        assert_eq!(first, Platform::ALL.to_vec());
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_missing_platform_fails() {
        let registry = AdapterRegistry::new(vec![Arc::new(StubAdapter::new(Platform::Email))]);

        let err = registry
            .resolve(PlatformTarget::One(Platform::Slack))
            .err()
            .unwrap();
        assert!(matches!(err, AppError::UnsupportedPlatform(p) if p == "slack"));
    }

    #[test]
    fn test_duplicate_platform_keeps_first() {
        let registry = AdapterRegistry::new(vec![
            Arc::new(StubAdapter::new(Platform::Email)),
            Arc::new(StubAdapter::new(Platform::Email)),
        ]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_config_uses_stubs_without_urls() {
        let registry = AdapterRegistry::from_config(&Config::default(), reqwest::Client::new());
        assert_eq!(registry.platforms(), Platform::ALL.to_vec());
    }
}
