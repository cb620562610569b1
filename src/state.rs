use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::foods::{AggregatorSettings, FoodAggregator};
use crate::providers::open_food_facts::OpenFoodFactsConfig;
use crate::providers::usda::UsdaConfig;
use crate::providers::{FoodProvider, OpenFoodFactsProvider, ProviderRegistry, UsdaProvider};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub foods: Arc<FoodAggregator>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let registry = default_registry(&config)?;
        Ok(Self::from_parts(config, registry))
    }

    pub fn from_parts(config: Arc<AppConfig>, registry: ProviderRegistry) -> Self {
        let foods = Arc::new(FoodAggregator::new(
            registry,
            AggregatorSettings {
                cache_ttl: config.cache_ttl,
                cache_max_entries: config.cache_max_entries,
                provider_timeout: config.provider_timeout,
            },
        ));
        Self { config, foods }
    }

    /// State backed by the given providers instead of the real upstreams.
    pub fn fake(providers: Vec<Arc<dyn FoodProvider>>) -> Self {
        let mut registry = ProviderRegistry::new();
        for p in providers {
            registry.register(p);
        }
        Self::from_parts(Arc::new(AppConfig::default()), registry)
    }
}

/// Open Food Facts first, then USDA: registration order decides which
/// record survives when both return the same food.
pub fn default_registry(config: &AppConfig) -> anyhow::Result<ProviderRegistry> {
    let off = OpenFoodFactsProvider::new(OpenFoodFactsConfig {
        base_url: config.open_food_facts.base_url.clone(),
        user_agent: config.open_food_facts.user_agent.clone(),
        timeout: config.provider_timeout,
    })
    .context("build open food facts provider")?;
    let usda = UsdaProvider::new(UsdaConfig {
        base_url: config.usda.base_url.clone(),
        api_key: config.usda.api_key.clone(),
        user_agent: config.open_food_facts.user_agent.clone(),
        timeout: config.provider_timeout,
    })
    .context("build usda provider")?;

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(off));
    registry.register(Arc::new(usda));
    Ok(registry)
}
