use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::FoodProvider;

/// Registered providers, in registration order and indexed by name.
///
/// Built once at startup and handed to the aggregator. It performs no I/O
/// and holds no cached data.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn FoodProvider>>,
    by_name: HashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider. A provider with an already registered name replaces
    /// the old one in its original slot, so iteration order is unchanged.
    pub fn register(&mut self, provider: Arc<dyn FoodProvider>) {
        let name = provider.name().to_owned();
        match self.by_name.get(&name) {
            Some(&idx) => {
                self.providers[idx] = provider;
                info!(provider = %name, "provider replaced");
            }
            None => {
                self.by_name.insert(name.clone(), self.providers.len());
                self.providers.push(provider);
                info!(provider = %name, "provider registered");
            }
        }
    }

    pub fn search_providers(&self) -> Vec<Arc<dyn FoodProvider>> {
        self.providers
            .iter()
            .filter(|p| p.supports_search())
            .cloned()
            .collect()
    }

    pub fn barcode_providers(&self) -> Vec<Arc<dyn FoodProvider>> {
        self.providers
            .iter()
            .filter(|p| p.supports_barcode())
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FoodProvider>> {
        self.by_name.get(name).map(|&idx| self.providers[idx].clone())
    }

    pub fn all(&self) -> &[Arc<dyn FoodProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
