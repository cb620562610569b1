//! Federated search: fan a request out to every capable provider, merge,
//! dedupe, rank and cache the result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use super::cache::{CacheKey, ResponseCache};
use super::dto::{FoodRecord, ProviderInfo, SearchResponse};
use super::ranking;
use crate::providers::{FoodProvider, ProviderError, ProviderRegistry};

#[derive(Debug, Clone, Copy)]
pub struct AggregatorSettings {
    pub cache_ttl: Duration,
    pub cache_max_entries: u64,
    pub provider_timeout: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 10_000,
            provider_timeout: Duration::from_secs(8),
        }
    }
}

/// What one provider produced during one fan-out.
#[derive(Debug)]
pub struct ProviderOutcome<T> {
    pub provider: String,
    pub result: Result<T, ProviderError>,
}

pub struct FoodAggregator {
    registry: RwLock<ProviderRegistry>,
    cache: ResponseCache,
    provider_timeout: Duration,
}

impl FoodAggregator {
    pub fn new(registry: ProviderRegistry, settings: AggregatorSettings) -> Self {
        info!(
            providers = registry.len(),
            cache_ttl_secs = settings.cache_ttl.as_secs(),
            cache_max_entries = settings.cache_max_entries,
            provider_timeout_ms = settings.provider_timeout.as_millis() as u64,
            "food aggregator ready"
        );
        Self {
            registry: RwLock::new(registry),
            cache: ResponseCache::new(settings.cache_ttl, settings.cache_max_entries),
            provider_timeout: settings.provider_timeout,
        }
    }

    /// Registers (or replaces) a provider at runtime. Cached pages were built
    /// from the previous provider set, so the cache is dropped, and searches
    /// still in flight will not store their pages.
    pub async fn register_provider(&self, provider: Arc<dyn FoodProvider>) {
        let mut registry = self.registry.write().await;
        registry.register(provider);
        self.cache.clear();
    }

    pub async fn providers(&self) -> Vec<ProviderInfo> {
        self.registry
            .read()
            .await
            .all()
            .iter()
            .map(|p| ProviderInfo {
                name: p.name().to_owned(),
                supports_search: p.supports_search(),
                supports_barcode: p.supports_barcode(),
            })
            .collect()
    }

    /// Always returns a well-formed page; failures degrade to an empty one.
    #[instrument(skip(self))]
    pub async fn search_foods(&self, query: &str, page: u32, page_size: u32) -> SearchResponse {
        let page = page.max(1);
        let page_size = page_size.max(1);
        match self.try_search_foods(query.trim(), page, page_size).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "search aggregation failed");
                SearchResponse::degraded(page)
            }
        }
    }

    async fn try_search_foods(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> anyhow::Result<SearchResponse> {
        if query.is_empty() {
            return Ok(SearchResponse::new(Vec::new(), 0, page, page_size));
        }

        let key = CacheKey::new(query, page, page_size);
        if let Some(hit) = self.cache.get(&key).await? {
            debug!("search cache hit");
            return Ok(hit);
        }

        let (generation, providers) = {
            let registry = self.registry.read().await;
            (self.cache.generation(), registry.search_providers())
        };
        let owned_query = query.to_owned();
        let outcomes = self
            .fan_out(providers, "search", query, move |p| {
                let query = owned_query.clone();
                async move { p.search_foods(&query, page, page_size).await }
            })
            .await;

        let mut answered = 0usize;
        let mut total_count = 0u64;
        let mut records = Vec::new();
        for outcome in outcomes {
            let Ok(response) = outcome.result else { continue };
            answered += 1;
            total_count = total_count.saturating_add(response.total_count);
            records.extend(response.foods.into_iter().map(|mut food| {
                food.provider.clone_from(&outcome.provider);
                food
            }));
        }
        if answered == 0 {
            warn!("no provider answered the search");
            return Ok(SearchResponse::degraded(page));
        }

        let merged = records.len();
        let ranked = ranking::rank(ranking::dedupe(records), query);
        let foods: Vec<FoodRecord> = ranked.into_iter().take(page_size as usize).collect();
        debug!(answered, merged, returned = foods.len(), total_count, "search aggregated");

        let response = SearchResponse::new(foods, total_count, page, page_size);
        if !self.cache.insert(key, &response, generation).await? {
            debug!("search page not cached");
        }
        Ok(response)
    }

    /// Best candidate across all barcode-capable providers, or `None`.
    #[instrument(skip(self))]
    pub async fn get_food_by_barcode(&self, barcode: &str) -> Option<FoodRecord> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return None;
        }

        let providers = self.registry.read().await.barcode_providers();
        let owned_barcode = barcode.to_owned();
        let outcomes = self
            .fan_out(providers, "barcode", barcode, move |p| {
                let barcode = owned_barcode.clone();
                async move { p.get_food_by_barcode(&barcode).await }
            })
            .await;

        let candidates = outcomes.into_iter().filter_map(|outcome| {
            let mut food = outcome.result.ok().flatten()?;
            food.provider = outcome.provider;
            food.is_informative().then_some(food)
        });
        let best = ranking::pick_best(candidates);
        match &best {
            Some(food) => debug!(provider = %food.provider, id = %food.id, "barcode resolved"),
            None => debug!("barcode not found"),
        }
        best
    }

    /// Runs `call` against every provider concurrently, each in its own task
    /// bounded by the provider timeout, and waits for all of them. Outcomes
    /// come back in the order of `providers`.
    async fn fan_out<T, F, Fut>(
        &self,
        providers: Vec<Arc<dyn FoodProvider>>,
        operation: &'static str,
        request: &str,
        call: F,
    ) -> Vec<ProviderOutcome<T>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn FoodProvider>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
    {
        let timeout = self.provider_timeout;
        let tasks: Vec<_> = providers
            .into_iter()
            .map(|provider| {
                let name = provider.name().to_owned();
                let fut = call(provider);
                let handle = tokio::spawn(async move {
                    tokio::time::timeout(timeout, fut)
                        .await
                        .unwrap_or(Err(ProviderError::Timeout(timeout)))
                });
                (name, handle)
            })
            .collect();

        let (names, handles): (Vec<String>, Vec<_>) = tasks.into_iter().unzip();
        let joined = join_all(handles).await;

        names
            .into_iter()
            .zip(joined)
            .map(|(provider, joined)| {
                let result = joined.unwrap_or_else(|e| Err(ProviderError::Aborted(e.to_string())));
                if let Err(e) = &result {
                    warn!(%provider, operation, request, error = %e, "provider call failed");
                }
                ProviderOutcome { provider, result }
            })
            .collect()
    }
}
