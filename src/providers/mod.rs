//! Upstream nutrition data sources behind one capability contract.
//!
//! A provider wraps exactly one external source. The aggregator only talks
//! to providers through [`FoodProvider`], so adding a source means
//! implementing the trait and registering it in the [`ProviderRegistry`].

use std::time::Duration;

use async_trait::async_trait;

use crate::foods::dto::{FoodRecord, SearchResponse};

pub mod error;
pub mod nutrients;
pub mod open_food_facts;
pub mod registry;
pub mod usda;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ProviderError;
pub use open_food_facts::OpenFoodFactsProvider;
pub use registry::ProviderRegistry;
pub use usda::UsdaProvider;

#[async_trait]
pub trait FoodProvider: Send + Sync {
    /// Stable name, also the registry key and the `provider` tag on records.
    fn name(&self) -> &str;

    fn supports_search(&self) -> bool {
        true
    }

    fn supports_barcode(&self) -> bool {
        false
    }

    /// Free-text search. No matches is an empty page, not an error.
    async fn search_foods(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse, ProviderError>;

    /// Lookup by barcode; unknown barcodes are `Ok(None)`.
    async fn get_food_by_barcode(&self, _barcode: &str) -> Result<Option<FoodRecord>, ProviderError> {
        Ok(None)
    }
}

/// HTTP client shared by the calls of one provider.
pub fn http_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Turns a non-success response into `ProviderError::Status`.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body = text.chars().take(256).collect();
    Err(ProviderError::Status { status, body })
}
