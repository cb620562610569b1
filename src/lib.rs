//! Federated food search: queries several nutrition data providers by text
//! or barcode, merges and ranks their answers, and caches the result.

pub mod app;
pub mod config;
pub mod foods;
pub mod providers;
pub mod state;

pub use foods::dto::{FoodRecord, SearchResponse};
pub use foods::{AggregatorSettings, FoodAggregator};
pub use providers::{FoodProvider, ProviderError, ProviderRegistry};
