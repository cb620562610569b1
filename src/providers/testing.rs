//! Synthetic providers for exercising the registry and the aggregator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{FoodProvider, ProviderError};
use crate::foods::dto::{FoodRecord, SearchResponse};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
}

pub struct StubProvider {
    name: String,
    search: bool,
    barcode: bool,
    foods: Vec<FoodRecord>,
    total: Option<u64>,
    barcode_food: Option<FoodRecord>,
    behavior: Behavior,
    delay: Option<Duration>,
    search_calls: AtomicUsize,
    barcode_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            search: true,
            barcode: false,
            foods: Vec::new(),
            total: None,
            barcode_food: None,
            behavior: Behavior::Succeed,
            delay: None,
            search_calls: AtomicUsize::new(0),
            barcode_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_foods(mut self, foods: Vec<FoodRecord>) -> Self {
        self.foods = foods;
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_barcode_support(mut self) -> Self {
        self.barcode = true;
        self
    }

    pub fn barcode_only(mut self) -> Self {
        self.search = false;
        self.barcode = true;
        self
    }

    pub fn with_barcode_food(mut self, food: FoodRecord) -> Self {
        self.barcode = true;
        self.barcode_food = Some(food);
        self
    }

    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.behavior = Behavior::Panic;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn barcode_calls(&self) -> usize {
        self.barcode_calls.load(Ordering::SeqCst)
    }

    async fn act(&self) -> Result<(), ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(ProviderError::Parse(format!("{} is down", self.name))),
            Behavior::Panic => panic!("{} blew up", self.name),
        }
    }
}

#[async_trait]
impl FoodProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_search(&self) -> bool {
        self.search
    }

    fn supports_barcode(&self) -> bool {
        self.barcode
    }

    async fn search_foods(
        &self,
        _query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.act().await?;
        let total = self.total.unwrap_or(self.foods.len() as u64);
        Ok(SearchResponse::new(self.foods.clone(), total, page, page_size))
    }

    async fn get_food_by_barcode(&self, _barcode: &str) -> Result<Option<FoodRecord>, ProviderError> {
        self.barcode_calls.fetch_add(1, Ordering::SeqCst);
        self.act().await?;
        Ok(self.barcode_food.clone())
    }
}

/// Search-only provider relying on the trait's default barcode lookup.
pub struct SearchOnlyProvider;

#[async_trait]
impl FoodProvider for SearchOnlyProvider {
    fn name(&self) -> &str {
        "search-only"
    }

    async fn search_foods(
        &self,
        _query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse, ProviderError> {
        Ok(SearchResponse::new(Vec::new(), 0, page, page_size))
    }
}

pub fn food(name: &str, brand: Option<&str>) -> FoodRecord {
    let mut f = FoodRecord::new(format!("stub:{}", name.to_lowercase()), name, "stub");
    f.brand = brand.map(str::to_owned);
    f
}
