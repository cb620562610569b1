use serde::{Deserialize, Serialize};

/// One candidate food as returned to callers, whatever provider produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub id: String, // provider-namespaced, e.g. "off:3017620422003"
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: Option<f64>,
    pub sugars: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub serving_size: f64,
    pub serving_unit: String,
    pub provider: String,
}

impl FoodRecord {
    /// Minimal record with zeroed nutrients and a 100 g serving.
    pub fn new(id: impl Into<String>, name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: None,
            barcode: None,
            image_url: None,
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            fiber: None,
            sugars: None,
            saturated_fat: None,
            serving_size: 100.0,
            serving_unit: "g".into(),
            provider: provider.into(),
        }
    }

    pub fn has_complete_nutrition(&self) -> bool {
        self.calories > 0.0 && self.protein > 0.0
    }

    /// Records without a calorie value carry no useful nutrition signal.
    pub fn is_informative(&self) -> bool {
        self.calories > 0.0
    }
}

/// A page of foods. `total_count` is best-effort across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub foods: Vec<FoodRecord>,
    pub total_count: u64,
    pub current_page: u32,
    pub total_pages: u32,
}

impl SearchResponse {
    pub fn new(foods: Vec<FoodRecord>, total_count: u64, page: u32, page_size: u32) -> Self {
        Self {
            foods,
            total_count,
            current_page: page,
            total_pages: total_pages(total_count, page_size),
        }
    }

    /// Returned when no provider could answer at all.
    pub fn degraded(page: u32) -> Self {
        Self {
            foods: Vec::new(),
            total_count: 0,
            current_page: page,
            total_pages: 0,
        }
    }
}

/// `max(1, ceil(total_count / page_size))`, saturating at `u32::MAX`.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let pages = total_count.div_ceil(u64::from(page_size.max(1))).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Query string of `GET /foods/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}
fn default_page() -> u32 { 1 }
fn default_page_size() -> u32 { 20 }

/// Registered provider and what it can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub supports_search: bool,
    pub supports_barcode: bool,
}
