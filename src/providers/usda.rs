//! USDA FoodData Central. Needs an API key and has no barcode endpoint, so
//! it only takes part in text searches.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::nutrients::{self, default_serving_unit, kj_to_kcal, normalize_unit};
use super::{ensure_success, http_client, FoodProvider, ProviderError};
use crate::foods::dto::{FoodRecord, SearchResponse};

pub const NAME: &str = "usda";
pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

// FoodData Central nutrient ids, in lookup priority order.
const ENERGY_KCAL: [u32; 3] = [1008, 2047, 2048];
const ENERGY_KJ: u32 = 1062;
const PROTEIN: u32 = 1003;
const FAT: u32 = 1004;
const CARBS: u32 = 1005;
const FIBER: u32 = 1079;
const SUGARS: [u32; 2] = [2000, 1063];
const SATURATED_FAT: u32 = 1258;

#[derive(Debug, Clone)]
pub struct UsdaConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

pub struct UsdaProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPayload {
    #[serde(default)]
    total_hits: u64,
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFood {
    fdc_id: u64,
    #[serde(default)]
    description: String,
    brand_name: Option<String>,
    brand_owner: Option<String>,
    gtin_upc: Option<String>,
    serving_size_unit: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodNutrient {
    nutrient_id: Option<u32>,
    unit_name: Option<String>,
    value: Option<f64>,
}

impl FoodNutrient {
    fn is_kilojoules(&self) -> bool {
        self.unit_name
            .as_deref()
            .is_some_and(|u| u.eq_ignore_ascii_case("kj"))
    }
}

impl UsdaProvider {
    pub fn new(config: UsdaConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!(provider = NAME, "no API key configured; searches will return no results");
        }
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key,
            client: http_client(&config.user_agent, config.timeout)?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn non_blank(s: Option<&String>) -> Option<String> {
    s.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_owned)
}

impl SearchFood {
    fn value(&self, id: u32) -> Option<f64> {
        self.food_nutrients
            .iter()
            .find(|n| n.nutrient_id == Some(id))
            .and_then(|n| n.value)
            .map(nutrients::non_negative)
    }

    fn first_value(&self, ids: &[u32]) -> Option<f64> {
        ids.iter().find_map(|&id| self.value(id))
    }

    fn energy_kcal(&self) -> f64 {
        ENERGY_KCAL
            .iter()
            .find_map(|&id| {
                let n = self.food_nutrients.iter().find(|n| n.nutrient_id == Some(id))?;
                let v = nutrients::non_negative(n.value?);
                Some(if n.is_kilojoules() { kj_to_kcal(v) } else { v })
            })
            .or_else(|| self.value(ENERGY_KJ).map(kj_to_kcal))
            .unwrap_or(0.0)
    }

    fn into_record(self) -> Option<FoodRecord> {
        let name = self.description.trim().to_owned();
        if name.is_empty() {
            return None;
        }
        let serving_unit = self
            .serving_size_unit
            .as_deref()
            .and_then(normalize_unit)
            .unwrap_or_else(|| default_serving_unit(&name));

        let mut record = FoodRecord::new(format!("usda:{}", self.fdc_id), name, NAME);
        record.calories = nutrients::round1(self.energy_kcal());
        record.protein = self.value(PROTEIN).unwrap_or(0.0);
        record.carbs = self.value(CARBS).unwrap_or(0.0);
        record.fat = self.value(FAT).unwrap_or(0.0);
        record.fiber = self.value(FIBER);
        record.sugars = self.first_value(&SUGARS);
        record.saturated_fat = self.value(SATURATED_FAT);
        record.brand = non_blank(self.brand_name.as_ref()).or_else(|| non_blank(self.brand_owner.as_ref()));
        record.barcode = non_blank(self.gtin_upc.as_ref());
        record.serving_size = 100.0;
        record.serving_unit = serving_unit.to_owned();
        Some(record)
    }
}

#[async_trait]
impl FoodProvider for UsdaProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn search_foods(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(SearchResponse::new(Vec::new(), 0, page, page_size));
        };
        debug!(%query, page, page_size, "usda search");
        let page_param = page.to_string();
        let size_param = page_size.to_string();
        let response = self
            .client
            .get(format!("{}/foods/search", self.base_url))
            .query(&[
                ("api_key", api_key),
                ("query", query),
                ("pageNumber", page_param.as_str()),
                ("pageSize", size_param.as_str()),
            ])
            .send()
            .await?;
        let payload: SearchPayload = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(ProviderError::parse)?;

        let foods: Vec<FoodRecord> = payload
            .foods
            .into_iter()
            .filter_map(SearchFood::into_record)
            .collect();
        Ok(SearchResponse::new(foods, payload.total_hits, page, page_size))
    }
}
