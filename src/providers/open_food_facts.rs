//! Open Food Facts: free, keyless, supports both text search and barcodes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::nutrients::{self, default_serving_unit, kj_to_kcal, normalize_unit};
use super::{ensure_success, http_client, FoodProvider, ProviderError};
use crate::foods::dto::{FoodRecord, SearchResponse};

pub const NAME: &str = "openfoodfacts";
pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

const FIELDS: &str = "code,product_name,product_name_en,generic_name,brands,image_front_url,image_url,image_small_url,nutriments,nutrition_data_per";

const KCAL_KEYS: [&str; 2] = ["energy-kcal_100g", "energy-kcal"];
const KJ_KEYS: [&str; 4] = ["energy-kj_100g", "energy_100g", "energy-kj", "energy"];

#[derive(Debug, Clone)]
pub struct OpenFoodFactsConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

pub struct OpenFoodFactsProvider {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    count: Value,
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct ProductPayload {
    #[serde(default)]
    status: Value,
    product: Option<Product>,
}

#[derive(Debug, Default, Deserialize)]
struct Product {
    #[serde(default)]
    code: Value,
    product_name: Option<String>,
    product_name_en: Option<String>,
    generic_name: Option<String>,
    brands: Option<String>,
    image_front_url: Option<String>,
    image_url: Option<String>,
    image_small_url: Option<String>,
    #[serde(default)]
    nutriments: HashMap<String, Value>,
    nutrition_data_per: Option<String>,
}

impl OpenFoodFactsProvider {
    pub fn new(config: OpenFoodFactsConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client: http_client(&config.user_agent, config.timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn non_blank(s: Option<&String>) -> Option<String> {
    s.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_owned)
}

fn code_of(value: &Value) -> Option<String> {
    let code = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!code.is_empty()).then_some(code)
}

fn first_of(nutriments: &HashMap<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|k| nutriments.get(*k).and_then(nutrients::number))
}

fn per_100(nutriments: &HashMap<String, Value>, nutrient: &str) -> Option<f64> {
    let per_100g = format!("{nutrient}_100g");
    first_of(nutriments, &[per_100g.as_str(), nutrient])
}

fn energy_kcal(nutriments: &HashMap<String, Value>) -> f64 {
    first_of(nutriments, &KCAL_KEYS)
        .or_else(|| first_of(nutriments, &KJ_KEYS).map(kj_to_kcal))
        .unwrap_or(0.0)
}

impl Product {
    fn into_record(self) -> Option<FoodRecord> {
        let code = code_of(&self.code)?;
        let name = non_blank(self.product_name.as_ref())
            .or_else(|| non_blank(self.product_name_en.as_ref()))
            .or_else(|| non_blank(self.generic_name.as_ref()))?;

        let brand = self
            .brands
            .as_deref()
            .and_then(|b| b.split(',').map(str::trim).find(|b| !b.is_empty()))
            .map(str::to_owned);
        let image_url = non_blank(self.image_front_url.as_ref())
            .or_else(|| non_blank(self.image_url.as_ref()))
            .or_else(|| non_blank(self.image_small_url.as_ref()));
        let serving_unit = self
            .nutrition_data_per
            .as_deref()
            .and_then(normalize_unit)
            .unwrap_or_else(|| default_serving_unit(&name));

        let n = &self.nutriments;
        let mut record = FoodRecord::new(format!("off:{code}"), name, NAME);
        record.brand = brand;
        record.barcode = Some(code);
        record.image_url = image_url;
        record.calories = nutrients::round1(energy_kcal(n));
        record.protein = per_100(n, "proteins").unwrap_or(0.0);
        record.carbs = per_100(n, "carbohydrates").unwrap_or(0.0);
        record.fat = per_100(n, "fat").unwrap_or(0.0);
        record.fiber = per_100(n, "fiber");
        record.sugars = per_100(n, "sugars");
        record.saturated_fat = per_100(n, "saturated-fat");
        record.serving_size = 100.0;
        record.serving_unit = serving_unit.to_owned();
        Some(record)
    }
}

#[async_trait]
impl FoodProvider for OpenFoodFactsProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn supports_barcode(&self) -> bool {
        true
    }

    async fn search_foods(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResponse, ProviderError> {
        debug!(%query, page, page_size, "openfoodfacts search");
        let page_param = page.to_string();
        let size_param = page_size.to_string();
        let response = self
            .client
            .get(format!("{}/cgi/search.pl", self.base_url))
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page", page_param.as_str()),
                ("page_size", size_param.as_str()),
                ("fields", FIELDS),
            ])
            .send()
            .await?;
        let payload: SearchPayload = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(ProviderError::parse)?;

        let foods: Vec<FoodRecord> = payload
            .products
            .into_iter()
            .filter_map(Product::into_record)
            .collect();
        let total = nutrients::number(&payload.count)
            .map(|c| c as u64)
            .unwrap_or(foods.len() as u64);
        Ok(SearchResponse::new(foods, total, page, page_size))
    }

    async fn get_food_by_barcode(&self, barcode: &str) -> Result<Option<FoodRecord>, ProviderError> {
        // the code becomes a path segment
        if barcode.is_empty() || !barcode.bytes().all(|b| b.is_ascii_digit()) {
            debug!(%barcode, "openfoodfacts skips non-numeric barcode");
            return Ok(None);
        }
        debug!(%barcode, "openfoodfacts barcode lookup");
        let response = self
            .client
            .get(format!("{}/api/v2/product/{}.json", self.base_url, barcode))
            .query(&[("fields", FIELDS)])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let payload: ProductPayload = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(ProviderError::parse)?;

        if nutrients::number(&payload.status) != Some(1.0) {
            return Ok(None);
        }
        Ok(payload.product.and_then(|mut p| {
            if code_of(&p.code).is_none() {
                p.code = Value::String(barcode.to_owned());
            }
            p.into_record()
        }))
    }
}

#[cfg(test)]
mod off_tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn provider(base_url: &str) -> OpenFoodFactsProvider {
        OpenFoodFactsProvider::new(OpenFoodFactsConfig {
            base_url: base_url.to_owned(),
            user_agent: "foodmind-test".into(),
            timeout: Duration::from_secs(5),
        })
        .expect("client builds")
    }

    fn nutella() -> Value {
        json!({
            "code": "3017620422003",
            "product_name": "Nutella",
            "brands": "Ferrero, Nutella",
            "image_front_url": "https://images.example/nutella.jpg",
            "nutriments": {
                "energy-kcal_100g": 539,
                "energy_100g": 2252,
                "proteins_100g": 6.3,
                "carbohydrates_100g": "57,5",
                "fat_100g": 30.9,
                "sugars_100g": 56.3,
                "saturated-fat_100g": 10.6
            }
        })
    }

    #[tokio::test]
    async fn search_maps_products() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cgi/search.pl")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_terms".into(), "nutella".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("page_size".into(), "5".into()),
                Matcher::UrlEncoded("json".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "count": "42",
                    "products": [
                        nutella(),
                        { "code": "", "product_name": "No code" },
                        { "code": "123", "product_name": "  " }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = provider(&server.url()).search_foods("nutella", 2, 5).await.unwrap();
        mock.assert_async().await;

        assert_eq!(result.total_count, 42);
        assert_eq!(result.current_page, 2);
        assert_eq!(result.total_pages, 9);
        assert_eq!(result.foods.len(), 1);
        let f = &result.foods[0];
        assert_eq!(f.id, "off:3017620422003");
        assert_eq!(f.name, "Nutella");
        assert_eq!(f.brand.as_deref(), Some("Ferrero"));
        assert_eq!(f.barcode.as_deref(), Some("3017620422003"));
        assert_eq!(f.calories, 539.0);
        assert_eq!(f.carbs, 57.5);
        assert_eq!(f.saturated_fat, Some(10.6));
        assert_eq!(f.fiber, None);
        assert_eq!(f.serving_unit, "g");
        assert_eq!(f.provider, NAME);
    }

    #[tokio::test]
    async fn energy_falls_back_to_kilojoules() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/cgi/search.pl")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "count": 1,
                    "products": [{
                        "code": 4000000000001u64,
                        "product_name": "Apfelsaft",
                        "nutriments": { "energy_100g": 184.1 }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = provider(&server.url()).search_foods("apfel", 1, 10).await.unwrap();
        let f = &result.foods[0];
        assert_eq!(f.barcode.as_deref(), Some("4000000000001"));
        assert_eq!(f.calories, 44.0);
        assert_eq!(f.protein, 0.0);
        assert_eq!(f.serving_unit, "ml");
    }

    #[test]
    fn explicit_unit_wins_over_heuristic() {
        let mut p: Product = serde_json::from_value(nutella()).unwrap();
        p.product_name = Some("Chocolate milk".into());
        p.nutrition_data_per = Some("100g".into());
        assert_eq!(p.into_record().unwrap().serving_unit, "g");
    }

    #[tokio::test]
    async fn search_server_error_is_a_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/cgi/search.pl")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let err = provider(&server.url()).search_foods("x", 1, 10).await.unwrap_err();
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[tokio::test]
    async fn search_garbage_body_is_parse_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/cgi/search.pl")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = provider(&server.url()).search_foods("x", 1, 10).await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[tokio::test]
    async fn barcode_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/product/3017620422003.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": 1, "product": nutella() }).to_string())
            .create_async()
            .await;

        let found = provider(&server.url())
            .get_food_by_barcode("3017620422003")
            .await
            .unwrap()
            .expect("product exists");
        mock.assert_async().await;
        assert_eq!(found.name, "Nutella");
        assert_eq!(found.image_url.as_deref(), Some("https://images.example/nutella.jpg"));
    }

    #[tokio::test]
    async fn barcode_unknown_is_not_found() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", "/api/v2/product/111.json")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(json!({ "status": 0, "status_verbose": "product not found" }).to_string())
            .create_async()
            .await;
        let _empty = server
            .mock("GET", "/api/v2/product/222.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "status": 0 }).to_string())
            .create_async()
            .await;

        let off = provider(&server.url());
        assert!(off.get_food_by_barcode("111").await.unwrap().is_none());
        assert!(off.get_food_by_barcode("222").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_numeric_barcode_never_reaches_upstream() {
        let mut server = Server::new_async().await;
        let untouched = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let off = provider(&server.url());
        for code in ["12/34?x", "../search", "", "12 34"] {
            assert!(off.get_food_by_barcode(code).await.unwrap().is_none());
        }
        untouched.assert_async().await;
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(provider("http://localhost:1/").base_url(), "http://localhost:1");
    }
}
