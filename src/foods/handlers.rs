use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{instrument, warn};

use super::dto::{FoodRecord, ProviderInfo, SearchParams, SearchResponse};
use crate::state::AppState;

pub const MAX_PAGE_SIZE: u32 = 100;

pub(crate) fn is_valid_barcode(barcode: &str) -> bool {
    lazy_static! {
        // EAN-8, UPC-A, EAN-13, GTIN-14
        static ref BARCODE_RE: Regex = Regex::new(r"^\d{8,14}$").unwrap();
    }
    BARCODE_RE.is_match(barcode)
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/foods/search", get(search_foods))
        .route("/foods/barcode/:barcode", get(get_food_by_barcode))
        .route("/providers", get(list_providers))
}

#[instrument(skip(state))]
pub async fn search_foods(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let query = params.q.trim();
    if query.is_empty() {
        warn!("empty search query");
        return Err((StatusCode::BAD_REQUEST, "q must not be empty".into()));
    }
    if params.page == 0 {
        return Err((StatusCode::BAD_REQUEST, "page starts at 1".into()));
    }
    if params.page_size == 0 || params.page_size > MAX_PAGE_SIZE {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("page_size must be between 1 and {MAX_PAGE_SIZE}"),
        ));
    }

    let response = state
        .foods
        .search_foods(query, params.page, params.page_size)
        .await;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn get_food_by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<FoodRecord>, (StatusCode, String)> {
    let barcode = barcode.trim();
    if !is_valid_barcode(barcode) {
        warn!(%barcode, "invalid barcode");
        return Err((StatusCode::BAD_REQUEST, "Invalid barcode".into()));
    }
    match state.foods.get_food_by_barcode(barcode).await {
        Some(food) => Ok(Json(food)),
        None => Err((StatusCode::NOT_FOUND, "Food not found".into())),
    }
}

pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(state.foods.providers().await)
}
