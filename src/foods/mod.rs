use crate::state::AppState;
use axum::Router;

pub mod cache;
pub mod dto;
pub mod handlers;
pub mod ranking;
pub mod services;

pub use services::{AggregatorSettings, FoodAggregator};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::read_routes())
}
