pub mod adapters;
pub mod catalog;
pub mod dto;
pub mod engine;
pub mod handlers;
pub mod record;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search-food", get(handlers::search_food))
        .route("/food-database", post(handlers::add_food_to_database))
        .route("/food-details/:fdc_id", get(handlers::food_details))
}
