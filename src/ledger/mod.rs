pub mod dto;
pub mod handlers;
pub mod model;
pub mod pg;
pub mod service;
pub mod store;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/daily-log", get(handlers::get_daily_log))
        .route("/add-food", post(handlers::add_food))
        .route("/remove-food/:entry_id", delete(handlers::remove_food))
        .route("/daily-goals", put(handlers::update_goals))
        .route("/clear-log", post(handlers::clear_log))
        .route("/weekly-summary", get(handlers::weekly_summary))
}
