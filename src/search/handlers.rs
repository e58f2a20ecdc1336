use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;

use crate::error::CoreError;
use crate::ledger::dto::ApiData;
use crate::search::catalog::{CatalogFood, NewCatalogFood};
use crate::search::dto::{SearchQuery, SearchResponse};
use crate::search::record::FoodRecord;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn search_food(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, CoreError> {
    let query = params.query.unwrap_or_default();
    let results = state.engine.search(&query).await?;
    Ok(Json(SearchResponse {
        total: results.foods.len(),
        foods: results.foods,
        source: results.source,
        query: query.trim().to_string(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_food_to_database(
    State(state): State<AppState>,
    Json(payload): Json<NewCatalogFood>,
) -> Result<Json<ApiData<CatalogFood>>, CoreError> {
    let food = state.catalog.insert(payload).await?;
    Ok(Json(ApiData::new(food)))
}

#[instrument(skip(state))]
pub async fn food_details(
    State(state): State<AppState>,
    Path(fdc_id): Path<u64>,
) -> Result<Json<FoodRecord>, CoreError> {
    let record = state.usda.fetch_details(fdc_id).await?;
    Ok(Json(record))
}
