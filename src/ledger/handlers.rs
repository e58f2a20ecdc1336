use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::CoreError;
use crate::ledger::dto::{ApiData, DayQuery, FoodInput, GoalsUpdate, WeeklySummaryResponse};
use crate::ledger::model::{DailyLedger, DayKey};
use crate::state::AppState;

fn day_from_query(date: Option<String>) -> Result<DayKey, CoreError> {
    match date {
        Some(raw) => raw.parse(),
        None => Ok(DayKey::today_utc()),
    }
}

#[instrument(skip(state))]
pub async fn get_daily_log(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DailyLedger>, CoreError> {
    let date = day_from_query(query.date)?;
    let ledger = state.ledgers.get_or_create(&date).await?;
    Ok(Json(ledger))
}

#[instrument(skip(state, input))]
pub async fn add_food(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
    Json(input): Json<FoodInput>,
) -> Result<Json<ApiData<DailyLedger>>, CoreError> {
    let date = day_from_query(query.date)?;
    let ledger = state.ledgers.add_entry(&date, input).await?;
    Ok(Json(ApiData::new(ledger)))
}

#[instrument(skip(state))]
pub async fn remove_food(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Query(query): Query<DayQuery>,
) -> Result<Json<ApiData<DailyLedger>>, CoreError> {
    let date = day_from_query(query.date)?;
    let ledger = state.ledgers.remove_entry(&date, entry_id).await?;
    Ok(Json(ApiData::new(ledger)))
}

#[instrument(skip(state, payload))]
pub async fn update_goals(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
    Json(payload): Json<GoalsUpdate>,
) -> Result<Json<ApiData<DailyLedger>>, CoreError> {
    let date = day_from_query(query.date)?;
    let ledger = state.ledgers.set_goals(&date, payload.goals).await?;
    Ok(Json(ApiData::new(ledger)))
}

#[instrument(skip(state))]
pub async fn clear_log(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<ApiData<DailyLedger>>, CoreError> {
    let date = day_from_query(query.date)?;
    let ledger = state.ledgers.clear(&date).await?;
    Ok(Json(ApiData::new(ledger)))
}

#[instrument(skip(state))]
pub async fn weekly_summary(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<WeeklySummaryResponse>, CoreError> {
    let end = day_from_query(query.date)?;
    let summary = state.ledgers.weekly_summary(&end).await?;
    Ok(Json(summary.into()))
}
