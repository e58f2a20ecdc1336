use serde::{Deserialize, Serialize};

use crate::ledger::model::{DailyLedger, Macros};
use crate::ledger::service::WeeklySummary;

/// Candidate food for `add-food`. Base macro values are per scale unit
/// (100 g in weight mode, one serving in quantity mode); clients may send
/// the amount as `amount`, `weight`, `quantity` or `quantityOrWeight`.
#[derive(Debug, Deserialize)]
pub struct FoodInput {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(
        default,
        alias = "weight",
        alias = "quantity",
        alias = "quantityOrWeight"
    )]
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GoalsUpdate {
    #[serde(alias = "dailyGoals")]
    pub goals: Macros,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
}

/// Envelope for mutation responses.
#[derive(Debug, Serialize)]
pub struct ApiData<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiData<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummaryResponse {
    pub days: usize,
    pub totals: Macros,
    pub averages: Macros,
    pub daily_logs: Vec<DailyLedger>,
}

impl From<WeeklySummary> for WeeklySummaryResponse {
    fn from(summary: WeeklySummary) -> Self {
        Self {
            days: summary.days,
            totals: summary.totals,
            // Averages are display values; round them here, not in the core.
            averages: summary.averages.rounded(),
            daily_logs: summary.daily_logs,
        }
    }
}
