use std::time::Duration;

use serde::Deserialize;

use crate::ledger::model::ScalingMode;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Without a database the service falls back to in-memory storage.
    pub database_url: Option<String>,
    /// Without a key the external food source stays disabled (always-empty).
    pub usda_api_key: Option<String>,
    pub usda_base_url: String,
    pub search_timeout_secs: u64,
    pub local_foods_file: Option<String>,
    pub scaling_mode: ScalingMode,
    pub goal_rollover: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            usda_api_key: std::env::var("USDA_API_KEY").ok().filter(|v| !v.is_empty()),
            usda_base_url: std::env::var("USDA_BASE_URL")
                .unwrap_or_else(|_| "https://api.nal.usda.gov/fdc/v1".into()),
            search_timeout_secs: std::env::var("SEARCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5),
            local_foods_file: std::env::var("LOCAL_FOODS_FILE").ok(),
            scaling_mode: match std::env::var("SCALING_MODE").as_deref() {
                Ok("quantity") => ScalingMode::Quantity,
                _ => ScalingMode::Weight,
            },
            goal_rollover: std::env::var("GOAL_ROLLOVER")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}
