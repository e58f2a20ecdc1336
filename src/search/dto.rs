use serde::{Deserialize, Serialize};

use crate::search::record::FoodRecord;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub foods: Vec<FoodRecord>,
    pub source: String,
    pub total: usize,
    pub query: String,
}
