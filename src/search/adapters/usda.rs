use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::search::adapters::FoodSourceAdapter;
use crate::search::record::{FoodRecord, Source};

// USDA FoodData Central nutrient ids.
const NUTRIENT_CALORIES: u32 = 1008;
const NUTRIENT_PROTEIN: u32 = 1003;
const NUTRIENT_CARBS: u32 = 1005;
const NUTRIENT_FATS: u32 = 1004;
const NUTRIENT_FIBER: u32 = 1079;
const NUTRIENT_SUGAR: u32 = 2000;
const NUTRIENT_SODIUM: u32 = 1093;

const SEARCH_PAGE_SIZE: &str = "15";

#[derive(Debug, Deserialize)]
pub(crate) struct UsdaSearchResponse {
    #[serde(default)]
    pub foods: Vec<UsdaFood>,
}

/// One food as FoodData Central reports it. The nutrient list shape differs
/// between the search API (`nutrientId`/`value`) and the bulk Foundation
/// Foods dumps (`nutrient.id`/`amount`); both are accepted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsdaFood {
    pub description: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<UsdaNutrient>,
    pub food_category: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsdaNutrient {
    pub nutrient_id: Option<u32>,
    pub nutrient: Option<UsdaNutrientRef>,
    pub value: Option<f64>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsdaNutrientRef {
    pub id: Option<u32>,
}

impl UsdaFood {
    fn numeric(&self, id: u32) -> Option<f64> {
        self.food_nutrients
            .iter()
            .find(|n| {
                n.nutrient_id == Some(id)
                    || n.nutrient.as_ref().and_then(|r| r.id) == Some(id)
            })
            .and_then(|n| n.value.or(n.amount))
            .filter(|v| v.is_finite())
    }

    fn category(&self) -> String {
        match &self.food_category {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Object(map)) => map
                .get("description")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(FoodRecord::default_category),
            _ => FoodRecord::default_category(),
        }
    }

    pub(crate) fn simplify(&self, source: Source) -> FoodRecord {
        FoodRecord {
            name: self
                .description
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            calories: self.numeric(NUTRIENT_CALORIES).unwrap_or(0.0),
            protein: self.numeric(NUTRIENT_PROTEIN).unwrap_or(0.0),
            carbs: self.numeric(NUTRIENT_CARBS).unwrap_or(0.0),
            fats: self.numeric(NUTRIENT_FATS).unwrap_or(0.0),
            category: self.category(),
            source,
            fiber: self.numeric(NUTRIENT_FIBER),
            sugar: self.numeric(NUTRIENT_SUGAR),
            sodium: self.numeric(NUTRIENT_SODIUM),
        }
    }
}

/// External FoodData Central adapter. Without an API key the adapter stays
/// silent (always-empty results) rather than failing the search.
pub struct UsdaApiAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl UsdaApiAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Detail lookup for one food by FDC id, used by the food-details
    /// passthrough endpoint.
    pub async fn fetch_details(&self, fdc_id: u64) -> Result<FoodRecord, CoreError> {
        let mut request = self.client.get(format!("{}/food/{}", self.base_url, fdc_id));
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }
        let response = request
            .send()
            .await
            .map_err(|err| CoreError::Internal(err.into()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CoreError::not_found("Food not found"));
        }
        let food: UsdaFood = response
            .error_for_status()
            .map_err(|err| CoreError::Internal(err.into()))?
            .json()
            .await
            .map_err(|err| CoreError::Internal(err.into()))?;
        Ok(food.simplify(Source::External))
    }
}

#[async_trait]
impl FoodSourceAdapter for UsdaApiAdapter {
    fn source(&self) -> Source {
        Source::External
    }

    async fn search(&self, term: &str) -> anyhow::Result<Vec<FoodRecord>> {
        let Some(key) = &self.api_key else {
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(format!("{}/foods/search", self.base_url))
            .query(&[
                ("query", term),
                ("api_key", key.as_str()),
                ("pageSize", SEARCH_PAGE_SIZE),
            ])
            .query(&[("dataType", "Foundation"), ("dataType", "SR Legacy")])
            .send()
            .await?
            .error_for_status()?;

        let body: UsdaSearchResponse = response.json().await?;
        Ok(body
            .foods
            .iter()
            .map(|food| food.simplify(Source::External))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplify_extracts_search_api_nutrients() {
        let food: UsdaFood = serde_json::from_value(serde_json::json!({
            "description": "Banana, raw",
            "foodCategory": "Fruits",
            "foodNutrients": [
                { "nutrientId": 1008, "value": 89.0 },
                { "nutrientId": 1003, "value": 1.1 },
                { "nutrientId": 1005, "value": 23.0 },
                { "nutrientId": 1004, "value": 0.3 },
                { "nutrientId": 1079, "value": 2.6 }
            ]
        }))
        .expect("deserialize");
        let record = food.simplify(Source::External);
        assert_eq!(record.name, "Banana, raw");
        assert_eq!(record.calories, 89.0);
        assert_eq!(record.protein, 1.1);
        assert_eq!(record.category, "Fruits");
        assert_eq!(record.fiber, Some(2.6));
        assert_eq!(record.sugar, None);
        assert_eq!(record.source, Source::External);
    }

    #[test]
    fn simplify_accepts_foundation_dump_shape() {
        let food: UsdaFood = serde_json::from_value(serde_json::json!({
            "description": "Broccoli, raw",
            "foodCategory": { "description": "Vegetables" },
            "foodNutrients": [
                { "nutrient": { "id": 1008 }, "amount": 34.0 },
                { "nutrient": { "id": 1003 }, "amount": 2.8 }
            ]
        }))
        .expect("deserialize");
        let record = food.simplify(Source::External);
        assert_eq!(record.calories, 34.0);
        assert_eq!(record.protein, 2.8);
        assert_eq!(record.category, "Vegetables");
    }

    #[test]
    fn simplify_defaults_missing_fields() {
        let food: UsdaFood =
            serde_json::from_value(serde_json::json!({})).expect("deserialize");
        let record = food.simplify(Source::External);
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.calories, 0.0);
        assert_eq!(record.category, "general");
    }

    #[tokio::test]
    async fn keyless_adapter_degrades_to_empty() {
        let adapter = UsdaApiAdapter::new(
            "https://api.nal.usda.gov/fdc/v1",
            None,
            Duration::from_secs(5),
        )
        .expect("build adapter");
        let records = adapter.search("banana").await.expect("search");
        assert!(records.is_empty());
    }
}
