use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::search::adapters::usda::UsdaFood;
use crate::search::adapters::FoodSourceAdapter;
use crate::search::record::{FoodRecord, Source};

/// Bundled fallback dataset, optionally extended from a simplified-foods
/// JSON file on disk. A missing or malformed file degrades to the built-in
/// list, never an error.
pub struct LocalDatasetAdapter {
    foods: Vec<FoodRecord>,
}

impl LocalDatasetAdapter {
    pub fn builtin() -> Self {
        Self {
            foods: builtin_foods(),
        }
    }

    pub fn from_json_file(path: &Path) -> Self {
        let mut foods = builtin_foods();
        match load_simplified_foods(path) {
            Ok(extra) => {
                debug!(path = %path.display(), loaded = extra.len(), "loaded local foods file");
                foods.extend(extra);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "local foods file unavailable");
            }
        }
        Self { foods }
    }
}

#[async_trait]
impl FoodSourceAdapter for LocalDatasetAdapter {
    fn source(&self) -> Source {
        Source::Local
    }

    async fn search(&self, term: &str) -> anyhow::Result<Vec<FoodRecord>> {
        let needle = term.to_lowercase();
        Ok(self
            .foods
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

fn food(name: &str, calories: f64, protein: f64, carbs: f64, fats: f64) -> FoodRecord {
    FoodRecord {
        name: name.to_string(),
        calories,
        protein,
        carbs,
        fats,
        category: FoodRecord::default_category(),
        source: Source::Local,
        fiber: None,
        sugar: None,
        sodium: None,
    }
}

fn builtin_foods() -> Vec<FoodRecord> {
    vec![
        food("Apple, raw", 52.0, 0.3, 14.0, 0.2),
        food("Banana, raw", 89.0, 1.1, 23.0, 0.3),
        food("Orange, raw", 47.0, 0.9, 12.0, 0.1),
        food("Chicken breast, grilled", 165.0, 31.0, 0.0, 3.6),
        food("Rice, white, cooked", 130.0, 2.7, 28.0, 0.3),
        food("Broccoli, raw", 34.0, 2.8, 7.0, 0.4),
        food("Salmon, grilled", 206.0, 22.0, 0.0, 12.0),
        food("Egg, whole, raw", 155.0, 13.0, 1.1, 11.0),
        food("Avocado, raw", 160.0, 2.0, 9.0, 15.0),
        food("Bread, whole wheat", 247.0, 13.0, 41.0, 4.2),
    ]
}

/// Flat-array item shape for pre-simplified food files.
#[derive(Debug, Deserialize)]
struct SimpleFood {
    name: String,
    #[serde(default)]
    calories: f64,
    #[serde(default)]
    protein: f64,
    #[serde(default)]
    carbs: f64,
    #[serde(default)]
    fats: f64,
    category: Option<String>,
}

/// Accepts either a plain array of simplified foods or a raw USDA
/// `{ "FoundationFoods": [...] }` dump; unrecognized items are skipped.
fn load_simplified_foods(path: &Path) -> anyhow::Result<Vec<FoodRecord>> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("FoundationFoods") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut foods = Vec::new();
    for item in items {
        if item.get("foodNutrients").is_some() {
            if let Ok(usda) = serde_json::from_value::<UsdaFood>(item) {
                if let Some(record) = usda.simplify(Source::Local).sanitized() {
                    foods.push(record);
                }
            }
        } else if let Ok(simple) = serde_json::from_value::<SimpleFood>(item) {
            let record = FoodRecord {
                name: simple.name,
                calories: simple.calories,
                protein: simple.protein,
                carbs: simple.carbs,
                fats: simple.fats,
                category: simple
                    .category
                    .unwrap_or_else(FoodRecord::default_category),
                source: Source::Local,
                fiber: None,
                sugar: None,
                sodium: None,
            };
            if let Some(record) = record.sanitized() {
                foods.push(record);
            }
        }
    }
    Ok(foods)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_search_matches_substring_case_insensitive() {
        let adapter = LocalDatasetAdapter::builtin();
        let found = adapter.search("APPLE").await.expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Apple, raw");
        assert_eq!(found[0].source, Source::Local);
    }

    #[tokio::test]
    async fn builtin_search_with_no_match_is_empty() {
        let adapter = LocalDatasetAdapter::builtin();
        let found = adapter.search("zzz-nothing").await.expect("search");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn missing_file_degrades_to_builtin_dataset() {
        let adapter = LocalDatasetAdapter::from_json_file(Path::new("/nonexistent/foods.json"));
        let found = adapter.search("banana").await.expect("search");
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn flat_array_file_extends_dataset() {
        let dir = std::env::temp_dir().join("caltrack-local-foods-test");
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("foods.json");
        std::fs::write(
            &path,
            r#"[{ "name": "Dragonfruit", "calories": 60, "carbs": 13 }, { "name": "" }]"#,
        )
        .expect("write file");

        let adapter = LocalDatasetAdapter::from_json_file(&path);
        let found = adapter.search("dragonfruit").await.expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].calories, 60.0);

        std::fs::remove_file(&path).ok();
    }
}
