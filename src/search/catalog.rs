use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::ledger::model::coerce_macro;
use crate::search::record::{FoodRecord, Source};

/// A user-contributed food. Name is unique across the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFood {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub category: String,
    pub brand: String,
    pub serving_size: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl CatalogFood {
    pub fn into_record(self) -> FoodRecord {
        FoodRecord {
            name: self.name,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fats: self.fats,
            category: self.category,
            source: Source::UserDb,
            fiber: None,
            sugar: None,
            sodium: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatalogFood {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub serving_size: Option<String>,
}

impl NewCatalogFood {
    fn into_food(self, now: OffsetDateTime) -> Result<CatalogFood, CoreError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::validation("Food name is required"));
        }
        Ok(CatalogFood {
            name,
            calories: coerce_macro(self.calories),
            protein: coerce_macro(self.protein),
            carbs: coerce_macro(self.carbs),
            fats: coerce_macro(self.fats),
            category: self.category.unwrap_or_else(|| "general".to_string()),
            brand: self.brand.unwrap_or_default(),
            serving_size: self.serving_size.unwrap_or_else(|| "100g".to_string()),
            created_at: now,
        })
    }
}

/// Persistence seam for the user food database behind the userdb adapter.
#[async_trait]
pub trait FoodCatalog: Send + Sync {
    async fn search_by_name(&self, term: &str, limit: i64) -> anyhow::Result<Vec<CatalogFood>>;
    async fn insert(&self, food: NewCatalogFood) -> Result<CatalogFood, CoreError>;
    async fn count(&self) -> anyhow::Result<i64>;
}

const DUPLICATE_FOOD_MESSAGE: &str = "Food already exists in database";

#[derive(Default)]
pub struct MemoryFoodCatalog {
    foods: RwLock<Vec<CatalogFood>>,
}

impl MemoryFoodCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FoodCatalog for MemoryFoodCatalog {
    async fn search_by_name(&self, term: &str, limit: i64) -> anyhow::Result<Vec<CatalogFood>> {
        let needle = term.to_lowercase();
        let foods = self.foods.read().await;
        Ok(foods
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn insert(&self, food: NewCatalogFood) -> Result<CatalogFood, CoreError> {
        let food = food.into_food(OffsetDateTime::now_utc())?;
        let mut foods = self.foods.write().await;
        if foods.iter().any(|f| f.name == food.name) {
            return Err(CoreError::validation(DUPLICATE_FOOD_MESSAGE));
        }
        foods.push(food.clone());
        Ok(food)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.foods.read().await.len() as i64)
    }
}

pub struct PgFoodCatalog {
    pool: PgPool,
}

impl PgFoodCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CATALOG_COLUMNS: &str =
    "name, calories, protein, carbs, fats, category, brand, serving_size, created_at";

#[async_trait]
impl FoodCatalog for PgFoodCatalog {
    async fn search_by_name(&self, term: &str, limit: i64) -> anyhow::Result<Vec<CatalogFood>> {
        let rows = sqlx::query_as::<_, CatalogFood>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM user_foods WHERE name ILIKE $1 ORDER BY name LIMIT $2"
        ))
        .bind(format!("%{term}%"))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, food: NewCatalogFood) -> Result<CatalogFood, CoreError> {
        let food = food.into_food(OffsetDateTime::now_utc())?;
        let result = sqlx::query_as::<_, CatalogFood>(&format!(
            r#"
            INSERT INTO user_foods (name, calories, protein, carbs, fats, category, brand, serving_size, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {CATALOG_COLUMNS}
            "#
        ))
        .bind(&food.name)
        .bind(food.calories)
        .bind(food.protein)
        .bind(food.carbs)
        .bind(food.fats)
        .bind(&food.category)
        .bind(&food.brand)
        .bind(&food.serving_size)
        .bind(food.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                Err(CoreError::validation(DUPLICATE_FOOD_MESSAGE))
            }
            Err(err) => Err(CoreError::Internal(err.into())),
        }
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_foods")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

const COMMON_FOODS: &[(&str, f64, f64, f64, f64, &str)] = &[
    ("Chicken Breast", 165.0, 31.0, 0.0, 3.6, "protein"),
    ("Brown Rice", 112.0, 2.6, 22.0, 0.9, "grain"),
    ("Broccoli", 25.0, 3.0, 5.0, 0.3, "vegetable"),
    ("Salmon", 208.0, 22.0, 0.0, 12.0, "protein"),
    ("Sweet Potato", 86.0, 1.6, 20.0, 0.1, "vegetable"),
    ("Greek Yogurt", 100.0, 10.0, 6.0, 0.4, "dairy"),
    ("Almonds", 579.0, 21.0, 22.0, 50.0, "nuts"),
    ("Banana", 89.0, 1.1, 23.0, 0.3, "fruit"),
    ("Oatmeal", 68.0, 2.4, 12.0, 1.4, "grain"),
    ("Eggs", 155.0, 13.0, 1.1, 11.0, "protein"),
    ("Spinach", 7.0, 0.9, 1.1, 0.1, "vegetable"),
    ("Avocado", 160.0, 2.0, 9.0, 15.0, "fruit"),
    ("Quinoa", 120.0, 4.4, 22.0, 1.9, "grain"),
    ("Turkey Breast", 135.0, 30.0, 0.0, 1.0, "protein"),
    ("Cottage Cheese", 98.0, 11.0, 3.4, 4.3, "dairy"),
];

/// Seeds the catalog with common foods so searches work out of the box.
/// Only runs against an empty catalog; individual failures are logged and
/// skipped.
pub async fn seed_common_foods(catalog: &dyn FoodCatalog) -> anyhow::Result<()> {
    if catalog.count().await? > 0 {
        return Ok(());
    }
    for &(name, calories, protein, carbs, fats, category) in COMMON_FOODS {
        let food = NewCatalogFood {
            name: name.to_string(),
            calories,
            protein,
            carbs,
            fats,
            category: Some(category.to_string()),
            brand: None,
            serving_size: None,
        };
        if let Err(err) = catalog.insert(food).await {
            warn!(food = name, error = %err, "failed to seed food");
        }
    }
    info!("food database initialized with common foods");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_food(name: &str) -> NewCatalogFood {
        NewCatalogFood {
            name: name.to_string(),
            calories: 100.0,
            protein: 10.0,
            carbs: 5.0,
            fats: 2.0,
            category: None,
            brand: None,
            serving_size: None,
        }
    }

    #[tokio::test]
    async fn insert_applies_defaults() {
        let catalog = MemoryFoodCatalog::new();
        let food = catalog.insert(new_food("Tofu")).await.expect("insert");
        assert_eq!(food.category, "general");
        assert_eq!(food.brand, "");
        assert_eq!(food.serving_size, "100g");
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_name() {
        let catalog = MemoryFoodCatalog::new();
        catalog.insert(new_food("Tofu")).await.expect("insert");
        let err = catalog.insert(new_food("Tofu")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(catalog.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn insert_rejects_blank_name() {
        let catalog = MemoryFoodCatalog::new();
        let err = catalog.insert(new_food("  ")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn search_matches_substring_case_insensitive() {
        let catalog = MemoryFoodCatalog::new();
        catalog.insert(new_food("Greek Yogurt")).await.expect("insert");
        catalog.insert(new_food("Banana")).await.expect("insert");
        let found = catalog.search_by_name("yogurt", 10).await.expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Greek Yogurt");
    }

    #[tokio::test]
    async fn search_honors_limit() {
        let catalog = MemoryFoodCatalog::new();
        for i in 0..8 {
            catalog
                .insert(new_food(&format!("Bar {i}")))
                .await
                .expect("insert");
        }
        let found = catalog.search_by_name("bar", 5).await.expect("search");
        assert_eq!(found.len(), 5);
    }

    #[tokio::test]
    async fn seed_fills_empty_catalog_only_once() {
        let catalog = MemoryFoodCatalog::new();
        seed_common_foods(&catalog).await.expect("seed");
        let seeded = catalog.count().await.expect("count");
        assert_eq!(seeded, COMMON_FOODS.len() as i64);

        seed_common_foods(&catalog).await.expect("seed again");
        assert_eq!(catalog.count().await.expect("count"), seeded);
    }
}
