use std::sync::Arc;

use async_trait::async_trait;

use crate::search::adapters::FoodSourceAdapter;
use crate::search::catalog::{CatalogFood, FoodCatalog};
use crate::search::record::{FoodRecord, Source};

/// How many curated matches one search pulls from the user database.
const USERDB_RESULT_LIMIT: i64 = 5;

/// Adapter over the user-contributed food database.
pub struct UserFoodAdapter {
    catalog: Arc<dyn FoodCatalog>,
}

impl UserFoodAdapter {
    pub fn new(catalog: Arc<dyn FoodCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl FoodSourceAdapter for UserFoodAdapter {
    fn source(&self) -> Source {
        Source::UserDb
    }

    async fn search(&self, term: &str) -> anyhow::Result<Vec<FoodRecord>> {
        let foods = self
            .catalog
            .search_by_name(term, USERDB_RESULT_LIMIT)
            .await?;
        Ok(foods.into_iter().map(CatalogFood::into_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::catalog::{MemoryFoodCatalog, NewCatalogFood};

    #[tokio::test]
    async fn search_maps_catalog_rows_to_userdb_records() {
        let catalog = Arc::new(MemoryFoodCatalog::new());
        catalog
            .insert(NewCatalogFood {
                name: "Greek Yogurt".to_string(),
                calories: 100.0,
                protein: 10.0,
                carbs: 6.0,
                fats: 0.4,
                category: Some("dairy".to_string()),
                brand: None,
                serving_size: None,
            })
            .await
            .expect("insert");

        let adapter = UserFoodAdapter::new(catalog);
        let found = adapter.search("yogurt").await.expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, Source::UserDb);
        assert_eq!(found[0].category, "dairy");
    }
}
