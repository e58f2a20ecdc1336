use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::ledger::pg::PgLedgerStore;
use crate::ledger::service::LedgerService;
use crate::ledger::store::{LedgerStore, MemoryLedgerStore};
use crate::search::adapters::{
    FoodSourceAdapter, LocalDatasetAdapter, UsdaApiAdapter, UserFoodAdapter,
};
use crate::search::catalog::{FoodCatalog, MemoryFoodCatalog, PgFoodCatalog};
use crate::search::engine::SearchEngine;

#[derive(Clone)]
pub struct AppState {
    pub ledgers: Arc<LedgerService>,
    pub engine: Arc<SearchEngine>,
    pub catalog: Arc<dyn FoodCatalog>,
    pub usda: Arc<UsdaApiAdapter>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (store, catalog): (Arc<dyn LedgerStore>, Arc<dyn FoodCatalog>) =
            match &config.database_url {
                Some(url) => {
                    let db = PgPoolOptions::new()
                        .max_connections(10)
                        .connect(url)
                        .await
                        .context("connect to database")?;
                    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                        tracing::warn!(error = %e, "migration failed; continuing");
                    }
                    (
                        Arc::new(PgLedgerStore::new(db.clone())) as Arc<dyn LedgerStore>,
                        Arc::new(PgFoodCatalog::new(db)) as Arc<dyn FoodCatalog>,
                    )
                }
                None => {
                    tracing::warn!("DATABASE_URL not set; using in-memory storage");
                    (
                        Arc::new(MemoryLedgerStore::new()) as Arc<dyn LedgerStore>,
                        Arc::new(MemoryFoodCatalog::new()) as Arc<dyn FoodCatalog>,
                    )
                }
            };

        Self::assemble(store, catalog, config)
    }

    pub fn assemble(
        store: Arc<dyn LedgerStore>,
        catalog: Arc<dyn FoodCatalog>,
        config: Arc<AppConfig>,
    ) -> anyhow::Result<Self> {
        let local = match &config.local_foods_file {
            Some(path) => LocalDatasetAdapter::from_json_file(Path::new(path)),
            None => LocalDatasetAdapter::builtin(),
        };
        let usda = Arc::new(UsdaApiAdapter::new(
            config.usda_base_url.clone(),
            config.usda_api_key.clone(),
            config.search_timeout(),
        )?);

        let adapters: Vec<Arc<dyn FoodSourceAdapter>> = vec![
            Arc::new(UserFoodAdapter::new(Arc::clone(&catalog))),
            Arc::new(local),
            Arc::clone(&usda) as Arc<dyn FoodSourceAdapter>,
        ];
        let engine = Arc::new(SearchEngine::new(adapters, config.search_timeout()));
        let ledgers = Arc::new(LedgerService::new(
            store,
            config.scaling_mode,
            config.goal_rollover,
        ));

        Ok(Self {
            ledgers,
            engine,
            catalog,
            usda,
        })
    }
}
