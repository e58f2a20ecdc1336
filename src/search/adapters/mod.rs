mod local;
mod usda;
mod userdb;

pub use local::LocalDatasetAdapter;
pub use usda::UsdaApiAdapter;
pub use userdb::UserFoodAdapter;

use async_trait::async_trait;

use crate::search::record::{FoodRecord, Source};

/// Uniform wrapper around one food-data provider. Implementations may fail
/// or hang; the merge engine isolates them with a catch-and-log plus a
/// timeout, so errors here never surface to the search caller.
#[async_trait]
pub trait FoodSourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// Merge priority; lower-valued adapters merge first and win
    /// de-duplication ties. Defaults to the source's canonical order.
    fn priority(&self) -> u8 {
        self.source().priority()
    }

    async fn search(&self, term: &str) -> anyhow::Result<Vec<FoodRecord>>;
}
