use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::CoreError;
use crate::search::adapters::FoodSourceAdapter;
use crate::search::record::FoodRecord;

/// Cap per adapter before merging, so one noisy source cannot crowd out
/// the others.
pub const PER_SOURCE_CAP: usize = 8;
/// Cap on the merged, de-duplicated result list.
pub const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub foods: Vec<FoodRecord>,
    /// Dominant source label for display: the first record's source, or
    /// "none" when nothing matched.
    pub source: String,
}

/// Fans a query out to every configured adapter, then merges the answers
/// into one bounded, de-duplicated list in source-priority order.
pub struct SearchEngine {
    adapters: Vec<Arc<dyn FoodSourceAdapter>>,
    timeout: Duration,
}

impl SearchEngine {
    pub fn new(mut adapters: Vec<Arc<dyn FoodSourceAdapter>>, timeout: Duration) -> Self {
        adapters.sort_by_key(|a| a.priority());
        Self { adapters, timeout }
    }

    pub async fn search(&self, raw_query: &str) -> Result<SearchResults, CoreError> {
        let query = raw_query.trim().to_lowercase();
        if query.is_empty() {
            return Err(CoreError::validation("Search query is required"));
        }

        let mut handles = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let term = query.clone();
            let timeout = self.timeout;
            handles.push(tokio::spawn(async move {
                let source = adapter.source();
                match tokio::time::timeout(timeout, adapter.search(&term)).await {
                    Ok(Ok(records)) => records,
                    Ok(Err(err)) => {
                        warn!(%source, error = %err, "food source search failed");
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(%source, timeout_ms = timeout.as_millis() as u64, "food source search timed out");
                        Vec::new()
                    }
                }
            }));
        }

        // The tasks run concurrently; awaiting them in adapter order keeps
        // the merge in priority order.
        let mut merged = Vec::new();
        for handle in handles {
            let mut records: Vec<FoodRecord> = match handle.await {
                Ok(records) => records
                    .into_iter()
                    .filter_map(FoodRecord::sanitized)
                    .collect(),
                Err(err) => {
                    warn!(error = %err, "food source task aborted");
                    Vec::new()
                }
            };
            records.truncate(PER_SOURCE_CAP);
            merged.extend(records);
        }

        // First record seen for a key wins, so higher-priority sources
        // decide which duplicate survives.
        let mut seen = HashSet::new();
        let mut foods = Vec::new();
        for record in merged {
            if seen.insert(record.dedup_key()) {
                foods.push(record);
            }
        }
        foods.truncate(MAX_RESULTS);

        let source = foods
            .first()
            .map(|f| f.source.label().to_string())
            .unwrap_or_else(|| "none".to_string());
        Ok(SearchResults { foods, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::record::Source;
    use anyhow::bail;
    use async_trait::async_trait;

    struct StubAdapter {
        source: Source,
        priority: u8,
        records: Vec<FoodRecord>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl StubAdapter {
        fn new(source: Source, records: Vec<FoodRecord>) -> Self {
            Self {
                source,
                priority: source.priority(),
                records,
                fail: false,
                delay: None,
            }
        }

        fn failing(source: Source) -> Self {
            Self {
                fail: true,
                ..Self::new(source, Vec::new())
            }
        }
    }

    #[async_trait]
    impl FoodSourceAdapter for StubAdapter {
        fn source(&self) -> Source {
            self.source
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        async fn search(&self, _term: &str) -> anyhow::Result<Vec<FoodRecord>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                bail!("adapter exploded");
            }
            Ok(self.records.clone())
        }
    }

    fn record(name: &str, source: Source) -> FoodRecord {
        FoodRecord {
            name: name.to_string(),
            calories: 50.0,
            protein: 1.0,
            carbs: 10.0,
            fats: 0.5,
            category: FoodRecord::default_category(),
            source,
            fiber: None,
            sugar: None,
            sodium: None,
        }
    }

    fn engine(adapters: Vec<Arc<dyn FoodSourceAdapter>>) -> SearchEngine {
        SearchEngine::new(adapters, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let results = engine(vec![]).search("   ").await;
        assert!(matches!(results, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicates_collapse_to_higher_priority_source() {
        let userdb = StubAdapter::new(Source::UserDb, vec![record("Apple, raw", Source::UserDb)]);
        let local = StubAdapter::new(Source::Local, vec![record("apple raw!", Source::Local)]);
        let results = engine(vec![Arc::new(userdb), Arc::new(local)])
            .search("apple")
            .await
            .expect("search");
        assert_eq!(results.foods.len(), 1);
        assert_eq!(results.foods[0].source, Source::UserDb);
        assert_eq!(results.source, "userdb");
    }

    #[tokio::test]
    async fn merge_order_follows_priority_not_registration_order() {
        let external = StubAdapter::new(Source::External, vec![record("Kiwi A", Source::External)]);
        let userdb = StubAdapter::new(Source::UserDb, vec![record("Kiwi B", Source::UserDb)]);
        // Registered external-first; priority must still put userdb first.
        let results = engine(vec![Arc::new(external), Arc::new(userdb)])
            .search("kiwi")
            .await
            .expect("search");
        assert_eq!(results.foods[0].source, Source::UserDb);
        assert_eq!(results.foods[1].source, Source::External);
    }

    #[tokio::test]
    async fn failing_adapter_degrades_to_partial_results() {
        let local = StubAdapter::new(Source::Local, vec![record("Banana, raw", Source::Local)]);
        let external = StubAdapter::failing(Source::External);
        let results = engine(vec![Arc::new(local), Arc::new(external)])
            .search("banana")
            .await
            .expect("search");
        assert_eq!(results.foods.len(), 1);
        assert_eq!(results.foods[0].source, Source::Local);
    }

    #[tokio::test]
    async fn all_adapters_failing_yields_empty_not_error() {
        let results = engine(vec![
            Arc::new(StubAdapter::failing(Source::Local)),
            Arc::new(StubAdapter::failing(Source::External)),
        ])
        .search("banana")
        .await
        .expect("search");
        assert!(results.foods.is_empty());
        assert_eq!(results.source, "none");
    }

    #[tokio::test]
    async fn slow_adapter_times_out_without_blocking_fast_sources() {
        let mut slow = StubAdapter::new(
            Source::External,
            vec![record("Slow result", Source::External)],
        );
        slow.delay = Some(Duration::from_secs(30));
        let local = StubAdapter::new(Source::Local, vec![record("Fast result", Source::Local)]);

        let engine = SearchEngine::new(
            vec![Arc::new(local), Arc::new(slow)],
            Duration::from_millis(50),
        );
        let results = engine.search("result").await.expect("search");
        assert_eq!(results.foods.len(), 1);
        assert_eq!(results.foods[0].name, "Fast result");
    }

    #[tokio::test]
    async fn per_source_cap_bounds_noisy_adapters() {
        let noisy: Vec<FoodRecord> = (0..20)
            .map(|i| record(&format!("Cereal {i}"), Source::External))
            .collect();
        let results = engine(vec![Arc::new(StubAdapter::new(Source::External, noisy))])
            .search("cereal")
            .await
            .expect("search");
        assert_eq!(results.foods.len(), PER_SOURCE_CAP);
    }

    #[tokio::test]
    async fn merged_results_are_bounded_in_priority_order() {
        let userdb: Vec<FoodRecord> = (0..8)
            .map(|i| record(&format!("Soup U{i}"), Source::UserDb))
            .collect();
        let local: Vec<FoodRecord> = (0..16)
            .map(|i| record(&format!("Soup L{i}"), Source::Local))
            .collect();
        let external: Vec<FoodRecord> = (0..16)
            .map(|i| record(&format!("Soup E{i}"), Source::External))
            .collect();

        let results = engine(vec![
            Arc::new(StubAdapter::new(Source::Local, local)),
            Arc::new(StubAdapter::new(Source::External, external)),
            Arc::new(StubAdapter::new(Source::UserDb, userdb)),
        ])
        .search("soup")
        .await
        .expect("search");

        assert_eq!(results.foods.len(), MAX_RESULTS);
        // Highest-priority source fills the front of the bounded list.
        assert!(results.foods[..8].iter().all(|f| f.source == Source::UserDb));
        assert_eq!(results.source, "userdb");
    }
}
