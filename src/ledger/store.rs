use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ledger::model::{DailyLedger, DayKey};

/// Persistence seam for daily ledgers, keyed by calendar day.
///
/// `try_create` is the unique-constraint primitive behind idempotent
/// get-or-create: exactly one concurrent creator wins and the losers re-read.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find(&self, date: &DayKey) -> anyhow::Result<Option<DailyLedger>>;

    /// Inserts only when no ledger exists for the date. Returns whether this
    /// call created the row.
    async fn try_create(&self, ledger: &DailyLedger) -> anyhow::Result<bool>;

    /// Atomic create-or-replace keyed by date.
    async fn upsert(&self, ledger: &DailyLedger) -> anyhow::Result<DailyLedger>;

    /// Ledgers with `start <= date <= end`, ordered by date ascending.
    async fn find_range(&self, start: &DayKey, end: &DayKey) -> anyhow::Result<Vec<DailyLedger>>;

    /// The most recent ledger strictly before `date`, if any.
    async fn find_latest_before(&self, date: &DayKey) -> anyhow::Result<Option<DailyLedger>>;
}

/// In-memory store: backs the no-database fallback deployment and unit tests.
#[derive(Default)]
pub struct MemoryLedgerStore {
    ledgers: RwLock<HashMap<DayKey, DailyLedger>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn find(&self, date: &DayKey) -> anyhow::Result<Option<DailyLedger>> {
        Ok(self.ledgers.read().await.get(date).cloned())
    }

    async fn try_create(&self, ledger: &DailyLedger) -> anyhow::Result<bool> {
        let mut map = self.ledgers.write().await;
        if map.contains_key(&ledger.date) {
            return Ok(false);
        }
        map.insert(ledger.date.clone(), ledger.clone());
        Ok(true)
    }

    async fn upsert(&self, ledger: &DailyLedger) -> anyhow::Result<DailyLedger> {
        self.ledgers
            .write()
            .await
            .insert(ledger.date.clone(), ledger.clone());
        Ok(ledger.clone())
    }

    async fn find_range(&self, start: &DayKey, end: &DayKey) -> anyhow::Result<Vec<DailyLedger>> {
        let map = self.ledgers.read().await;
        let mut rows: Vec<DailyLedger> = map
            .values()
            .filter(|l| l.date >= *start && l.date <= *end)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }

    async fn find_latest_before(&self, date: &DayKey) -> anyhow::Result<Option<DailyLedger>> {
        let map = self.ledgers.read().await;
        Ok(map
            .values()
            .filter(|l| l.date < *date)
            .max_by(|a, b| a.date.cmp(&b.date))
            .cloned())
    }
}
