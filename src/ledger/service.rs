use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::ledger::dto::FoodInput;
use crate::ledger::model::{DailyLedger, DayKey, FoodEntry, Macros, ScalingMode};
use crate::ledger::store::LedgerStore;

/// Totals and averages of consumed macros over the trailing week.
/// Averages divide by the number of ledgers found, not by seven.
#[derive(Debug, Clone)]
pub struct WeeklySummary {
    pub days: usize,
    pub totals: Macros,
    pub averages: Macros,
    pub daily_logs: Vec<DailyLedger>,
}

/// Single source of truth for per-day logs. All mutations of one date are
/// serialized behind a per-date mutex held for the whole read-modify-write
/// cycle; distinct dates proceed in parallel.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    scaling: ScalingMode,
    goal_rollover: bool,
    locks: Mutex<HashMap<DayKey, Arc<Mutex<()>>>>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, scaling: ScalingMode, goal_rollover: bool) -> Self {
        Self {
            store,
            scaling,
            goal_rollover,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_date(&self, date: &DayKey) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.locks.lock().await;
            Arc::clone(
                map.entry(date.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        mutex.lock_owned().await
    }

    pub async fn get_or_create(&self, date: &DayKey) -> Result<DailyLedger, CoreError> {
        let _guard = self.lock_date(date).await;
        self.load_or_create(date).await
    }

    /// Caller must hold the per-date lock. Idempotent under cross-process
    /// races: the store's create-if-absent decides a single winner and the
    /// loser re-reads the winner's row.
    async fn load_or_create(&self, date: &DayKey) -> Result<DailyLedger, CoreError> {
        if let Some(ledger) = self.store.find(date).await? {
            return Ok(ledger);
        }

        let goals = if self.goal_rollover {
            match self.store.find_latest_before(date).await? {
                Some(previous) => previous.goals,
                None => Macros::default_goals(),
            }
        } else {
            Macros::default_goals()
        };

        let ledger = DailyLedger::new(date.clone(), goals, OffsetDateTime::now_utc());
        if self.store.try_create(&ledger).await? {
            debug!(date = %ledger.date, "created daily log");
            return Ok(ledger);
        }

        self.store.find(date).await?.ok_or_else(|| {
            CoreError::Conflict(format!(
                "daily log for {date} missing after losing create race"
            ))
        })
    }

    pub async fn add_entry(
        &self,
        date: &DayKey,
        input: FoodInput,
    ) -> Result<DailyLedger, CoreError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::validation("Food name is required"));
        }

        let base =
            Macros::new(input.calories, input.protein, input.carbs, input.fats).sanitized();
        if base.is_zero() {
            return Err(CoreError::validation(
                "At least one nutritional value is required",
            ));
        }

        let amount = match input.amount {
            None => self.scaling.default_amount(),
            Some(a) if a.is_finite() && a > 0.0 => a,
            Some(_) => {
                return Err(CoreError::validation(
                    "Quantity or weight must be greater than zero",
                ))
            }
        };
        let effective = base.scale(amount / self.scaling.scale_unit());

        let _guard = self.lock_date(date).await;
        let mut ledger = self.load_or_create(date).await?;

        let now = OffsetDateTime::now_utc();
        let entry = FoodEntry {
            id: Uuid::new_v4(),
            name,
            calories: effective.calories,
            protein: effective.protein,
            carbs: effective.carbs,
            fats: effective.fats,
            quantity_or_weight: amount,
            timestamp: now,
        };
        ledger.consumed.add(&entry.macros());
        ledger.entries.push(entry);
        ledger.updated_at = now;

        Ok(self.store.upsert(&ledger).await?)
    }

    pub async fn remove_entry(
        &self,
        date: &DayKey,
        entry_id: Uuid,
    ) -> Result<DailyLedger, CoreError> {
        let _guard = self.lock_date(date).await;
        let Some(mut ledger) = self.store.find(date).await? else {
            return Err(CoreError::not_found("Daily log not found"));
        };
        let Some(position) = ledger.entries.iter().position(|e| e.id == entry_id) else {
            return Err(CoreError::not_found("Food entry not found"));
        };

        // Subtract the stored entry values, never recomputed ones, so the
        // totals cannot drift from what the add put in.
        let entry = ledger.entries.remove(position);
        ledger.consumed.subtract_clamped(&entry.macros());
        ledger.updated_at = OffsetDateTime::now_utc();

        Ok(self.store.upsert(&ledger).await?)
    }

    pub async fn set_goals(&self, date: &DayKey, goals: Macros) -> Result<DailyLedger, CoreError> {
        let _guard = self.lock_date(date).await;
        let mut ledger = self.load_or_create(date).await?;
        ledger.goals = goals.sanitized();
        ledger.updated_at = OffsetDateTime::now_utc();
        Ok(self.store.upsert(&ledger).await?)
    }

    pub async fn clear(&self, date: &DayKey) -> Result<DailyLedger, CoreError> {
        let _guard = self.lock_date(date).await;
        let mut ledger = self.load_or_create(date).await?;
        ledger.entries.clear();
        ledger.consumed = Macros::default();
        ledger.updated_at = OffsetDateTime::now_utc();
        Ok(self.store.upsert(&ledger).await?)
    }

    /// Rolls up the trailing 7 calendar days ending at `end` (inclusive).
    /// Days with no ledger are absent from both totals and the averages'
    /// denominator; zero ledgers in range yields all zeros.
    pub async fn weekly_summary(&self, end: &DayKey) -> Result<WeeklySummary, CoreError> {
        let start = end.days_before(6);
        let daily_logs = self.store.find_range(&start, end).await?;

        let mut totals = Macros::default();
        for log in &daily_logs {
            totals.add(&log.consumed);
        }
        let averages = if daily_logs.is_empty() {
            Macros::default()
        } else {
            totals.scale(1.0 / daily_logs.len() as f64)
        };

        Ok(WeeklySummary {
            days: daily_logs.len(),
            totals,
            averages,
            daily_logs,
        })
    }
}
