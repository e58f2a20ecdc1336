use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::ledger::model::{DailyLedger, DayKey, FoodEntry, Macros};
use crate::ledger::store::LedgerStore;

/// Postgres-backed ledger store. Each day is one row; goals, consumed and
/// entries live in JSONB columns mirroring the wire shapes.
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct LedgerRow {
    date: String,
    goals: Json<Macros>,
    consumed: Json<Macros>,
    entries: Json<Vec<FoodEntry>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl LedgerRow {
    fn into_ledger(self) -> anyhow::Result<DailyLedger> {
        let date: DayKey = self.date.parse().map_err(anyhow::Error::new)?;
        Ok(DailyLedger {
            date,
            goals: self.goals.0,
            consumed: self.consumed.0,
            entries: self.entries.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "date, goals, consumed, entries, created_at, updated_at";

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn find(&self, date: &DayKey) -> anyhow::Result<Option<DailyLedger>> {
        let row = sqlx::query_as::<_, LedgerRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM daily_logs WHERE date = $1"
        ))
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(LedgerRow::into_ledger).transpose()
    }

    async fn try_create(&self, ledger: &DailyLedger) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_logs (date, goals, consumed, entries, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (date) DO NOTHING
            "#,
        )
        .bind(ledger.date.to_string())
        .bind(Json(&ledger.goals))
        .bind(Json(&ledger.consumed))
        .bind(Json(&ledger.entries))
        .bind(ledger.created_at)
        .bind(ledger.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn upsert(&self, ledger: &DailyLedger) -> anyhow::Result<DailyLedger> {
        let row = sqlx::query_as::<_, LedgerRow>(&format!(
            r#"
            INSERT INTO daily_logs (date, goals, consumed, entries, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (date) DO UPDATE SET
                goals = EXCLUDED.goals,
                consumed = EXCLUDED.consumed,
                entries = EXCLUDED.entries,
                updated_at = EXCLUDED.updated_at
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(ledger.date.to_string())
        .bind(Json(&ledger.goals))
        .bind(Json(&ledger.consumed))
        .bind(Json(&ledger.entries))
        .bind(ledger.created_at)
        .bind(ledger.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.into_ledger()
    }

    async fn find_range(&self, start: &DayKey, end: &DayKey) -> anyhow::Result<Vec<DailyLedger>> {
        let rows = sqlx::query_as::<_, LedgerRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM daily_logs WHERE date >= $1 AND date <= $2 ORDER BY date ASC"
        ))
        .bind(start.to_string())
        .bind(end.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LedgerRow::into_ledger).collect()
    }

    async fn find_latest_before(&self, date: &DayKey) -> anyhow::Result<Option<DailyLedger>> {
        let row = sqlx::query_as::<_, LedgerRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM daily_logs WHERE date < $1 ORDER BY date DESC LIMIT 1"
        ))
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(LedgerRow::into_ledger).transpose()
    }
}
