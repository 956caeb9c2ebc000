//! PostgreSQL entry store.

use crate::models::{BhartiPair, LedgerEntry, NewEntry, LEGACY_ITEM, SYSTEM_ACTOR};
use crate::services::aggregation::DateTotals;
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{not_found, EntryOrder, EntryStore};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};

/// Column list shared by every read. `id` is cast so tables created with a
/// 32-bit SERIAL decode the same way.
const ENTRY_COLUMNS: &str = "id::BIGINT AS id, entry_date, name, bags, bharti_pairs, weight, \
     rate, lessrate, amount, commission, other_amount, total, quality, item, market_fee, \
     is_marked, created_at, updated_at, created_by, updated_by";

/// Raw row. Columns added after the first release are nullable on old rows;
/// defaults are filled in here and nowhere else.
#[derive(Debug, FromRow)]
struct EntryRow {
    id: i64,
    entry_date: NaiveDate,
    name: String,
    bags: i32,
    bharti_pairs: Json<Vec<BhartiPair>>,
    weight: Decimal,
    rate: Decimal,
    lessrate: Option<Decimal>,
    amount: Decimal,
    commission: Decimal,
    other_amount: Option<i32>,
    total: Decimal,
    quality: String,
    item: Option<String>,
    market_fee: i32,
    is_marked: Option<bool>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    updated_by: Option<String>,
}

impl From<EntryRow> for LedgerEntry {
    fn from(row: EntryRow) -> Self {
        let created_at = row.created_at.unwrap_or_default();
        LedgerEntry {
            id: row.id,
            entry_date: row.entry_date,
            name: row.name,
            bags: row.bags,
            bharti_pairs: row.bharti_pairs.0,
            weight: row.weight,
            rate: row.rate,
            lessrate: row.lessrate.unwrap_or(Decimal::ZERO),
            amount: row.amount,
            commission: row.commission,
            other_amount: row.other_amount.unwrap_or(0),
            total: row.total,
            quality: row.quality.trim_end().to_string(),
            item: row.item.unwrap_or_else(|| LEGACY_ITEM.to_string()),
            market_fee: row.market_fee,
            is_marked: row.is_marked.unwrap_or(false),
            created_at,
            updated_at: row.updated_at.unwrap_or(created_at),
            created_by: row.created_by.unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
            updated_by: row.updated_by.unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
        }
    }
}

fn order_clause(order: EntryOrder) -> &'static str {
    match order {
        EntryOrder::CreatedDesc => "ORDER BY created_at DESC, id DESC",
        EntryOrder::EntryDateDesc => "ORDER BY entry_date DESC, created_at DESC, id DESC",
        EntryOrder::AsRequested => "ORDER BY array_position($1::BIGINT[], id::BIGINT)",
    }
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "entry-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    #[instrument(skip(self, entry), fields(name = %entry.name, entry_date = %entry.entry_date))]
    async fn create(&self, entry: NewEntry) -> Result<LedgerEntry, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_entry"])
            .start_timer();

        let sql = format!(
            r#"
            INSERT INTO entries (entry_date, name, bags, bharti_pairs, weight, rate, lessrate,
                amount, commission, other_amount, total, quality, item, market_fee,
                created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );

        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(entry.entry_date)
            .bind(&entry.name)
            .bind(entry.bags)
            .bind(Json(&entry.bharti_pairs))
            .bind(entry.weight)
            .bind(entry.rate)
            .bind(entry.lessrate)
            .bind(entry.amount)
            .bind(entry.commission)
            .bind(entry.other_amount)
            .bind(entry.total)
            .bind(&entry.quality)
            .bind(&entry.item)
            .bind(entry.market_fee)
            .bind(&entry.actor)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to create entry"))?;

        timer.observe_duration();

        info!(entry_id = row.id, total = %row.total, "Entry created");

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<LedgerEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_entries"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM entries {}",
            ENTRY_COLUMNS,
            order_clause(EntryOrder::CreatedDesc)
        );
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list entries"))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<LedgerEntry, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_entry"])
            .start_timer();

        let sql = format!("SELECT {} FROM entries WHERE id = $1", ENTRY_COLUMNS);
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get entry"))?;

        timer.observe_duration();

        row.map(LedgerEntry::from).ok_or_else(|| not_found(id))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_many(
        &self,
        ids: &[i64],
        order: EntryOrder,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_entries"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM entries WHERE id = ANY($1) {}",
            ENTRY_COLUMNS,
            order_clause(order)
        );
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to fetch entries"))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<LedgerEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_entries_by_date"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM entries WHERE entry_date = $1 {}",
            ENTRY_COLUMNS,
            order_clause(EntryOrder::CreatedDesc)
        );
        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list entries by date"))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    #[instrument(skip(self, entry))]
    async fn update(&self, id: i64, entry: NewEntry) -> Result<LedgerEntry, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_entry"])
            .start_timer();

        let sql = format!(
            r#"
            UPDATE entries
            SET entry_date = $1, name = $2, bags = $3, bharti_pairs = $4, weight = $5,
                rate = $6, lessrate = $7, amount = $8, commission = $9, other_amount = $10,
                total = $11, quality = $12, item = $13, market_fee = $14, updated_by = $15,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $16
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        );

        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(entry.entry_date)
            .bind(&entry.name)
            .bind(entry.bags)
            .bind(Json(&entry.bharti_pairs))
            .bind(entry.weight)
            .bind(entry.rate)
            .bind(entry.lessrate)
            .bind(entry.amount)
            .bind(entry.commission)
            .bind(entry.other_amount)
            .bind(entry.total)
            .bind(&entry.quality)
            .bind(&entry.item)
            .bind(entry.market_fee)
            .bind(&entry.actor)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update entry"))?;

        timer.observe_duration();

        let row = row.ok_or_else(|| not_found(id))?;
        info!(entry_id = row.id, total = %row.total, "Entry updated");
        Ok(row.into())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_many(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_entries"])
            .start_timer();

        let deleted = sqlx::query_scalar::<_, i64>(
            "DELETE FROM entries WHERE id = ANY($1) RETURNING id::BIGINT",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to delete entries"))?;

        timer.observe_duration();

        info!(deleted = deleted.len(), "Entries deleted");
        Ok(deleted)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn set_marked(&self, ids: &[i64], marked: bool) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_entries"])
            .start_timer();

        let result = sqlx::query("UPDATE entries SET is_marked = $1 WHERE id = ANY($2)")
            .bind(marked)
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to mark entries"))?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn sum_by_date(&self, date: NaiveDate) -> Result<DateTotals, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sum_by_date"])
            .start_timer();

        let (total_bags, total_weight, total_amount, total_market_fee) =
            sqlx::query_as::<_, (i64, Decimal, Decimal, i64)>(
                r#"
                SELECT
                    COALESCE(SUM(bags), 0)::BIGINT,
                    COALESCE(SUM(weight), 0),
                    COALESCE(SUM(total), 0),
                    COALESCE(SUM(market_fee), 0)::BIGINT
                FROM entries
                WHERE entry_date = $1
                "#,
            )
            .bind(date)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to sum entries"))?;

        timer.observe_duration();

        Ok(DateTotals {
            total_bags,
            total_weight,
            total_amount,
            total_market_fee,
        })
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
