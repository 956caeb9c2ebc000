//! Entry repository seam.

use crate::models::{LedgerEntry, NewEntry};
use crate::services::aggregation::DateTotals;
use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrder {
    /// Newest first, id descending as tie-break.
    CreatedDesc,
    /// Latest entry date first, then newest.
    EntryDateDesc,
    /// The order the ids were given in.
    AsRequested,
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn create(&self, entry: NewEntry) -> Result<LedgerEntry, AppError>;

    /// All entries, newest first.
    async fn list(&self) -> Result<Vec<LedgerEntry>, AppError>;

    async fn get(&self, id: i64) -> Result<LedgerEntry, AppError>;

    /// Entries among `ids` that exist. Unknown ids are skipped.
    async fn find_many(&self, ids: &[i64], order: EntryOrder)
        -> Result<Vec<LedgerEntry>, AppError>;

    /// Entries of one calendar day, newest first.
    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<LedgerEntry>, AppError>;

    /// Replaces the editable fields and re-stamps `updated_at`/`updated_by`.
    async fn update(&self, id: i64, entry: NewEntry) -> Result<LedgerEntry, AppError>;

    /// Returns the ids that were actually removed.
    async fn delete_many(&self, ids: &[i64]) -> Result<Vec<i64>, AppError>;

    /// Flips `is_marked` only; returns the number of rows touched.
    async fn set_marked(&self, ids: &[i64], marked: bool) -> Result<u64, AppError>;

    async fn sum_by_date(&self, date: NaiveDate) -> Result<DateTotals, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

pub(crate) fn not_found(id: i64) -> AppError {
    tracing::debug!(entry_id = id, "Entry not found");
    AppError::NotFound(anyhow::anyhow!("Entry not found"))
}
