use crate::dtos::ApiResponse;
use crate::handlers::track_error;
use crate::models::LedgerEntry;
use crate::services::aggregation::{
    group_by_quality, quality_view_amount, EntryFilter, QualitySummary,
};
use crate::services::calculator::round2;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use std::cmp::Reverse;

#[derive(Debug, Serialize)]
pub struct QualityRow {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    /// `rate × weight / 20`, without less-rate.
    pub quality_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct QualitywiseView {
    pub summary: Vec<QualitySummary>,
    pub entries: Vec<QualityRow>,
}

/// Quality-wise view: per-quality sums plus the filtered rows, latest entry date first.
pub async fn qualitywise(
    State(state): State<AppState>,
    Query(filter): Query<EntryFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut entries = filter.apply(state.store.list().await.map_err(track_error)?);
    // Stable: rows of the same day stay newest first.
    entries.sort_by_key(|e| Reverse(e.entry_date));

    let summary = group_by_quality(&entries);
    let entries = entries
        .into_iter()
        .map(|entry| QualityRow {
            quality_amount: round2(quality_view_amount(entry.rate, entry.weight)),
            entry,
        })
        .collect();

    Ok(Json(ApiResponse::ok(QualitywiseView { summary, entries })))
}
