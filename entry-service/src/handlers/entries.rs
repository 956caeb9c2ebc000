use crate::dtos::{
    require_selection, Acknowledged, ApiResponse, DateRequest, DeleteRequest, DeleteResponse,
    MarkRequest,
};
use crate::handlers::track_error;
use crate::middleware::Actor;
use crate::models::{EntryInput, EntryView, LedgerEntry};
use crate::services::aggregation::{AllAmounts, EntryFilter};
use crate::services::calculator::prepare_entry;
use crate::services::metrics::{ENTRIES_CREATED, ENTRIES_DELETED, ENTRIES_UPDATED};
use crate::services::LiveEvent;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

fn with_all_amounts(entries: Vec<LedgerEntry>) -> Vec<EntryView> {
    let all_amounts = AllAmounts::compute(&entries);
    entries
        .into_iter()
        .map(|entry| EntryView {
            all_amount: all_amounts.get(entry.id),
            entry,
        })
        .collect()
}

/// Newest first, optionally filtered by quality and status. ALLAMOUNT is
/// attributed within the returned set.
pub async fn list_entries(
    State(state): State<AppState>,
    Query(filter): Query<EntryFilter>,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.store.list().await.map_err(track_error)?;
    let entries = filter.apply(entries);

    tracing::debug!(count = entries.len(), "Listed entries");

    Ok(Json(ApiResponse::ok(with_all_amounts(entries))))
}

pub async fn create_entry(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<EntryInput>,
) -> Result<impl IntoResponse, AppError> {
    let entry = prepare_entry(input, actor.as_str())?;

    let created = state.store.create(entry).await.map_err(track_error)?;
    ENTRIES_CREATED.inc();

    tracing::info!(
        entry_id = created.id,
        entry_date = %created.entry_date,
        total = %created.total,
        actor = %actor.as_str(),
        "Entry added"
    );

    state.notifier.publish(LiveEvent::NewEntry(created.clone()));

    Ok(Json(ApiResponse::ok(created)))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.store.get(id).await.map_err(track_error)?;
    Ok(Json(ApiResponse::ok(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    actor: Actor,
    Json(input): Json<EntryInput>,
) -> Result<impl IntoResponse, AppError> {
    let entry = prepare_entry(input, actor.as_str())?;

    let updated = state.store.update(id, entry).await.map_err(track_error)?;
    ENTRIES_UPDATED.inc();

    tracing::info!(entry_id = id, total = %updated.total, actor = %actor.as_str(), "Entry updated");

    Ok(Json(ApiResponse::ok(updated)))
}

pub async fn delete_entries(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_selection(&request.entry_ids, "deletion")?;

    let deleted = state
        .store
        .delete_many(&request.entry_ids)
        .await
        .map_err(track_error)?;
    ENTRIES_DELETED.inc_by(deleted.len() as u64);

    tracing::info!(
        requested = request.entry_ids.len(),
        deleted = deleted.len(),
        "Entries deleted"
    );

    let deleted_count = deleted.len();
    if !deleted.is_empty() {
        state.notifier.publish(LiveEvent::EntriesDeleted(deleted));
    }

    Ok(Json(DeleteResponse {
        success: true,
        deleted_count,
    }))
}

pub async fn mark_entries(
    State(state): State<AppState>,
    Json(request): Json<MarkRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_selection(&request.entry_ids, "marking")?;

    let touched = state
        .store
        .set_marked(&request.entry_ids, request.marked)
        .await
        .map_err(track_error)?;

    tracing::info!(touched, marked = request.marked, "Entries marked");

    Ok(Json(Acknowledged { success: true }))
}

pub async fn datewise_total(
    State(state): State<AppState>,
    Json(request): Json<DateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = request.calendar_date()?;
    let totals = state.store.sum_by_date(date).await.map_err(track_error)?;
    Ok(Json(totals))
}
