//! Request and response bodies for the HTTP API.

use crate::models::lenient;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Acknowledged {
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_count: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default, deserialize_with = "lenient::ids")]
    pub entry_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRequest {
    #[serde(default, deserialize_with = "lenient::ids")]
    pub entry_ids: Vec<i64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub marked: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRequest {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub date: Option<String>,
}

impl DateRequest {
    pub fn calendar_date(&self) -> Result<chrono::NaiveDate, AppError> {
        let raw = self
            .date
            .as_deref()
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Date is required")))?;
        lenient::parse_calendar_date(raw)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid date: {}", raw)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub selected_fields: Vec<String>,
    #[serde(default, deserialize_with = "lenient::ids")]
    pub entry_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitywiseExportRequest {
    #[serde(default, deserialize_with = "lenient::ids")]
    pub selected_entries: Vec<i64>,
}

/// Rejects an empty id set before any work is done.
pub fn require_selection(ids: &[i64], action: &str) -> Result<(), AppError> {
    if ids.is_empty() {
        tracing::debug!(action, "Rejected empty selection");
        return Err(AppError::EmptySelection("No entries selected".to_string()));
    }
    Ok(())
}
