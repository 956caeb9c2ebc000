use crate::dtos::{require_selection, DateRequest, ExportRequest, QualitywiseExportRequest};
use crate::handlers::track_error;
use crate::services::metrics::EXPORTS_TOTAL;
use crate::services::render::{render, DocumentFormat, RenderedDocument};
use crate::services::report::{datewise_report, entries_report, qualitywise_report, ReportTable};
use crate::services::EntryOrder;
use crate::startup::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

impl IntoResponse for RenderedDocument {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.format.content_type().to_string()),
                (header::CONTENT_DISPOSITION, self.content_disposition()),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Renders off the async runtime; layout and encoding are CPU-bound.
async fn render_document(
    table: ReportTable,
    format: DocumentFormat,
) -> Result<RenderedDocument, AppError> {
    let kind = table.kind;
    let rows = table.rows.len();

    let document = tokio::task::spawn_blocking(move || render(&table, format))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Render task failed: {}", e)))
        .map_err(track_error)?
        .map_err(|e| track_error(e.into()))?;

    EXPORTS_TOTAL
        .with_label_values(&[kind.as_str(), format.as_str()])
        .inc();
    tracing::info!(
        kind = kind.as_str(),
        format = format.as_str(),
        rows,
        bytes = document.bytes.len(),
        "Report exported"
    );

    Ok(document)
}

async fn export_entries(
    state: AppState,
    request: ExportRequest,
    format: DocumentFormat,
) -> Result<RenderedDocument, AppError> {
    require_selection(&request.entry_ids, "export")?;

    let entries = state
        .store
        .find_many(&request.entry_ids, EntryOrder::AsRequested)
        .await
        .map_err(track_error)?;

    render_document(entries_report(&entries, &request.selected_fields), format).await
}

async fn export_datewise(
    state: AppState,
    request: DateRequest,
    format: DocumentFormat,
) -> Result<RenderedDocument, AppError> {
    let date = request.calendar_date()?;
    let entries = state.store.list_by_date(date).await.map_err(track_error)?;
    if entries.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "No entries found for this date"
        )));
    }

    render_document(datewise_report(&entries, date), format).await
}

async fn export_qualitywise(
    state: AppState,
    request: QualitywiseExportRequest,
    format: DocumentFormat,
) -> Result<RenderedDocument, AppError> {
    require_selection(&request.selected_entries, "export")?;

    let entries = state
        .store
        .find_many(&request.selected_entries, EntryOrder::EntryDateDesc)
        .await
        .map_err(track_error)?;

    render_document(qualitywise_report(&entries), format).await
}

pub async fn export_pdf(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<RenderedDocument, AppError> {
    export_entries(state, request, DocumentFormat::Pdf).await
}

pub async fn export_excel(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<RenderedDocument, AppError> {
    export_entries(state, request, DocumentFormat::Xlsx).await
}

pub async fn export_datewise_pdf(
    State(state): State<AppState>,
    Json(request): Json<DateRequest>,
) -> Result<RenderedDocument, AppError> {
    export_datewise(state, request, DocumentFormat::Pdf).await
}

pub async fn export_datewise_excel(
    State(state): State<AppState>,
    Json(request): Json<DateRequest>,
) -> Result<RenderedDocument, AppError> {
    export_datewise(state, request, DocumentFormat::Xlsx).await
}

pub async fn export_qualitywise_pdf(
    State(state): State<AppState>,
    Json(request): Json<QualitywiseExportRequest>,
) -> Result<RenderedDocument, AppError> {
    export_qualitywise(state, request, DocumentFormat::Pdf).await
}

pub async fn export_qualitywise_excel(
    State(state): State<AppState>,
    Json(request): Json<QualitywiseExportRequest>,
) -> Result<RenderedDocument, AppError> {
    export_qualitywise(state, request, DocumentFormat::Xlsx).await
}
