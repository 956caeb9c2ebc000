//! Document renderers for assembled reports.

mod pdf;
mod xlsx;

pub use pdf::PdfRenderer;
pub use xlsx::XlsxRenderer;

use crate::services::report::ReportTable;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Xlsx,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Xlsx => "excel",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("Spreadsheet rendering failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::RenderError(anyhow::Error::new(err))
    }
}

/// Turns an assembled table into document bytes.
pub trait DocumentRenderer: Send + Sync {
    fn format(&self) -> DocumentFormat;
    fn render(&self, table: &ReportTable) -> Result<Vec<u8>, RenderError>;
}

pub fn renderer_for(format: DocumentFormat) -> &'static dyn DocumentRenderer {
    match format {
        DocumentFormat::Pdf => &PdfRenderer,
        DocumentFormat::Xlsx => &XlsxRenderer,
    }
}

/// A rendered report ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub format: DocumentFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.file_name)
    }
}

pub fn render(table: &ReportTable, format: DocumentFormat) -> Result<RenderedDocument, RenderError> {
    let bytes = renderer_for(format).render(table)?;
    Ok(RenderedDocument {
        format,
        file_name: format!("{}.{}", table.kind.file_stem(), format.extension()),
        bytes,
    })
}
