pub mod entries;
pub mod events;
pub mod export;
pub mod health;
pub mod reports;

use crate::services::metrics::ERRORS_TOTAL;
use service_core::error::AppError;

pub use entries::{
    create_entry, datewise_total, delete_entries, get_entry, list_entries, mark_entries,
    update_entry,
};
pub use events::live_updates;
pub use export::{
    export_datewise_excel, export_datewise_pdf, export_excel, export_pdf,
    export_qualitywise_excel, export_qualitywise_pdf,
};
pub use health::{health_check, metrics_handler, readiness_check};
pub use reports::qualitywise;

/// Counts a failure by kind on its way out of a handler.
pub(crate) fn track_error(err: AppError) -> AppError {
    ERRORS_TOTAL.with_label_values(&[err.kind()]).inc();
    err
}
