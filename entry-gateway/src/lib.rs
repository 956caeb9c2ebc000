pub mod config;
pub mod handlers;
pub mod services;
pub mod startup;

use services::EntryClient;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub entry_client: Arc<EntryClient>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(entry_client: Arc<EntryClient>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            entry_client,
            static_dir: static_dir.into(),
        }
    }
}
