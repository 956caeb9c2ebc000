pub mod entry_client;
pub mod metrics;

pub use entry_client::EntryClient;
