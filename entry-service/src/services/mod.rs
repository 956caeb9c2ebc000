pub mod aggregation;
pub mod calculator;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod notifier;
pub mod render;
pub mod report;
pub mod store;

pub use database::PgEntryStore;
pub use memory::MemoryEntryStore;
pub use metrics::{get_metrics, init_metrics};
pub use notifier::{LiveEvent, LiveNotifier};
pub use store::{EntryOrder, EntryStore};
