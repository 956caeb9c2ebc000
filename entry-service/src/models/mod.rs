//! Domain models for entry-service.

mod entry;
pub mod lenient;

pub use entry::{
    BhartiPair, EntryInput, EntryView, LedgerEntry, NewEntry, LEGACY_ITEM, SYSTEM_ACTOR,
};
