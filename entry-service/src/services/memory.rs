//! In-process entry store. Backs the router tests and local runs without a database.

use crate::models::{LedgerEntry, NewEntry};
use crate::services::aggregation::{date_totals, DateTotals};
use crate::services::store::{not_found, EntryOrder, EntryStore};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use service_core::error::AppError;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    next_id: i64,
    entries: BTreeMap<i64, LedgerEntry>,
}

#[derive(Default)]
pub struct MemoryEntryStore {
    inner: RwLock<Inner>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort(entries: &mut [LedgerEntry], order: EntryOrder) {
    match order {
        EntryOrder::CreatedDesc => entries.sort_by_key(|e| Reverse((e.created_at, e.id))),
        EntryOrder::EntryDateDesc => {
            entries.sort_by_key(|e| Reverse((e.entry_date, e.created_at, e.id)))
        }
        EntryOrder::AsRequested => {}
    }
}

fn stored(id: i64, entry: NewEntry, created: Option<&LedgerEntry>) -> LedgerEntry {
    let now = Utc::now();
    LedgerEntry {
        id,
        entry_date: entry.entry_date,
        name: entry.name,
        bags: entry.bags,
        bharti_pairs: entry.bharti_pairs,
        weight: entry.weight,
        rate: entry.rate,
        lessrate: entry.lessrate,
        amount: entry.amount,
        commission: entry.commission,
        other_amount: entry.other_amount,
        total: entry.total,
        quality: entry.quality,
        item: entry.item,
        market_fee: entry.market_fee,
        is_marked: created.map(|e| e.is_marked).unwrap_or(false),
        created_at: created.map(|e| e.created_at).unwrap_or(now),
        updated_at: now,
        created_by: created
            .map(|e| e.created_by.clone())
            .unwrap_or_else(|| entry.actor.clone()),
        updated_by: entry.actor,
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn create(&self, entry: NewEntry) -> Result<LedgerEntry, AppError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        let row = stored(id, entry, None);
        inner.entries.insert(id, row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<LedgerEntry>, AppError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<LedgerEntry> = inner.entries.values().cloned().collect();
        sort(&mut entries, EntryOrder::CreatedDesc);
        Ok(entries)
    }

    async fn get(&self, id: i64) -> Result<LedgerEntry, AppError> {
        let inner = self.inner.read().await;
        inner.entries.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn find_many(
        &self,
        ids: &[i64],
        order: EntryOrder,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let inner = self.inner.read().await;
        let mut seen = Vec::with_capacity(ids.len());
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);
            if let Some(entry) = inner.entries.get(id) {
                entries.push(entry.clone());
            }
        }
        sort(&mut entries, order);
        Ok(entries)
    }

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<LedgerEntry>, AppError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<LedgerEntry> = inner
            .entries
            .values()
            .filter(|e| e.entry_date == date)
            .cloned()
            .collect();
        sort(&mut entries, EntryOrder::CreatedDesc);
        Ok(entries)
    }

    async fn update(&self, id: i64, entry: NewEntry) -> Result<LedgerEntry, AppError> {
        let mut inner = self.inner.write().await;
        let existing = inner.entries.get(&id).ok_or_else(|| not_found(id))?;
        let row = stored(id, entry, Some(existing));
        inner.entries.insert(id, row.clone());
        Ok(row)
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let mut inner = self.inner.write().await;
        let mut deleted = Vec::new();
        for id in ids {
            if inner.entries.remove(id).is_some() {
                deleted.push(*id);
            }
        }
        Ok(deleted)
    }

    async fn set_marked(&self, ids: &[i64], marked: bool) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;
        let mut touched = 0;
        for id in ids {
            if let Some(entry) = inner.entries.get_mut(id) {
                entry.is_marked = marked;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn sum_by_date(&self, date: NaiveDate) -> Result<DateTotals, AppError> {
        let inner = self.inner.read().await;
        let entries: Vec<LedgerEntry> = inner.entries.values().cloned().collect();
        Ok(date_totals(&entries, date))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BhartiPair;
    use rust_decimal_macros::dec;

    fn new_entry(name: &str, date: &str) -> NewEntry {
        NewEntry {
            entry_date: date.parse().unwrap(),
            name: name.to_string(),
            bags: 2,
            bharti_pairs: vec![BhartiPair::new(dec!(2), dec!(5))],
            weight: dec!(10.00),
            rate: dec!(100.00),
            lessrate: dec!(10.00),
            amount: dec!(45.00),
            commission: dec!(0.68),
            other_amount: 5,
            total: dec!(50.68),
            quality: "A".to_string(),
            item: "Wheat".to_string(),
            market_fee: 12,
            actor: "system".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = MemoryEntryStore::new();
        let first = store.create(new_entry("A", "2024-01-01")).await.unwrap();
        let second = store.create(new_entry("B", "2024-01-01")).await.unwrap();
        assert!(second.id > first.id);
        assert!(!first.is_marked);

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test]
    async fn mark_then_unmark_changes_nothing_else() {
        let store = MemoryEntryStore::new();
        let created = store.create(new_entry("A", "2024-01-01")).await.unwrap();

        store.set_marked(&[created.id], true).await.unwrap();
        assert!(store.get(created.id).await.unwrap().is_marked);

        store.set_marked(&[created.id], false).await.unwrap();
        assert_eq!(store.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_keeps_creation_audit() {
        let store = MemoryEntryStore::new();
        let created = store.create(new_entry("A", "2024-01-01")).await.unwrap();

        let mut edit = new_entry("A2", "2024-01-02");
        edit.actor = "clerk".to_string();
        let updated = store.update(created.id, edit).await.unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.created_by, "system");
        assert_eq!(updated.updated_by, "clerk");
        assert_eq!(updated.name, "A2");
        assert!(matches!(
            store.update(999, new_entry("X", "2024-01-01")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_reports_removed_ids_only() {
        let store = MemoryEntryStore::new();
        let a = store.create(new_entry("A", "2024-01-01")).await.unwrap();
        let deleted = store.delete_many(&[a.id, 42]).await.unwrap();
        assert_eq!(deleted, vec![a.id]);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_many_orders_and_skips_unknown() {
        let store = MemoryEntryStore::new();
        let old = store.create(new_entry("A", "2024-01-03")).await.unwrap();
        let new = store.create(new_entry("B", "2024-01-01")).await.unwrap();

        let by_date = store
            .find_many(&[new.id, old.id, 77], EntryOrder::EntryDateDesc)
            .await
            .unwrap();
        assert_eq!(by_date.iter().map(|e| e.id).collect::<Vec<_>>(), vec![old.id, new.id]);

        let requested = store
            .find_many(&[new.id, old.id, new.id], EntryOrder::AsRequested)
            .await
            .unwrap();
        assert_eq!(requested.iter().map(|e| e.id).collect::<Vec<_>>(), vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn sum_by_date_uses_exact_day() {
        let store = MemoryEntryStore::new();
        store.create(new_entry("A", "2024-01-01")).await.unwrap();
        store.create(new_entry("B", "2024-01-01")).await.unwrap();
        store.create(new_entry("C", "2024-01-02")).await.unwrap();

        let totals = store.sum_by_date("2024-01-01".parse().unwrap()).await.unwrap();
        assert_eq!(totals.total_bags, 4);
        assert_eq!(totals.total_amount, dec!(101.36));
        assert_eq!(totals.total_market_fee, 24);
    }
}
