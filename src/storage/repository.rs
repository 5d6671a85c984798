//! Store abstraction and the in-memory implementation

use std::sync::RwLock;

use async_trait::async_trait;

use super::query::{apply_query, InventoryPage, ListQuery};
use super::{StoreError, StoreResult};
use crate::models::InventoryRecord;

// ============================================================================
// Store Trait
// ============================================================================

/// Record store used by the ledger.
///
/// Implementations only persist and retrieve; capacity rules live in the
/// ledger. Listing methods return records in insertion order.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Persist a new record
    async fn insert(&self, record: &InventoryRecord) -> StoreResult<()>;

    /// Fetch a record by id
    async fn get(&self, id: &str) -> StoreResult<Option<InventoryRecord>>;

    /// Overwrite an existing record. Returns `false` if the id is unknown.
    async fn replace(&self, record: &InventoryRecord) -> StoreResult<bool>;

    /// Delete a record, returning it if it existed
    async fn delete(&self, id: &str) -> StoreResult<Option<InventoryRecord>>;

    /// Every record
    async fn list_all(&self) -> StoreResult<Vec<InventoryRecord>>;

    /// Records held at one facility
    async fn list_by_location(&self, location: &str) -> StoreResult<Vec<InventoryRecord>>;

    /// Records flagged as ventilators
    async fn list_ventilators(&self) -> StoreResult<Vec<InventoryRecord>>;

    /// Filtered, sorted, paginated listing
    async fn query(&self, query: &ListQuery) -> StoreResult<InventoryPage> {
        Ok(apply_query(self.list_all().await?, query))
    }

    /// Total number of records
    async fn count(&self) -> StoreResult<usize> {
        Ok(self.list_all().await?.len())
    }
}

// ============================================================================
// In-memory Implementation
// ============================================================================

/// Vector-backed store for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryInventoryStore {
    records: RwLock<Vec<InventoryRecord>>,
}

impl MemoryInventoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_records(records: Vec<InventoryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Vec<InventoryRecord>) -> T) -> StoreResult<T> {
        let guard = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Vec<InventoryRecord>) -> T) -> StoreResult<T> {
        let mut guard = self.records.write().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, record: &InventoryRecord) -> StoreResult<()> {
        self.write(|records| {
            if records.iter().any(|r| r.id == record.id) {
                return Err(StoreError::Duplicate(record.id.clone()));
            }
            records.push(record.clone());
            Ok(())
        })?
    }

    async fn get(&self, id: &str) -> StoreResult<Option<InventoryRecord>> {
        self.read(|records| records.iter().find(|r| r.id == id).cloned())
    }

    async fn replace(&self, record: &InventoryRecord) -> StoreResult<bool> {
        self.write(|records| match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: &str) -> StoreResult<Option<InventoryRecord>> {
        self.write(|records| {
            records
                .iter()
                .position(|r| r.id == id)
                .map(|idx| records.remove(idx))
        })
    }

    async fn list_all(&self) -> StoreResult<Vec<InventoryRecord>> {
        self.read(|records| records.clone())
    }

    async fn list_by_location(&self, location: &str) -> StoreResult<Vec<InventoryRecord>> {
        self.read(|records| {
            records
                .iter()
                .filter(|r| r.hospital_location == location)
                .cloned()
                .collect()
        })
    }

    async fn list_ventilators(&self) -> StoreResult<Vec<InventoryRecord>> {
        self.read(|records| records.iter().filter(|r| r.is_ventilator).cloned().collect())
    }

    async fn count(&self) -> StoreResult<usize> {
        self.read(|records| records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, InventoryDraft, ItemStatus};

    fn record(name: &str, location: &str, is_ventilator: bool) -> InventoryRecord {
        InventoryRecord::new(InventoryDraft {
            name: name.to_string(),
            quantity: 3,
            category: Category::Equipment,
            hospital_location: location.to_string(),
            is_ventilator,
            status: ItemStatus::Available,
        })
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let store = MemoryInventoryStore::new();
        let rec = record("Ventilator", "Central Hospital", true);

        store.insert(&rec).await.unwrap();
        assert_eq!(store.get(&rec.id).await.unwrap(), Some(rec.clone()));
        assert_eq!(store.count().await.unwrap(), 1);

        let deleted = store.delete(&rec.id).await.unwrap();
        assert_eq!(deleted.map(|r| r.id), Some(rec.id.clone()));
        assert!(store.get(&rec.id).await.unwrap().is_none());
        assert!(store.delete(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryInventoryStore::new();
        let rec = record("Gloves", "Central Hospital", false);
        store.insert(&rec).await.unwrap();
        assert!(matches!(
            store.insert(&rec).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_unknown_returns_false() {
        let store = MemoryInventoryStore::new();
        let rec = record("Gloves", "Central Hospital", false);
        assert!(!store.replace(&rec).await.unwrap());

        store.insert(&rec).await.unwrap();
        let mut changed = rec.clone();
        changed.quantity = 99;
        assert!(store.replace(&changed).await.unwrap());
        assert_eq!(store.get(&rec.id).await.unwrap().unwrap().quantity, 99);
    }

    #[tokio::test]
    async fn test_location_and_ventilator_filters() {
        let store = MemoryInventoryStore::with_records(vec![
            record("Ventilator", "Central Hospital", true),
            record("Gloves", "Central Hospital", false),
            record("Ventilator", "ICU Complex", true),
        ]);

        assert_eq!(
            store.list_by_location("Central Hospital").await.unwrap().len(),
            2
        );
        assert_eq!(store.list_ventilators().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_default_query_uses_apply_query() {
        let store = MemoryInventoryStore::with_records(vec![
            record("Ventilator", "Central Hospital", true),
            record("Gloves", "ICU Complex", false),
        ]);
        let page = store
            .query(&ListQuery::default().search("icu"))
            .await
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].name, "Gloves");
    }
}
