//! SQLite-backed inventory store
//!
//! The connection lives behind a mutex and every statement runs on the
//! blocking pool so request handlers never stall the async runtime.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::query::{InventoryPage, ListQuery};
use super::repository::InventoryStore;
use super::{StoreError, StoreResult};
use crate::models::{Category, InventoryRecord, ItemStatus};

const COLUMNS: &str = "id, name, quantity, category, hospital_location, is_ventilator, status, \
                       last_updated, created_at, updated_at";

/// SQLite implementation of [`InventoryStore`]
pub struct SqliteInventoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteInventoryStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        create_schema(&conn)?;

        tracing::info!(path = %path.display(), "SQLite inventory store initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
            CREATE TABLE IF NOT EXISTS inventory (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity >= 0),
                category TEXT NOT NULL,
                hospital_location TEXT NOT NULL,
                is_ventilator INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'Available',
                last_updated TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_inventory_location
                ON inventory(hospital_location);

            CREATE INDEX IF NOT EXISTS idx_inventory_location_ventilator
                ON inventory(hospital_location, is_ventilator);
            "#,
    )
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp '{raw}': {e}")))
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<InventoryRecord> {
    let category: String = row.get(3)?;
    let status: String = row.get(6)?;

    Ok(InventoryRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        category: Category::parse(&category)
            .ok_or_else(|| conversion_error(3, format!("unknown category '{category}'")))?,
        hospital_location: row.get(4)?,
        is_ventilator: row.get(5)?,
        status: ItemStatus::parse(&status)
            .ok_or_else(|| conversion_error(6, format!("unknown status '{status}'")))?,
        last_updated: parse_timestamp(row, 7)?,
        created_at: parse_timestamp(row, 8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn select_where(
    conn: &Connection,
    clause: &str,
    args: &[&dyn ToSql],
) -> StoreResult<Vec<InventoryRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM inventory {clause} ORDER BY rowid ASC");
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(args, read_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, record: &InventoryRecord) -> StoreResult<()> {
        let record = record.clone();
        self.run(move |conn| {
            let result = conn.execute(
                &format!("INSERT INTO inventory ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
                params![
                    record.id,
                    record.name,
                    record.quantity,
                    record.category.as_str(),
                    record.hospital_location,
                    record.is_ventilator,
                    record.status.as_str(),
                    timestamp(&record.last_updated),
                    timestamp(&record.created_at),
                    timestamp(&record.updated_at),
                ],
            );

            match result {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::Duplicate(record.id))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<InventoryRecord>> {
        let id = id.to_string();
        self.run(move |conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM inventory WHERE id = ?1"),
                    params![id],
                    read_record,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn replace(&self, record: &InventoryRecord) -> StoreResult<bool> {
        let record = record.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                r#"
                    UPDATE inventory SET
                        name = ?2,
                        quantity = ?3,
                        category = ?4,
                        hospital_location = ?5,
                        is_ventilator = ?6,
                        status = ?7,
                        last_updated = ?8,
                        updated_at = ?9
                    WHERE id = ?1
                    "#,
                params![
                    record.id,
                    record.name,
                    record.quantity,
                    record.category.as_str(),
                    record.hospital_location,
                    record.is_ventilator,
                    record.status.as_str(),
                    timestamp(&record.last_updated),
                    timestamp(&record.updated_at),
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<Option<InventoryRecord>> {
        let id = id.to_string();
        self.run(move |conn| {
            let existing = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM inventory WHERE id = ?1"),
                    params![id],
                    read_record,
                )
                .optional()?;

            if existing.is_some() {
                conn.execute("DELETE FROM inventory WHERE id = ?1", params![id])?;
            }
            Ok(existing)
        })
        .await
    }

    async fn list_all(&self) -> StoreResult<Vec<InventoryRecord>> {
        self.run(|conn| select_where(conn, "", &[])).await
    }

    async fn list_by_location(&self, location: &str) -> StoreResult<Vec<InventoryRecord>> {
        let location = location.to_string();
        self.run(move |conn| {
            select_where(
                conn,
                "WHERE hospital_location = ?1",
                &[&location as &dyn ToSql],
            )
        })
        .await
    }

    async fn list_ventilators(&self) -> StoreResult<Vec<InventoryRecord>> {
        self.run(|conn| select_where(conn, "WHERE is_ventilator = 1", &[]))
            .await
    }

    async fn query(&self, query: &ListQuery) -> StoreResult<InventoryPage> {
        let query = query.clone();
        self.run(move |conn| {
            let pattern = query
                .search_term()
                .map(|term| format!("%{}%", escape_like(term)));

            let filter = if pattern.is_some() {
                "WHERE name LIKE ?1 ESCAPE '\\' \
                 OR category LIKE ?1 ESCAPE '\\' \
                 OR hospital_location LIKE ?1 ESCAPE '\\'"
            } else {
                ""
            };
            let args: Vec<&dyn ToSql> = pattern.iter().map(|p| p as &dyn ToSql).collect();

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM inventory {filter}"),
                args.as_slice(),
                |row| row.get(0),
            )?;

            // SQLite integers are i64; larger literals are read as reals and rejected
            let limit = i64::try_from(query.limit.max(1)).unwrap_or(i64::MAX);
            let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);
            let sql = format!(
                "SELECT {COLUMNS} FROM inventory {filter} ORDER BY {} {}, rowid ASC LIMIT {limit} OFFSET {offset}",
                query.sort_field.column(),
                query.sort_order.sql(),
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(args.as_slice(), read_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(InventoryPage::new(items, total.max(0) as usize, &query))
        })
        .await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.run(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM inventory", [], |row| row.get(0))?;
            Ok(total.max(0) as usize)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InventoryDraft;
    use crate::storage::query::{SortField, SortOrder};
    use tempfile::TempDir;

    fn record(name: &str, quantity: u32, location: &str, is_ventilator: bool) -> InventoryRecord {
        InventoryRecord::new(InventoryDraft {
            name: name.to_string(),
            quantity,
            category: if is_ventilator {
                Category::Equipment
            } else {
                Category::Ppe
            },
            hospital_location: location.to_string(),
            is_ventilator,
            status: ItemStatus::InUse,
        })
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        let rec = record("Ventilator", 7, "Central Hospital", true);

        store.insert(&rec).await.unwrap();
        let loaded = store.get(&rec.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, rec.name);
        assert_eq!(loaded.quantity, 7);
        assert_eq!(loaded.status, ItemStatus::InUse);
        assert!(loaded.is_ventilator);
        // Stored with microsecond precision
        assert_eq!(
            loaded.created_at.timestamp_micros(),
            rec.created_at.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn test_duplicate_id_maps_to_duplicate_error() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        let rec = record("Gloves", 1, "Central Hospital", false);
        store.insert(&rec).await.unwrap();
        assert!(matches!(
            store.insert(&rec).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_and_delete() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        let rec = record("Gloves", 1, "Central Hospital", false);
        store.insert(&rec).await.unwrap();

        let mut changed = rec.clone();
        changed.quantity = 12;
        changed.hospital_location = "ICU Complex".to_string();
        assert!(store.replace(&changed).await.unwrap());

        let loaded = store.get(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.quantity, 12);
        assert_eq!(loaded.hospital_location, "ICU Complex");

        let deleted = store.delete(&rec.id).await.unwrap().unwrap();
        assert_eq!(deleted.quantity, 12);
        assert!(store.delete(&rec.id).await.unwrap().is_none());
        assert!(!store.replace(&changed).await.unwrap());
    }

    #[tokio::test]
    async fn test_filters() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        for rec in [
            record("Ventilator", 2, "Central Hospital", true),
            record("Gloves", 50, "Central Hospital", false),
            record("Ventilator", 3, "ICU Complex", true),
        ] {
            store.insert(&rec).await.unwrap();
        }

        assert_eq!(store.list_all().await.unwrap().len(), 3);
        assert_eq!(
            store.list_by_location("Central Hospital").await.unwrap().len(),
            2
        );
        let vents = store.list_ventilators().await.unwrap();
        assert_eq!(vents.len(), 2);
        assert!(vents.iter().all(|r| r.is_ventilator));
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_query_search_sort_paginate() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        for (name, qty) in [("N95 Mask", 30), ("Gloves", 10), ("Face Shield", 20)] {
            store
                .insert(&record(name, qty, "South Medical Center", false))
                .await
                .unwrap();
        }
        store
            .insert(&record("Ventilator", 1, "ICU Complex", true))
            .await
            .unwrap();

        let query = ListQuery::default()
            .search("ppe")
            .sort(SortField::Quantity, SortOrder::Asc)
            .page(1, 2);
        let page = store.query(&query).await.unwrap();

        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
        let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Gloves", "Face Shield"]);
    }

    #[tokio::test]
    async fn test_query_escapes_like_wildcards() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        store
            .insert(&record("Gloves", 1, "Central Hospital", false))
            .await
            .unwrap();

        let page = store.query(&ListQuery::default().search("%")).await.unwrap();
        assert_eq!(page.total_items, 0);
    }

    #[tokio::test]
    async fn test_query_far_past_last_page_is_empty() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        store
            .insert(&record("Gloves", 1, "Central Hospital", false))
            .await
            .unwrap();

        let query = ListQuery::default().page(1_000_000_000_000_000_000, 10);
        let page = store.query(&query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 1);

        let page = store
            .query(&ListQuery::default().page(2, usize::MAX))
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_search_folds_ascii_case_like_memory_store() {
        let sqlite = SqliteInventoryStore::in_memory().unwrap();
        let memory = crate::storage::MemoryInventoryStore::new();
        for rec in [
            record("Épinéphrine", 3, "Central Hospital", false),
            record("Gloves", 1, "Central Hospital", false),
        ] {
            sqlite.insert(&rec).await.unwrap();
            memory.insert(&rec).await.unwrap();
        }

        for (term, expected) in [("ÉPI", 1), ("épi", 0), ("gLoVeS", 1), ("PINÉ", 0)] {
            let query = ListQuery::default().search(term);
            let from_sqlite = sqlite.query(&query).await.unwrap();
            let from_memory = memory.query(&query).await.unwrap();
            assert_eq!(from_sqlite.total_items, expected, "sqlite, term {term}");
            assert_eq!(from_memory.total_items, expected, "memory, term {term}");
        }
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("inventory.db");
        let rec = record("Ventilator", 4, "Central Hospital", true);

        {
            let store = SqliteInventoryStore::open(&path).unwrap();
            store.insert(&rec).await.unwrap();
        }

        let reopened = SqliteInventoryStore::open(&path).unwrap();
        assert!(reopened.get(&rec.id).await.unwrap().is_some());
    }
}
