//! Inventory persistence
//!
//! The ledger talks to an [`InventoryStore`] and never to a concrete
//! database, so the same capacity logic runs against SQLite in production
//! and the in-memory store in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │            InventoryLedger            │
//! └───────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌───────────────────────────────────────┐
//! │          InventoryStore trait         │
//! └───────────────────────────────────────┘
//!            │                  │
//!            ▼                  ▼
//!   ┌─────────────────┐ ┌─────────────────┐
//!   │     SQLite      │ │    In-memory    │
//!   └─────────────────┘ └─────────────────┘
//! ```

pub mod query;
pub mod repository;
pub mod sqlite;

use thiserror::Error;

pub use query::{apply_query, InventoryPage, ListQuery, SortField, SortOrder};
pub use repository::{InventoryStore, MemoryInventoryStore};
pub use sqlite::SqliteInventoryStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by inventory stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The operation did not finish within the configured bound
    #[error("Store operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// A record with this id already exists
    #[error("Record already exists: {0}")]
    Duplicate(String),

    /// A stored row could not be decoded
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// A lock guarding the store was poisoned by a panic
    #[error("Store lock poisoned")]
    Poisoned,

    /// The blocking worker running the query failed
    #[error("Store task failed: {0}")]
    Task(String),

    /// Filesystem error while opening the store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying the same call might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Task(_))
    }
}
