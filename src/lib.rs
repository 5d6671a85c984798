//! medstock - Hospital medical-supply inventory ledger
//!
//! Tracks supplies held at a fixed registry of facilities, enforces storage
//! and ventilator capacity on every write, and streams ventilator updates to
//! dashboards. A distance resolver ranks facilities for ambulance routing.
//!
//! # Architecture
//!
//! - [`facility`] - Static registry of facilities and their limits
//! - [`geo`] - Coordinates and haversine distance
//! - [`models`] - Inventory records and input payloads
//! - [`storage`] - Record stores (in-memory, SQLite)
//! - [`ledger`] - Validation, capacity checks and aggregates
//! - [`resolver`] - Nearest-facility search
//! - [`notifications`] - Broadcast targets and capacity alerts
//! - [`server`] - REST and WebSocket API
//! - [`config`] - Layered configuration
//! - [`metrics`] - Prometheus metrics
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use medstock::facility::FacilityRegistry;
//! use medstock::ledger::{InventoryLedger, LedgerConfig};
//! use medstock::models::{Category, InventoryInput};
//! use medstock::notifications::NoopBroadcaster;
//! use medstock::storage::MemoryInventoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ledger = InventoryLedger::new(
//!         Arc::new(FacilityRegistry::builtin()?),
//!         Arc::new(MemoryInventoryStore::new()),
//!         Arc::new(NoopBroadcaster),
//!         LedgerConfig::default(),
//!     );
//!     let input = InventoryInput::new("Ventilator", 2, Category::Equipment, "Central Hospital")
//!         .ventilator();
//!     ledger.create(&input).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod facility;
pub mod geo;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod resolver;
pub mod server;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, MedstockErrorTrait, Result};
    pub use crate::facility::{Facility, FacilityRegistry, FacilityType};
    pub use crate::geo::{distance_km, Coordinates};
    pub use crate::ledger::{InventoryLedger, LedgerConfig, LedgerError};
    pub use crate::models::{Category, InventoryInput, InventoryRecord, ItemStatus};
    pub use crate::notifications::{BroadcastEvent, Broadcaster};
    pub use crate::resolver::{DistanceResult, NearestFacilityResolver};
    pub use crate::server::InventoryServer;
    pub use crate::storage::{InventoryStore, ListQuery};
}

// Direct re-exports for convenience
pub use models::{Category, InventoryInput, InventoryRecord, ItemStatus};
