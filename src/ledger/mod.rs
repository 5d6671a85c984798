//! Capacity-aware inventory ledger
//!
//! Every mutation is checked against the target facility's storage and
//! ventilator limits before anything is written. Writes to the same
//! facility are serialized by a per-facility lock so that two concurrent
//! requests cannot both pass the check and jointly overshoot.
//!
//! # Write path
//!
//! ```text
//!  validate ─► resolve facility ─► lock location(s) ─► peer totals
//!                                                          │
//!       broadcast (spawned) ◄── persist ◄── capacity check ◄┘
//! ```
//!
//! Store calls are bounded by `store_timeout`. Broadcasting runs in a
//! separate task and its failures never reach the caller.

pub mod aggregate;
pub mod error;
pub mod validation;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::facility::{Facility, FacilityRegistry};
use crate::metrics;
use crate::models::{InventoryDraft, InventoryInput, InventoryRecord};
use crate::notifications::{
    capacity_alerts, BroadcastError, BroadcastEvent, Broadcaster, CapacityAlert,
};
use crate::storage::{InventoryPage, InventoryStore, ListQuery, StoreError, StoreResult};

pub use aggregate::{
    capacity_utilization, location_stats, peer_totals, ventilator_counts, ventilator_status,
    LocationStats, LocationTotals, VentilatorAggregate,
};
pub use error::{CapacityKind, LedgerError};
pub use validation::validate_input;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

// ============================================================================
// Configuration
// ============================================================================

/// Ledger timing bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Upper bound for each store call
    pub store_timeout: Duration,
    /// Upper bound for one broadcast delivery, raised to the broadcaster's
    /// own retry budget when that is longer
    pub broadcast_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            broadcast_timeout: Duration::from_secs(2),
        }
    }
}

impl LedgerConfig {
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_broadcast_timeout(mut self, timeout: Duration) -> Self {
        self.broadcast_timeout = timeout;
        self
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Inventory records plus the rules that govern them
pub struct InventoryLedger {
    registry: Arc<FacilityRegistry>,
    store: Arc<dyn InventoryStore>,
    broadcaster: Arc<dyn Broadcaster>,
    /// One write lock per facility name
    locks: HashMap<String, Mutex<()>>,
    config: LedgerConfig,
}

impl InventoryLedger {
    pub fn new(
        registry: Arc<FacilityRegistry>,
        store: Arc<dyn InventoryStore>,
        broadcaster: Arc<dyn Broadcaster>,
        config: LedgerConfig,
    ) -> Self {
        let locks = registry
            .list_names()
            .into_iter()
            .map(|name| (name.to_string(), Mutex::new(())))
            .collect();

        tracing::debug!(
            store = store.name(),
            broadcaster = broadcaster.name(),
            facilities = registry.len(),
            "Inventory ledger created"
        );

        Self {
            registry,
            store,
            broadcaster,
            locks,
            config,
        }
    }

    /// The facility registry this ledger validates against
    pub fn registry(&self) -> &Arc<FacilityRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Filtered, sorted, paginated listing
    pub async fn list(&self, query: &ListQuery) -> LedgerResult<InventoryPage> {
        self.call("query", self.store.query(query)).await
    }

    /// Fetch one record
    pub async fn get(&self, id: &str) -> LedgerResult<InventoryRecord> {
        self.call("get", self.store.get(id))
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Every ventilator record, as carried by `ventilatorUpdate` events
    pub async fn ventilator_records(&self) -> LedgerResult<Vec<InventoryRecord>> {
        self.call("list_ventilators", self.store.list_ventilators())
            .await
    }

    /// Per-facility ventilator breakdown, in registry order
    pub async fn ventilator_status(&self) -> LedgerResult<Vec<VentilatorAggregate>> {
        let records = self.ventilator_records().await?;
        Ok(ventilator_status(&self.registry, &records))
    }

    /// Live ventilator quantity per facility name
    pub async fn ventilator_counts(&self) -> LedgerResult<HashMap<String, u64>> {
        let records = self.ventilator_records().await?;
        Ok(ventilator_counts(&records))
    }

    /// Load and utilization for every facility
    pub async fn location_stats(&self) -> LedgerResult<Vec<LocationStats>> {
        let records = self.call("list_all", self.store.list_all()).await?;
        Ok(location_stats(&self.registry, &records))
    }

    /// Facilities above their alert threshold
    pub async fn capacity_alerts(&self) -> LedgerResult<Vec<CapacityAlert>> {
        Ok(capacity_alerts(&self.location_stats().await?))
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Validate and persist a new record
    pub async fn create(&self, input: &InventoryInput) -> LedgerResult<InventoryRecord> {
        let result = self.create_inner(input).await;
        record_outcome("create", &result);
        result
    }

    async fn create_inner(&self, input: &InventoryInput) -> LedgerResult<InventoryRecord> {
        let draft = validate_input(input).map_err(|errors| LedgerError::Validation { errors })?;
        let facility = self.facility(&draft.hospital_location)?;

        let guards = self.lock_locations(&[facility.name.as_str()]).await;

        let records = self
            .call("list_by_location", self.store.list_by_location(&facility.name))
            .await?;
        let peers = peer_totals(&records, &facility.name, None);
        check_capacity(facility, &draft, peers, peers)?;

        let record = InventoryRecord::new(draft);
        self.call("insert", self.store.insert(&record)).await?;
        drop(guards);

        tracing::info!(
            item_id = %record.id,
            location = %record.hospital_location,
            quantity = record.quantity,
            is_ventilator = record.is_ventilator,
            "Inventory item created"
        );

        if record.is_ventilator {
            self.notify_ventilators();
        }
        Ok(record)
    }

    /// Replace a record's fields, re-checking capacity without its own
    /// prior contribution
    pub async fn update(&self, id: &str, input: &InventoryInput) -> LedgerResult<InventoryRecord> {
        let result = self.update_inner(id, input).await;
        record_outcome("update", &result);
        result
    }

    async fn update_inner(&self, id: &str, input: &InventoryInput) -> LedgerResult<InventoryRecord> {
        let draft = validate_input(input).map_err(|errors| LedgerError::Validation { errors })?;
        let existing = self.get(id).await?;
        let facility = self.facility(&draft.hospital_location)?;

        // Moving a record changes two peer sets
        let guards = self
            .lock_locations(&[existing.hospital_location.as_str(), facility.name.as_str()])
            .await;

        // Another writer may have changed or removed it while we waited
        let existing = self.get(id).await?;

        let records = self
            .call("list_by_location", self.store.list_by_location(&facility.name))
            .await?;
        let peers = peer_totals(&records, &facility.name, Some(id));
        let before = peer_totals(&records, &facility.name, None);
        check_capacity(facility, &draft, peers, before)?;

        let updated = existing.apply(draft);
        if !self.call("replace", self.store.replace(&updated)).await? {
            return Err(LedgerError::NotFound(id.to_string()));
        }
        drop(guards);

        tracing::info!(
            item_id = %updated.id,
            location = %updated.hospital_location,
            quantity = updated.quantity,
            previous_quantity = existing.quantity,
            "Inventory item updated"
        );

        if existing.is_ventilator || updated.is_ventilator {
            self.notify_ventilators();
        }
        Ok(updated)
    }

    /// Delete a record, returning it
    pub async fn remove(&self, id: &str) -> LedgerResult<InventoryRecord> {
        let result = self.remove_inner(id).await;
        record_outcome("remove", &result);
        result
    }

    async fn remove_inner(&self, id: &str) -> LedgerResult<InventoryRecord> {
        let existing = self.get(id).await?;
        let guards = self
            .lock_locations(&[existing.hospital_location.as_str()])
            .await;

        let removed = self
            .call("delete", self.store.delete(id))
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        drop(guards);

        tracing::info!(
            item_id = %removed.id,
            location = %removed.hospital_location,
            "Inventory item removed"
        );

        if removed.is_ventilator {
            self.notify_ventilators();
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn facility(&self, name: &str) -> LedgerResult<&Facility> {
        self.registry
            .get_by_name(name)
            .map_err(|_| LedgerError::InvalidLocation(name.to_string()))
    }

    /// Lock facilities in name order. Names outside the registry carry no
    /// capacity and are skipped.
    async fn lock_locations(&self, names: &[&str]) -> Vec<MutexGuard<'_, ()>> {
        let mut names = names.to_vec();
        names.sort_unstable();
        names.dedup();

        let mut guards = Vec::with_capacity(names.len());
        for name in names {
            if let Some(lock) = self.locks.get(name) {
                guards.push(lock.lock().await);
            }
        }
        guards
    }

    /// Run a store call under the configured timeout
    async fn call<T, F>(&self, operation: &'static str, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let _timer = metrics::start_store_timer(operation);
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(operation, error = %e, "Store call failed");
                LedgerError::Store(e)
            }),
            Err(_) => {
                let timeout_ms = self.config.store_timeout.as_millis() as u64;
                tracing::warn!(operation, timeout_ms, "Store call timed out");
                Err(LedgerError::Store(StoreError::Timeout {
                    operation,
                    timeout_ms,
                }))
            }
        }
    }

    /// Publish the full ventilator set in the background
    fn notify_ventilators(&self) {
        let store = Arc::clone(&self.store);
        let broadcaster = Arc::clone(&self.broadcaster);
        let LedgerConfig {
            store_timeout,
            broadcast_timeout,
        } = self.config.clone();

        tokio::spawn(async move {
            let records = match tokio::time::timeout(store_timeout, store.list_ventilators()).await
            {
                Ok(Ok(records)) => records,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Could not load ventilators for broadcast");
                    metrics::record_broadcast("failed");
                    return;
                }
                Err(_) => {
                    tracing::warn!("Loading ventilators for broadcast timed out");
                    metrics::record_broadcast("timeout");
                    return;
                }
            };

            // Never cut a broadcaster's own retries short
            let publish_timeout = broadcaster
                .delivery_budget()
                .map_or(broadcast_timeout, |budget| budget.max(broadcast_timeout));

            let count = records.len();
            let event = BroadcastEvent::ventilator_update(records);
            match tokio::time::timeout(publish_timeout, broadcaster.publish(event)).await {
                Ok(Ok(())) => {
                    tracing::debug!(broadcaster = broadcaster.name(), records = count, "Ventilator update sent");
                    metrics::record_broadcast("sent");
                }
                Ok(Err(e)) => {
                    tracing::warn!(broadcaster = broadcaster.name(), error = %e, "Ventilator update failed");
                    metrics::record_broadcast("failed");
                }
                Err(_) => {
                    let err = BroadcastError::Timeout(publish_timeout.as_millis() as u64);
                    tracing::warn!(broadcaster = broadcaster.name(), error = %err, "Ventilator update dropped");
                    metrics::record_broadcast("timeout");
                }
            }
        });
    }
}

/// Reject the draft if it would push the facility over a limit.
///
/// `peers` excludes the record being written; `before` is the load prior to
/// the mutation. A limit only fails the write when the new total exceeds it
/// and also grows the load, so shrinking a record never fails even at a
/// facility that is already over capacity. The ventilator limit is checked
/// first.
fn check_capacity(
    facility: &Facility,
    draft: &InventoryDraft,
    peers: LocationTotals,
    before: LocationTotals,
) -> LedgerResult<()> {
    let quantity = u64::from(draft.quantity);

    if draft.is_ventilator {
        let proposed = peers.ventilators + quantity;
        if proposed > u64::from(facility.ventilator_capacity) && proposed > before.ventilators {
            return Err(capacity_error(
                CapacityKind::Ventilator,
                facility,
                facility.ventilator_capacity,
                peers.ventilators,
                draft.quantity,
            ));
        }
    }

    let proposed = peers.total + quantity;
    if proposed > u64::from(facility.capacity) && proposed > before.total {
        return Err(capacity_error(
            CapacityKind::General,
            facility,
            facility.capacity,
            peers.total,
            draft.quantity,
        ));
    }

    Ok(())
}

fn capacity_error(
    kind: CapacityKind,
    facility: &Facility,
    limit: u32,
    current: u64,
    requested: u32,
) -> LedgerError {
    tracing::info!(
        kind = kind.as_str(),
        location = %facility.name,
        limit,
        current,
        requested,
        "Capacity check rejected mutation"
    );
    metrics::record_capacity_rejection(kind.as_str(), &facility.name);

    LedgerError::CapacityExceeded {
        kind,
        location: facility.name.clone(),
        limit,
        current,
        requested,
    }
}

fn record_outcome<T>(operation: &str, result: &LedgerResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(LedgerError::Store(_)) => "error",
        Err(_) => "rejected",
    };
    metrics::record_mutation(operation, outcome);
}
