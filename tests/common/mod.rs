//! Common test utilities

use std::sync::Arc;

use medstock::facility::FacilityRegistry;
use medstock::ledger::{InventoryLedger, LedgerConfig};
use medstock::models::{Category, InventoryInput};
use medstock::notifications::ChannelBroadcaster;
use medstock::storage::{InventoryStore, MemoryInventoryStore};

/// Ledger over the built-in registry with an in-memory store
pub fn memory_ledger() -> (Arc<InventoryLedger>, ChannelBroadcaster) {
    ledger_with_store(Arc::new(MemoryInventoryStore::new()))
}

/// Ledger over the built-in registry with the given store
pub fn ledger_with_store(store: Arc<dyn InventoryStore>) -> (Arc<InventoryLedger>, ChannelBroadcaster) {
    let events = ChannelBroadcaster::new(16);
    let registry = Arc::new(FacilityRegistry::builtin().expect("built-in registry"));
    let ledger = InventoryLedger::new(
        registry,
        store,
        Arc::new(events.clone()),
        LedgerConfig::default(),
    );
    (Arc::new(ledger), events)
}

/// A ventilator line at `location`
#[allow(dead_code)]
pub fn ventilators(quantity: u32, location: &str) -> InventoryInput {
    InventoryInput::new("Ventilator", quantity, Category::Equipment, location).ventilator()
}

/// A non-ventilator line at `location`
#[allow(dead_code)]
pub fn supplies(name: &str, quantity: u32, location: &str) -> InventoryInput {
    InventoryInput::new(name, quantity, Category::Supplies, location)
}
