//! Pure aggregation over inventory records
//!
//! Nothing here touches the store. The ledger loads records and hands them
//! to these functions, so capacity arithmetic can be tested in isolation.

use std::collections::HashMap;

use serde::Serialize;

use crate::facility::{Facility, FacilityRegistry, FacilityType};
use crate::geo::Coordinates;
use crate::models::{InventoryRecord, ItemStatus};

/// Quantity sums at one location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationTotals {
    /// Sum of all quantities
    pub total: u64,
    /// Sum of ventilator quantities
    pub ventilators: u64,
}

impl LocationTotals {
    fn add(&mut self, record: &InventoryRecord) {
        let qty = u64::from(record.quantity);
        self.total += qty;
        if record.is_ventilator {
            self.ventilators += qty;
        }
    }
}

/// Totals at `location`, skipping the record with id `excluding_id`
pub fn peer_totals(
    records: &[InventoryRecord],
    location: &str,
    excluding_id: Option<&str>,
) -> LocationTotals {
    let mut totals = LocationTotals::default();
    for record in records
        .iter()
        .filter(|r| r.hospital_location == location)
        .filter(|r| excluding_id != Some(r.id.as_str()))
    {
        totals.add(record);
    }
    totals
}

/// Per-facility ventilator breakdown by status
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentilatorAggregate {
    pub name: String,
    /// The facility's ventilator capacity
    pub total: u32,
    pub available: u64,
    pub in_use: u64,
    pub maintenance: u64,
    pub out_of_order: u64,
    /// Percentage of capacity not available, capped at 100
    pub utilization: f64,
}

impl VentilatorAggregate {
    fn empty(facility: &Facility) -> Self {
        Self {
            name: facility.name.clone(),
            total: facility.ventilator_capacity,
            available: 0,
            in_use: 0,
            maintenance: 0,
            out_of_order: 0,
            utilization: 0.0,
        }
    }

    fn add(&mut self, status: ItemStatus, quantity: u64) {
        match status {
            ItemStatus::Available => self.available += quantity,
            ItemStatus::InUse => self.in_use += quantity,
            ItemStatus::Maintenance => self.maintenance += quantity,
            ItemStatus::OutOfOrder => self.out_of_order += quantity,
        }
    }

    fn finish(&mut self) {
        let used = self.in_use + self.maintenance + self.out_of_order;
        self.utilization = if self.total == 0 {
            0.0
        } else {
            round1((used as f64 / f64::from(self.total) * 100.0).min(100.0))
        };
    }
}

/// Ventilator aggregates for every ventilator-capable facility, in registry
/// order. Records at unknown locations or non-ventilator records are ignored.
pub fn ventilator_status(
    registry: &FacilityRegistry,
    records: &[InventoryRecord],
) -> Vec<VentilatorAggregate> {
    let mut aggregates: Vec<VentilatorAggregate> = registry
        .all()
        .iter()
        .filter(|f| f.ventilator_capacity > 0)
        .map(VentilatorAggregate::empty)
        .collect();

    let index: HashMap<String, usize> = aggregates
        .iter()
        .enumerate()
        .map(|(i, agg)| (agg.name.clone(), i))
        .collect();

    for record in records.iter().filter(|r| r.is_ventilator) {
        if let Some(&i) = index.get(&record.hospital_location) {
            aggregates[i].add(record.status, u64::from(record.quantity));
        }
    }
    for agg in &mut aggregates {
        agg.finish();
    }
    aggregates
}

/// Live ventilator quantity per facility name
pub fn ventilator_counts(records: &[InventoryRecord]) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for record in records.iter().filter(|r| r.is_ventilator) {
        *counts.entry(record.hospital_location.clone()).or_insert(0) +=
            u64::from(record.quantity);
    }
    counts
}

/// Facility reference data joined with its current load
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStats {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub facility_type: FacilityType,
    pub region: String,
    pub capacity: u32,
    pub ventilator_capacity: u32,
    pub alert_threshold: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub total_items: u64,
    pub ventilators: u64,
    /// totalItems / capacity as a percentage
    pub utilization: f64,
    /// Utilization is above the facility's alert threshold
    pub alert: bool,
}

/// Stats for every facility, in registry order
pub fn location_stats(
    registry: &FacilityRegistry,
    records: &[InventoryRecord],
) -> Vec<LocationStats> {
    let mut totals: HashMap<&str, LocationTotals> = HashMap::new();
    for record in records {
        totals
            .entry(record.hospital_location.as_str())
            .or_default()
            .add(record);
    }

    registry
        .all()
        .iter()
        .map(|facility| {
            let t = totals.get(facility.name.as_str()).copied().unwrap_or_default();
            let utilization = capacity_utilization(t.total, facility.capacity);
            LocationStats {
                id: facility.id.clone(),
                name: facility.name.clone(),
                facility_type: facility.facility_type,
                region: facility.region.clone(),
                capacity: facility.capacity,
                ventilator_capacity: facility.ventilator_capacity,
                alert_threshold: facility.alert_threshold,
                coordinates: facility.coordinates,
                total_items: t.total,
                ventilators: t.ventilators,
                utilization,
                alert: utilization > f64::from(facility.alert_threshold),
            }
        })
        .collect()
}

/// `used / capacity` as a percentage with one decimal; zero capacity yields 0
pub fn capacity_utilization(used: u64, capacity: u32) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    round1(used as f64 / f64::from(capacity) * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
