//! Nearest-facility resolver for ambulance routing

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::facility::{Facility, FacilityRegistry};
use crate::geo::{distance_km, CoordinateError, Coordinates};

/// Number of facilities returned when the caller does not ask
pub const DEFAULT_NEAREST_COUNT: usize = 5;

/// A facility with its distance from the query point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceResult {
    #[serde(flatten)]
    pub facility: Facility,

    /// Kilometres from the query point
    pub distance: f64,

    /// Live ventilator quantity, when enriched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ventilators: Option<u64>,
}

/// Options for a nearest-facility search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearestQuery {
    pub count: usize,
    /// Skip facilities with fewer live ventilators (requires counts)
    pub min_ventilators: Option<u64>,
}

impl Default for NearestQuery {
    fn default() -> Self {
        Self {
            count: DEFAULT_NEAREST_COUNT,
            min_ventilators: None,
        }
    }
}

impl NearestQuery {
    pub fn count(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    pub fn with_min_ventilators(mut self, min: u64) -> Self {
        self.min_ventilators = Some(min);
        self
    }
}

/// Ranks registry facilities by great-circle distance
#[derive(Debug, Clone)]
pub struct NearestFacilityResolver {
    registry: Arc<FacilityRegistry>,
}

impl NearestFacilityResolver {
    pub fn new(registry: Arc<FacilityRegistry>) -> Self {
        Self { registry }
    }

    /// Nearest `count` facilities to `origin`, closest first.
    ///
    /// Facilities without coordinates are skipped. Equal distances keep
    /// registry order.
    pub fn find_nearest(
        &self,
        origin: Coordinates,
        count: usize,
    ) -> Result<Vec<DistanceResult>, CoordinateError> {
        self.find_nearest_with(origin, &NearestQuery::count(count), None)
    }

    /// Nearest facilities, optionally joined with live ventilator counts
    /// keyed by facility name.
    pub fn find_nearest_with(
        &self,
        origin: Coordinates,
        query: &NearestQuery,
        ventilators: Option<&HashMap<String, u64>>,
    ) -> Result<Vec<DistanceResult>, CoordinateError> {
        origin.validate()?;
        if query.count == 0 {
            return Ok(Vec::new());
        }

        let mut ranked = Vec::new();
        for facility in self.registry.all() {
            let Some(coords) = facility.coordinates else {
                continue;
            };
            let live = ventilators.map(|counts| counts.get(&facility.name).copied().unwrap_or(0));
            if let (Some(min), Some(live)) = (query.min_ventilators, live) {
                if live < min {
                    continue;
                }
            }

            ranked.push(DistanceResult {
                facility: facility.clone(),
                distance: distance_km(&origin, &coords)?,
                ventilators: live,
            });
        }

        // Stable, so ties keep registry order
        ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ranked.truncate(query.count);

        tracing::debug!(
            lat = origin.lat,
            lng = origin.lng,
            results = ranked.len(),
            "Resolved nearest facilities"
        );
        Ok(ranked)
    }
}
