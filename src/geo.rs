//! Great-circle distance on a spherical Earth
//!
//! All public functions take coordinates in degrees and validate them
//! before converting to radians.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors raised for malformed coordinates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// A coordinate component was not supplied
    #[error("Latitude and longitude are required (missing {0})")]
    Missing(&'static str),

    /// A coordinate component could not be read as a number
    #[error("Invalid coordinates - {field} must be a number, got {value}")]
    NotANumber { field: &'static str, value: String },

    /// Latitude outside [-90, 90] or not finite
    #[error("Latitude {0} is out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180] or not finite
    #[error("Longitude {0} is out of range [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create validated coordinates
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        let coords = Self { lat, lng };
        coords.validate()?;
        Ok(coords)
    }

    /// Check that both components are finite and in range
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange(self.lat));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoordinateError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    /// Build coordinates from loosely-typed JSON values.
    ///
    /// Dashboards post either numbers or numeric strings (form fields), so
    /// both are accepted. Anything else is rejected.
    pub fn from_json(
        lat: Option<&serde_json::Value>,
        lng: Option<&serde_json::Value>,
    ) -> Result<Self, CoordinateError> {
        let lat = json_component(lat, "lat")?;
        let lng = json_component(lng, "lng")?;
        Self::new(lat, lng)
    }
}

fn json_component(
    value: Option<&serde_json::Value>,
    field: &'static str,
) -> Result<f64, CoordinateError> {
    use serde_json::Value;

    match value {
        None | Some(Value::Null) => Err(CoordinateError::Missing(field)),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| CoordinateError::NotANumber {
            field,
            value: n.to_string(),
        }),
        Some(Value::String(s)) => {
            s.trim()
                .parse::<f64>()
                .map_err(|_| CoordinateError::NotANumber {
                    field,
                    value: s.clone(),
                })
        }
        Some(other) => Err(CoordinateError::NotANumber {
            field,
            value: other.to_string(),
        }),
    }
}

/// Haversine distance between two points, in kilometres
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> Result<f64, CoordinateError> {
    a.validate()?;
    b.validate()?;

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1.0 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Ok(EARTH_RADIUS_KM * c)
}
