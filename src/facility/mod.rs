//! Facility registry
//!
//! The registry is the static reference table of hospitals, emergency
//! centers and storage sites. It is built once at startup, either from the
//! built-in table or from a TOML/JSON file, and is read-only afterwards.
//! Share it behind an `Arc`.

mod data;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinates;

// ============================================================================
// Facility Type
// ============================================================================

/// Kind of facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityType {
    #[serde(rename = "Major Hospital")]
    MajorHospital,
    #[serde(rename = "Regional Center")]
    RegionalCenter,
    #[serde(rename = "Emergency Center")]
    EmergencyCenter,
    #[serde(rename = "Storage")]
    Storage,
    #[serde(rename = "Specialized Unit")]
    SpecializedUnit,
}

impl FacilityType {
    /// All facility types in declaration order
    pub fn all() -> [FacilityType; 5] {
        [
            Self::MajorHospital,
            Self::RegionalCenter,
            Self::EmergencyCenter,
            Self::Storage,
            Self::SpecializedUnit,
        ]
    }

    /// Display name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MajorHospital => "Major Hospital",
            Self::RegionalCenter => "Regional Center",
            Self::EmergencyCenter => "Emergency Center",
            Self::Storage => "Storage",
            Self::SpecializedUnit => "Specialized Unit",
        }
    }

    /// Parse from display name or a compact form (`major-hospital`, `MajorHospital`)
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        Self::all().into_iter().find(|t| {
            t.as_str()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
                == normalized
        })
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Facility
// ============================================================================

/// A registered location with fixed capacities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    /// Unique identifier (`central`, `north-general`, ...)
    pub id: String,

    /// Unique display name, referenced by inventory records
    pub name: String,

    /// Kind of facility
    #[serde(rename = "type")]
    pub facility_type: FacilityType,

    /// Administrative region
    pub region: String,

    /// Location, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,

    /// Total storage units
    pub capacity: u32,

    /// Maximum number of ventilator units
    pub ventilator_capacity: u32,

    /// Utilization percentage (0-100) above which an alert fires
    pub alert_threshold: u8,
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors raised by registry lookups and construction
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No facility with the given id or name
    #[error("Facility not found: {0}")]
    NotFound(String),

    /// Two facilities share an id or a name
    #[error("Duplicate facility {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// A facility entry failed validation
    #[error("Invalid facility '{id}': {reason}")]
    Invalid { id: String, reason: String },

    /// Registry file could not be read
    #[error("Failed to read registry file: {0}")]
    Io(#[from] std::io::Error),

    /// Registry file could not be parsed
    #[error("Failed to parse registry file: {0}")]
    Parse(String),
}

/// File layout for registry files: a list of `[[facility]]` tables
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(rename = "facility", default)]
    facilities: Vec<Facility>,
}

// ============================================================================
// Facility Registry
// ============================================================================

/// Immutable, indexed facility table
#[derive(Debug, Clone)]
pub struct FacilityRegistry {
    facilities: Vec<Facility>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl FacilityRegistry {
    /// Build a registry, validating every entry
    pub fn new(facilities: Vec<Facility>) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(facilities.len());
        let mut by_name = HashMap::with_capacity(facilities.len());

        for (idx, facility) in facilities.iter().enumerate() {
            validate_facility(facility)?;

            if by_id.insert(facility.id.clone(), idx).is_some() {
                return Err(RegistryError::Duplicate {
                    field: "id",
                    value: facility.id.clone(),
                });
            }
            if by_name.insert(facility.name.clone(), idx).is_some() {
                return Err(RegistryError::Duplicate {
                    field: "name",
                    value: facility.name.clone(),
                });
            }
        }

        Ok(Self {
            facilities,
            by_id,
            by_name,
        })
    }

    /// The built-in facility table
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(data::builtin_facilities())
    }

    /// Load a registry from a `.toml` or `.json` file.
    ///
    /// TOML files hold `[[facility]]` tables; JSON files hold either a bare
    /// array of facilities or `{"facility": [...]}`.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;

        let facilities = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                let value: serde_json::Value = serde_json::from_str(&content)
                    .map_err(|e| RegistryError::Parse(e.to_string()))?;
                if value.is_array() {
                    serde_json::from_value::<Vec<Facility>>(value)
                } else {
                    serde_json::from_value::<RegistryFile>(value).map(|f| f.facilities)
                }
                .map_err(|e| RegistryError::Parse(e.to_string()))?
            }
            _ => {
                toml::from_str::<RegistryFile>(&content)
                    .map_err(|e| RegistryError::Parse(e.to_string()))?
                    .facilities
            }
        };

        let registry = Self::new(facilities)?;
        tracing::info!(
            path = %path.display(),
            facilities = registry.len(),
            "Facility registry loaded"
        );
        Ok(registry)
    }

    /// Look up a facility by id
    pub fn get_by_id(&self, id: &str) -> Result<&Facility, RegistryError> {
        self.by_id
            .get(id)
            .map(|&idx| &self.facilities[idx])
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Look up a facility by its display name
    pub fn get_by_name(&self, name: &str) -> Result<&Facility, RegistryError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.facilities[idx])
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Facilities in a region (exact match), registry order
    pub fn get_by_region(&self, region: &str) -> Vec<&Facility> {
        self.facilities
            .iter()
            .filter(|f| f.region == region)
            .collect()
    }

    /// Facilities of a type, registry order
    pub fn get_by_type(&self, facility_type: FacilityType) -> Vec<&Facility> {
        self.facilities
            .iter()
            .filter(|f| f.facility_type == facility_type)
            .collect()
    }

    /// Distinct regions in order of first appearance
    pub fn all_regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = Vec::new();
        for facility in &self.facilities {
            if !regions.contains(&facility.region.as_str()) {
                regions.push(&facility.region);
            }
        }
        regions
    }

    /// Distinct facility types in order of first appearance
    pub fn all_types(&self) -> Vec<FacilityType> {
        let mut types = Vec::new();
        for facility in &self.facilities {
            if !types.contains(&facility.facility_type) {
                types.push(facility.facility_type);
            }
        }
        types
    }

    /// Facility names in registry order
    pub fn list_names(&self) -> Vec<&str> {
        self.facilities.iter().map(|f| f.name.as_str()).collect()
    }

    /// Every facility in registry order
    pub fn all(&self) -> &[Facility] {
        &self.facilities
    }

    /// Whether a facility with this name exists
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of facilities
    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}

fn validate_facility(facility: &Facility) -> Result<(), RegistryError> {
    let invalid = |reason: String| RegistryError::Invalid {
        id: facility.id.clone(),
        reason,
    };

    if facility.id.trim().is_empty() {
        return Err(invalid("id must not be empty".to_string()));
    }
    if facility.name.trim().is_empty() {
        return Err(invalid("name must not be empty".to_string()));
    }
    if facility.alert_threshold > 100 {
        return Err(invalid(format!(
            "alertThreshold {} is not a percentage",
            facility.alert_threshold
        )));
    }
    if let Some(coords) = &facility.coordinates {
        coords.validate().map_err(|e| invalid(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility(id: &str, name: &str) -> Facility {
        Facility {
            id: id.to_string(),
            name: name.to_string(),
            facility_type: FacilityType::MajorHospital,
            region: "Central".to_string(),
            coordinates: Some(Coordinates {
                lat: 12.9716,
                lng: 77.5946,
            }),
            capacity: 100,
            ventilator_capacity: 10,
            alert_threshold: 20,
        }
    }

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = FacilityRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 52);

        let central = registry.get_by_id("central").unwrap();
        assert_eq!(central.name, "Central Hospital");
        assert_eq!(central.ventilator_capacity, 50);
        assert_eq!(central.capacity, 1000);
    }

    #[test]
    fn test_lookup_misses_are_errors() {
        let registry = FacilityRegistry::builtin().unwrap();
        assert!(matches!(
            registry.get_by_id("nowhere"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(registry.get_by_name("Nowhere Hospital").is_err());
    }

    #[test]
    fn test_region_and_type_queries() {
        let registry = FacilityRegistry::builtin().unwrap();

        let storage = registry.get_by_type(FacilityType::Storage);
        assert!(storage.iter().all(|f| f.facility_type == FacilityType::Storage));
        assert_eq!(storage.len(), 4);

        let east = registry.get_by_region("East");
        assert!(!east.is_empty());
        assert!(east.iter().all(|f| f.region == "East"));

        let regions = registry.all_regions();
        assert_eq!(regions[0], "Central");
        assert!(regions.contains(&"Southwest"));

        assert_eq!(registry.all_types().len(), 5);
        assert_eq!(registry.list_names()[0], "Central Hospital");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = FacilityRegistry::new(vec![facility("a", "Same"), facility("b", "Same")]);
        assert!(matches!(
            result,
            Err(RegistryError::Duplicate { field: "name", .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = FacilityRegistry::new(vec![facility("a", "One"), facility("a", "Two")]);
        assert!(matches!(
            result,
            Err(RegistryError::Duplicate { field: "id", .. })
        ));
    }

    #[test]
    fn test_invalid_entries_rejected() {
        let mut bad = facility("a", "One");
        bad.alert_threshold = 150;
        assert!(FacilityRegistry::new(vec![bad]).is_err());

        let mut bad = facility("a", "One");
        bad.coordinates = Some(Coordinates { lat: 100.0, lng: 0.0 });
        assert!(FacilityRegistry::new(vec![bad]).is_err());
    }

    #[test]
    fn test_facility_type_parse() {
        assert_eq!(
            FacilityType::parse("Major Hospital"),
            Some(FacilityType::MajorHospital)
        );
        assert_eq!(
            FacilityType::parse("specialized-unit"),
            Some(FacilityType::SpecializedUnit)
        );
        assert_eq!(FacilityType::parse("Storage"), Some(FacilityType::Storage));
        assert_eq!(FacilityType::parse("Clinic"), None);
    }

    #[test]
    fn test_facility_wire_format() {
        let json = serde_json::to_value(facility("a", "One")).unwrap();
        assert_eq!(json["type"], "Major Hospital");
        assert_eq!(json["ventilatorCapacity"], 10);
        assert_eq!(json["alertThreshold"], 20);
        assert_eq!(json["coordinates"]["lat"], 12.9716);
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facilities.toml");
        std::fs::write(
            &path,
            r#"
[[facility]]
id = "alpha"
name = "Alpha Hospital"
type = "Major Hospital"
region = "North"
coordinates = { lat = 13.0, lng = 77.5 }
capacity = 300
ventilatorCapacity = 12
alertThreshold = 25

[[facility]]
id = "depot"
name = "Depot"
type = "Storage"
region = "North"
capacity = 2000
ventilatorCapacity = 0
alertThreshold = 10
"#,
        )
        .unwrap();

        let registry = FacilityRegistry::from_file(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get_by_name("Depot").unwrap().coordinates.is_none());
    }

    #[test]
    fn test_from_json_array_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facilities.json");
        let json = serde_json::to_string(&vec![facility("a", "One"), facility("b", "Two")]).unwrap();
        std::fs::write(&path, json).unwrap();

        let registry = FacilityRegistry::from_file(&path).unwrap();
        assert_eq!(registry.list_names(), vec!["One", "Two"]);
    }
}
