//! Core inventory data structures
//!
//! Wire names follow the dashboard contract: camelCase fields, and the
//! human-readable status labels (`"In Use"`, `"Out of Order"`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inventory item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Equipment,
    #[serde(rename = "PPE")]
    Ppe,
    Supplies,
    Medicine,
}

impl Category {
    /// All categories
    pub fn all() -> [Category; 4] {
        [Self::Equipment, Self::Ppe, Self::Supplies, Self::Medicine]
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equipment => "Equipment",
            Self::Ppe => "PPE",
            Self::Supplies => "Supplies",
            Self::Medicine => "Medicine",
        }
    }

    /// Parse from the wire name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status of an inventory line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    Available,
    #[serde(rename = "In Use")]
    InUse,
    Maintenance,
    #[serde(rename = "Out of Order")]
    OutOfOrder,
}

impl ItemStatus {
    /// All statuses
    pub fn all() -> [ItemStatus; 4] {
        [
            Self::Available,
            Self::InUse,
            Self::Maintenance,
            Self::OutOfOrder,
        ]
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::InUse => "In Use",
            Self::Maintenance => "Maintenance",
            Self::OutOfOrder => "Out of Order",
        }
    }

    /// Parse from the wire name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored inventory line at one facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    /// Generated on create
    pub id: String,

    /// Item name (trimmed, non-empty)
    pub name: String,

    /// Units on hand; zero is a tracked but depleted line
    pub quantity: u32,

    pub category: Category,

    /// Name of the facility holding the item
    pub hospital_location: String,

    pub is_ventilator: bool,

    pub status: ItemStatus,

    /// Set on every mutation
    pub last_updated: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Create a new record from a validated draft
    pub fn new(draft: InventoryDraft) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            quantity: draft.quantity,
            category: draft.category,
            hospital_location: draft.hospital_location,
            is_ventilator: draft.is_ventilator,
            status: draft.status,
            last_updated: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields, keeping identity and creation time
    pub fn apply(&self, draft: InventoryDraft) -> Self {
        let now = Utc::now();
        Self {
            id: self.id.clone(),
            name: draft.name,
            quantity: draft.quantity,
            category: draft.category,
            hospital_location: draft.hospital_location,
            is_ventilator: draft.is_ventilator,
            status: draft.status,
            last_updated: now,
            created_at: self.created_at,
            updated_at: now,
        }
    }
}

/// Raw create/update submission.
///
/// Every field is optional so that validation can report all problems at
/// once instead of failing on the first missing key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    #[serde(default)]
    pub name: Option<String>,

    /// Kept as a float so fractional or negative input reaches validation
    #[serde(default)]
    pub quantity: Option<f64>,

    #[serde(default)]
    pub category: Option<Category>,

    #[serde(default)]
    pub hospital_location: Option<String>,

    #[serde(default)]
    pub is_ventilator: bool,

    #[serde(default)]
    pub status: Option<ItemStatus>,
}

impl InventoryInput {
    /// Convenience constructor used by tests and the CLI
    pub fn new(
        name: impl Into<String>,
        quantity: u32,
        category: Category,
        hospital_location: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            quantity: Some(f64::from(quantity)),
            category: Some(category),
            hospital_location: Some(hospital_location.into()),
            is_ventilator: false,
            status: None,
        }
    }

    /// Mark the submission as a ventilator line
    pub fn ventilator(mut self) -> Self {
        self.is_ventilator = true;
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(f64::from(quantity));
        self
    }

    /// Set the location
    pub fn at(mut self, hospital_location: impl Into<String>) -> Self {
        self.hospital_location = Some(hospital_location.into());
        self
    }
}

/// A submission that passed field validation
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryDraft {
    pub name: String,
    pub quantity: u32,
    pub category: Category,
    pub hospital_location: String,
    pub is_ventilator: bool,
    pub status: ItemStatus,
}
