//! Ledger error types

use std::fmt;

use thiserror::Error;

use crate::facility::RegistryError;
use crate::geo::CoordinateError;
use crate::storage::StoreError;

/// Which capacity limit a mutation would break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapacityKind {
    /// `ventilatorCapacity`
    Ventilator,
    /// Total storage `capacity`
    General,
}

impl CapacityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ventilator => "ventilator",
            Self::General => "general",
        }
    }
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ventilator => "Ventilator",
            Self::General => "Storage",
        })
    }
}

/// Errors returned by ledger and resolver operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// One or more submitted fields are missing or malformed
    #[error("Validation failed: {}", .errors.join(", "))]
    Validation { errors: Vec<String> },

    /// `hospitalLocation` does not name a registered facility
    #[error("Invalid hospital location: {0}")]
    InvalidLocation(String),

    #[error("{0}")]
    InvalidCoordinate(#[from] CoordinateError),

    /// Applying the mutation would exceed a facility limit
    #[error("{kind} capacity exceeded at {location}: limit {limit}, current {current}, requested {requested}")]
    CapacityExceeded {
        kind: CapacityKind,
        location: String,
        limit: u32,
        current: u64,
        requested: u32,
    },

    /// Unknown record id
    #[error("Inventory item not found: {0}")]
    NotFound(String),

    /// Unknown facility id, region or type in a registry lookup
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Whether the caller may retry the same request
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }

    /// Field messages for validation failures
    pub fn field_errors(&self) -> Option<&[String]> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}
