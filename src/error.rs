//! Unified error handling for the medstock crate
//!
//! Each subsystem keeps its own error enum. [`Error`] wraps them so that
//! startup code and the CLI can propagate any of them with `?`.
//!
//! # Architecture
//!
//! - [`MedstockErrorTrait`] - Common interface implemented by the error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! ```rust,ignore
//! use medstock::error::{Error, MedstockErrorTrait};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "Retry later: {err}");
//!     } else {
//!         tracing::error!(category = %err.category(), "{err}");
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

pub use crate::facility::RegistryError;
pub use crate::geo::CoordinateError;
pub use crate::ledger::LedgerError;
pub use crate::notifications::BroadcastError;
pub use crate::storage::StoreError;

/// Common trait for medstock error types
pub trait MedstockErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input from a caller (fields, coordinates, unknown ids)
    Validation,
    /// A capacity limit would be exceeded
    Capacity,
    /// Persistence failures
    Storage,
    /// Broadcast delivery
    Network,
    /// Configuration and registry loading
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Capacity => "capacity",
            Self::Storage => "storage",
            Self::Network => "network",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MedstockErrorTrait for StoreError {
    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

impl MedstockErrorTrait for LedgerError {
    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::InvalidLocation(_)
            | Self::InvalidCoordinate(_)
            | Self::NotFound(_)
            | Self::Registry(_) => ErrorCategory::Validation,
            Self::CapacityExceeded { .. } => ErrorCategory::Capacity,
            Self::Store(_) => ErrorCategory::Storage,
        }
    }
}

impl MedstockErrorTrait for BroadcastError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfig(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig(_) => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

/// Unified error type for the medstock crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),

    #[error("Coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MedstockErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_recoverable(),
            Self::Store(e) => e.is_recoverable(),
            Self::Broadcast(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Registry(_)
            | Self::Coordinate(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Ledger(e) => e.category(),
            Self::Store(e) => e.category(),
            Self::Broadcast(e) => e.category(),
            Self::Coordinate(_) | Self::Json(_) => ErrorCategory::Validation,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Registry(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
