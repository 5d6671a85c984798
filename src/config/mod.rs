//! Configuration management for the inventory service
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `MEDSTOCK_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::facility::FacilityRegistry;
use crate::ledger::LedgerConfig;
use crate::notifications::WebhookConfig;
use crate::server::ServerConfig;
use crate::storage::{InventoryStore, MemoryInventoryStore, SqliteInventoryStore};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Record store configuration
    pub store: StoreConfig,

    /// Broadcast configuration
    pub broadcast: BroadcastConfig,

    /// Facility registry source
    pub registry: RegistryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Which record store backs the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    #[default]
    Sqlite,
}

impl StoreKind {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// SQLite database path
    pub sqlite_path: PathBuf,

    /// Upper bound for one store call, in milliseconds
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Sqlite,
            sqlite_path: PathBuf::from("data/inventory.db"),
            timeout_ms: 5_000,
        }
    }
}

/// Broadcast configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Events buffered per WebSocket subscriber
    pub buffer: usize,

    /// Upper bound for one delivery, in milliseconds
    pub timeout_ms: u64,

    /// Optional webhook receiving every event
    pub webhook: Option<WebhookConfig>,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            buffer: 100,
            timeout_ms: 2_000,
            webhook: None,
        }
    }
}

/// Facility registry source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// TOML or JSON file; the built-in table is used when unset
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Defaults, then `path` if given, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::with_source(
                format!("Failed to read config file: {}", path.display()),
                e,
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse TOML config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Apply `MEDSTOCK_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(bind) = lookup("MEDSTOCK_BIND") {
            self.server.bind_address = bind
                .parse()
                .map_err(|_| Error::config(format!("MEDSTOCK_BIND is not an address: {bind}")))?;
        }

        if let Some(kind) = lookup("MEDSTOCK_STORE") {
            self.store.kind = StoreKind::parse(&kind).ok_or_else(|| {
                Error::config(format!("MEDSTOCK_STORE must be memory or sqlite, got {kind}"))
            })?;
        }

        if let Some(path) = lookup("MEDSTOCK_DB_PATH") {
            self.store.sqlite_path = PathBuf::from(path);
        }

        if let Some(ms) = lookup("MEDSTOCK_STORE_TIMEOUT_MS") {
            self.store.timeout_ms = ms.parse().map_err(|_| {
                Error::config(format!("MEDSTOCK_STORE_TIMEOUT_MS is not a number: {ms}"))
            })?;
        }

        if let Some(path) = lookup("MEDSTOCK_REGISTRY_PATH") {
            self.registry.path = Some(PathBuf::from(path));
        }

        if let Some(url) = lookup("MEDSTOCK_WEBHOOK_URL") {
            self.broadcast.webhook = Some(match self.broadcast.webhook.take() {
                Some(mut webhook) => {
                    webhook.url = url;
                    webhook
                }
                None => WebhookConfig::new(url),
            });
        }

        if let Some(level) = lookup("MEDSTOCK_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("MEDSTOCK_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.server
            .validate()
            .map_err(|e| Error::config(e.to_string()))?;

        if self.store.timeout_ms == 0 {
            return Err(Error::config("store.timeout_ms must be greater than 0"));
        }

        if self.broadcast.timeout_ms == 0 {
            return Err(Error::config("broadcast.timeout_ms must be greater than 0"));
        }

        if self.broadcast.buffer == 0 {
            return Err(Error::config("broadcast.buffer must be greater than 0"));
        }

        if let Some(webhook) = &self.broadcast.webhook {
            webhook.validate().map_err(Error::config)?;
        }

        if !matches!(self.logging.format.as_str(), "text" | "pretty" | "json") {
            return Err(Error::config(format!(
                "logging.format must be text or json, got {}",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Timing bounds handed to the ledger
    #[must_use]
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig::default()
            .with_store_timeout(Duration::from_millis(self.store.timeout_ms))
            .with_broadcast_timeout(Duration::from_millis(self.broadcast.timeout_ms))
    }

    /// Load the configured facility registry
    pub fn load_registry(&self) -> Result<FacilityRegistry> {
        let registry = match &self.registry.path {
            Some(path) => FacilityRegistry::from_file(path)?,
            None => FacilityRegistry::builtin()?,
        };
        Ok(registry)
    }

    /// Open the configured record store
    pub fn open_store(&self) -> Result<Arc<dyn InventoryStore>> {
        let store: Arc<dyn InventoryStore> = match self.store.kind {
            StoreKind::Memory => Arc::new(MemoryInventoryStore::new()),
            StoreKind::Sqlite => Arc::new(SqliteInventoryStore::open(&self.store.sqlite_path)?),
        };
        Ok(store)
    }
}
