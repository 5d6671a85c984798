//! HTTP server configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

use crate::storage::query::DEFAULT_PAGE_SIZE;

const DEFAULT_PORT: u16 = 5000;

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
}

/// Configuration for the inventory HTTP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Enable permissive CORS for dashboards served elsewhere
    pub enable_cors: bool,

    /// Trace every request
    pub enable_request_logging: bool,

    /// Page size when a listing does not specify `limit`
    pub default_page_size: usize,

    /// Upper bound for `limit`
    pub max_page_size: usize,

    /// Seconds between WebSocket pings
    pub ws_ping_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            enable_cors: true,
            enable_request_logging: true,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 100,
            ws_ping_interval_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.max_page_size < self.default_page_size {
            return Err(ConfigError::InvalidValue {
                field: "max_page_size".to_string(),
                reason: "Must not be smaller than default_page_size".to_string(),
            });
        }

        if self.ws_ping_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ws_ping_interval_secs".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Clamp a requested page size to `[1, max_page_size]`
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    bind_address: Option<SocketAddr>,
    enable_cors: Option<bool>,
    enable_request_logging: Option<bool>,
    default_page_size: Option<usize>,
    max_page_size: Option<usize>,
    ws_ping_interval_secs: Option<u64>,
}

impl ServerConfigBuilder {
    /// Set bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    /// Set bind address from string
    pub fn bind_address_str(mut self, addr: &str) -> Result<Self, ConfigError> {
        self.bind_address = Some(addr.parse().map_err(|_| ConfigError::InvalidValue {
            field: "bind_address".to_string(),
            reason: format!("Invalid address: {addr}"),
        })?);
        Ok(self)
    }

    /// Enable/disable CORS
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.enable_cors = Some(enable);
        self
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = Some(size);
        self
    }

    pub fn max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = Some(size);
        self
    }

    pub fn ws_ping_interval_secs(mut self, secs: u64) -> Self {
        self.ws_ping_interval_secs = Some(secs);
        self
    }

    /// Build the config
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let defaults = ServerConfig::default();
        let config = ServerConfig {
            bind_address: self.bind_address.unwrap_or(defaults.bind_address),
            enable_cors: self.enable_cors.unwrap_or(defaults.enable_cors),
            enable_request_logging: self
                .enable_request_logging
                .unwrap_or(defaults.enable_request_logging),
            default_page_size: self.default_page_size.unwrap_or(defaults.default_page_size),
            max_page_size: self.max_page_size.unwrap_or(defaults.max_page_size),
            ws_ping_interval_secs: self
                .ws_ping_interval_secs
                .unwrap_or(defaults.ws_ping_interval_secs),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
