//! HTTP and WebSocket surface for dashboards
//!
//! # API Endpoints
//!
//! ```text
//! GET    /api/inventory                 list (page, limit, search, sortField, sortOrder)
//! POST   /api/inventory                 create
//! GET    /api/inventory/ventilators     ventilator aggregates
//! GET    /api/inventory/{id}            fetch
//! PUT    /api/inventory/{id}            update
//! DELETE /api/inventory/{id}            remove
//!
//! GET    /api/locations                 facility names
//! GET    /api/locations/stats           load per facility
//! GET    /api/locations/alerts          facilities above their threshold
//! GET    /api/locations/regions         region names
//! GET    /api/locations/types           facility types
//! GET    /api/locations/region/{region} facilities in a region
//! GET    /api/locations/type/{type}     facilities of a type
//! GET    /api/locations/{id}            one facility
//! POST   /api/locations/nearest         nearest facilities to {lat, lng}
//!
//! GET    /health                        liveness
//! GET    /metrics                       Prometheus text format
//! GET    /ws                            ventilatorUpdate stream
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod ws;

pub use app::{AppState, InventoryServer, ServerError};
pub use config::{ConfigError, ServerConfig, ServerConfigBuilder};
