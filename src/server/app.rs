//! Server assembly and lifecycle

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::ledger::InventoryLedger;
use crate::metrics;
use crate::notifications::{Broadcaster, ChannelBroadcaster, FanoutBroadcaster, WebhookBroadcaster};
use crate::resolver::NearestFacilityResolver;

use super::api::create_router;
use super::config::ServerConfig;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<InventoryLedger>,

    pub resolver: NearestFacilityResolver,

    /// Feed for WebSocket subscribers
    pub events: ChannelBroadcaster,

    /// Server start time
    pub start_time: Instant,

    pub config: ServerConfig,
}

// ============================================================================
// Inventory Server
// ============================================================================

/// The inventory HTTP server
pub struct InventoryServer {
    config: ServerConfig,
    state: AppState,
}

impl InventoryServer {
    /// Create a server around an existing ledger.
    ///
    /// `events` must be one of the ledger's broadcast targets for WebSocket
    /// clients to see updates.
    pub fn new(
        config: ServerConfig,
        ledger: Arc<InventoryLedger>,
        events: ChannelBroadcaster,
    ) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let resolver = NearestFacilityResolver::new(Arc::clone(ledger.registry()));
        let state = AppState {
            ledger,
            resolver,
            events,
            start_time: Instant::now(),
            config: config.clone(),
        };

        Ok(Self { config, state })
    }

    /// Wire registry, store and broadcasters from configuration
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        let registry = Arc::new(
            config
                .load_registry()
                .map_err(|e| ServerError::Init(e.to_string()))?,
        );
        let store = config
            .open_store()
            .map_err(|e| ServerError::Init(e.to_string()))?;

        let events = ChannelBroadcaster::new(config.broadcast.buffer);
        let mut fanout = FanoutBroadcaster::new().with(Arc::new(events.clone()));
        if let Some(webhook) = &config.broadcast.webhook {
            let hook = WebhookBroadcaster::new(webhook.clone())
                .map_err(|e| ServerError::Init(e.to_string()))?;
            tracing::info!(url = hook.url(), "Webhook broadcaster enabled");
            fanout = fanout.with(Arc::new(hook));
        }
        let broadcaster: Arc<dyn Broadcaster> = Arc::new(fanout);

        let ledger = Arc::new(InventoryLedger::new(
            registry,
            store,
            broadcaster,
            config.ledger_config(),
        ));

        Self::new(config.server.clone(), ledger, events)
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone())
            .layer(middleware::from_fn(track_api_metrics));

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(
            %addr,
            facilities = self.state.ledger.registry().len(),
            "Inventory server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Inventory server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            facilities: self.state.ledger.registry().len(),
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Count and time requests by matched route
async fn track_api_metrics(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    metrics::record_api_request(
        &endpoint,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub facilities: usize,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Inventory Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Facilities: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.facilities,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Failed to bind: {0}")]
    Bind(String),

    #[error("Server error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreKind;

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.store.kind = StoreKind::Memory;
        config
    }

    #[test]
    fn test_server_from_config() {
        let server = InventoryServer::from_config(&memory_config()).unwrap();
        let info = server.info();
        assert_eq!(info.facilities, 52);
        assert!(info.cors_enabled);
        assert!(info.display().contains("Facilities: 52"));
    }

    #[test]
    fn test_webhook_target_requires_valid_url() {
        let mut config = memory_config();
        config.broadcast.webhook = Some(crate::notifications::WebhookConfig::new("nope"));
        assert!(matches!(
            InventoryServer::from_config(&config),
            Err(ServerError::Init(_))
        ));
    }

    #[tokio::test]
    async fn test_state_shares_ledger() {
        let server = InventoryServer::from_config(&memory_config()).unwrap();
        let state = server.state();
        let page = state
            .ledger
            .list(&crate::storage::ListQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total_items, 0);
        assert_eq!(state.events.subscriber_count(), 0);
    }
}
