//! Live update delivery for dashboards
//!
//! The ledger only knows the [`Broadcaster`] trait. Transports plug in
//! behind it and the ledger calls them fire-and-forget.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │              InventoryLedger               │
//! │  - publishes `ventilatorUpdate` events     │
//! └────────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌────────────────────────────────────────────┐
//! │            FanoutBroadcaster               │
//! └────────────────────────────────────────────┘
//!               │                 │
//!               ▼                 ▼
//!   ┌───────────────────┐ ┌───────────────────┐
//!   │ ChannelBroadcaster│ │ WebhookBroadcaster│
//!   │  (WebSocket feed) │ │   (HTTP POST)     │
//!   └───────────────────┘ └───────────────────┘
//! ```

pub mod alerts;
pub mod channel;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::InventoryRecord;

pub use alerts::{capacity_alerts, AlertSeverity, CapacityAlert};
pub use channel::ChannelBroadcaster;
pub use webhook::{WebhookBroadcaster, WebhookConfig};

/// Event name for ventilator updates
pub const VENTILATOR_UPDATE: &str = "ventilatorUpdate";

/// Result type for broadcaster operations
pub type BroadcastResult<T> = Result<T, BroadcastError>;

/// Errors raised while delivering an event
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Endpoint rejected event: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Invalid broadcaster configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Delivery did not finish in time
    #[error("Broadcast timed out after {0}ms")]
    Timeout(u64),

    /// One or more targets of a fan-out failed
    #[error("{failed} of {total} broadcasters failed: {first}")]
    Partial {
        failed: usize,
        total: usize,
        first: String,
    },
}

/// A named event with the full current ventilator record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEvent {
    pub event: String,
    pub payload: Vec<InventoryRecord>,
    pub emitted_at: DateTime<Utc>,
}

impl BroadcastEvent {
    /// Build a `ventilatorUpdate` event
    pub fn ventilator_update(records: Vec<InventoryRecord>) -> Self {
        Self {
            event: VENTILATOR_UPDATE.to_string(),
            payload: records,
            emitted_at: Utc::now(),
        }
    }
}

/// Push transport for inventory events
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Transport name for logs
    fn name(&self) -> &str;

    /// Deliver one event
    async fn publish(&self, event: BroadcastEvent) -> BroadcastResult<()>;

    /// Worst-case time one `publish` needs to exhaust its own retries.
    ///
    /// Callers that bound delivery must allow at least this much.
    fn delivery_budget(&self) -> Option<Duration> {
        None
    }
}

/// Broadcaster that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBroadcaster;

#[async_trait]
impl Broadcaster for NoopBroadcaster {
    fn name(&self) -> &str {
        "noop"
    }

    async fn publish(&self, _event: BroadcastEvent) -> BroadcastResult<()> {
        Ok(())
    }
}

/// Publishes each event to several broadcasters concurrently.
///
/// Every target is attempted; a failure in one does not stop the others.
#[derive(Default, Clone)]
pub struct FanoutBroadcaster {
    targets: Vec<Arc<dyn Broadcaster>>,
}

impl FanoutBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target
    pub fn with(mut self, target: Arc<dyn Broadcaster>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl Broadcaster for FanoutBroadcaster {
    fn name(&self) -> &str {
        "fanout"
    }

    fn delivery_budget(&self) -> Option<Duration> {
        self.targets
            .iter()
            .filter_map(|target| target.delivery_budget())
            .max()
    }

    async fn publish(&self, event: BroadcastEvent) -> BroadcastResult<()> {
        let results = futures::future::join_all(
            self.targets
                .iter()
                .map(|target| target.publish(event.clone())),
        )
        .await;

        let mut failures = Vec::new();
        for (target, result) in self.targets.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(broadcaster = target.name(), error = %e, "Broadcast target failed");
                failures.push(e.to_string());
            }
        }

        match failures.first() {
            None => Ok(()),
            Some(first) => Err(BroadcastError::Partial {
                failed: failures.len(),
                total: self.targets.len(),
                first: first.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBroadcaster;

    #[async_trait]
    impl Broadcaster for FailingBroadcaster {
        fn name(&self) -> &str {
            "failing"
        }

        async fn publish(&self, _event: BroadcastEvent) -> BroadcastResult<()> {
            Err(BroadcastError::InvalidConfig("always fails".to_string()))
        }
    }

    #[test]
    fn test_event_wire_format() {
        let event = BroadcastEvent::ventilator_update(Vec::new());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ventilatorUpdate");
        assert!(json["payload"].as_array().unwrap().is_empty());
        assert!(json["emittedAt"].is_string());
    }

    #[tokio::test]
    async fn test_noop_accepts_everything() {
        let noop = NoopBroadcaster;
        assert!(noop
            .publish(BroadcastEvent::ventilator_update(Vec::new()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_fanout_delivers_to_all_targets() {
        let channel = Arc::new(ChannelBroadcaster::new(8));
        let mut rx = channel.subscribe();

        let fanout = FanoutBroadcaster::new()
            .with(Arc::new(FailingBroadcaster))
            .with(channel.clone());
        assert_eq!(fanout.len(), 2);

        let result = fanout
            .publish(BroadcastEvent::ventilator_update(Vec::new()))
            .await;

        assert!(matches!(
            result,
            Err(BroadcastError::Partial {
                failed: 1,
                total: 2,
                ..
            })
        ));
        // The healthy target still received the event
        assert_eq!(rx.recv().await.unwrap().event, VENTILATOR_UPDATE);
    }

    #[test]
    fn test_fanout_budget_is_slowest_target() {
        let slow = WebhookBroadcaster::new(
            WebhookConfig::new("http://localhost:9/slow").with_retries(1, 100),
        )
        .unwrap();
        let fast = WebhookBroadcaster::new(
            WebhookConfig::new("http://localhost:9/fast")
                .with_retries(0, 0)
                .with_timeout_ms(50),
        )
        .unwrap();

        let fanout = FanoutBroadcaster::new()
            .with(Arc::new(NoopBroadcaster))
            .with(Arc::new(fast))
            .with(Arc::new(slow));
        // 2 x 5000ms attempts plus one 100ms backoff
        assert_eq!(fanout.delivery_budget(), Some(Duration::from_millis(10_100)));
        assert_eq!(FanoutBroadcaster::new().delivery_budget(), None);
    }

    #[tokio::test]
    async fn test_empty_fanout_is_ok() {
        let fanout = FanoutBroadcaster::new();
        assert!(fanout.is_empty());
        assert!(fanout
            .publish(BroadcastEvent::ventilator_update(Vec::new()))
            .await
            .is_ok());
    }
}
