//! In-process fan-out over a tokio broadcast channel

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{BroadcastEvent, BroadcastResult, Broadcaster};

/// Broadcaster backed by `tokio::sync::broadcast`.
///
/// Each WebSocket connection holds its own receiver. Publishing with no
/// receivers is not an error; the event is simply dropped.
#[derive(Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl ChannelBroadcaster {
    /// Create a channel buffering up to `capacity` events per slow receiver
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }

    /// Number of live receivers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    fn name(&self) -> &str {
        "channel"
    }

    async fn publish(&self, event: BroadcastEvent) -> BroadcastResult<()> {
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(receivers, "Event queued for subscribers"),
            Err(_) => tracing::trace!("No subscribers for event"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let channel = ChannelBroadcaster::new(4);
        assert_eq!(channel.subscriber_count(), 0);
        assert!(channel
            .publish(BroadcastEvent::ventilator_update(Vec::new()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let channel = ChannelBroadcaster::default();
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);

        channel
            .publish(BroadcastEvent::ventilator_update(Vec::new()))
            .await
            .unwrap();

        assert_eq!(a.recv().await.unwrap().event, "ventilatorUpdate");
        assert_eq!(b.recv().await.unwrap().event, "ventilatorUpdate");
    }
}
