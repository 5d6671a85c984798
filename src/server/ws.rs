//! WebSocket stream of broadcast events
//!
//! Clients connect to `/ws` and receive every broadcast event as a JSON
//! text frame (`{"event": "ventilatorUpdate", "payload": [...], ...}`).
//! A snapshot of the current ventilator records is sent on connect.
//! Slow clients that fall behind get a `lagged` notice instead of the
//! dropped events.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::metrics;
use crate::notifications::BroadcastEvent;

use super::app::AppState;

/// Notice sent when a client missed events
#[derive(Debug, Serialize)]
struct LaggedNotice {
    event: &'static str,
    skipped: u64,
}

/// Upgrade to a WebSocket and start streaming
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe();
    let ping_every = Duration::from_secs(state.config.ws_ping_interval_secs);

    metrics::ws_client_connected(true);
    tracing::debug!(subscribers = state.events.subscriber_count(), "WebSocket client connected");

    match state.ledger.ventilator_records().await {
        Ok(records) => {
            let snapshot = BroadcastEvent::ventilator_update(records);
            if let Ok(json) = serde_json::to_string(&snapshot) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    metrics::ws_client_connected(false);
                    return;
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not load snapshot for WebSocket client"),
    }

    let forward_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_every);
        ping.tick().await;

        loop {
            tokio::select! {
                result = events.recv() => {
                    let json = match result {
                        Ok(event) => serde_json::to_string(&event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "WebSocket client lagged, events dropped");
                            serde_json::to_string(&LaggedNotice { event: "lagged", skipped })
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    };
                    match json {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::error!(error = %e, "Failed to encode event"),
                    }
                }
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Dashboards only listen; drain until the client goes away
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Close(_) => break,
            Message::Pong(_) => tracing::trace!("Received pong"),
            _ => tracing::trace!("Ignoring client frame"),
        }
    }

    forward_task.abort();
    metrics::ws_client_connected(false);
    tracing::debug!("WebSocket client disconnected");
}
