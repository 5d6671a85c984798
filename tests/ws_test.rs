//! WebSocket stream served over a real socket

mod common;

use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use common::ventilators;
use medstock::notifications::VENTILATOR_UPDATE;
use medstock::server::{InventoryServer, ServerConfig};

/// Next text frame as JSON, skipping control frames
async fn next_event<S>(stream: &mut S) -> Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("frame before timeout")
            .expect("stream open")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_ws_sends_snapshot_then_updates() {
    let (ledger, events) = common::memory_ledger();
    ledger.create(&ventilators(3, "ICU Complex")).await.unwrap();

    let router = InventoryServer::new(ServerConfig::default(), ledger.clone(), events)
        .unwrap()
        .build_router();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    let snapshot = next_event(&mut socket).await;
    assert_eq!(snapshot["event"], VENTILATOR_UPDATE);
    assert_eq!(snapshot["payload"].as_array().unwrap().len(), 1);

    ledger
        .create(&ventilators(2, "Central Hospital"))
        .await
        .unwrap();

    let update = next_event(&mut socket).await;
    assert_eq!(update["event"], VENTILATOR_UPDATE);
    assert_eq!(update["payload"].as_array().unwrap().len(), 2);
}
