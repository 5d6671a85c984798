//! HTTP API tests driven through the router without a socket

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use medstock::server::{InventoryServer, ServerConfig};

fn router() -> Router {
    let (ledger, events) = common::memory_ledger();
    InventoryServer::new(ServerConfig::default(), ledger, events)
        .unwrap()
        .build_router()
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn ventilator_body(quantity: u32, location: &str) -> Value {
    json!({
        "name": "Ventilator",
        "quantity": quantity,
        "category": "Equipment",
        "hospitalLocation": location,
        "isVentilator": true,
        "status": "Available"
    })
}

#[tokio::test]
async fn test_health() {
    let app = router();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["facilities"], 52);
}

#[tokio::test]
async fn test_inventory_crud() {
    let app = router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(ventilator_body(4, "ICU Complex")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let id = body["item"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["item"]["hospitalLocation"], "ICU Complex");

    let (status, body) = send(&app, Method::GET, &format!("/api/inventory/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["quantity"], 4);

    let mut update = ventilator_body(6, "ICU Complex");
    update["status"] = json!("In Use");
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/inventory/{id}"),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["status"], "In Use");

    let (status, body) = send(&app, Method::GET, "/api/inventory?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 1);
    assert_eq!(body["itemsPerPage"], 5);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/inventory/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &format!("/api/inventory/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_validation_and_capacity_errors() {
    let app = router();

    let (status, body) = send(&app, Method::POST, "/api/inventory", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"].as_array().unwrap().len(), 4);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(ventilator_body(21, "Emergency Care Unit 1")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(ventilator_body(1, "Nowhere Clinic")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Nowhere Clinic"));
}

#[tokio::test]
async fn test_ventilator_endpoint_shape() {
    let app = router();
    send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(ventilator_body(10, "Central Hospital")),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/inventory/ventilators", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["ventilatorStatus"].as_array().unwrap();
    let central = rows
        .iter()
        .find(|r| r["name"] == "Central Hospital")
        .unwrap();
    assert_eq!(central["total"], 50);
    assert_eq!(central["available"], 10);
    assert!(central.get("outOfOrder").is_some());
}

#[tokio::test]
async fn test_location_endpoints() {
    let app = router();

    let (status, body) = send(&app, Method::GET, "/api/locations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locations"].as_array().unwrap().len(), 52);

    let (_, body) = send(&app, Method::GET, "/api/locations/central", None).await;
    assert_eq!(body["facility"]["name"], "Central Hospital");
    assert_eq!(body["facility"]["type"], "Major Hospital");

    let (status, _) = send(&app, Method::GET, "/api/locations/no-such-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/locations/region/North", None).await;
    let north = body["facilities"].as_array().unwrap();
    assert!(!north.is_empty());
    assert!(north.iter().all(|f| f["region"] == "North"));

    let (status, body) = send(&app, Method::GET, "/api/locations/region/Atlantis", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["facilities"].as_array().unwrap().is_empty());

    let (_, body) = send(&app, Method::GET, "/api/locations/type/Storage", None).await;
    assert!(body["facilities"]
        .as_array()
        .unwrap()
        .iter()
        .all(|f| f["type"] == "Storage"));

    let (status, _) = send(&app, Method::GET, "/api/locations/type/Spaceport", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::GET, "/api/locations/stats", None).await;
    assert_eq!(body["stats"].as_array().unwrap().len(), 52);

    let (_, body) = send(&app, Method::GET, "/api/locations/alerts", None).await;
    assert!(body["alerts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_nearest_hospitals() {
    let app = router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/locations/nearest",
        Some(json!({ "lat": 12.9716, "lng": "77.5946", "count": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hospitals = body["hospitals"].as_array().unwrap();
    assert_eq!(hospitals.len(), 3);
    assert_eq!(hospitals[0]["name"], "Central Hospital");
    assert!(hospitals[0]["distance"].as_f64().unwrap() < 1e-6);
    assert_eq!(hospitals[0]["ventilators"], 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/locations/nearest",
        Some(json!({ "lat": 12.9716 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/locations/nearest",
        Some(json!({ "lat": 95.0, "lng": 77.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_sort_field_falls_back() {
    let app = router();
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/inventory?sortField=bogus&sortOrder=asc&page=0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentPage"], 1);
}
