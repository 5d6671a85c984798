//! REST API handlers
//!
//! Successful responses are `{"success": true, ...fields}`; failures are
//! `{"success": false, "message": ..., "errors"?: [...]}`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::facility::{Facility, FacilityType, RegistryError};
use crate::geo::Coordinates;
use crate::ledger::{LedgerError, LedgerResult, LocationStats, VentilatorAggregate};
use crate::metrics;
use crate::models::{InventoryInput, InventoryRecord};
use crate::notifications::CapacityAlert;
use crate::resolver::{DistanceResult, NearestQuery, DEFAULT_NEAREST_COUNT};
use crate::storage::{InventoryPage, ListQuery, SortField, SortOrder};

use super::app::AppState;
use super::ws::ws_handler;

// ============================================================================
// API Response Types
// ============================================================================

/// Success envelope; `data` fields are inlined next to `success`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failure envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: Some(errors),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item: InventoryRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentilatorStatusResponse {
    pub ventilator_status: Vec<VentilatorAggregate>,
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Vec<LocationStats>,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<CapacityAlert>,
}

#[derive(Debug, Serialize)]
pub struct RegionsResponse {
    pub regions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TypesResponse {
    pub types: Vec<FacilityType>,
}

#[derive(Debug, Serialize)]
pub struct FacilitiesResponse {
    pub facilities: Vec<Facility>,
}

#[derive(Debug, Serialize)]
pub struct FacilityResponse {
    pub facility: Facility,
}

#[derive(Debug, Serialize)]
pub struct HospitalsResponse {
    pub hospitals: Vec<DistanceResult>,
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub facilities: usize,
}

// ============================================================================
// Request Types
// ============================================================================

/// Query string for `GET /api/inventory`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

/// Body for `POST /api/locations/nearest`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestRequest {
    pub lat: Option<serde_json::Value>,
    pub lng: Option<serde_json::Value>,
    pub count: Option<usize>,
    pub min_ventilators: Option<u64>,
}

// ============================================================================
// Error Mapping
// ============================================================================

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation { errors } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_errors("Validation failed", errors.clone()),
            ),
            Self::InvalidLocation(_) | Self::InvalidCoordinate(_) | Self::CapacityExceeded { .. } => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(self.to_string()))
            }
            Self::NotFound(_) | Self::Registry(RegistryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new(self.to_string()))
            }
            Self::Store(e) if e.is_transient() => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new("Service temporarily unavailable, please retry"),
            ),
            Self::Store(_) | Self::Registry(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn rejection(message: String) -> LedgerError {
    LedgerError::Validation {
        errors: vec![message],
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_text))
        // Inventory endpoints
        .route("/api/inventory", get(list_inventory).post(create_item))
        .route("/api/inventory/ventilators", get(ventilator_status))
        .route(
            "/api/inventory/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        // Location endpoints
        .route("/api/locations", get(list_locations))
        .route("/api/locations/stats", get(location_stats))
        .route("/api/locations/alerts", get(capacity_alerts))
        .route("/api/locations/regions", get(list_regions))
        .route("/api/locations/types", get(list_types))
        .route("/api/locations/region/{region}", get(locations_by_region))
        .route("/api/locations/type/{facility_type}", get(locations_by_type))
        .route("/api/locations/nearest", post(nearest_hospitals))
        .route("/api/locations/{id}", get(get_location))
        // Live updates
        .route("/ws", get(ws_handler))
        .with_state(state)
}

// ============================================================================
// Health Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        facilities: state.ledger.registry().len(),
    }))
}

async fn metrics_text() -> Response {
    match metrics::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to encode metrics")),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Inventory Handlers
// ============================================================================

/// List inventory with search, sort and pagination
async fn list_inventory(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> LedgerResult<Json<ApiResponse<InventoryPage>>> {
    let Query(params) = params.map_err(|e| rejection(e.body_text()))?;

    let sort_field = params
        .sort_field
        .as_deref()
        .and_then(SortField::parse)
        .unwrap_or_default();
    let sort_order = params
        .sort_order
        .as_deref()
        .map(SortOrder::parse)
        .unwrap_or_default();

    let mut query = ListQuery::default()
        .sort(sort_field, sort_order)
        .page(
            params.page.unwrap_or(1),
            state.config.page_size(params.limit),
        );
    query.search = params.search;

    let page = state.ledger.list(&query).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> LedgerResult<Json<ApiResponse<ItemResponse>>> {
    let item = state.ledger.get(&id).await?;
    Ok(Json(ApiResponse::success(ItemResponse { item })))
}

async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<InventoryInput>, JsonRejection>,
) -> LedgerResult<(StatusCode, Json<ApiResponse<ItemResponse>>)> {
    let Json(input) = body.map_err(|e| rejection(e.body_text()))?;
    let item = state.ledger.create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ItemResponse { item })),
    ))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<InventoryInput>, JsonRejection>,
) -> LedgerResult<Json<ApiResponse<ItemResponse>>> {
    let Json(input) = body.map_err(|e| rejection(e.body_text()))?;
    let item = state.ledger.update(&id, &input).await?;
    Ok(Json(ApiResponse::success(ItemResponse { item })))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> LedgerResult<Json<ApiResponse<ItemResponse>>> {
    let item = state.ledger.remove(&id).await?;
    Ok(Json(ApiResponse::success(ItemResponse { item })))
}

async fn ventilator_status(
    State(state): State<AppState>,
) -> LedgerResult<Json<ApiResponse<VentilatorStatusResponse>>> {
    let ventilator_status = state.ledger.ventilator_status().await?;
    Ok(Json(ApiResponse::success(VentilatorStatusResponse {
        ventilator_status,
    })))
}

// ============================================================================
// Location Handlers
// ============================================================================

async fn list_locations(State(state): State<AppState>) -> Json<ApiResponse<LocationsResponse>> {
    let locations = state
        .ledger
        .registry()
        .list_names()
        .into_iter()
        .map(String::from)
        .collect();
    Json(ApiResponse::success(LocationsResponse { locations }))
}

async fn location_stats(
    State(state): State<AppState>,
) -> LedgerResult<Json<ApiResponse<StatsResponse>>> {
    let stats = state.ledger.location_stats().await?;
    Ok(Json(ApiResponse::success(StatsResponse { stats })))
}

async fn capacity_alerts(
    State(state): State<AppState>,
) -> LedgerResult<Json<ApiResponse<AlertsResponse>>> {
    let alerts = state.ledger.capacity_alerts().await?;
    Ok(Json(ApiResponse::success(AlertsResponse { alerts })))
}

async fn list_regions(State(state): State<AppState>) -> Json<ApiResponse<RegionsResponse>> {
    let regions = state
        .ledger
        .registry()
        .all_regions()
        .into_iter()
        .map(String::from)
        .collect();
    Json(ApiResponse::success(RegionsResponse { regions }))
}

async fn list_types(State(state): State<AppState>) -> Json<ApiResponse<TypesResponse>> {
    let types = state.ledger.registry().all_types();
    Json(ApiResponse::success(TypesResponse { types }))
}

async fn locations_by_region(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Json<ApiResponse<FacilitiesResponse>> {
    let facilities = state
        .ledger
        .registry()
        .get_by_region(&region)
        .into_iter()
        .cloned()
        .collect();
    Json(ApiResponse::success(FacilitiesResponse { facilities }))
}

async fn locations_by_type(
    State(state): State<AppState>,
    Path(facility_type): Path<String>,
) -> LedgerResult<Json<ApiResponse<FacilitiesResponse>>> {
    let parsed = FacilityType::parse(&facility_type)
        .ok_or_else(|| rejection(format!("Unknown facility type: {facility_type}")))?;
    let facilities = state
        .ledger
        .registry()
        .get_by_type(parsed)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(ApiResponse::success(FacilitiesResponse { facilities })))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> LedgerResult<Json<ApiResponse<FacilityResponse>>> {
    let facility = state.ledger.registry().get_by_id(&id)?.clone();
    Ok(Json(ApiResponse::success(FacilityResponse { facility })))
}

/// Rank facilities by distance from the posted coordinate
async fn nearest_hospitals(
    State(state): State<AppState>,
    body: Result<Json<NearestRequest>, JsonRejection>,
) -> LedgerResult<Json<ApiResponse<HospitalsResponse>>> {
    let Json(request) = body.map_err(|e| rejection(e.body_text()))?;
    let origin = Coordinates::from_json(request.lat.as_ref(), request.lng.as_ref())?;

    let mut query = NearestQuery::count(request.count.unwrap_or(DEFAULT_NEAREST_COUNT));
    query.min_ventilators = request.min_ventilators;

    let counts = state.ledger.ventilator_counts().await?;
    let hospitals = state
        .resolver
        .find_nearest_with(origin, &query, Some(&counts))?;

    Ok(Json(ApiResponse::success(HospitalsResponse { hospitals })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::CoordinateError;
    use crate::storage::StoreError;

    #[test]
    fn test_envelope_is_flat() {
        let json = serde_json::to_value(ApiResponse::success(LocationsResponse {
            locations: vec!["Central Hospital".to_string()],
        }))
        .unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["locations"][0], "Central Hospital");
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                LedgerError::Validation {
                    errors: vec!["Name is required".into()],
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::InvalidLocation("Atlantis".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::InvalidCoordinate(CoordinateError::Missing("lat")),
                StatusCode::BAD_REQUEST,
            ),
            (LedgerError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                LedgerError::Registry(RegistryError::NotFound("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                LedgerError::Store(StoreError::Timeout {
                    operation: "get",
                    timeout_ms: 1,
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LedgerError::Store(StoreError::Poisoned),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
