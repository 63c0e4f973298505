//! Gateway monitoring endpoints
//!
//! Self health, aggregate service status, and the static service
//! listing. Only the status endpoint performs network I/O.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use sg_common::ServiceHealthRecord;

use crate::AppState;

/// Gateway self-health response
#[derive(Debug, Serialize, ToSchema)]
pub struct GatewayHealth {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
}

/// Aggregate status of every registered service
#[derive(Debug, Serialize, ToSchema)]
pub struct ServicesStatus {
    pub gateway_status: String,
    /// Records in registration order
    pub services: Vec<ServiceHealthRecord>,
    pub timestamp: String,
}

/// One service in the static listing
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceListing {
    pub name: String,
    pub url: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GatewayInfo {
    pub version: String,
    pub endpoints: Vec<String>,
}

/// Static service listing response
#[derive(Debug, Serialize, ToSchema)]
pub struct ServicesList {
    pub services: Vec<ServiceListing>,
    pub gateway_info: GatewayInfo,
}

/// Gateway liveness only; says nothing about upstream services.
#[utoipa::path(
    get,
    path = "/api/health/",
    tag = "monitoring",
    responses(
        (status = 200, description = "Gateway is up", body = GatewayHealth)
    )
)]
pub async fn gateway_health(State(state): State<AppState>) -> Json<GatewayHealth> {
    Json(GatewayHealth {
        status: "healthy".to_string(),
        service: "api-gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// Probe every registered service's health endpoint and report the
/// classification per service.
#[utoipa::path(
    get,
    path = "/api/services/status/",
    tag = "monitoring",
    responses(
        (status = 200, description = "Per-service health records", body = ServicesStatus)
    )
)]
pub async fn services_status(State(state): State<AppState>) -> Json<ServicesStatus> {
    let services = state.health.check_all().await;
    Json(ServicesStatus {
        gateway_status: "healthy".to_string(),
        services,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Static routing metadata. No upstream calls are made.
#[utoipa::path(
    get,
    path = "/api/services/list/",
    tag = "monitoring",
    responses(
        (status = 200, description = "Registered services and gateway routes", body = ServicesList)
    )
)]
pub async fn services_list(State(state): State<AppState>) -> Json<ServicesList> {
    let services = state
        .registry
        .iter()
        .map(|entry| ServiceListing {
            name: entry.name.clone(),
            url: entry.base_url.clone(),
            endpoints: entry.endpoints.clone(),
        })
        .collect();

    Json(ServicesList {
        services,
        gateway_info: GatewayInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints: vec![
                "GET /api/services/status/ - Check all services".to_string(),
                "GET /api/services/list/ - List available services".to_string(),
                "GET /api/health/ - Gateway health check".to_string(),
                "PROXY /api/{service}/{path} - Proxy to services".to_string(),
            ],
        },
    })
}
