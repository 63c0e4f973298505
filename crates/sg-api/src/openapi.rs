//! OpenAPI Documentation
//!
//! Central OpenAPI specification for the gateway's fixed endpoints.
//! The proxy catch-all is documented in prose in the description;
//! its surface is whatever the fronted services expose.

use utoipa::OpenApi;

/// Gateway API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SvcGate API Gateway",
        description = "Request-routing gateway. Fixed endpoints are listed here; \
            any other `/api/{service_name}/{path}` request is forwarded verbatim \
            to the named backend service."
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "monitoring", description = "Gateway health and service status")
    ),
    paths(
        super::monitoring::gateway_health,
        super::monitoring::services_status,
        super::monitoring::services_list,
    ),
    components(schemas(
        super::common::ApiError,
        super::monitoring::GatewayHealth,
        super::monitoring::ServicesStatus,
        super::monitoring::ServicesList,
        super::monitoring::ServiceListing,
        super::monitoring::GatewayInfo,
        sg_common::ServiceHealthRecord,
        sg_common::HealthState,
    ))
)]
pub struct GatewayApiDoc;
