//! Common API types and rendering helpers

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use sg_common::GatewayError;

/// Standard gateway error envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Only present on unknown-service errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_services: Option<Vec<String>>,
}

/// Render a classified gateway failure as its envelope response
pub fn error_response(err: &GatewayError) -> Response {
    let status =
        StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ApiError {
        error: err.error_label(),
        message: err.public_message().map(str::to_string),
        available_services: err.available_services().map(<[String]>::to_vec),
    };
    (status, Json(body)).into_response()
}

/// 400 for request bodies that are not valid JSON
pub fn invalid_body_response() -> Response {
    let body = ApiError {
        error: "Invalid JSON".to_string(),
        message: Some("Request body must be valid JSON".to_string()),
        available_services: None,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
