//! Proxy handlers
//!
//! Translate inbound axum requests into [`ProxyRequest`]s and render
//! the resulting [`ProxyOutcome`] or error envelope.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use sg_common::{PayloadPlacement, ProxyMethod, ProxyOutcome, ProxyRequest};

use crate::{common, AppState};

/// Inbound headers that must not be replayed upstream: hop-by-hop
/// headers, `Host` (the transport sets the upstream host), and body
/// framing, since the payload is re-encoded as JSON.
const SKIPPED_INBOUND_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "content-type",
    "accept-encoding",
];

/// `/api/{service_name}` and `/api/{service_name}/`
pub async fn proxy_service_root(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
    method: Method,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    relay(&state, service_name, String::new(), method, query, headers, body).await
}

/// `/api/{service_name}/{path...}`
pub async fn proxy_service_path(
    State(state): State<AppState>,
    Path((service_name, sub_path)): Path<(String, String)>,
    method: Method,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    relay(&state, service_name, sub_path, method, query, headers, body).await
}

async fn relay(
    state: &AppState,
    service: String,
    sub_path: String,
    method: Method,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // the router only registers the five supported methods
    let Some(method) = ProxyMethod::from_name(method.as_str()) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    let mut request = ProxyRequest::new(service, sub_path, method);
    request.query = query;
    request.headers = forwardable_headers(&headers);

    if method.payload_placement() == PayloadPlacement::JsonBody && !body.is_empty() {
        match serde_json::from_slice(&body) {
            Ok(value) => request.body = Some(value),
            Err(e) => {
                warn!(method = %method, error = %e, "Rejected malformed JSON request body");
                return common::invalid_body_response();
            }
        }
    }

    match state.forwarder.forward(&request).await {
        Ok(outcome) => render_outcome(outcome),
        Err(err) => common::error_response(&err),
    }
}

fn forwardable_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| {
            !SKIPPED_INBOUND_HEADERS
                .iter()
                .any(|skipped| name.as_str().eq_ignore_ascii_case(skipped))
        })
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn render_outcome(outcome: ProxyOutcome) -> Response {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, Json(outcome.body)).into_response();
    for (name, value) in &outcome.headers {
        let (Ok(name), Ok(value)) =
            (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str()))
        else {
            continue;
        };
        response.headers_mut().insert(name, value);
    }
    response
}
