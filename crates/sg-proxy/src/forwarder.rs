//! Forwarding engine
//!
//! Translates an inbound [`ProxyRequest`] into an outbound call against
//! the resolved service and maps the transport outcome back into either
//! a [`ProxyOutcome`] or a classified [`GatewayError`]. Handlers never
//! see a raw transport error.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use sg_common::{
    GatewayError, PayloadPlacement, ProxyOutcome, ProxyRequest, Result, ServiceRegistry,
};

use crate::transport::{HttpTransport, OutboundRequest, TransportError};

/// Headers that describe the connection or the original body framing.
/// The body is re-encoded as JSON on the way back out, so these no
/// longer apply and must not be passed through.
const STRIPPED_RESPONSE_HEADERS: &[&str] = &[
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
    "content-encoding",
];

#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Upstream timeout for proxied calls
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: format!("SvcGate-API-Gateway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub struct Forwarder {
    registry: Arc<ServiceRegistry>,
    transport: Arc<dyn HttpTransport>,
    config: ForwarderConfig,
}

impl Forwarder {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        transport: Arc<dyn HttpTransport>,
        config: ForwarderConfig,
    ) -> Self {
        Self { registry, transport, config }
    }

    /// Relay one request to the named service
    pub async fn forward(&self, request: &ProxyRequest) -> Result<ProxyOutcome> {
        let entry = self.registry.resolve(&request.service)?;
        let url = join_url(&entry.base_url, &request.sub_path);
        let method = request.method;

        let (query, json_body) = match method.payload_placement() {
            PayloadPlacement::Query => (request.query.clone(), None),
            PayloadPlacement::JsonBody => (Vec::new(), request.body.clone()),
        };

        let outbound = OutboundRequest {
            method,
            url: url.clone(),
            query,
            json_body,
            headers: self.merge_headers(&request.headers),
            timeout: self.config.request_timeout,
        };

        let start = Instant::now();
        match self.transport.execute(outbound).await {
            Ok(response) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                info!(
                    method = %method,
                    url = %url,
                    status = response.status,
                    elapsed_ms = elapsed_ms,
                    "Proxied request"
                );

                let is_json = response
                    .content_type()
                    .is_some_and(|ct| ct.contains("application/json"));
                let body = if is_json {
                    serde_json::from_str(&response.body).map_err(|e| {
                        error!(method = %method, url = %url, error = %e, "Upstream returned unparseable JSON");
                        GatewayError::UpstreamUnexpected { detail: e.to_string() }
                    })?
                } else {
                    serde_json::json!({ "raw_response": response.body })
                };

                let headers = response
                    .headers
                    .into_iter()
                    .filter(|(name, _)| {
                        !STRIPPED_RESPONSE_HEADERS
                            .iter()
                            .any(|stripped| name.eq_ignore_ascii_case(stripped))
                    })
                    .collect();

                Ok(ProxyOutcome { status: response.status, body, headers })
            }
            Err(TransportError::TimedOut) => {
                error!(method = %method, url = %url, "Timeout proxying request");
                Err(GatewayError::UpstreamTimeout)
            }
            Err(TransportError::Connect) => {
                error!(method = %method, url = %url, "Connection error proxying request");
                Err(GatewayError::UpstreamUnreachable)
            }
            Err(TransportError::Other(detail)) => {
                error!(method = %method, url = %url, error = %detail, "Error proxying request");
                Err(GatewayError::UpstreamUnexpected { detail })
            }
        }
    }

    /// Default headers first, then caller headers; callers win on
    /// conflicting names (case-insensitive).
    fn merge_headers(&self, caller: &[(String, String)]) -> Vec<(String, String)> {
        let mut merged = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), self.config.user_agent.clone()),
        ];
        for (name, value) in caller {
            merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            merged.push((name.clone(), value.clone()));
        }
        merged
    }
}

/// Join a normalized base URL and a sub-path.
///
/// Empty or `/`-only sub-paths reach the service root; duplicate
/// slashes collapse; a meaningful trailing slash is preserved because
/// the fronted services route on it.
pub fn join_url(base_url: &str, sub_path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let segments: Vec<&str> = sub_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return format!("{base}/");
    }
    let trailing = if sub_path.ends_with('/') { "/" } else { "" };
    format!("{}/{}{}", base, segments.join("/"), trailing)
}
