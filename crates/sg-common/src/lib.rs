use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Service Registry
// ============================================================================

/// A registered backend service
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceEntry {
    pub name: String,
    /// Base URL with trailing slashes stripped
    pub base_url: String,
    /// Static endpoint metadata shown by the service list endpoint
    #[serde(default)]
    pub endpoints: Vec<String>,
}

impl ServiceEntry {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: normalize_base_url(base_url.into()),
            endpoints: Vec::new(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }
}

/// Strip trailing slashes so path joining never produces `//`
pub fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Static name -> service mapping, immutable after startup.
///
/// Iteration order is registration order, which the health aggregator
/// relies on for its output ordering.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    entries: IndexMap<String, ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new(entries: Vec<ServiceEntry>) -> Self {
        let mut map = IndexMap::with_capacity(entries.len());
        for entry in entries {
            map.insert(entry.name.clone(), entry);
        }
        Self { entries: map }
    }

    /// Exact-match lookup. Unknown names fail with the list of valid
    /// names so the caller can render a helpful error.
    pub fn resolve(&self, name: &str) -> Result<&ServiceEntry> {
        self.entries.get(name).ok_or_else(|| GatewayError::ServiceNotFound {
            service: name.to_string(),
            available: self.names(),
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Proxy Types
// ============================================================================

/// Supported proxy methods with their payload-placement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ProxyMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Where the inbound payload goes on the outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadPlacement {
    /// Serialized as query-string parameters
    Query,
    /// Serialized as a JSON body
    JsonBody,
}

impl ProxyMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// DELETE carries a JSON body like PUT/PATCH; the fronted services
    /// accept bodies on DELETE and the contract is pinned by tests.
    pub fn payload_placement(&self) -> PayloadPlacement {
        match self {
            Self::Get => PayloadPlacement::Query,
            Self::Post | Self::Put | Self::Patch | Self::Delete => PayloadPlacement::JsonBody,
        }
    }
}

impl std::fmt::Display for ProxyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single inbound request as seen by the forwarding engine.
///
/// Deliberately independent of any HTTP server library so the engine
/// can be exercised with hand-built requests in tests.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub service: String,
    pub sub_path: String,
    pub method: ProxyMethod,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl ProxyRequest {
    pub fn new(service: impl Into<String>, sub_path: impl Into<String>, method: ProxyMethod) -> Self {
        Self {
            service: service.into(),
            sub_path: sub_path.into(),
            method,
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }
}

/// The structured result of a successfully relayed call
#[derive(Debug, Clone)]
pub struct ProxyOutcome {
    pub status: u16,
    pub body: serde_json::Value,
    pub headers: Vec<(String, String)>,
}

// ============================================================================
// Health Types
// ============================================================================

/// Point-in-time reachability classification for one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    Timeout,
    Unreachable,
    Error,
}

/// One service's health, assembled fresh on every status request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceHealthRecord {
    pub service_name: String,
    pub base_url: String,
    pub status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Upstream health payload when healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Service {service} not found")]
    ServiceNotFound { service: String, available: Vec<String> },

    #[error("Upstream timeout")]
    UpstreamTimeout,

    #[error("Upstream unreachable")]
    UpstreamUnreachable,

    #[error("Unexpected upstream failure: {detail}")]
    UpstreamUnexpected { detail: String },
}

impl GatewayError {
    /// HTTP status the front door renders for this failure
    pub fn status(&self) -> u16 {
        match self {
            Self::ServiceNotFound { .. } => 404,
            Self::UpstreamTimeout => 504,
            Self::UpstreamUnreachable => 503,
            Self::UpstreamUnexpected { .. } => 500,
        }
    }

    /// Machine-readable `error` field of the response envelope
    pub fn error_label(&self) -> String {
        match self {
            Self::ServiceNotFound { service, .. } => format!("Service {service} not found"),
            Self::UpstreamTimeout => "Service timeout".to_string(),
            Self::UpstreamUnreachable => "Service unavailable".to_string(),
            Self::UpstreamUnexpected { .. } => "Proxy error".to_string(),
        }
    }

    /// Human-readable message. Internal detail is never included here;
    /// it is logged at the classification site instead.
    pub fn public_message(&self) -> Option<&'static str> {
        match self {
            Self::ServiceNotFound { .. } => None,
            Self::UpstreamTimeout => Some("The requested service is taking too long to respond"),
            Self::UpstreamUnreachable => Some("Cannot connect to the requested service"),
            Self::UpstreamUnexpected { .. } => {
                Some("An error occurred while processing your request")
            }
        }
    }

    pub fn available_services(&self) -> Option<&[String]> {
        match self {
            Self::ServiceNotFound { available, .. } => Some(available),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ServiceRegistry {
        ServiceRegistry::new(vec![
            ServiceEntry::new("user", "http://user-svc:8001/"),
            ServiceEntry::new("billing", "http://billing-svc:8002"),
        ])
    }

    #[test]
    fn resolve_returns_configured_base_url() {
        let reg = registry();
        assert_eq!(reg.resolve("user").unwrap().base_url, "http://user-svc:8001");
        assert_eq!(reg.resolve("billing").unwrap().base_url, "http://billing-svc:8002");
    }

    #[test]
    fn resolve_unknown_name_lists_available_services() {
        let reg = registry();
        let err = reg.resolve("payments").unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(
            err.available_services().unwrap(),
            &["user".to_string(), "billing".to_string()]
        );
    }

    #[test]
    fn registry_iterates_in_registration_order() {
        let names: Vec<_> = registry().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, ["user", "billing"]);
    }

    #[test]
    fn base_url_normalization_strips_trailing_slashes() {
        let entry = ServiceEntry::new("user", "http://svc:8000///");
        assert_eq!(entry.base_url, "http://svc:8000");
    }

    #[test]
    fn payload_placement_policy() {
        assert_eq!(ProxyMethod::Get.payload_placement(), PayloadPlacement::Query);
        assert_eq!(ProxyMethod::Post.payload_placement(), PayloadPlacement::JsonBody);
        assert_eq!(ProxyMethod::Put.payload_placement(), PayloadPlacement::JsonBody);
        assert_eq!(ProxyMethod::Patch.payload_placement(), PayloadPlacement::JsonBody);
        // DELETE mirrors PUT/PATCH per the service contract
        assert_eq!(ProxyMethod::Delete.payload_placement(), PayloadPlacement::JsonBody);
    }

    #[test]
    fn method_from_name_is_case_insensitive() {
        assert_eq!(ProxyMethod::from_name("get"), Some(ProxyMethod::Get));
        assert_eq!(ProxyMethod::from_name("DELETE"), Some(ProxyMethod::Delete));
        assert_eq!(ProxyMethod::from_name("TRACE"), None);
    }

    #[test]
    fn error_envelope_fields() {
        assert_eq!(GatewayError::UpstreamTimeout.status(), 504);
        assert_eq!(GatewayError::UpstreamTimeout.error_label(), "Service timeout");
        assert_eq!(GatewayError::UpstreamUnreachable.status(), 503);
        assert_eq!(GatewayError::UpstreamUnreachable.error_label(), "Service unavailable");
        let unexpected = GatewayError::UpstreamUnexpected { detail: "boom".into() };
        assert_eq!(unexpected.status(), 500);
        // internal detail never leaks through the public fields
        assert!(!unexpected.public_message().unwrap().contains("boom"));
    }
}
