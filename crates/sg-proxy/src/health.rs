//! Health aggregator
//!
//! Builds a point-in-time reachability summary across all registered
//! services. Checks fan out with bounded concurrency but the output
//! list always follows registry order, and one service's failure never
//! prevents the others from being evaluated.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use sg_common::{HealthState, ServiceEntry, ServiceHealthRecord, ServiceRegistry};

use crate::transport::{HttpTransport, OutboundRequest, TransportError};

/// Health endpoint every fronted service must expose
const HEALTH_PATH: &str = "/api/health/";

#[derive(Debug, Clone)]
pub struct HealthAggregatorConfig {
    /// Per-check timeout, deliberately shorter than the proxy timeout
    /// so one slow service cannot stall the whole summary
    pub check_timeout: Duration,
    /// Fan-out limit across services
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for HealthAggregatorConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(5),
            concurrency: 4,
            user_agent: format!("SvcGate-API-Gateway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub struct HealthAggregator {
    registry: Arc<ServiceRegistry>,
    transport: Arc<dyn HttpTransport>,
    config: HealthAggregatorConfig,
}

impl HealthAggregator {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        transport: Arc<dyn HttpTransport>,
        config: HealthAggregatorConfig,
    ) -> Self {
        Self { registry, transport, config }
    }

    /// Check every registered service, returning records in registry
    /// order. Never caches; every call reflects current reachability.
    pub async fn check_all(&self) -> Vec<ServiceHealthRecord> {
        let checks: Vec<_> = self.registry.iter().map(|entry| self.check_one(entry)).collect();
        futures::stream::iter(checks)
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }

    async fn check_one(&self, entry: &ServiceEntry) -> ServiceHealthRecord {
        let url = format!("{}{}", entry.base_url, HEALTH_PATH);
        let mut request = OutboundRequest::get(url.as_str(), self.config.check_timeout);
        request.headers = vec![("User-Agent".to_string(), self.config.user_agent.clone())];

        let mut record = ServiceHealthRecord {
            service_name: entry.name.clone(),
            base_url: entry.base_url.clone(),
            status: HealthState::Error,
            status_code: None,
            data: None,
            error: None,
        };

        match self.transport.execute(request).await {
            Ok(response) if response.status == 200 => match serde_json::from_str(&response.body) {
                Ok(data) => {
                    debug!(service = %entry.name, "Health check passed");
                    record.status = HealthState::Healthy;
                    record.data = Some(data);
                }
                Err(e) => {
                    warn!(service = %entry.name, url = %url, error = %e, "Health payload was not valid JSON");
                    record.error = Some(e.to_string());
                }
            },
            Ok(response) => {
                warn!(service = %entry.name, url = %url, status = response.status, "Health check failed");
                record.status = HealthState::Unhealthy;
                record.status_code = Some(response.status);
            }
            Err(TransportError::TimedOut) => {
                warn!(service = %entry.name, url = %url, "Health check timed out");
                record.status = HealthState::Timeout;
                record.error = Some("Request timeout".to_string());
            }
            Err(TransportError::Connect) => {
                warn!(service = %entry.name, url = %url, "Health check could not connect");
                record.status = HealthState::Unreachable;
                record.error = Some("Connection failed".to_string());
            }
            Err(TransportError::Other(detail)) => {
                warn!(service = %entry.name, url = %url, error = %detail, "Health check errored");
                record.error = Some(detail);
            }
        }

        record
    }
}
