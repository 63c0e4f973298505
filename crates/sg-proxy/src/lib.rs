//! SvcGate proxy core
//!
//! This crate provides the outbound side of the gateway:
//! - HttpTransport: transport seam over the HTTP client, fakeable in tests
//! - Forwarder: builds the outbound request and classifies outcomes
//! - HealthAggregator: per-service reachability summary with fan-out

pub mod forwarder;
pub mod health;
pub mod transport;

pub use forwarder::{Forwarder, ForwarderConfig};
pub use health::{HealthAggregator, HealthAggregatorConfig};
pub use transport::{
    HttpTransport, OutboundRequest, OutboundResponse, ReqwestTransport, TransportError,
};
