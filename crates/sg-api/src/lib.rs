//! HTTP front door
//!
//! Thin axum layer over the forwarding engine and health aggregator.
//! Handlers only extract, dispatch, and render; classification and all
//! outbound I/O live in `sg-proxy`.

pub mod common;
pub mod monitoring;
pub mod openapi;
pub mod proxy;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, MethodRouter};
use axum::Router;

use sg_common::ServiceRegistry;
use sg_proxy::{Forwarder, HealthAggregator};

/// Shared handler state. Everything in here is immutable after
/// startup, so cloning per request is just Arc bumps.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub forwarder: Arc<Forwarder>,
    pub health: Arc<HealthAggregator>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        forwarder: Arc<Forwarder>,
        health: Arc<HealthAggregator>,
    ) -> Self {
        Self { registry, forwarder, health, started_at: Instant::now() }
    }
}

/// Build the gateway router.
///
/// The fixed gateway endpoints are registered as static routes, which
/// the router matches ahead of the `:service_name` captures, so
/// `health` and `services` are not routable service names.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health/", get(monitoring::gateway_health))
        .route("/api/services/status/", get(monitoring::services_status))
        .route("/api/services/list/", get(monitoring::services_list))
        .route("/api/:service_name", proxy_root_methods())
        // a catch-all cannot match an empty remainder, so the bare
        // trailing-slash form needs its own route
        .route("/api/:service_name/", proxy_root_methods())
        .route("/api/:service_name/*path", proxy_sub_methods())
        .with_state(state)
}

fn proxy_root_methods() -> MethodRouter<AppState> {
    get(proxy::proxy_service_root)
        .post(proxy::proxy_service_root)
        .put(proxy::proxy_service_root)
        .patch(proxy::proxy_service_root)
        .delete(proxy::proxy_service_root)
}

fn proxy_sub_methods() -> MethodRouter<AppState> {
    get(proxy::proxy_service_path)
        .post(proxy::proxy_service_path)
        .put(proxy::proxy_service_path)
        .patch(proxy::proxy_service_path)
        .delete(proxy::proxy_service_path)
}
