//! SvcGate Gateway Server
//!
//! Single entry point for clients: forwards `/api/{service}/...`
//! requests to the registered backend services and serves the gateway's
//! own health, status, and listing endpoints.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SG_PORT` | `8080` | HTTP listen port |
//! | `SG_CONFIG_PATH` | - | Path to a TOML config file; without one a single `user` service at `http://localhost:8001` is registered |
//! | `SG_SERVICE_<NAME>_URL` | - | Per-service base URL override (hyphens in the name become underscores) |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sg_api::openapi::GatewayApiDoc;
use sg_api::{create_router, AppState};
use sg_config::GatewayConfig;
use sg_proxy::{
    Forwarder, ForwarderConfig, HealthAggregator, HealthAggregatorConfig, ReqwestTransport,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting SvcGate Gateway");

    // Configuration: optional TOML file, then environment overrides
    let mut config = match std::env::var("SG_CONFIG_PATH") {
        Ok(path) => GatewayConfig::load(path.as_ref())
            .with_context(|| format!("loading config from {path}"))?,
        Err(_) => GatewayConfig::default(),
    };
    config.apply_env_overrides();

    let registry = Arc::new(config.registry());
    for entry in registry.iter() {
        info!(service = %entry.name, url = %entry.base_url, "Registered service");
    }

    let transport = Arc::new(
        ReqwestTransport::new(CONNECT_TIMEOUT).context("building HTTP transport")?,
    );
    let forwarder = Arc::new(Forwarder::new(
        registry.clone(),
        transport.clone(),
        ForwarderConfig {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            ..ForwarderConfig::default()
        },
    ));
    let health = Arc::new(HealthAggregator::new(
        registry.clone(),
        transport,
        HealthAggregatorConfig {
            check_timeout: Duration::from_secs(config.health_timeout_secs),
            ..HealthAggregatorConfig::default()
        },
    ));

    let app = create_router(AppState::new(registry, forwarder, health))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", GatewayApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let addr = format!("0.0.0.0:{}", config.listen_port);
    info!("Gateway listening on http://{}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("SvcGate Gateway shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
