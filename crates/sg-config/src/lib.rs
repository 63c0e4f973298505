//! Gateway configuration
//!
//! TOML file with per-service entries, plus environment overrides of the
//! form `SG_SERVICE_<NAME>_URL`. The registry built from a config is
//! immutable for the life of the process.

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use sg_common::{ServiceEntry, ServiceRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// One `[[services]]` block in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub listen_port: u16,
    /// Upstream timeout for proxied calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Per-service timeout for health checks, deliberately shorter than
    /// the proxy timeout so one slow service cannot stall the summary
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_health_timeout() -> u64 {
    5
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_port: default_port(),
            request_timeout_secs: default_request_timeout(),
            health_timeout_secs: default_health_timeout(),
            services: vec![ServiceConfig {
                name: "user".to_string(),
                base_url: "http://localhost:8001".to_string(),
                endpoints: default_user_endpoints(),
            }],
        }
    }
}

/// Endpoint metadata advertised for the default user service
fn default_user_endpoints() -> Vec<String> {
    [
        "POST /api/auth/register",
        "POST /api/auth/login",
        "GET /api/users/me",
        "GET /api/users/list",
        "GET /api/users/{id}",
        "GET /api/vehicles",
        "GET /api/vehicles/{id}",
        "GET /api/health",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl GatewayConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GatewayConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), services = config.services.len(), "Loaded gateway config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for service in &self.services {
            if service.name.is_empty() {
                return Err(ConfigError::Invalid("service name must not be empty".to_string()));
            }
            if !service.base_url.starts_with("http://") && !service.base_url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "service '{}' base_url must be an absolute http(s) URL",
                    service.name
                )));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate service name '{}'",
                    service.name
                )));
            }
        }
        Ok(())
    }

    /// Apply `SG_SERVICE_<NAME>_URL` overrides from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup, so tests don't mutate process state.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for service in &mut self.services {
            let key = format!("SG_SERVICE_{}_URL", service.name.to_ascii_uppercase().replace('-', "_"));
            if let Some(url) = lookup(&key) {
                info!(service = %service.name, url = %url, "Service base URL overridden from environment");
                service.base_url = url;
            }
        }
        if let Some(port) = lookup("SG_PORT").and_then(|v| v.parse().ok()) {
            self.listen_port = port;
        }
    }

    /// Build the immutable service registry, normalizing base URLs
    pub fn registry(&self) -> ServiceRegistry {
        ServiceRegistry::new(
            self.services
                .iter()
                .map(|s| {
                    ServiceEntry::new(s.name.clone(), s.base_url.clone())
                        .with_endpoints(s.endpoints.clone())
                })
                .collect(),
        )
    }
}
