//! Configuration for the gateway daemon

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream service addresses
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8088".parse().expect("static listen address"),
            enable_cors: true,
        }
    }
}

/// Upstream service addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Workflow engine base URL
    #[serde(default = "default_engine_url")]
    pub engine_url: String,

    /// Scheduler base URL
    #[serde(default = "default_scheduler_url")]
    pub scheduler_url: String,

    /// Group-lookup GraphQL endpoint
    #[serde(default = "default_group_lookup_url")]
    pub group_lookup_url: String,

    /// Register RBAC-filtered workflow-definition routes
    #[serde(default)]
    pub rbac_enabled: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            engine_url: default_engine_url(),
            scheduler_url: default_scheduler_url(),
            group_lookup_url: default_group_lookup_url(),
            rbac_enabled: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_engine_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_scheduler_url() -> String {
    "http://127.0.0.1:8085".to_string()
}

fn default_group_lookup_url() -> String {
    "http://127.0.0.1:4000/graphql".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GatewayConfig {
    /// Load configuration from defaults, an optional file, and environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&GatewayConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with FLOWGATE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("FLOWGATE")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8088);
        assert!(!config.upstream.rbac_enabled);
        assert_eq!(config.upstream.engine_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_load_without_file() {
        let config = GatewayConfig::load(None).unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.server.enable_cors);
    }
}
