//! Flowgate - multi-tenant workflow gateway
//!
//! The daemon provides:
//! - Tenant-namespaced proxying of workflow and task metadata
//! - Per-user authorization on top of tenant isolation
//! - Validated bulk lifecycle operations
//! - Schedule proxying to the companion scheduler

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod proxy;
mod server;

use config::GatewayConfig;
use error::DaemonResult;
use server::Server;

/// Flowgate daemon CLI
#[derive(Parser)]
#[command(name = "flowgated")]
#[command(about = "Flowgate - multi-tenant workflow gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FLOWGATE_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "FLOWGATE_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "FLOWGATE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "FLOWGATE_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let mut config = GatewayConfig::load(cli.config.as_deref())
        .map_err(|e| error::DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = cli.listen.as_deref() {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| error::DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }

    println!(
        r#"
  _____ _                          _
 |  ___| | _____      ____ _  __ _| |_ ___
 | |_  | |/ _ \ \ /\ / / _` |/ _` | __/ _ \
 |  _| | | (_) \ V  V / (_| | (_| | ||  __/
 |_|   |_|\___/ \_/\_/ \__, |\__,_|\__\___|
                       |___/
  Multi-tenant workflow gateway
  Version: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await
}
