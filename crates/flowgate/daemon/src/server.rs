//! Server setup and lifecycle management

use crate::config::GatewayConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::proxy::{build_router, Forwarder, GatewayState};
use flowgate_auth::GraphqlGroupLookup;
use flowgate_codec::NameCodec;
use flowgate_transform::{HttpInstanceSearch, TransformerContext, TransformerRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Flowgate gateway server
pub struct Server {
    config: GatewayConfig,
    listener: TcpListener,
    state: GatewayState,
}

impl Server {
    /// Create a new server with the given configuration
    ///
    /// Binds the listener and builds the transformer registry; both happen
    /// once, before any request is accepted, and the registry is immutable
    /// from here on.
    pub async fn new(config: GatewayConfig) -> DaemonResult<Self> {
        let client = reqwest::Client::new();

        let engine_codec = NameCodec::engine();
        let scheduler_codec = NameCodec::scheduler();

        let context = TransformerContext {
            engine_codec: engine_codec.clone(),
            scheduler_codec,
            rbac_enabled: config.upstream.rbac_enabled,
            groups: Arc::new(GraphqlGroupLookup::new(
                client.clone(),
                config.upstream.group_lookup_url.clone(),
            )),
            search: Arc::new(HttpInstanceSearch::new(
                client.clone(),
                config.upstream.engine_url.clone(),
                engine_codec,
            )),
        };

        let registry = TransformerRegistry::build(&context)
            .map_err(|e| DaemonError::Config(e.to_string()))?;

        let forwarder = Forwarder::new(
            client,
            config.upstream.engine_url.clone(),
            config.upstream.scheduler_url.clone(),
        );

        let state = GatewayState {
            registry: Arc::new(registry),
            forwarder: Arc::new(forwarder),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        };

        let listener = TcpListener::bind(config.server.listen_addr).await?;

        Ok(Self {
            config,
            listener,
            state,
        })
    }

    /// Address the server is bound to
    pub fn local_addr(&self) -> DaemonResult<SocketAddr> {
        self.listener.local_addr().map_err(DaemonError::from)
    }

    /// Run the server until shutdown
    pub async fn run(self) -> DaemonResult<()> {
        let mut app = build_router(self.state.clone())?;

        if self.config.server.enable_cors {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        tracing::info!(
            listen = %self.local_addr()?,
            engine = %self.config.upstream.engine_url,
            scheduler = %self.config.upstream.scheduler_url,
            rbac = self.config.upstream.rbac_enabled,
            routes = self.state.registry.len(),
            "flowgate listening"
        );

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("flowgate shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
