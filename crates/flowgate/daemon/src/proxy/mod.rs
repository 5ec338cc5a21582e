//! Proxy router
//!
//! Turns the transformer registry into one axum route per entry. Each
//! request runs the same pipeline: resolve identity from headers, run the
//! entry's before hook, forward to the chosen upstream, and either pass the
//! reply through or buffer-rewrite it when an after hook is registered.

mod forward;
mod handler;
mod identity;

pub use forward::{Forwarder, UpstreamReply};
pub use identity::resolve_identity;

use crate::error::{DaemonError, DaemonResult};
use axum::body::Bytes;
use axum::extract::{RawPathParams, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::IntoResponse;
use axum::routing::{get, on, MethodFilter};
use axum::{Json, Router};
use flowgate_transform::TransformerRegistry;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state behind every proxy route
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<TransformerRegistry>,
    pub forwarder: Arc<Forwarder>,
    pub version: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Build the gateway router from the registry
pub fn build_router(state: GatewayState) -> DaemonResult<Router> {
    let mut router = Router::new().route("/health", get(health));

    for entry in state.registry.entries().iter().cloned() {
        let entry = Arc::new(entry);
        let filter = method_filter(&entry.method)?;
        let captured = entry.clone();
        let route_handler = move |State(gateway): State<GatewayState>,
                                  uri: Uri,
                                  params: RawPathParams,
                                  headers: HeaderMap,
                                  body: Bytes| {
            let entry = captured.clone();
            async move { handler::handle(gateway, entry, uri, params, headers, body).await }
        };
        router = router.route(entry.path, on(filter, route_handler));
    }

    Ok(router.layer(TraceLayer::new_for_http()).with_state(state))
}

fn method_filter(method: &Method) -> DaemonResult<MethodFilter> {
    let filter = match method.as_str() {
        "GET" => MethodFilter::GET,
        "POST" => MethodFilter::POST,
        "PUT" => MethodFilter::PUT,
        "DELETE" => MethodFilter::DELETE,
        "PATCH" => MethodFilter::PATCH,
        other => {
            return Err(DaemonError::Config(format!(
                "unsupported proxy method: {}",
                other
            )))
        }
    };
    Ok(filter)
}

/// Gateway liveness; never proxied
async fn health(State(state): State<GatewayState>) -> impl IntoResponse {
    let uptime_secs = (chrono::Utc::now() - state.started_at).num_seconds();
    Json(json!({
        "status": "ok",
        "version": state.version,
        "uptimeSecs": uptime_secs,
    }))
}
