//! Hook contracts between the proxy router and transformer modules
//!
//! A `before` hook validates and rewrites an incoming request and returns
//! an explicit action: forward an instruction to one of the upstreams, or
//! answer the client directly without forwarding. An `after` hook mutates
//! the fully buffered, JSON-decoded upstream response in place; the router
//! re-serializes and writes exactly once.

use crate::context::Upstream;
use async_trait::async_trait;
use flowgate_types::{GatewayResult, RequestIdentity};
use serde_json::Value;
use std::collections::HashMap;

/// The incoming request as a hook sees it
#[derive(Clone, Debug)]
pub struct ProxyRequest {
    /// Request path as received from the client
    pub path: String,

    /// Path parameters extracted by the router
    pub params: HashMap<String, String>,

    /// Raw query string, if any
    pub query: Option<String>,

    /// JSON-decoded request body, if any
    pub body: Option<Value>,
}

impl ProxyRequest {
    /// Named path parameter, or a validation error naming it
    pub fn param(&self, name: &str) -> GatewayResult<&str> {
        self.params.get(name).map(String::as_str).ok_or_else(|| {
            flowgate_types::GatewayError::Internal(format!("route param {:?} not bound", name))
        })
    }
}

/// What to send upstream after the before hook ran
#[derive(Clone, Debug)]
pub struct ForwardInstruction {
    pub upstream: Upstream,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

impl ForwardInstruction {
    /// Forward the request as received
    pub fn passthrough(upstream: Upstream, req: &ProxyRequest) -> Self {
        Self {
            upstream,
            path: req.path.clone(),
            query: req.query.clone(),
            body: req.body.clone(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// Terminal response produced by a hook instead of a forward
#[derive(Clone, Debug)]
pub struct HookResponse {
    pub status: u16,
    pub body: Value,
}

/// Outcome of a before hook
#[derive(Clone, Debug)]
pub enum BeforeAction {
    /// Proxy the (possibly rewritten) request to an upstream
    Forward(ForwardInstruction),
    /// The hook answered the request itself; nothing is forwarded
    Respond(HookResponse),
}

/// Request-rewrite / validation hook, run before any upstream call
#[async_trait]
pub trait BeforeHook: Send + Sync {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction>;
}

/// Response-rewrite hook, run over the buffered upstream reply
#[async_trait]
pub trait AfterHook: Send + Sync {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()>;
}
