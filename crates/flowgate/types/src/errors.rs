//! Gateway error taxonomy
//!
//! Every rejection the gateway can produce before, during, or after a
//! forward maps onto one of these variants. The daemon translates them to
//! HTTP statuses at the edge; inner crates only ever return the taxonomy.

use thiserror::Error;

/// Errors raised while validating, rewriting, or forwarding a request
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required identity header was absent; the request is never forwarded
    #[error("missing required header: {0}")]
    ContextMissing(String),

    /// A caller-supplied name contains a reserved separator, or a payload
    /// carries a section the gateway refuses to forward
    #[error("naming violation: {0}")]
    NamingViolation(String),

    /// A task (at any nesting depth) uses a type outside the system allow-list
    #[error("disallowed task type: {0}")]
    DisallowedTaskType(String),

    /// Two fields that must agree (schedule name vs. workflow name) do not
    #[error("name mismatch: {name} != {workflow_name}")]
    NameMismatch { name: String, workflow_name: String },

    /// Group or ownership check failed on a single-record route
    #[error("not authorized: {0}")]
    AuthorizationDenied(String),

    /// Request body failed structural validation
    #[error("invalid request: {0}")]
    Validation(String),

    /// The upstream call itself failed (transport-level)
    #[error("upstream call failed: {0}")]
    Upstream(String),

    /// Anything a hook was not prepared for
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;
