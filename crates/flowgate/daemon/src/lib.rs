//! Flowgate daemon library
//!
//! This module provides the components of the gateway process:
//! - Proxy router built from the transformer registry
//! - Upstream forwarder and response interceptor
//! - Configuration and server lifecycle management

pub mod config;
pub mod error;
pub mod proxy;
pub mod server;

pub use config::GatewayConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use server::Server;
