//! Upstream forwarder
//!
//! One shared HTTP client forwards rewritten requests to whichever backend
//! the hook selected. The whole reply body is buffered: response rewriting
//! needs the complete structure, so nothing is forwarded incrementally.
//! Timeouts and retries are the transport's business; the gateway adds
//! neither.

use axum::body::Bytes;
use flowgate_transform::{ForwardInstruction, Upstream};
use flowgate_types::{GatewayError, GatewayResult};

/// A fully buffered upstream reply
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Forwards rewritten requests to the configured backends
pub struct Forwarder {
    client: reqwest::Client,
    engine_base: String,
    scheduler_base: String,
}

impl Forwarder {
    pub fn new(
        client: reqwest::Client,
        engine_base: impl Into<String>,
        scheduler_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            engine_base: engine_base.into(),
            scheduler_base: scheduler_base.into(),
        }
    }

    fn base(&self, upstream: Upstream) -> &str {
        match upstream {
            Upstream::Engine => &self.engine_base,
            Upstream::Scheduler => &self.scheduler_base,
        }
    }

    /// Send one rewritten request and buffer the reply
    pub async fn send(
        &self,
        method: &http::Method,
        instruction: &ForwardInstruction,
    ) -> GatewayResult<UpstreamReply> {
        let mut url = format!(
            "{}{}",
            self.base(instruction.upstream).trim_end_matches('/'),
            instruction.path
        );
        if let Some(query) = instruction.query.as_deref() {
            url.push('?');
            url.push_str(query);
        }

        let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|_| GatewayError::Internal(format!("method {} not forwardable", method)))?;

        tracing::debug!(%url, method = %method, "forwarding to upstream");

        let mut request = self.client.request(method, &url);
        if let Some(body) = instruction.body.as_ref() {
            request = request.json(body);
        }

        let reply = request
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        let status = reply.status().as_u16();
        let content_type = reply
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = reply
            .bytes()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}
