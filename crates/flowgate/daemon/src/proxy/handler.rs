//! Per-request proxy pipeline
//!
//! resolve identity -> before hook -> forward -> (after hook?) -> respond.
//! The after-hook path is an explicit buffering interceptor: parse the
//! buffered reply once, let the hook mutate it in place, serialize once,
//! write once. Upstream error statuses skip interception entirely and pass
//! through with body and status untouched.

use super::identity::resolve_identity;
use super::GatewayState;
use crate::error::ApiError;
use axum::body::{Body, Bytes};
use axum::extract::RawPathParams;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowgate_transform::{BeforeAction, ForwardInstruction, ProxyRequest, RouteTransformer};
use flowgate_types::{GatewayError, GatewayResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub async fn handle(
    gateway: GatewayState,
    entry: Arc<RouteTransformer>,
    uri: Uri,
    params: RawPathParams,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match run(gateway, entry, uri, params, headers, body).await {
        Ok(response) => response,
        Err(err) => ApiError(err).into_response(),
    }
}

async fn run(
    gateway: GatewayState,
    entry: Arc<RouteTransformer>,
    uri: Uri,
    params: RawPathParams,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let identity = resolve_identity(&headers, entry.requires_user)?;

    let body = if body.is_empty() {
        None
    } else {
        Some(
            serde_json::from_slice::<Value>(&body)
                .map_err(|e| GatewayError::Validation(format!("request body is not JSON: {}", e)))?,
        )
    };

    let params: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let request = ProxyRequest {
        path: uri.path().to_string(),
        params,
        query: uri.query().map(str::to_string),
        body,
    };

    let action = match entry.before.as_ref() {
        Some(hook) => hook.run(&identity, request).await?,
        None => BeforeAction::Forward(ForwardInstruction::passthrough(entry.upstream, &request)),
    };

    let instruction = match action {
        BeforeAction::Respond(reply) => {
            let status = StatusCode::from_u16(reply.status)
                .map_err(|_| GatewayError::Internal(format!("hook status {}", reply.status)))?;
            return Ok((status, Json(reply.body)).into_response());
        }
        BeforeAction::Forward(instruction) => instruction,
    };

    let reply = gateway.forwarder.send(&entry.method, &instruction).await?;
    let status = StatusCode::from_u16(reply.status)
        .map_err(|_| GatewayError::Upstream(format!("upstream status {}", reply.status)))?;

    if let Some(after) = entry.after.as_ref() {
        if status.is_success() && !reply.body.is_empty() {
            // Interception contract: fully buffer, parse, transform,
            // re-emit exactly once.
            let mut value: Value = serde_json::from_slice(&reply.body).map_err(|e| {
                GatewayError::Internal(format!("upstream reply is not JSON: {}", e))
            })?;
            after.run(&identity, &mut value).await?;
            return Ok((status, Json(value)).into_response());
        }
    }

    passthrough(status, reply.content_type.as_deref(), reply.body)
}

fn passthrough(
    status: StatusCode,
    content_type: Option<&str>,
    body: Bytes,
) -> GatewayResult<Response> {
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from(body))
        .map_err(|e| GatewayError::Internal(e.to_string()))
}
