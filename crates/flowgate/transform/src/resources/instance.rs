//! Workflow-instance transformers
//!
//! Instances are where tenant isolation meets per-user ownership: starts
//! are stamped with the caller's identity as the correlation id, search is
//! scoped at query-build time, and destructive single-instance operations
//! confirm tenant ownership with a pre-flight search before forwarding.

use crate::context::{TransformerContext, Upstream};
use crate::hook::{AfterHook, BeforeAction, BeforeHook, ForwardInstruction, ProxyRequest};
use crate::registry::RouteTransformer;
use crate::search::{validate_instance_id, InstanceSearch};
use async_trait::async_trait;
use flowgate_auth::{and_clause, ownership_clause, tenant_clause};
use flowgate_codec::{strip_document, NameCodec, PathRule, Seg, StripOutcome};
use flowgate_types::{GatewayError, GatewayResult, RequestIdentity, StartWorkflowRequest};
use http::Method;
use serde_json::Value;
use std::sync::Arc;
use url::form_urlencoded;

/// Name fields on a single instance document; GLOBAL stays visible since
/// tenants may run shared workflows
const INSTANCE_RULES: &[PathRule] = &[
    PathRule::new(&[Seg::Key("workflowName")], true),
    PathRule::new(&[Seg::Key("workflowType")], true),
];

/// Name fields on one search hit; search is scoped to the tenant's own
/// namespace, matching the predicate added to the query
const SEARCH_HIT_RULES: &[PathRule] = &[PathRule::new(&[Seg::Key("workflowType")], false)];

pub fn register(ctx: &TransformerContext) -> Vec<RouteTransformer> {
    let codec = ctx.engine_codec.clone();
    let guard = Arc::new(OwnershipGuardBefore {
        search: ctx.search.clone(),
    });
    vec![
        RouteTransformer::new(Method::POST, "/api/workflow", Upstream::Engine)
            .requires_user()
            .before(Arc::new(StartBefore { codec: codec.clone() })),
        RouteTransformer::new(Method::GET, "/api/workflow/search", Upstream::Engine)
            .requires_user()
            .before(Arc::new(SearchBefore { codec: codec.clone() }))
            .after(Arc::new(SearchAfter { codec: codec.clone() })),
        RouteTransformer::new(Method::GET, "/api/workflow/:id", Upstream::Engine)
            .after(Arc::new(GetAfter { codec })),
        RouteTransformer::new(Method::DELETE, "/api/workflow/:id", Upstream::Engine)
            .before(guard.clone()),
        RouteTransformer::new(Method::PUT, "/api/workflow/:id/pause", Upstream::Engine)
            .before(guard.clone()),
        RouteTransformer::new(Method::PUT, "/api/workflow/:id/resume", Upstream::Engine)
            .before(guard),
    ]
}

struct StartBefore {
    codec: NameCodec,
}

#[async_trait]
impl BeforeHook for StartBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let body = req
            .body
            .clone()
            .ok_or_else(|| GatewayError::Validation("missing request body".to_string()))?;
        let mut start: StartWorkflowRequest = serde_json::from_value(body)
            .map_err(|e| GatewayError::Validation(format!("start request body: {}", e)))?;

        // An inline definition or domain override would bypass every
        // rewrite applied at metadata time.
        if start.workflow_def.is_some() {
            return Err(GatewayError::NamingViolation(
                "start request carries an inline workflowDef".to_string(),
            ));
        }
        if start.task_to_domain.is_some() {
            return Err(GatewayError::NamingViolation(
                "start request carries a taskToDomain override".to_string(),
            ));
        }

        self.codec
            .prefix_in_place_allow_global(&identity.tenant_id, &mut start.name)?;

        // The correlation id records who started the instance; ownership
        // checks at search time rely on it, so the caller cannot choose it.
        start.correlation_id = Some(identity.require_email()?.to_string());

        let body = serde_json::to_value(start).map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Engine, &req).with_body(body),
        ))
    }
}

struct GetAfter {
    codec: NameCodec,
}

#[async_trait]
impl AfterHook for GetAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        match strip_document(&self.codec, &identity.tenant_id, body, INSTANCE_RULES) {
            StripOutcome::Complete => Ok(()),
            StripOutcome::Mismatch => Err(GatewayError::AuthorizationDenied(
                "instance outside tenant namespace".to_string(),
            )),
        }
    }
}

/// Confirms tenant ownership of the addressed instance before any
/// destructive forward; one extra engine round trip per request
struct OwnershipGuardBefore {
    search: Arc<dyn InstanceSearch>,
}

#[async_trait]
impl BeforeHook for OwnershipGuardBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let id = req.param("id")?.to_string();
        validate_instance_id(&id)?;

        let confirmed = self
            .search
            .confirm_tenant_ids(&identity.tenant_id, std::slice::from_ref(&id))
            .await?;
        if confirmed.is_empty() {
            return Err(GatewayError::AuthorizationDenied(format!(
                "instance {:?} is not owned by this tenant",
                id
            )));
        }

        Ok(BeforeAction::Forward(ForwardInstruction::passthrough(
            Upstream::Engine,
            &req,
        )))
    }
}

struct SearchBefore {
    codec: NameCodec,
}

#[async_trait]
impl BeforeHook for SearchBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let email = identity.require_email()?;

        // Pull the caller's query (if any) out of the query string; every
        // other parameter is forwarded as received.
        let mut caller_query = None;
        let mut rest: Vec<(String, String)> = Vec::new();
        if let Some(raw) = req.query.as_deref() {
            for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
                if key == "query" {
                    caller_query = Some(value.into_owned());
                } else {
                    rest.push((key.into_owned(), value.into_owned()));
                }
            }
        }

        let scoped = and_clause(
            caller_query.as_deref(),
            &tenant_clause(&self.codec, &identity.tenant_id)?,
        );
        let scoped = and_clause(Some(&scoped), &ownership_clause(email)?);

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("query", &scoped);
        for (key, value) in &rest {
            serializer.append_pair(key, value);
        }

        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Engine, &req)
                .with_query(serializer.finish()),
        ))
    }
}

struct SearchAfter {
    codec: NameCodec,
}

#[async_trait]
impl AfterHook for SearchAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        let Some(results) = body.get_mut("results").and_then(Value::as_array_mut) else {
            return Ok(());
        };
        // The query-side predicates already scope the result set; dropping
        // anything that still fails to decode is defense, not filtering.
        results.retain_mut(|hit| {
            strip_document(&self.codec, &identity.tenant_id, hit, SEARCH_HIT_RULES).is_complete()
        });
        Ok(())
    }
}
