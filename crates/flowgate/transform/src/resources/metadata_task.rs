//! Task-definition transformers
//!
//! Task definitions are flat documents; only the name field is rewritten.
//! Reads keep GLOBAL definitions visible (fully qualified) next to the
//! tenant's own, writes always land in the tenant's namespace.

use crate::context::{TransformerContext, Upstream};
use crate::hook::{AfterHook, BeforeAction, BeforeHook, ForwardInstruction, ProxyRequest};
use crate::registry::RouteTransformer;
use async_trait::async_trait;
use flowgate_codec::{strip_document, NameCodec, PathRule, Seg};
use flowgate_types::{GatewayError, GatewayResult, RequestIdentity};
use http::Method;
use serde_json::Value;
use std::sync::Arc;

const NAME_RULES: &[PathRule] = &[PathRule::new(&[Seg::Key("name")], true)];

pub fn register(ctx: &TransformerContext) -> Vec<RouteTransformer> {
    let codec = ctx.engine_codec.clone();
    vec![
        RouteTransformer::new(Method::GET, "/api/metadata/taskdefs", Upstream::Engine)
            .after(Arc::new(ListAfter { codec: codec.clone() })),
        RouteTransformer::new(Method::GET, "/api/metadata/taskdefs/:name", Upstream::Engine)
            .before(Arc::new(SingleBefore { codec: codec.clone() }))
            .after(Arc::new(SingleAfter { codec: codec.clone() })),
        RouteTransformer::new(Method::POST, "/api/metadata/taskdefs", Upstream::Engine)
            .before(Arc::new(WriteBefore { codec: codec.clone(), batch: true })),
        RouteTransformer::new(Method::PUT, "/api/metadata/taskdefs", Upstream::Engine)
            .before(Arc::new(WriteBefore { codec: codec.clone(), batch: false })),
        RouteTransformer::new(
            Method::DELETE,
            "/api/metadata/taskdefs/:name",
            Upstream::Engine,
        )
        .before(Arc::new(DeleteBefore { codec })),
    ]
}

fn prefix_name_field(codec: &NameCodec, tenant: &str, doc: &mut Value) -> GatewayResult<()> {
    let Some(Value::String(name)) = doc.get_mut("name") else {
        return Err(GatewayError::Validation(
            "task definition has no name".to_string(),
        ));
    };
    codec.prefix_in_place(tenant, name)
}

struct ListAfter {
    codec: NameCodec,
}

#[async_trait]
impl AfterHook for ListAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        let items = body
            .as_array()
            .ok_or_else(|| GatewayError::Internal("task definition list is not an array".to_string()))?;

        let kept: Vec<Value> = items
            .iter()
            .cloned()
            .filter_map(|mut item| {
                strip_document(&self.codec, &identity.tenant_id, &mut item, NAME_RULES)
                    .is_complete()
                    .then_some(item)
            })
            .collect();
        *body = Value::Array(kept);
        Ok(())
    }
}

struct SingleBefore {
    codec: NameCodec,
}

#[async_trait]
impl BeforeHook for SingleBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        // A caller may fetch a shared definition by its qualified GLOBAL
        // name; everything else resolves inside the tenant.
        let mut name = req.param("name")?.to_string();
        self.codec
            .prefix_in_place_allow_global(&identity.tenant_id, &mut name)?;
        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Engine, &req)
                .with_path(format!("/api/metadata/taskdefs/{}", name)),
        ))
    }
}

struct SingleAfter {
    codec: NameCodec,
}

#[async_trait]
impl AfterHook for SingleAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        if !strip_document(&self.codec, &identity.tenant_id, body, NAME_RULES).is_complete() {
            return Err(GatewayError::Internal(
                "task definition outside tenant namespace".to_string(),
            ));
        }
        Ok(())
    }
}

struct WriteBefore {
    codec: NameCodec,
    /// POST carries an array of definitions, PUT a single one
    batch: bool,
}

#[async_trait]
impl BeforeHook for WriteBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let mut body = req
            .body
            .clone()
            .ok_or_else(|| GatewayError::Validation("missing request body".to_string()))?;

        if self.batch {
            let items = body.as_array_mut().ok_or_else(|| {
                GatewayError::Validation("task definition list body is not an array".to_string())
            })?;
            for item in items {
                prefix_name_field(&self.codec, &identity.tenant_id, item)?;
            }
        } else {
            prefix_name_field(&self.codec, &identity.tenant_id, &mut body)?;
        }

        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Engine, &req).with_body(body),
        ))
    }
}

struct DeleteBefore {
    codec: NameCodec,
}

#[async_trait]
impl BeforeHook for DeleteBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let name = self.codec.prefix(&identity.tenant_id, req.param("name")?)?;
        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Engine, &req)
                .with_path(format!("/api/metadata/taskdefs/{}", name)),
        ))
    }
}
