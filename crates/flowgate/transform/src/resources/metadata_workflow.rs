//! Workflow-definition transformers (tenant-scoped, no group filtering)
//!
//! Writes validate the task tree against the system allow-list, then
//! prefix the definition name and every nested task / sub-workflow name.
//! Reads strip the prefix back off; a record that does not decode under
//! the caller's tenant is dropped from lists but fails a single fetch.

use crate::context::{TransformerContext, Upstream};
use crate::hook::{AfterHook, BeforeAction, BeforeHook, ForwardInstruction, ProxyRequest};
use crate::registry::RouteTransformer;
use async_trait::async_trait;
use flowgate_codec::NameCodec;
use flowgate_types::{
    task::visit_names_mut, validate_task_types, GatewayError, GatewayResult, RequestIdentity,
    WorkflowDefinition,
};
use http::Method;
use serde_json::Value;
use std::sync::Arc;

pub fn register(ctx: &TransformerContext) -> Vec<RouteTransformer> {
    let codec = ctx.engine_codec.clone();
    vec![
        RouteTransformer::new(Method::GET, "/api/metadata/workflow", Upstream::Engine)
            .after(Arc::new(ListAfter { codec: codec.clone() })),
        RouteTransformer::new(Method::GET, "/api/metadata/workflow/:name", Upstream::Engine)
            .before(Arc::new(SingleBefore { codec: codec.clone() }))
            .after(Arc::new(SingleAfter { codec: codec.clone() })),
        RouteTransformer::new(Method::POST, "/api/metadata/workflow", Upstream::Engine)
            .before(Arc::new(WriteBefore { codec: codec.clone(), batch: false })),
        RouteTransformer::new(Method::PUT, "/api/metadata/workflow", Upstream::Engine)
            .before(Arc::new(WriteBefore { codec: codec.clone(), batch: true })),
        RouteTransformer::new(
            Method::DELETE,
            "/api/metadata/workflow/:name/:version",
            Upstream::Engine,
        )
        .before(Arc::new(DeleteBefore { codec })),
    ]
}

/// Encode one definition into the tenant's namespace
///
/// Type validation runs over the whole tree first, so a disallowed type at
/// any depth rejects the definition before a single name has been touched.
pub(crate) fn prefix_definition(
    codec: &NameCodec,
    tenant: &str,
    def: &mut WorkflowDefinition,
) -> GatewayResult<()> {
    validate_task_types(&def.tasks)?;
    codec.prefix_in_place(tenant, &mut def.name)?;
    visit_names_mut(&mut def.tasks, &mut |name| {
        codec.prefix_in_place_allow_global(tenant, name)
    })
}

/// Decode one definition; false when any name sits outside the tenant's
/// namespace (GLOBAL nested task names stay fully qualified)
pub(crate) fn strip_definition(
    codec: &NameCodec,
    tenant: &str,
    def: &mut WorkflowDefinition,
) -> bool {
    if !codec.strip_in_place(tenant, &mut def.name, false) {
        return false;
    }
    visit_names_mut(&mut def.tasks, &mut |name| {
        if codec.strip_in_place(tenant, name, true) {
            Ok(())
        } else {
            Err(GatewayError::Validation(format!(
                "task name {:?} outside tenant namespace",
                name
            )))
        }
    })
    .is_ok()
}

/// Strip a list response, dropping records that do not decode
pub(crate) fn strip_definition_list(
    codec: &NameCodec,
    tenant: &str,
    body: &mut Value,
) -> GatewayResult<Vec<WorkflowDefinition>> {
    let items = body
        .as_array()
        .ok_or_else(|| GatewayError::Internal("definition list is not an array".to_string()))?;

    let mut kept = Vec::new();
    for item in items {
        // Records the gateway cannot even parse are foreign by definition.
        let Ok(mut def) = serde_json::from_value::<WorkflowDefinition>(item.clone()) else {
            continue;
        };
        if strip_definition(codec, tenant, &mut def) {
            kept.push(def);
        }
    }
    Ok(kept)
}

struct ListAfter {
    codec: NameCodec,
}

#[async_trait]
impl AfterHook for ListAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        let kept = strip_definition_list(&self.codec, &identity.tenant_id, body)?;
        *body = serde_json::to_value(kept)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(())
    }
}

struct SingleBefore {
    codec: NameCodec,
}

#[async_trait]
impl BeforeHook for SingleBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let name = self.codec.prefix(&identity.tenant_id, req.param("name")?)?;
        let instruction = ForwardInstruction::passthrough(Upstream::Engine, &req)
            .with_path(format!("/api/metadata/workflow/{}", name));
        Ok(BeforeAction::Forward(instruction))
    }
}

struct SingleAfter {
    codec: NameCodec,
}

#[async_trait]
impl AfterHook for SingleAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        let mut def: WorkflowDefinition = serde_json::from_value(body.clone())
            .map_err(|e| GatewayError::Internal(format!("definition body: {}", e)))?;
        if !strip_definition(&self.codec, &identity.tenant_id, &mut def) {
            // A single fetch must never answer with a half-decoded record.
            return Err(GatewayError::Internal(format!(
                "definition {:?} outside tenant namespace",
                def.name
            )));
        }
        *body = serde_json::to_value(def).map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(())
    }
}

struct WriteBefore {
    codec: NameCodec,
    /// PUT carries an array of definitions, POST a single one
    batch: bool,
}

#[async_trait]
impl BeforeHook for WriteBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let body = req
            .body
            .clone()
            .ok_or_else(|| GatewayError::Validation("missing request body".to_string()))?;

        let rewritten = if self.batch {
            let mut defs: Vec<WorkflowDefinition> = serde_json::from_value(body)
                .map_err(|e| GatewayError::Validation(format!("definition list body: {}", e)))?;
            for def in &mut defs {
                prefix_definition(&self.codec, &identity.tenant_id, def)?;
            }
            serde_json::to_value(defs)
        } else {
            let mut def: WorkflowDefinition = serde_json::from_value(body)
                .map_err(|e| GatewayError::Validation(format!("definition body: {}", e)))?;
            prefix_definition(&self.codec, &identity.tenant_id, &mut def)?;
            serde_json::to_value(def)
        }
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Engine, &req).with_body(rewritten),
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
        let version = req.param("version")?;
        let instruction = ForwardInstruction::passthrough(Upstream::Engine, &req)
            .with_path(format!("/api/metadata/workflow/{}/{}", name, version));
        Ok(BeforeAction::Forward(instruction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn identity() -> RequestIdentity {
        RequestIdentity::tenant_only("acme")
    }

    fn request(body: Option<Value>) -> ProxyRequest {
        ProxyRequest {
            path: "/api/metadata/workflow".to_string(),
            params: HashMap::new(),
            query: None,
            body,
        }
    }

    fn fx3() -> Value {
        json!({
            "name": "fx3",
            "version": 1,
            "tasks": [
                {"name": "rate", "taskReferenceName": "rate_ref", "type": "SIMPLE"},
                {"name": "GLOBAL___notify", "taskReferenceName": "n_ref", "type": "SIMPLE"}
            ]
        })
    }

    #[tokio::test]
    async fn test_create_prefixes_definition_and_tasks() {
        let hook = WriteBefore {
            codec: NameCodec::engine(),
            batch: false,
        };
        let action = hook.run(&identity(), request(Some(fx3()))).await.unwrap();
        let BeforeAction::Forward(fwd) = action else {
            panic!("expected forward")
        };
        let body = fwd.body.unwrap();
        assert_eq!(body["name"], "acme___fx3");
        assert_eq!(body["tasks"][0]["name"], "acme___rate");
        assert_eq!(body["tasks"][1]["name"], "GLOBAL___notify");
    }

    #[tokio::test]
    async fn test_create_rejects_disallowed_type_before_prefixing() {
        let mut def = fx3();
        def["tasks"][0]["type"] = json!("INLINE");
        let hook = WriteBefore {
            codec: NameCodec::engine(),
            batch: false,
        };
        let err = hook.run(&identity(), request(Some(def))).await.unwrap_err();
        assert!(matches!(err, GatewayError::DisallowedTaskType(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_separator_in_name() {
        let mut def = fx3();
        def["name"] = json!("fx___3");
        let hook = WriteBefore {
            codec: NameCodec::engine(),
            batch: false,
        };
        let err = hook.run(&identity(), request(Some(def))).await.unwrap_err();
        assert!(matches!(err, GatewayError::NamingViolation(_)));
    }

    #[tokio::test]
    async fn test_list_strips_and_drops_foreign_records() {
        let hook = ListAfter {
            codec: NameCodec::engine(),
        };
        let mut body = json!([
            {"name": "acme___fx3", "tasks": [{"name": "acme___rate", "type": "SIMPLE"}]},
            {"name": "umbrella___fx9", "tasks": []},
            {"name": "GLOBAL___shared", "tasks": []}
        ]);
        hook.run(&identity(), &mut body).await.unwrap();
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["name"], "fx3");
        assert_eq!(list[0]["tasks"][0]["name"], "rate");
    }

    #[tokio::test]
    async fn test_single_fetch_fails_hard_on_foreign_record() {
        let hook = SingleAfter {
            codec: NameCodec::engine(),
        };
        let mut body = json!({"name": "umbrella___fx9"});
        assert!(hook.run(&identity(), &mut body).await.is_err());
    }

    #[tokio::test]
    async fn test_get_single_rewrites_path() {
        let hook = SingleBefore {
            codec: NameCodec::engine(),
        };
        let mut params = HashMap::new();
        params.insert("name".to_string(), "fx3".to_string());
        let req = ProxyRequest {
            path: "/api/metadata/workflow/fx3".to_string(),
            params,
            query: Some("version=2".to_string()),
            body: None,
        };
        let BeforeAction::Forward(fwd) = hook.run(&identity(), req).await.unwrap() else {
            panic!("expected forward")
        };
        assert_eq!(fwd.path, "/api/metadata/workflow/acme___fx3");
        assert_eq!(fwd.query.as_deref(), Some("version=2"));
    }
}
