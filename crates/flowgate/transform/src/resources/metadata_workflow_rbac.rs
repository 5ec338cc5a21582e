//! Workflow-definition transformers with group-based authorization
//!
//! Registered instead of the plain module when RBAC is enabled. Writes are
//! identical; reads additionally match the definition's group labels
//! against the caller's groups. List responses silently exclude
//! unauthorized entries; a single fetch of one answers 401 so a broken
//! link is not masked as a 404.

use super::metadata_workflow::{strip_definition, strip_definition_list};
use crate::context::TransformerContext;
use crate::hook::AfterHook;
use crate::registry::RouteTransformer;
use async_trait::async_trait;
use flowgate_auth::{is_authorized_by_group, GroupLookup};
use flowgate_codec::NameCodec;
use flowgate_types::{GatewayError, GatewayResult, RequestIdentity, WorkflowDefinition};
use http::Method;
use serde_json::Value;
use std::sync::Arc;

pub fn register(ctx: &TransformerContext) -> Vec<RouteTransformer> {
    let codec = ctx.engine_codec.clone();
    let plain = super::metadata_workflow::register(ctx);

    let mut entries: Vec<RouteTransformer> = plain
        .into_iter()
        .map(|entry| match (entry.method.clone(), entry.path) {
            (Method::GET, "/api/metadata/workflow") => entry
                .requires_user()
                .after(Arc::new(RbacListAfter {
                    codec: codec.clone(),
                    groups: ctx.groups.clone(),
                })),
            (Method::GET, "/api/metadata/workflow/:name") => entry
                .requires_user()
                .after(Arc::new(RbacSingleAfter {
                    codec: codec.clone(),
                    groups: ctx.groups.clone(),
                })),
            _ => entry,
        })
        .collect();

    // Writes also run under an identified caller.
    for entry in &mut entries {
        if entry.method != Method::GET {
            entry.requires_user = true;
        }
    }
    entries
}

struct RbacListAfter {
    codec: NameCodec,
    groups: Arc<dyn GroupLookup>,
}

#[async_trait]
impl AfterHook for RbacListAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        let caller_groups = self.groups.groups_for(identity.require_email()?).await?;
        let kept: Vec<WorkflowDefinition> =
            strip_definition_list(&self.codec, &identity.tenant_id, body)?
                .into_iter()
                .filter(|def| is_authorized_by_group(&def.labels, &caller_groups))
                .collect();
        *body = serde_json::to_value(kept).map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(())
    }
}

struct RbacSingleAfter {
    codec: NameCodec,
    groups: Arc<dyn GroupLookup>,
}

#[async_trait]
impl AfterHook for RbacSingleAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        let mut def: WorkflowDefinition = serde_json::from_value(body.clone())
            .map_err(|e| GatewayError::Internal(format!("definition body: {}", e)))?;
        if !strip_definition(&self.codec, &identity.tenant_id, &mut def) {
            return Err(GatewayError::Internal(format!(
                "definition {:?} outside tenant namespace",
                def.name
            )));
        }

        let caller_groups = self.groups.groups_for(identity.require_email()?).await?;
        if !is_authorized_by_group(&def.labels, &caller_groups) {
            return Err(GatewayError::AuthorizationDenied(format!(
                "definition {:?} is restricted to other groups",
                def.name
            )));
        }

        *body = serde_json::to_value(def).map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgate_auth::StaticGroupLookup;
    use serde_json::json;

    fn identity() -> RequestIdentity {
        RequestIdentity::with_user("acme", "eve@acme.io", "user")
    }

    fn lookup(groups: &[&str]) -> Arc<dyn GroupLookup> {
        Arc::new(StaticGroupLookup::new(
            groups.iter().map(|g| g.to_string()).collect(),
        ))
    }

    #[tokio::test]
    async fn test_list_excludes_foreign_group_labels() {
        let hook = RbacListAfter {
            codec: NameCodec::engine(),
            groups: lookup(&["g2"]),
        };
        let mut body = json!([
            {"name": "acme___open", "tasks": []},
            {"name": "acme___locked", "labels": ["g1"], "tasks": []},
            {"name": "acme___team", "labels": ["g2", "g9"], "tasks": []}
        ]);
        hook.run(&identity(), &mut body).await.unwrap();
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["open", "team"]);
    }

    #[tokio::test]
    async fn test_single_fetch_of_restricted_definition_is_denied() {
        let hook = RbacSingleAfter {
            codec: NameCodec::engine(),
            groups: lookup(&["g2"]),
        };
        let mut body = json!({"name": "acme___locked", "labels": ["g1"]});
        let err = hook.run(&identity(), &mut body).await.unwrap_err();
        assert!(matches!(err, GatewayError::AuthorizationDenied(_)));
    }

    #[tokio::test]
    async fn test_single_fetch_of_unlabeled_definition_passes() {
        let hook = RbacSingleAfter {
            codec: NameCodec::engine(),
            groups: lookup(&[]),
        };
        let mut body = json!({"name": "acme___open"});
        hook.run(&identity(), &mut body).await.unwrap();
        assert_eq!(body["name"], "open");
    }
}
