//! Bulk lifecycle-operation validator
//!
//! A bulk terminate/pause/resume/retry/restart names many instance ids in
//! one call. Before anything is forwarded, the ids are confirmed against a
//! tenant-scoped search; ids the search cannot confirm are dropped and
//! logged, never forwarded. An empty confirmed subset still forwards -- a
//! no-op at the backend is a legitimate outcome of filtering, not an error.

use crate::context::{TransformerContext, Upstream};
use crate::hook::{BeforeAction, BeforeHook, ForwardInstruction, ProxyRequest};
use crate::registry::RouteTransformer;
use crate::search::{validate_instance_id, InstanceSearch};
use async_trait::async_trait;
use flowgate_types::{GatewayError, GatewayResult, RequestIdentity};
use http::Method;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub fn register(ctx: &TransformerContext) -> Vec<RouteTransformer> {
    let validate = Arc::new(BulkBefore {
        search: ctx.search.clone(),
    });
    vec![
        RouteTransformer::new(Method::DELETE, "/api/workflow/bulk/terminate", Upstream::Engine)
            .before(validate.clone()),
        RouteTransformer::new(Method::PUT, "/api/workflow/bulk/pause", Upstream::Engine)
            .before(validate.clone()),
        RouteTransformer::new(Method::PUT, "/api/workflow/bulk/resume", Upstream::Engine)
            .before(validate.clone()),
        RouteTransformer::new(Method::POST, "/api/workflow/bulk/retry", Upstream::Engine)
            .before(validate.clone()),
        RouteTransformer::new(Method::POST, "/api/workflow/bulk/restart", Upstream::Engine)
            .before(validate),
    ]
}

struct BulkBefore {
    search: Arc<dyn InstanceSearch>,
}

fn parse_ids(body: Option<&Value>) -> GatewayResult<Vec<String>> {
    let items = body
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::Validation("bulk body must be an array of instance ids".to_string()))?;
    if items.is_empty() {
        return Err(GatewayError::Validation(
            "bulk body must name at least one instance id".to_string(),
        ));
    }

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = item
            .as_str()
            .ok_or_else(|| GatewayError::Validation("bulk ids must be strings".to_string()))?;
        validate_instance_id(id)?;
        ids.push(id.to_string());
    }
    Ok(ids)
}

#[async_trait]
impl BeforeHook for BulkBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let ids = parse_ids(req.body.as_ref())?;

        let confirmed: HashSet<String> = self
            .search
            .confirm_tenant_ids(&identity.tenant_id, &ids)
            .await?
            .into_iter()
            .collect();

        let (forwarded, dropped): (Vec<String>, Vec<String>) =
            ids.into_iter().partition(|id| confirmed.contains(id));

        if !dropped.is_empty() {
            tracing::warn!(
                tenant = %identity.tenant_id,
                path = %req.path,
                dropped = ?dropped,
                "bulk operation dropped ids not confirmed for this tenant"
            );
        }

        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Engine, &req).with_body(json!(forwarded)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedSearch {
        owned: Vec<String>,
    }

    #[async_trait]
    impl InstanceSearch for FixedSearch {
        async fn confirm_tenant_ids(
            &self,
            _tenant: &str,
            ids: &[String],
        ) -> GatewayResult<Vec<String>> {
            Ok(ids.iter().filter(|id| self.owned.contains(*id)).cloned().collect())
        }
    }

    fn hook(owned: &[&str]) -> BulkBefore {
        BulkBefore {
            search: Arc::new(FixedSearch {
                owned: owned.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    fn request(body: Value) -> ProxyRequest {
        ProxyRequest {
            path: "/api/workflow/bulk/retry".to_string(),
            params: HashMap::new(),
            query: None,
            body: Some(body),
        }
    }

    fn identity() -> RequestIdentity {
        RequestIdentity::tenant_only("acme")
    }

    #[tokio::test]
    async fn test_forwards_confirmed_subset_in_caller_order() {
        let action = hook(&["A", "C"])
            .run(&identity(), request(json!(["A", "B", "C"])))
            .await
            .unwrap();
        let BeforeAction::Forward(fwd) = action else {
            panic!("expected forward")
        };
        assert_eq!(fwd.body.unwrap(), json!(["A", "C"]));
    }

    #[tokio::test]
    async fn test_empty_confirmed_subset_still_forwards() {
        let action = hook(&[])
            .run(&identity(), request(json!(["A", "B"])))
            .await
            .unwrap();
        let BeforeAction::Forward(fwd) = action else {
            panic!("expected forward")
        };
        assert_eq!(fwd.body.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_rejects_empty_body() {
        let err = hook(&["A"])
            .run(&identity(), request(json!([])))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rejects_malformed_ids_before_searching() {
        let err = hook(&["A"])
            .run(&identity(), request(json!(["A", "x') OR ('1'='1"])))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rejects_non_string_ids() {
        let err = hook(&["A"])
            .run(&identity(), request(json!(["A", 42])))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }
}
