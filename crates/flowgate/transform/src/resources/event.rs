//! Event-handler transformers
//!
//! Event handlers are write-only through the gateway. The handler's own
//! name is tenant-prefixed, and any start-workflow action inside it is
//! rewritten so the triggered workflow resolves inside the tenant (or
//! GLOBAL) namespace. The subscription string itself passes through: queue
//! addressing is backend configuration, not a tenant name.

use crate::context::{TransformerContext, Upstream};
use crate::hook::{BeforeAction, BeforeHook, ForwardInstruction, ProxyRequest};
use crate::registry::RouteTransformer;
use async_trait::async_trait;
use flowgate_codec::NameCodec;
use flowgate_types::{EventHandler, GatewayError, GatewayResult, RequestIdentity};
use http::Method;
use std::sync::Arc;

pub fn register(ctx: &TransformerContext) -> Vec<RouteTransformer> {
    let write = Arc::new(WriteBefore {
        codec: ctx.engine_codec.clone(),
    });
    vec![
        RouteTransformer::new(Method::POST, "/api/event", Upstream::Engine).before(write.clone()),
        RouteTransformer::new(Method::PUT, "/api/event", Upstream::Engine).before(write),
    ]
}

struct WriteBefore {
    codec: NameCodec,
}

#[async_trait]
impl BeforeHook for WriteBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let body = req
            .body
            .clone()
            .ok_or_else(|| GatewayError::Validation("missing request body".to_string()))?;
        let mut handler: EventHandler = serde_json::from_value(body)
            .map_err(|e| GatewayError::Validation(format!("event handler body: {}", e)))?;

        self.codec
            .prefix_in_place(&identity.tenant_id, &mut handler.name)?;
        for action in &mut handler.actions {
            if let Some(start) = action.start_workflow.as_mut() {
                self.codec
                    .prefix_in_place_allow_global(&identity.tenant_id, &mut start.name)?;
            }
        }

        let body = serde_json::to_value(handler).map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Engine, &req).with_body(body),
        ))
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

    fn request(body: serde_json::Value) -> ProxyRequest {
        ProxyRequest {
            path: "/api/event".to_string(),
            params: HashMap::new(),
            query: None,
            body: Some(body),
        }
    }

    #[tokio::test]
    async fn test_write_prefixes_handler_and_action_targets() {
        let hook = WriteBefore {
            codec: NameCodec::engine(),
        };
        let action = hook
            .run(
                &identity(),
                request(json!({
                    "name": "on_fx",
                    "event": "kafka:fx.updates",
                    "actions": [
                        {"action": "start_workflow", "startWorkflow": {"name": "fx3"}},
                        {"action": "start_workflow", "startWorkflow": {"name": "GLOBAL___audit"}}
                    ]
                })),
            )
            .await
            .unwrap();
        let BeforeAction::Forward(fwd) = action else {
            panic!("expected forward")
        };
        let body = fwd.body.unwrap();
        assert_eq!(body["name"], "acme___on_fx");
        assert_eq!(body["event"], "kafka:fx.updates");
        assert_eq!(body["actions"][0]["startWorkflow"]["name"], "acme___fx3");
        assert_eq!(body["actions"][1]["startWorkflow"]["name"], "GLOBAL___audit");
    }

    #[tokio::test]
    async fn test_write_rejects_separator_in_handler_name() {
        let hook = WriteBefore {
            codec: NameCodec::engine(),
        };
        let err = hook
            .run(
                &identity(),
                request(json!({"name": "on___fx", "event": "kafka:fx"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NamingViolation(_)));
    }
}
