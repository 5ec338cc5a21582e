//! Schedule transformers (scheduler backend)
//!
//! Schedules live on the companion scheduler, whose naming rules differ
//! from the engine's; the schedule's own name uses the scheduler codec
//! while the embedded workflow name keeps the engine convention. The two
//! fields must be equal before prefixing and both are rewritten together,
//! so they decode back to the same local name.

use crate::context::{TransformerContext, Upstream};
use crate::hook::{AfterHook, BeforeAction, BeforeHook, ForwardInstruction, ProxyRequest};
use crate::registry::RouteTransformer;
use async_trait::async_trait;
use flowgate_codec::NameCodec;
use flowgate_types::{GatewayError, GatewayResult, RequestIdentity, Schedule};
use http::Method;
use serde_json::Value;
use std::sync::Arc;

pub fn register(ctx: &TransformerContext) -> Vec<RouteTransformer> {
    let sched = ctx.scheduler_codec.clone();
    let engine = ctx.engine_codec.clone();
    vec![
        RouteTransformer::new(Method::GET, "/api/schedule", Upstream::Scheduler).after(Arc::new(
            ListAfter {
                sched: sched.clone(),
                engine: engine.clone(),
            },
        )),
        RouteTransformer::new(Method::GET, "/api/schedule/:name", Upstream::Scheduler)
            .before(Arc::new(SingleBefore { sched: sched.clone() }))
            .after(Arc::new(SingleAfter {
                sched: sched.clone(),
                engine: engine.clone(),
            })),
        RouteTransformer::new(Method::POST, "/api/schedule", Upstream::Scheduler)
            .before(Arc::new(UpsertBefore {
                sched: sched.clone(),
                engine: engine.clone(),
                named_route: false,
            })),
        RouteTransformer::new(Method::PUT, "/api/schedule/:name", Upstream::Scheduler)
            .before(Arc::new(UpsertBefore {
                sched: sched.clone(),
                engine,
                named_route: true,
            })),
        RouteTransformer::new(Method::DELETE, "/api/schedule/:name", Upstream::Scheduler)
            .before(Arc::new(DeleteBefore { sched })),
    ]
}

/// Rewrite one schedule into the tenant's namespaces
fn prefix_schedule(
    sched: &NameCodec,
    engine: &NameCodec,
    tenant: &str,
    schedule: &mut Schedule,
) -> GatewayResult<()> {
    schedule.check_names_match()?;
    sched.prefix_in_place(tenant, &mut schedule.name)?;
    engine.prefix_in_place(tenant, &mut schedule.workflow_name)
}

/// Decode one schedule; false when either field is outside the tenant
fn strip_schedule(
    sched: &NameCodec,
    engine: &NameCodec,
    tenant: &str,
    schedule: &mut Schedule,
) -> bool {
    sched.strip_in_place(tenant, &mut schedule.name, false)
        && engine.strip_in_place(tenant, &mut schedule.workflow_name, false)
}

struct ListAfter {
    sched: NameCodec,
    engine: NameCodec,
}

#[async_trait]
impl AfterHook for ListAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        let items = body
            .as_array()
            .ok_or_else(|| GatewayError::Internal("schedule list is not an array".to_string()))?;

        let mut kept = Vec::new();
        for item in items {
            let Ok(mut schedule) = serde_json::from_value::<Schedule>(item.clone()) else {
                continue;
            };
            if strip_schedule(&self.sched, &self.engine, &identity.tenant_id, &mut schedule) {
                kept.push(schedule);
            }
        }
        *body = serde_json::to_value(kept).map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(())
    }
}

struct SingleBefore {
    sched: NameCodec,
}

#[async_trait]
impl BeforeHook for SingleBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let name = self.sched.prefix(&identity.tenant_id, req.param("name")?)?;
        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Scheduler, &req)
                .with_path(format!("/api/schedule/{}", name)),
        ))
    }
}

struct SingleAfter {
    sched: NameCodec,
    engine: NameCodec,
}

#[async_trait]
impl AfterHook for SingleAfter {
    async fn run(&self, identity: &RequestIdentity, body: &mut Value) -> GatewayResult<()> {
        let mut schedule: Schedule = serde_json::from_value(body.clone())
            .map_err(|e| GatewayError::Internal(format!("schedule body: {}", e)))?;
        if !strip_schedule(&self.sched, &self.engine, &identity.tenant_id, &mut schedule) {
            return Err(GatewayError::AuthorizationDenied(format!(
                "schedule {:?} is not owned by this tenant",
                schedule.name
            )));
        }
        *body = serde_json::to_value(schedule).map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(())
    }
}

struct UpsertBefore {
    sched: NameCodec,
    engine: NameCodec,
    /// PUT routes carry the schedule name in the path as well
    named_route: bool,
}

#[async_trait]
impl BeforeHook for UpsertBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let body = req
            .body
            .clone()
            .ok_or_else(|| GatewayError::Validation("missing request body".to_string()))?;
        let mut schedule: Schedule = serde_json::from_value(body)
            .map_err(|e| GatewayError::Validation(format!("schedule body: {}", e)))?;

        if self.named_route {
            let path_name = req.param("name")?;
            if path_name != schedule.name {
                return Err(GatewayError::NameMismatch {
                    name: schedule.name.clone(),
                    workflow_name: path_name.to_string(),
                });
            }
        }

        prefix_schedule(&self.sched, &self.engine, &identity.tenant_id, &mut schedule)?;

        let path = if self.named_route {
            format!("/api/schedule/{}", schedule.name)
        } else {
            req.path.clone()
        };
        let body = serde_json::to_value(schedule).map_err(|e| GatewayError::Internal(e.to_string()))?;

        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Scheduler, &req)
                .with_path(path)
                .with_body(body),
        ))
    }
}

struct DeleteBefore {
    sched: NameCodec,
}

#[async_trait]
impl BeforeHook for DeleteBefore {
    async fn run(&self, identity: &RequestIdentity, req: ProxyRequest) -> GatewayResult<BeforeAction> {
        let name = self.sched.prefix(&identity.tenant_id, req.param("name")?)?;
        Ok(BeforeAction::Forward(
            ForwardInstruction::passthrough(Upstream::Scheduler, &req)
                .with_path(format!("/api/schedule/{}", name)),
        ))
    }
}
