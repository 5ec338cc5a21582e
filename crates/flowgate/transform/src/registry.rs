//! Transformer registry
//!
//! Built once at startup by calling every resource module's registration
//! function with the shared context and concatenating the results. The
//! registry is read-only for the lifetime of the process; the daemon turns
//! it into concrete routes.

use crate::context::{TransformerContext, Upstream};
use crate::hook::{AfterHook, BeforeHook};
use crate::resources;
use flowgate_types::{GatewayError, GatewayResult};
use http::Method;
use std::collections::HashSet;
use std::sync::Arc;

/// One proxied route and its transformation hooks
#[derive(Clone)]
pub struct RouteTransformer {
    pub method: Method,

    /// Router-style path pattern (`:name` segments bind params)
    pub path: &'static str,

    /// Default target when no before hook overrides it
    pub upstream: Upstream,

    /// Route needs user identity headers in addition to the tenant header
    pub requires_user: bool,

    pub before: Option<Arc<dyn BeforeHook>>,
    pub after: Option<Arc<dyn AfterHook>>,
}

impl RouteTransformer {
    pub fn new(method: Method, path: &'static str, upstream: Upstream) -> Self {
        Self {
            method,
            path,
            upstream,
            requires_user: false,
            before: None,
            after: None,
        }
    }

    pub fn requires_user(mut self) -> Self {
        self.requires_user = true;
        self
    }

    pub fn before(mut self, hook: Arc<dyn BeforeHook>) -> Self {
        self.before = Some(hook);
        self
    }

    pub fn after(mut self, hook: Arc<dyn AfterHook>) -> Self {
        self.after = Some(hook);
        self
    }
}

/// Immutable collection of every proxied route
pub struct TransformerRegistry {
    entries: Vec<RouteTransformer>,
}

impl TransformerRegistry {
    /// Collect entries from every resource module
    ///
    /// Exactly one workflow-definition variant registers, chosen by the
    /// RBAC toggle. Overlapping method+path pairs are a configuration
    /// error, reported rather than resolved.
    pub fn build(ctx: &TransformerContext) -> GatewayResult<Self> {
        let mut entries = Vec::new();
        if ctx.rbac_enabled {
            entries.extend(resources::metadata_workflow_rbac::register(ctx));
        } else {
            entries.extend(resources::metadata_workflow::register(ctx));
        }
        entries.extend(resources::metadata_task::register(ctx));
        entries.extend(resources::instance::register(ctx));
        entries.extend(resources::bulk::register(ctx));
        entries.extend(resources::schedule::register(ctx));
        entries.extend(resources::event::register(ctx));

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert((entry.method.clone(), entry.path)) {
                return Err(GatewayError::Internal(format!(
                    "duplicate route registration: {} {}",
                    entry.method, entry.path
                )));
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RouteTransformer] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::InstanceSearch;
    use async_trait::async_trait;
    use flowgate_auth::StaticGroupLookup;
    use flowgate_codec::NameCodec;

    struct NoSearch;

    #[async_trait]
    impl InstanceSearch for NoSearch {
        async fn confirm_tenant_ids(
            &self,
            _tenant: &str,
            _ids: &[String],
        ) -> flowgate_types::GatewayResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn test_ctx(rbac: bool) -> TransformerContext {
        TransformerContext {
            engine_codec: NameCodec::engine(),
            scheduler_codec: NameCodec::scheduler(),
            rbac_enabled: rbac,
            groups: Arc::new(StaticGroupLookup::new(Vec::new())),
            search: Arc::new(NoSearch),
        }
    }

    #[test]
    fn test_registry_has_no_overlaps() {
        let registry = TransformerRegistry::build(&test_ctx(false)).unwrap();
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_rbac_variant_registers_same_definition_routes() {
        let plain = TransformerRegistry::build(&test_ctx(false)).unwrap();
        let rbac = TransformerRegistry::build(&test_ctx(true)).unwrap();
        assert_eq!(plain.len(), rbac.len());

        let paths = |r: &TransformerRegistry| {
            let mut v: Vec<_> = r
                .entries()
                .iter()
                .map(|e| format!("{} {}", e.method, e.path))
                .collect();
            v.sort();
            v
        };
        assert_eq!(paths(&plain), paths(&rbac));
    }

    #[test]
    fn test_schedule_routes_target_scheduler() {
        let registry = TransformerRegistry::build(&test_ctx(false)).unwrap();
        for entry in registry.entries() {
            let is_schedule = entry.path.starts_with("/api/schedule");
            assert_eq!(
                entry.upstream == Upstream::Scheduler,
                is_schedule,
                "unexpected upstream for {}",
                entry.path
            );
        }
    }
}
