//! Shared context handed to every registration function

use crate::search::InstanceSearch;
use flowgate_auth::GroupLookup;
use flowgate_codec::NameCodec;
use std::sync::Arc;

/// Which backend a forwarded request targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upstream {
    /// The shared workflow engine
    Engine,
    /// The companion scheduler service
    Scheduler,
}

/// Dependencies injected into transformer modules at registration time
///
/// Everything a hook needs arrives here once, at startup; modules hold no
/// ambient state of their own.
pub struct TransformerContext {
    /// Codec for names stored by the workflow engine
    pub engine_codec: NameCodec,

    /// Codec for schedule names stored by the scheduler
    pub scheduler_codec: NameCodec,

    /// Register RBAC-filtered workflow-definition routes instead of the
    /// plain tenant-scoped ones
    pub rbac_enabled: bool,

    /// Group membership lookup for RBAC routes
    pub groups: Arc<dyn GroupLookup>,

    /// Pre-flight instance search used by bulk and ownership validation
    pub search: Arc<dyn InstanceSearch>,
}
