//! Route transformers
//!
//! Each backend resource type contributes one module of before/after hooks
//! built from the namespacing codecs and authorization filters. A
//! registration pass at startup collects every module's route entries into
//! an immutable registry; the daemon builds its proxy router from that and
//! never touches the entries again.

pub mod context;
pub mod hook;
pub mod registry;
pub mod resources;
pub mod search;

pub use context::{TransformerContext, Upstream};
pub use hook::{AfterHook, BeforeAction, BeforeHook, ForwardInstruction, HookResponse, ProxyRequest};
pub use registry::{RouteTransformer, TransformerRegistry};
pub use search::{validate_instance_id, HttpInstanceSearch, InstanceSearch};
