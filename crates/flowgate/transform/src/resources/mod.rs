//! Per-resource transformer modules
//!
//! Each module owns the rewrite rules for one backend resource type and
//! exposes a single `register` function called during registry
//! construction.

pub mod bulk;
pub mod event;
pub mod instance;
pub mod metadata_task;
pub mod metadata_workflow;
pub mod metadata_workflow_rbac;
pub mod schedule;
