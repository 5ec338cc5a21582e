//! Authorization and ownership filtering
//!
//! Two mechanisms restrict what a caller may see on top of tenant
//! isolation: group labels on workflow definitions (matched against the
//! caller's groups, resolved through an external lookup service), and
//! correlation-id ownership on running instances (applied at query-build
//! time so pagination counts stay correct).

pub mod groups;
pub mod lookup;
pub mod query;

pub use groups::is_authorized_by_group;
pub use lookup::{GraphqlGroupLookup, GroupLookup, StaticGroupLookup};
pub use query::{and_clause, ownership_clause, tenant_clause};
