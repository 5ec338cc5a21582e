//! Search-query scoping predicates
//!
//! The backend exposes a boolean query language; the gateway only ever
//! augments a caller's query by AND-ing scoping predicates onto it, never
//! replacing it.

use flowgate_codec::NameCodec;
use flowgate_types::{GatewayError, GatewayResult};

/// AND a scoping clause onto an optional caller query
pub fn and_clause(existing: Option<&str>, clause: &str) -> String {
    match existing {
        Some(q) if !q.trim().is_empty() => format!("({}) AND {}", q, clause),
        _ => clause.to_string(),
    }
}

/// Predicate limiting instance visibility to the user who started it
///
/// The correlation id is stamped with the starter's email at start time;
/// quoting it back into the query requires the email to be quote-free, a
/// restriction enforced here rather than papered over by escaping.
pub fn ownership_clause(email: &str) -> GatewayResult<String> {
    if email.contains('\'') {
        return Err(GatewayError::Validation(format!(
            "email {:?} contains a quote character",
            email
        )));
    }
    Ok(format!("correlationId = '{}'", email))
}

/// Predicate limiting instance visibility to one tenant's namespace
pub fn tenant_clause(codec: &NameCodec, tenant: &str) -> GatewayResult<String> {
    codec.check_tenant(tenant)?;
    Ok(format!(
        "workflowType STARTS_WITH '{}{}'",
        tenant,
        codec.separator()
    ))
}
