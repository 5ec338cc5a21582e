//! Header-based identity resolution
//!
//! Runs before anything else in the pipeline; a request missing a required
//! header is rejected with 400 and never reaches an upstream.

use axum::http::HeaderMap;
use flowgate_codec::GLOBAL_NAMESPACE;
use flowgate_types::{
    GatewayError, GatewayResult, RequestIdentity, UserIdentity, TENANT_HEADER, USER_EMAIL_HEADER,
    USER_ROLE_HEADER,
};

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> GatewayResult<&'a str> {
    let value = headers
        .get(name)
        .ok_or_else(|| GatewayError::ContextMissing(name.to_string()))?;
    let value = value
        .to_str()
        .map_err(|_| GatewayError::ContextMissing(name.to_string()))?;
    if value.trim().is_empty() {
        return Err(GatewayError::ContextMissing(name.to_string()));
    }
    Ok(value)
}

/// Resolve tenant (and, when required, user) identity from headers
pub fn resolve_identity(headers: &HeaderMap, requires_user: bool) -> GatewayResult<RequestIdentity> {
    let tenant_id = required_header(headers, TENANT_HEADER)?;
    if tenant_id == GLOBAL_NAMESPACE {
        return Err(GatewayError::Validation(format!(
            "tenant id may not be the reserved namespace {}",
            GLOBAL_NAMESPACE
        )));
    }

    let user = if requires_user {
        Some(UserIdentity {
            email: required_header(headers, USER_EMAIL_HEADER)?.to_string(),
            role: required_header(headers, USER_ROLE_HEADER)?.to_string(),
        })
    } else {
        None
    };

    Ok(RequestIdentity {
        tenant_id: tenant_id.to_string(),
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_tenant_only_resolution() {
        let identity = resolve_identity(&headers(&[("x-tenant-id", "acme")]), false).unwrap();
        assert_eq!(identity.tenant_id, "acme");
        assert!(identity.user.is_none());
    }

    #[test]
    fn test_missing_tenant_is_context_missing() {
        assert!(matches!(
            resolve_identity(&HeaderMap::new(), false),
            Err(GatewayError::ContextMissing(h)) if h == "x-tenant-id"
        ));
    }

    #[test]
    fn test_reserved_tenant_rejected() {
        assert!(resolve_identity(&headers(&[("x-tenant-id", "GLOBAL")]), false).is_err());
    }

    #[test]
    fn test_user_headers_required_when_flagged() {
        let partial = headers(&[("x-tenant-id", "acme"), ("x-user-email", "e@acme.io")]);
        assert!(matches!(
            resolve_identity(&partial, true),
            Err(GatewayError::ContextMissing(h)) if h == "x-user-role"
        ));

        let full = headers(&[
            ("x-tenant-id", "acme"),
            ("x-user-email", "e@acme.io"),
            ("x-user-role", "user"),
        ]);
        let identity = resolve_identity(&full, true).unwrap();
        assert_eq!(identity.user.unwrap().email, "e@acme.io");
    }
}
