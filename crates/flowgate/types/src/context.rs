//! Request identity resolved from trusted gateway headers
//!
//! The gateway sits behind an authenticating edge; tenant and user identity
//! arrive as plain headers and are treated as already verified. Resolution
//! happens once per request, before any upstream call.

use crate::errors::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};

/// Header carrying the tenant organization identifier
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Header carrying the calling user's email
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Header carrying the calling user's role
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated user attached to a request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: String,
    pub role: String,
}

/// Identity under which a proxied request executes
///
/// `user` is populated only on routes that require per-user authorization;
/// plain tenant-scoped routes run with the tenant alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub tenant_id: String,
    pub user: Option<UserIdentity>,
}

impl RequestIdentity {
    pub fn tenant_only(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user: None,
        }
    }

    pub fn with_user(tenant_id: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user: Some(UserIdentity {
                email: email.into(),
                role: role.into(),
            }),
        }
    }

    /// User email, or ContextMissing when the route needed one
    pub fn require_email(&self) -> GatewayResult<&str> {
        self.user
            .as_ref()
            .map(|u| u.email.as_str())
            .ok_or_else(|| GatewayError::ContextMissing(USER_EMAIL_HEADER.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_email_present() {
        let id = RequestIdentity::with_user("acme", "eve@acme.io", "user");
        assert_eq!(id.require_email().unwrap(), "eve@acme.io");
    }

    #[test]
    fn test_require_email_missing() {
        let id = RequestIdentity::tenant_only("acme");
        assert!(matches!(
            id.require_email(),
            Err(GatewayError::ContextMissing(_))
        ));
    }
}
