//! Group membership lookup
//!
//! Group membership lives in an external identity service with a GraphQL
//! surface. The lookup sits behind a trait so transformer hooks stay
//! testable without the service.

use async_trait::async_trait;
use flowgate_types::{GatewayError, GatewayResult};
use serde::Deserialize;
use serde_json::json;

/// Resolves the group memberships of a caller
#[async_trait]
pub trait GroupLookup: Send + Sync {
    async fn groups_for(&self, email: &str) -> GatewayResult<Vec<String>>;
}

const GROUPS_QUERY: &str = "query Groups($email: String!) { user(email: $email) { groups } }";

/// Group lookup against the configured GraphQL identity service
pub struct GraphqlGroupLookup {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphqlGroupLookup {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupsReply {
    data: Option<GroupsData>,
}

#[derive(Debug, Deserialize)]
struct GroupsData {
    user: Option<GroupsUser>,
}

#[derive(Debug, Deserialize)]
struct GroupsUser {
    #[serde(default)]
    groups: Vec<String>,
}

#[async_trait]
impl GroupLookup for GraphqlGroupLookup {
    async fn groups_for(&self, email: &str) -> GatewayResult<Vec<String>> {
        let reply = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "query": GROUPS_QUERY,
                "variables": { "email": email },
            }))
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(format!("group lookup: {}", e)))?;

        let status = reply.status();
        if !status.is_success() {
            return Err(GatewayError::Upstream(format!(
                "group lookup returned {}",
                status
            )));
        }

        let parsed: GroupsReply = reply
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("group lookup body: {}", e)))?;

        let groups = parsed
            .data
            .and_then(|d| d.user)
            .map(|u| u.groups)
            .unwrap_or_default();

        tracing::debug!(email = %email, groups = groups.len(), "resolved caller groups");
        Ok(groups)
    }
}

/// Fixed group set; for tests and single-team deployments
pub struct StaticGroupLookup {
    groups: Vec<String>,
}

impl StaticGroupLookup {
    pub fn new(groups: Vec<String>) -> Self {
        Self { groups }
    }
}

#[async_trait]
impl GroupLookup for StaticGroupLookup {
    async fn groups_for(&self, _email: &str) -> GatewayResult<Vec<String>> {
        Ok(self.groups.clone())
    }
}
