//! Pre-flight instance search
//!
//! Destructive operations on workflow instances (bulk lifecycle calls,
//! single-instance delete/pause/resume) confirm tenant ownership through
//! the engine's search endpoint before anything is forwarded. The search
//! sits behind a trait so hooks stay testable without an engine.

use async_trait::async_trait;
use flowgate_codec::NameCodec;
use flowgate_types::{GatewayError, GatewayResult};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Allow-list for workflow instance identifiers
///
/// Ids are interpolated into a search query; anything outside this set is
/// rejected up front rather than quoted.
pub fn validate_instance_id(id: &str) -> GatewayResult<()> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:-]{1,128}$").expect("static pattern"));
    if pattern.is_match(id) {
        Ok(())
    } else {
        Err(GatewayError::Validation(format!(
            "instance id {:?} is not a valid identifier",
            id
        )))
    }
}

/// Confirms which instance ids are owned by a tenant
#[async_trait]
pub trait InstanceSearch: Send + Sync {
    /// Return the subset of `ids` the engine knows and whose workflow type
    /// carries this tenant's prefix. Order is not significant.
    async fn confirm_tenant_ids(&self, tenant: &str, ids: &[String]) -> GatewayResult<Vec<String>>;
}

/// Instance search against the engine's HTTP search endpoint
pub struct HttpInstanceSearch {
    client: reqwest::Client,
    engine_base: String,
    codec: NameCodec,
}

impl HttpInstanceSearch {
    pub fn new(client: reqwest::Client, engine_base: impl Into<String>, codec: NameCodec) -> Self {
        Self {
            client,
            engine_base: engine_base.into(),
            codec,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchReply {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    workflow_id: String,
    #[serde(default)]
    workflow_type: String,
}

#[async_trait]
impl InstanceSearch for HttpInstanceSearch {
    async fn confirm_tenant_ids(&self, tenant: &str, ids: &[String]) -> GatewayResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        for id in ids {
            validate_instance_id(id)?;
        }

        let query = format!("workflowId IN ({})", ids.join(","));
        let size = ids.len().to_string();
        let url = format!("{}/api/workflow/search", self.engine_base.trim_end_matches('/'));
        let reply = self
            .client
            .get(url)
            .query(&[("query", query.as_str()), ("size", size.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(format!("ownership search: {}", e)))?;

        let status = reply.status();
        if !status.is_success() {
            return Err(GatewayError::Upstream(format!(
                "ownership search returned {}",
                status
            )));
        }

        let parsed: SearchReply = reply
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("ownership search body: {}", e)))?;

        // Records without this tenant's prefix are not tenant-owned and
        // never enter the confirmed set.
        let confirmed = parsed
            .results
            .into_iter()
            .filter(|hit| self.codec.strip(tenant, &hit.workflow_type, false).is_some())
            .map(|hit| hit.workflow_id)
            .collect();
        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_allow_list() {
        assert!(validate_instance_id("6fa2f3a0-9c2e-11ee-8c90-0242ac120002").is_ok());
        assert!(validate_instance_id("wf_1.2:A").is_ok());
        assert!(validate_instance_id("a, b").is_err());
        assert!(validate_instance_id("x') OR ('1'='1").is_err());
        assert!(validate_instance_id("").is_err());
    }

    #[test]
    fn test_search_reply_shape() {
        let parsed: SearchReply = serde_json::from_str(
            r#"{"totalHits": 2, "results": [
                {"workflowId": "A", "workflowType": "acme___fx3"},
                {"workflowId": "B", "workflowType": "umbrella___fx3"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].workflow_id, "A");
    }
}
