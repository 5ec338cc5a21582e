//! Workflow definition and start-request wire shapes

use crate::task::Task;
use serde::{Deserialize, Serialize};

/// A workflow definition as the backend engine stores it
///
/// `labels` is the gateway-side group annotation consulted by the RBAC
/// transformer; definitions without labels are visible to every caller in
/// the tenant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Request body for starting a workflow instance
///
/// `workflow_def` and `task_to_domain` are accepted by the backend but
/// refused by the gateway: an inline definition or domain override would
/// bypass every tenant-scoping rewrite applied at metadata time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkflowRequest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_def: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_to_domain: Option<serde_json::Value>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_passthrough_fields_survive() {
        let raw = r#"{
            "name": "fx3",
            "version": 1,
            "ownerEmail": "ops@acme.io",
            "schemaVersion": 2,
            "tasks": [{"name": "t1", "type": "SIMPLE"}]
        }"#;
        let def: WorkflowDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(def.extra["ownerEmail"], "ops@acme.io");

        let back = serde_json::to_value(&def).unwrap();
        assert_eq!(back["schemaVersion"], 2);
        assert_eq!(back["tasks"][0]["name"], "t1");
    }

    #[test]
    fn test_start_request_flags_inline_sections() {
        let raw = r#"{"name": "fx3", "workflowDef": {"name": "evil"}}"#;
        let req: StartWorkflowRequest = serde_json::from_str(raw).unwrap();
        assert!(req.workflow_def.is_some());
        assert!(req.task_to_domain.is_none());
    }
}
