//! Event handler wire shape

use serde::{Deserialize, Serialize};

/// One action fired by an event handler
///
/// Only the embedded start-workflow target needs tenant rewriting; complete
/// and fail actions reference instances by id and pass through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_workflow: Option<StartWorkflowAction>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Start-workflow target inside an event action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkflowAction {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An event handler registered with the backend engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHandler {
    pub name: String,

    pub event: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<EventAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_handler_round_trip() {
        let raw = r#"{
            "name": "on_fx",
            "event": "kafka:fx.updates",
            "active": true,
            "actions": [{
                "action": "start_workflow",
                "startWorkflow": {"name": "fx3", "version": 1, "input": {"k": "v"}}
            }]
        }"#;
        let handler: EventHandler = serde_json::from_str(raw).unwrap();
        assert_eq!(handler.actions.len(), 1);
        let back = serde_json::to_value(&handler).unwrap();
        assert_eq!(back["actions"][0]["startWorkflow"]["input"]["k"], "v");
    }
}
