//! Schedule wire shape (scheduler backend)

use crate::errors::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};

/// A schedule as the scheduler backend stores it
///
/// The scheduler requires `name` to equal `workflow_name`; the gateway
/// validates that before prefixing and keeps both fields consistent after.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub name: String,

    pub workflow_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_version: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_string: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Schedule {
    /// Reject a schedule whose two name fields disagree
    pub fn check_names_match(&self) -> GatewayResult<()> {
        if self.name != self.workflow_name {
            return Err(GatewayError::NameMismatch {
                name: self.name.clone(),
                workflow_name: self.workflow_name.clone(),
            });
        }
        Ok(())
    }
}
