//! Workflow CRD
//!
//! Executes a `Template` against a `Hardware`. One per `TinkerbellMachine`,
//! sharing its name and namespace. Status is reported by the Tinkerbell
//! workflow engine.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "tinkerbell.org",
    version = "v1alpha1",
    kind = "Workflow",
    namespaced,
    status = "WorkflowStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSpec {
    /// Name of the `Template` to run
    #[serde(default)]
    pub template_ref: String,

    /// Name of the `Hardware` to run on
    #[serde(default)]
    pub hardware_ref: String,

    /// Template device variables (e.g. `device_1` -> MAC address)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hardware_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    /// Overall workflow state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<WorkflowState>,
}

/// Workflow states as reported by the Tinkerbell workflow engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum WorkflowState {
    #[serde(rename = "STATE_PENDING")]
    Pending,
    #[serde(rename = "STATE_RUNNING")]
    Running,
    #[serde(rename = "STATE_FAILED")]
    Failed,
    #[serde(rename = "STATE_TIMEOUT")]
    Timeout,
    #[serde(rename = "STATE_SUCCESS")]
    Success,
}

impl Workflow {
    /// Reported state, if the workflow engine has picked the workflow up.
    pub fn state(&self) -> Option<WorkflowState> {
        self.status.as_ref().and_then(|status| status.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_uses_engine_names() {
        let status: WorkflowStatus =
            serde_json::from_value(serde_json::json!({ "state": "STATE_SUCCESS" })).unwrap();
        assert_eq!(status.state, Some(WorkflowState::Success));
    }
}
