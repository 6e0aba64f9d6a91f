//! Template CRD
//!
//! Rendered Tinkerbell provisioning template. One per `TinkerbellMachine`,
//! sharing its name and namespace.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "tinkerbell.org",
    version = "v1alpha1",
    kind = "Template",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    /// Template body (Tinkerbell template YAML)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}
