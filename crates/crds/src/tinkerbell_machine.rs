//! TinkerbellMachine CRD
//!
//! Infrastructure record for one bare-metal node. Owned by a Cluster API
//! `Machine` and bound to exactly one `Hardware` by name.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::MACHINE_FINALIZER;
use crate::finalizers;

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "TinkerbellMachine",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TinkerbellMachineSpec {
    /// Provider ID reported back to Cluster API once the node is up
    #[serde(default, rename = "providerID", skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Name of the `Hardware` this machine is placed on
    #[serde(default)]
    pub hardware_name: String,

    /// Raw Tinkerbell template to use instead of the generated one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_override: Option<String>,
}

impl TinkerbellMachine {
    /// Name of the placed hardware, or `None` if placement has not happened.
    pub fn hardware_name(&self) -> Option<&str> {
        Some(self.spec.hardware_name.as_str()).filter(|name| !name.is_empty())
    }

    /// True once the store has recorded deletion intent for this machine.
    pub fn deletion_requested(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// True while the controller's finalizer is still present.
    pub fn has_machine_finalizer(&self) -> bool {
        finalizers::has_finalizer(&self.metadata, MACHINE_FINALIZER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_deserializes_upstream_field_names() {
        let spec: TinkerbellMachineSpec = serde_json::from_value(serde_json::json!({
            "providerID": "tinkerbell://hw-1",
            "hardwareName": "hw-1",
        }))
        .unwrap();
        assert_eq!(spec.provider_id.as_deref(), Some("tinkerbell://hw-1"));
        assert_eq!(spec.hardware_name, "hw-1");
        assert!(spec.template_override.is_none());
    }

    #[test]
    fn test_empty_hardware_name_is_unplaced() {
        let machine = TinkerbellMachine::new("m1", TinkerbellMachineSpec::default());
        assert!(machine.hardware_name().is_none());
        assert!(!machine.deletion_requested());
        assert!(!machine.has_machine_finalizer());
    }
}
