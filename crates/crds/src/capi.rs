//! Cluster API intent types
//!
//! Only the fields the machine controller reads are modelled; everything else
//! on the upstream objects is ignored on deserialization. These CRDs are
//! installed by Cluster API itself, so `crdgen` does not emit them.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::references::ObjectRef;

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "cluster.x-k8s.io",
    version = "v1beta1",
    kind = "Machine",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// Name of the owning Cluster
    #[serde(default)]
    pub cluster_name: String,

    /// Bootstrap configuration for the node
    #[serde(default)]
    pub bootstrap: Bootstrap,

    /// Infrastructure record backing this machine (a `TinkerbellMachine`)
    #[serde(default)]
    pub infrastructure_ref: ObjectRef,

    /// Kubernetes version to install. Optional upstream, required here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    /// Bootstrap provider config this machine is waiting on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<ObjectRef>,

    /// Secret holding the rendered bootstrap data, set by the bootstrap provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_secret_name: Option<String>,
}

impl Machine {
    /// Desired version, treating an empty string as unset.
    pub fn version(&self) -> Option<&str> {
        self.spec.version.as_deref().filter(|v| !v.is_empty())
    }

    /// Name of the bootstrap data secret, if the bootstrap provider has produced one.
    pub fn bootstrap_data_secret_name(&self) -> Option<&str> {
        self.spec.bootstrap.data_secret_name.as_deref()
    }
}

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "cluster.x-k8s.io",
    version = "v1beta1",
    kind = "Cluster",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Pauses reconciliation of the cluster and its machines
    #[serde(default)]
    pub paused: bool,

    /// Infrastructure record backing this cluster (a `TinkerbellCluster`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_ref: Option<ObjectRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_ignores_unknown_upstream_fields() {
        let spec: MachineSpec = serde_json::from_value(serde_json::json!({
            "clusterName": "c1",
            "bootstrap": { "dataSecretName": "c1-bootstrap" },
            "infrastructureRef": {
                "apiVersion": "infrastructure.cluster.x-k8s.io/v1beta1",
                "kind": "TinkerbellMachine",
                "name": "m1"
            },
            "version": "v1.30.2",
            "failureDomain": "rack-a",
            "nodeDrainTimeout": "10m"
        }))
        .unwrap();
        assert_eq!(spec.cluster_name, "c1");
        assert_eq!(spec.bootstrap.data_secret_name.as_deref(), Some("c1-bootstrap"));
        assert_eq!(spec.infrastructure_ref.name, "m1");
    }

    #[test]
    fn test_empty_version_reads_as_unset() {
        let machine = Machine::new(
            "m1",
            MachineSpec {
                version: Some(String::new()),
                ..Default::default()
            },
        );
        assert!(machine.version().is_none());
    }
}
