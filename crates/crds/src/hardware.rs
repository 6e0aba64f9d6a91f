//! Hardware CRD
//!
//! A physical machine known to Tinkerbell. Cluster scoped; a
//! `TinkerbellMachine` claims one by writing the owner labels.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{HARDWARE_OWNER_NAME_LABEL, HARDWARE_OWNER_NAMESPACE_LABEL};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "tinkerbell.org",
    version = "v1alpha1",
    kind = "Hardware",
    plural = "hardware"
)]
#[serde(rename_all = "camelCase")]
pub struct HardwareSpec {
    /// Tinkerbell hardware ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Name of the `BMC` managing this hardware; empty when it has none
    #[serde(default)]
    pub bmc_ref: String,

    /// Network interfaces, first one is used for provisioning
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    /// DHCP settings served for this interface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<Dhcp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dhcp {
    /// MAC address of the interface
    #[serde(default)]
    pub mac: String,

    /// Hostname handed out over DHCP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Address handed out over DHCP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IpSpec {
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

/// Namespaced name of the machine recorded in a hardware's owner labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareOwner {
    pub name: String,
    pub namespace: String,
}

impl Hardware {
    /// Power endpoint reference, or `None` if this hardware has no manageable BMC.
    pub fn bmc_ref(&self) -> Option<&str> {
        Some(self.spec.bmc_ref.as_str()).filter(|name| !name.is_empty())
    }

    /// MAC address of the first interface with DHCP settings.
    pub fn primary_mac(&self) -> Option<&str> {
        self.spec
            .interfaces
            .iter()
            .filter_map(|iface| iface.dhcp.as_ref())
            .map(|dhcp| dhcp.mac.as_str())
            .find(|mac| !mac.is_empty())
    }

    /// Machine currently holding this hardware, read from the owner labels.
    pub fn owner(&self) -> Option<HardwareOwner> {
        let labels = self.metadata.labels.as_ref()?;
        let name = labels.get(HARDWARE_OWNER_NAME_LABEL)?;
        let namespace = labels
            .get(HARDWARE_OWNER_NAMESPACE_LABEL)
            .cloned()
            .unwrap_or_default();
        Some(HardwareOwner {
            name: name.clone(),
            namespace,
        })
    }

    /// Writes owner labels for `name`/`namespace`. Returns true if they changed.
    pub fn set_owner(&mut self, name: &str, namespace: &str) -> bool {
        let labels = self.metadata.labels.get_or_insert_with(Default::default);
        let mut changed = false;
        for (key, value) in [
            (HARDWARE_OWNER_NAME_LABEL, name),
            (HARDWARE_OWNER_NAMESPACE_LABEL, namespace),
        ] {
            if labels.get(key).map(String::as_str) != Some(value) {
                labels.insert(key.to_string(), value.to_string());
                changed = true;
            }
        }
        changed
    }

    /// Drops both owner labels. Returns true if either was present.
    pub fn clear_owner(&mut self) -> bool {
        let Some(labels) = self.metadata.labels.as_mut() else {
            return false;
        };
        let removed_name = labels.remove(HARDWARE_OWNER_NAME_LABEL).is_some();
        let removed_namespace = labels.remove(HARDWARE_OWNER_NAMESPACE_LABEL).is_some();
        removed_name || removed_namespace
    }
}
