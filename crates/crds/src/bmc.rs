//! BMC CRD
//!
//! Remote power and boot control endpoint, driven by the PBNJ shim. The
//! machine controller only writes the desired `bootDevice` and `powerAction`;
//! the shim performs the action and reports back into `status`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "pbnj.tinkerbell.org",
    version = "v1alpha1",
    kind = "BMC",
    plural = "bmc",
    status = "BMCStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct BMCSpec {
    /// Host IP address of the BMC
    #[serde(default)]
    pub host: String,

    /// Secret holding `username` and `password` for the BMC
    #[serde(default)]
    pub auth_secret_ref: SecretRef,

    /// Vendor name of the BMC
    #[serde(default)]
    pub vendor: String,

    /// Power action for PBNJ to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_action: Option<PowerAction>,

    /// Boot device to set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_device: Option<BootDevice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BMCStatus {
    /// Last observed power state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<String>,

    /// Last observed boot device state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_state: Option<String>,
}

/// Machine power actions understood by PBNJ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum PowerAction {
    #[serde(rename = "POWER_ACTION_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "POWER_ACTION_ON")]
    On,
    #[serde(rename = "POWER_ACTION_OFF")]
    Off,
    #[serde(rename = "POWER_ACTION_HARDOFF")]
    HardOff,
    #[serde(rename = "POWER_ACTION_CYCLE")]
    Cycle,
    #[serde(rename = "POWER_ACTION_RESET")]
    Reset,
    #[serde(rename = "POWER_ACTION_STATUS")]
    Status,
}

/// Boot devices understood by PBNJ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum BootDevice {
    #[serde(rename = "BOOT_DEVICE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "BOOT_DEVICE_NONE")]
    NoOverride,
    #[serde(rename = "BOOT_DEVICE_BIOS")]
    Bios,
    #[serde(rename = "BOOT_DEVICE_DISK")]
    Disk,
    #[serde(rename = "BOOT_DEVICE_CDROM")]
    Cdrom,
    #[serde(rename = "BOOT_DEVICE_SAFE")]
    Safe,
    #[serde(rename = "BOOT_DEVICE_PXE")]
    Pxe,
}

impl BMC {
    /// Requests a network boot and a hard power off.
    ///
    /// Returns true if either desired field changed.
    pub fn request_deprovision(&mut self) -> bool {
        let changed = self.spec.boot_device != Some(BootDevice::Pxe)
            || self.spec.power_action != Some(PowerAction::HardOff);
        self.spec.boot_device = Some(BootDevice::Pxe);
        self.spec.power_action = Some(PowerAction::HardOff);
        changed
    }
}
