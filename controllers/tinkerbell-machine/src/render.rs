//! Tinkerbell template rendering.
//!
//! Produces the body of the `Template` record for a machine. A non-empty
//! `spec.templateOverride` is used verbatim. Otherwise a template is generated
//! that streams the OS image for the machine's Kubernetes version onto the
//! first disk, writes the bootstrap payload as cloud-init user data and kexecs
//! into the new system.

use std::collections::BTreeMap;

use crds::{TinkerbellCluster, TinkerbellMachine};
use kube::ResourceExt;
use serde::Serialize;

use crate::error::ControllerError;

const TEMPLATE_VERSION: &str = "0.1";
const GLOBAL_TIMEOUT_SECS: u32 = 6000;
const WORKER: &str = "{{.device_1}}";
const DEST_DISK: &str = "/dev/sda";
const ROOT_PARTITION: &str = "/dev/sda1";
const IMAGE2DISK_ACTION: &str = "quay.io/tinkerbell-actions/image2disk:v1.0.0";
const WRITEFILE_ACTION: &str = "quay.io/tinkerbell-actions/writefile:v1.0.0";
const KEXEC_ACTION: &str = "quay.io/tinkerbell-actions/kexec:v1.0.0";
const USER_DATA_PATH: &str = "/var/lib/cloud/seed/nocloud/user-data";
const OS_IMAGE_PREFIX: &str = "ubuntu-2004-kube";

#[derive(Debug, Serialize)]
struct Workflow {
    version: &'static str,
    name: String,
    global_timeout: u32,
    tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
struct Task {
    name: String,
    worker: &'static str,
    volumes: Vec<&'static str>,
    actions: Vec<Action>,
}

#[derive(Debug, Serialize)]
struct Action {
    name: &'static str,
    image: &'static str,
    timeout: u32,
    environment: BTreeMap<&'static str, String>,
}

/// Rendering inputs.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub machine: &'a TinkerbellMachine,
    pub cluster: &'a TinkerbellCluster,
    /// Kubernetes version of the owning Machine
    pub version: &'a str,
    /// Cloud-init user data
    pub bootstrap_data: &'a str,
}

/// URL of the OS image for `version` under `base_url`.
pub fn image_url(base_url: &str, version: &str) -> String {
    format!(
        "{}/{OS_IMAGE_PREFIX}-{version}.gz",
        base_url.trim_end_matches('/')
    )
}

/// Renders the Template body for `input.machine`.
pub fn render_template(input: RenderInput<'_>) -> Result<String, ControllerError> {
    if let Some(raw) = input
        .machine
        .spec
        .template_override
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
    {
        return Ok(raw.to_string());
    }

    let name = input.machine.name_any();
    let image = image_url(input.cluster.image_lookup_base_url(), input.version);

    let workflow = Workflow {
        version: TEMPLATE_VERSION,
        name: name.clone(),
        global_timeout: GLOBAL_TIMEOUT_SECS,
        tasks: vec![Task {
            name,
            worker: WORKER,
            volumes: vec![
                "/dev:/dev",
                "/dev/console:/dev/console",
                "/lib/firmware:/lib/firmware:ro",
            ],
            actions: vec![
                Action {
                    name: "stream-image",
                    image: IMAGE2DISK_ACTION,
                    timeout: 600,
                    environment: BTreeMap::from([
                        ("DEST_DISK", DEST_DISK.to_string()),
                        ("IMG_URL", image),
                        ("COMPRESSED", "true".to_string()),
                    ]),
                },
                Action {
                    name: "write-cloud-init",
                    image: WRITEFILE_ACTION,
                    timeout: 90,
                    environment: BTreeMap::from([
                        ("DEST_DISK", ROOT_PARTITION.to_string()),
                        ("FS_TYPE", "ext4".to_string()),
                        ("DEST_PATH", USER_DATA_PATH.to_string()),
                        ("CONTENTS", input.bootstrap_data.to_string()),
                        ("UID", "0".to_string()),
                        ("GID", "0".to_string()),
                        ("MODE", "0600".to_string()),
                        ("DIRMODE", "0700".to_string()),
                    ]),
                },
                Action {
                    name: "kexec",
                    image: KEXEC_ACTION,
                    timeout: 90,
                    environment: BTreeMap::from([
                        ("BLOCK_DEVICE", ROOT_PARTITION.to_string()),
                        ("FS_TYPE", "ext4".to_string()),
                    ]),
                },
            ],
        }],
    };

    serde_yaml::to_string(&workflow).map_err(|e| ControllerError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{TinkerbellClusterSpec, TinkerbellMachineSpec};

    fn machine(template_override: Option<&str>) -> TinkerbellMachine {
        let mut machine = TinkerbellMachine::new(
            "n1",
            TinkerbellMachineSpec {
                hardware_name: "h1".to_string(),
                template_override: template_override.map(str::to_string),
                ..Default::default()
            },
        );
        machine.metadata.namespace = Some("default".to_string());
        machine
    }

    fn cluster(base_url: Option<&str>) -> TinkerbellCluster {
        TinkerbellCluster::new(
            "c1",
            TinkerbellClusterSpec {
                image_lookup_base_url: base_url.map(str::to_string),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_override_used_verbatim() {
        let machine = machine(Some("version: custom\n"));
        let cluster = cluster(None);
        let rendered = render_template(RenderInput {
            machine: &machine,
            cluster: &cluster,
            version: "v1.30.1",
            bootstrap_data: "#cloud-config",
        })
        .unwrap();
        assert_eq!(rendered, "version: custom\n");
    }

    #[test]
    fn test_generated_template_streams_versioned_image() {
        let machine = machine(None);
        let cluster = cluster(Some("http://images.example/"));
        let rendered = render_template(RenderInput {
            machine: &machine,
            cluster: &cluster,
            version: "v1.30.1",
            bootstrap_data: "#cloud-config\nruncmd: []\n",
        })
        .unwrap();

        let parsed: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed["name"].as_str(), Some("n1"));
        assert_eq!(parsed["tasks"][0]["worker"].as_str(), Some("{{.device_1}}"));
        let actions = &parsed["tasks"][0]["actions"];
        assert_eq!(
            actions[0]["environment"]["IMG_URL"].as_str(),
            Some("http://images.example/ubuntu-2004-kube-v1.30.1.gz")
        );
        assert_eq!(
            actions[1]["environment"]["CONTENTS"].as_str(),
            Some("#cloud-config\nruncmd: []\n")
        );
    }

    #[test]
    fn test_blank_override_falls_back_to_generated() {
        let machine = machine(Some("   "));
        let cluster = cluster(None);
        let rendered = render_template(RenderInput {
            machine: &machine,
            cluster: &cluster,
            version: "v1.29.0",
            bootstrap_data: "data",
        })
        .unwrap();
        assert!(rendered.contains("http://192.168.1.1:8080/ubuntu-2004-kube-v1.29.0.gz"));
    }
}
