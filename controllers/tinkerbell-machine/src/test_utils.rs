//! Test utilities for unit testing reconcilers
//!
//! Fixture builders for every kind the reconciler touches, plus a
//! [`TestWorld`] holding one in-memory store per kind. All stores record into
//! a single journal so tests can assert the exact order of writes.

use std::collections::BTreeMap;

use crds::*;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference, Time};
use store_client::{Journal, MockStore, ObjectKey};
use tokio_util::sync::CancellationToken;

use crate::error::ControllerError;
use crate::reconciler::{ReconcileOutcome, Reconciler, Stores};

pub const NAMESPACE: &str = "default";
pub const VERSION: &str = "v1.30.1";
pub const MAC: &str = "00:00:5e:00:53:01";
pub const BOOTSTRAP_DATA: &str = "#cloud-config\nruncmd: []\n";

fn meta(name: &str, namespace: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    }
}

/// Timestamp used for deletion intent in fixtures.
pub fn deletion_time() -> Time {
    serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z")).unwrap()
}

/// Key of a namespaced fixture.
pub fn key(name: &str) -> ObjectKey {
    ObjectKey::namespaced(NAMESPACE, name)
}

/// Key of a cluster-scoped fixture.
pub fn cluster_key(name: &str) -> ObjectKey {
    ObjectKey::cluster(name)
}

/// TinkerbellMachine placed on `hardware`, optionally owned by Machine `owner`.
pub fn tinkerbell_machine(name: &str, hardware: &str, owner: Option<&str>) -> TinkerbellMachine {
    let mut machine = TinkerbellMachine::new(
        name,
        TinkerbellMachineSpec {
            hardware_name: hardware.to_string(),
            ..Default::default()
        },
    );
    machine.metadata.namespace = Some(NAMESPACE.to_string());
    machine.metadata.owner_references = owner.map(|owner| {
        vec![OwnerReference {
            api_version: "cluster.x-k8s.io/v1beta1".to_string(),
            kind: "Machine".to_string(),
            name: owner.to_string(),
            uid: format!("uid-{owner}"),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }]
    });
    machine
}

/// Same as [`tinkerbell_machine`] with the machine finalizer already set.
pub fn finalized_machine(name: &str, hardware: &str, owner: Option<&str>) -> TinkerbellMachine {
    let mut machine = tinkerbell_machine(name, hardware, owner);
    machine.metadata.finalizers = Some(vec![MACHINE_FINALIZER.to_string()]);
    machine
}

/// Finalized machine with deletion intent recorded.
pub fn deleted_machine(name: &str, hardware: &str) -> TinkerbellMachine {
    let mut machine = finalized_machine(name, hardware, Some("m1"));
    machine.metadata.deletion_timestamp = Some(deletion_time());
    machine
}

/// Cluster API Machine in cluster `cluster`.
pub fn capi_machine(
    name: &str,
    secret: Option<&str>,
    version: Option<&str>,
    cluster: Option<&str>,
) -> Machine {
    let mut machine = Machine::new(
        name,
        MachineSpec {
            cluster_name: cluster.unwrap_or_default().to_string(),
            bootstrap: Bootstrap {
                config_ref: None,
                data_secret_name: secret.map(str::to_string),
            },
            version: version.map(str::to_string),
            ..Default::default()
        },
    );
    machine.metadata.namespace = Some(NAMESPACE.to_string());
    if let Some(cluster) = cluster {
        machine.metadata.labels = Some(BTreeMap::from([(
            CLUSTER_NAME_LABEL.to_string(),
            cluster.to_string(),
        )]));
    }
    machine
}

/// Cluster API Cluster pointing at TinkerbellCluster `infrastructure`.
pub fn capi_cluster(name: &str, infrastructure: Option<&str>) -> Cluster {
    let mut cluster = Cluster::new(
        name,
        ClusterSpec {
            paused: false,
            infrastructure_ref: infrastructure.map(|infrastructure| ObjectRef {
                api_version: Some("infrastructure.cluster.x-k8s.io/v1beta1".to_string()),
                kind: Some("TinkerbellCluster".to_string()),
                name: infrastructure.to_string(),
                namespace: Some(NAMESPACE.to_string()),
            }),
        },
    );
    cluster.metadata.namespace = Some(NAMESPACE.to_string());
    cluster
}

pub fn tinkerbell_cluster(name: &str, ready: bool) -> TinkerbellCluster {
    let mut cluster = TinkerbellCluster::new(name, TinkerbellClusterSpec::default());
    cluster.metadata.namespace = Some(NAMESPACE.to_string());
    cluster.status = Some(TinkerbellClusterStatus { ready });
    cluster
}

/// Bootstrap secret; `value` of `None` leaves the `value` key out entirely.
pub fn bootstrap_secret(name: &str, value: Option<&[u8]>) -> Secret {
    Secret {
        metadata: meta(name, Some(NAMESPACE)),
        data: Some(
            value
                .map(|value| (BOOTSTRAP_DATA_KEY.to_string(), ByteString(value.to_vec())))
                .into_iter()
                .collect(),
        ),
        ..Default::default()
    }
}

/// Hardware with one DHCP interface, managed by BMC `bmc` (empty for none).
pub fn hardware(name: &str, bmc: &str) -> Hardware {
    Hardware::new(
        name,
        HardwareSpec {
            id: Some(format!("id-{name}")),
            bmc_ref: bmc.to_string(),
            interfaces: vec![Interface {
                dhcp: Some(Dhcp {
                    mac: MAC.to_string(),
                    ..Default::default()
                }),
            }],
        },
    )
}

/// Hardware held by `owner` in `namespace`, with the machine finalizer set.
pub fn owned_hardware(name: &str, bmc: &str, owner: &str, namespace: &str) -> Hardware {
    let mut hardware = hardware(name, bmc);
    hardware.set_owner(owner, namespace);
    hardware.metadata.finalizers = Some(vec![MACHINE_FINALIZER.to_string()]);
    hardware
}

pub fn bmc(name: &str) -> BMC {
    BMC::new(
        name,
        BMCSpec {
            host: "10.0.0.10".to_string(),
            vendor: "supermicro".to_string(),
            ..Default::default()
        },
    )
}

pub fn template(name: &str) -> Template {
    Template {
        metadata: meta(name, Some(NAMESPACE)),
        spec: TemplateSpec {
            data: Some("version: \"0.1\"\n".to_string()),
        },
    }
}

pub fn workflow(name: &str, hardware: &str, state: Option<WorkflowState>) -> Workflow {
    Workflow {
        metadata: meta(name, Some(NAMESPACE)),
        spec: WorkflowSpec {
            template_ref: name.to_string(),
            hardware_ref: hardware.to_string(),
            hardware_map: BTreeMap::from([("device_1".to_string(), MAC.to_string())]),
        },
        status: state.map(|state| WorkflowStatus { state: Some(state) }),
    }
}

/// One in-memory store per kind, all journaling into the same [`Journal`].
#[derive(Debug)]
pub struct TestWorld {
    pub journal: Journal,
    pub machines: MockStore<TinkerbellMachine>,
    pub capi_machines: MockStore<Machine>,
    pub capi_clusters: MockStore<Cluster>,
    pub tinkerbell_clusters: MockStore<TinkerbellCluster>,
    pub secrets: MockStore<Secret>,
    pub hardware: MockStore<Hardware>,
    pub templates: MockStore<Template>,
    pub workflows: MockStore<Workflow>,
    pub bmcs: MockStore<BMC>,
}

impl TestWorld {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            machines: MockStore::with_journal(journal.clone()),
            capi_machines: MockStore::with_journal(journal.clone()),
            capi_clusters: MockStore::with_journal(journal.clone()),
            tinkerbell_clusters: MockStore::with_journal(journal.clone()),
            secrets: MockStore::with_journal(journal.clone()),
            hardware: MockStore::with_journal(journal.clone()),
            templates: MockStore::with_journal(journal.clone()),
            workflows: MockStore::with_journal(journal.clone()),
            bmcs: MockStore::with_journal(journal.clone()),
            journal,
        }
    }

    /// Reconciler over clones of this world's stores.
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(Stores {
            machines: Box::new(self.machines.clone()),
            capi_machines: Box::new(self.capi_machines.clone()),
            capi_clusters: Box::new(self.capi_clusters.clone()),
            tinkerbell_clusters: Box::new(self.tinkerbell_clusters.clone()),
            secrets: Box::new(self.secrets.clone()),
            hardware: Box::new(self.hardware.clone()),
            templates: Box::new(self.templates.clone()),
            workflows: Box::new(self.workflows.clone()),
            bmcs: Box::new(self.bmcs.clone()),
        })
    }

    /// Reconciles TinkerbellMachine `name` once.
    pub async fn reconcile(&self, name: &str) -> Result<ReconcileOutcome, ControllerError> {
        self.reconciler()
            .reconcile_machine(&key(name), &CancellationToken::new())
            .await
    }

    /// Seeds the upstream graph of a provisionable machine: Machine `m1` with
    /// secret `b1` and a version, Cluster `c1` backed by ready TinkerbellCluster
    /// `tc1`.
    pub fn seed_upstream(&self) {
        self.capi_machines
            .insert(capi_machine("m1", Some("b1"), Some(VERSION), Some("c1")));
        self.secrets
            .insert(bootstrap_secret("b1", Some(BOOTSTRAP_DATA.as_bytes())));
        self.capi_clusters.insert(capi_cluster("c1", Some("tc1")));
        self.tinkerbell_clusters.insert(tinkerbell_cluster("tc1", true));
    }

    /// Seeds machine `n1` on free Hardware `h1` with BMC `p1`, ready to provision.
    pub fn seed_ready(&self) {
        self.seed_upstream();
        self.machines.insert(tinkerbell_machine("n1", "h1", Some("m1")));
        self.hardware.insert(hardware("h1", "p1"));
        self.bmcs.insert(bmc("p1"));
    }

    /// Seeds machine `n1` as provisioning leaves it, with deletion intent set.
    pub fn seed_deleting(&self) {
        self.seed_upstream();
        self.machines.insert(deleted_machine("n1", "h1"));
        self.hardware.insert(owned_hardware("h1", "p1", "n1", NAMESPACE));
        self.bmcs.insert(bmc("p1"));
        self.templates.insert(template("n1"));
        self.workflows.insert(workflow("n1", "h1", Some(WorkflowState::Success)));
    }
}
