//! Readiness gate.
//!
//! Decides whether a TinkerbellMachine has enough upstream intent to be
//! provisioned: an owning Cluster API Machine with bootstrap data and a
//! version, a readable bootstrap payload, and a ready TinkerbellCluster.
//! Missing upstream data is a wait condition, not an error. The gate only
//! reads from the store.

use crds::{
    BOOTSTRAP_DATA_KEY, CLUSTER_API_GROUP, CLUSTER_NAME_LABEL, Machine, TinkerbellCluster,
    api_version_group,
};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use store_client::ObjectKey;
use tracing::{debug, info};

use super::scope::MachineScope;
use crate::error::ControllerError;

/// Wait reason: no owning Machine recorded yet.
pub const OWNER_NOT_SET: &str = "owner not yet set";
/// Wait reason: Machine has no bootstrap data secret yet.
pub const BOOTSTRAP_DATA_PENDING: &str = "bootstrap data not available yet";
/// Wait reason: TinkerbellCluster not ready.
pub const CLUSTER_NOT_READY: &str = "cluster not ready yet";

/// Upstream intent resolved by a passing gate.
#[derive(Debug, Clone)]
pub struct ReadyIntent {
    pub machine: Machine,
    pub cluster: TinkerbellCluster,
    pub bootstrap_data: String,
}

/// Gate verdict.
#[derive(Debug, Clone)]
pub enum Readiness {
    /// Not enough upstream data yet
    NotReady(String),
    /// Ready to provision
    Ready(Box<ReadyIntent>),
}

/// Name of the Cluster API Machine listed as owner of `meta`, if any.
pub fn owner_machine_name(meta: &ObjectMeta) -> Option<&str> {
    meta.owner_references
        .iter()
        .flatten()
        .find(|owner| owner.kind == "Machine" && api_version_group(&owner.api_version) == CLUSTER_API_GROUP)
        .map(|owner| owner.name.as_str())
}

/// Checks the owning Machine's own fields.
///
/// Returns a wait reason when the Machine has no bootstrap data reference yet.
/// An empty version is an error rather than a wait.
pub fn machine_readiness(machine: &Machine) -> Result<Option<&'static str>, ControllerError> {
    if machine.bootstrap_data_secret_name().is_none() {
        return Ok(Some(BOOTSTRAP_DATA_PENDING));
    }
    if machine.version().is_none() {
        return Err(ControllerError::MachineVersionEmpty);
    }
    Ok(None)
}

/// Extracts the bootstrap payload from the `value` key of `secret`.
pub fn bootstrap_data(secret: &Secret) -> Result<String, ControllerError> {
    let name = secret.name_any();
    let value = secret
        .data
        .as_ref()
        .and_then(|data| data.get(BOOTSTRAP_DATA_KEY))
        .ok_or_else(|| ControllerError::MissingBootstrapKey(name.clone()))?;
    if value.0.is_empty() {
        return Err(ControllerError::EmptyBootstrapData(name));
    }
    Ok(String::from_utf8_lossy(&value.0).into_owned())
}

impl MachineScope<'_> {
    /// Runs the readiness gate for this machine.
    pub async fn assess_readiness(&self) -> Result<Readiness, ControllerError> {
        let Some(machine) = self.owner_machine().await? else {
            info!(reason = OWNER_NOT_SET, "Machine is not ready yet");
            return Ok(Readiness::NotReady(OWNER_NOT_SET.to_string()));
        };
        if let Some(reason) = machine_readiness(&machine)? {
            info!(reason, "Machine is not ready yet");
            return Ok(Readiness::NotReady(reason.to_string()));
        }

        let bootstrap_data = self.bootstrap_payload(&machine).await?;

        let Some(cluster) = self.ready_tinkerbell_cluster(&machine).await? else {
            info!("TinkerbellCluster is not ready yet");
            return Ok(Readiness::NotReady(CLUSTER_NOT_READY.to_string()));
        };

        Ok(Readiness::Ready(Box::new(ReadyIntent {
            machine,
            cluster,
            bootstrap_data,
        })))
    }

    async fn owner_machine(&self) -> Result<Option<Machine>, ControllerError> {
        let Some(name) = owner_machine_name(&self.machine.metadata) else {
            debug!("TinkerbellMachine has no Machine owner reference");
            return Ok(None);
        };
        let key = self.local_key(name);
        self.call(
            format!("getting owner Machine {key}"),
            self.stores.capi_machines.get(&key),
        )
        .await
        .map(Some)
    }

    async fn bootstrap_payload(&self, machine: &Machine) -> Result<String, ControllerError> {
        let secret_name = machine
            .bootstrap_data_secret_name()
            .ok_or_else(|| ControllerError::InvalidConfig("Machine has no bootstrap data secret".to_string()))?;
        let namespace = machine.namespace().unwrap_or_else(|| self.namespace().to_string());
        let key = ObjectKey::namespaced(namespace, secret_name);
        let secret = self
            .call(
                format!("retrieving bootstrap data secret {key}"),
                self.stores.secrets.get(&key),
            )
            .await?;
        bootstrap_data(&secret)
    }

    async fn ready_tinkerbell_cluster(
        &self,
        machine: &Machine,
    ) -> Result<Option<TinkerbellCluster>, ControllerError> {
        let cluster_name = machine
            .labels()
            .get(CLUSTER_NAME_LABEL)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ControllerError::ClusterNameLabelMissing(machine.name_any()))?;
        let namespace = machine.namespace().unwrap_or_else(|| self.namespace().to_string());
        let cluster_key = ObjectKey::namespaced(namespace, cluster_name.as_str());
        let cluster = self
            .call(
                format!("getting Cluster {cluster_key}"),
                self.stores.capi_clusters.get(&cluster_key),
            )
            .await?;

        let Some(infrastructure_ref) = cluster.spec.infrastructure_ref.as_ref() else {
            debug!(cluster = %cluster_key, "Cluster has no infrastructureRef yet");
            return Ok(None);
        };

        let key = self.local_key(&infrastructure_ref.name);
        let tinkerbell_cluster = self
            .call(
                format!("getting TinkerbellCluster {key}"),
                self.stores.tinkerbell_clusters.get(&key),
            )
            .await?;
        Ok(Some(tinkerbell_cluster).filter(TinkerbellCluster::is_ready))
    }
}
