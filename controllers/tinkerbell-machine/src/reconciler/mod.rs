//! Reconciliation logic for TinkerbellMachine.
//!
//! One call to [`Reconciler::reconcile_machine`] fetches the machine, decides
//! its [`LifecyclePhase`] and then either provisions it or tears it down:
//! - `readiness`: read-only gate over the owning Machine, bootstrap Secret and cluster
//! - `dependents`: Template and Workflow creation and ordered removal
//! - `hardware`: Hardware claim/release and BMC deprovisioning
//! - `lifecycle`: the provisioning and teardown sequences
//!
//! The reconciler keeps no state between calls; everything lives in the store.

pub mod dependents;
pub mod hardware;
pub mod lifecycle;
pub mod readiness;
pub mod scope;

#[cfg(test)]
mod lifecycle_test;
#[cfg(test)]
mod readiness_test;

use std::fmt;

use crds::{BMC, Cluster, Hardware, Machine, Template, TinkerbellCluster, TinkerbellMachine, Workflow};
use k8s_openapi::api::core::v1::Secret;
use store_client::{ObjectKey, ResourceStore, cancellable};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span};

use crate::error::ControllerError;
use lifecycle::LifecyclePhase;
use scope::MachineScope;

/// Typed stores for every kind the reconciler touches.
pub struct Stores {
    pub machines: Box<dyn ResourceStore<TinkerbellMachine>>,
    pub capi_machines: Box<dyn ResourceStore<Machine>>,
    pub capi_clusters: Box<dyn ResourceStore<Cluster>>,
    pub tinkerbell_clusters: Box<dyn ResourceStore<TinkerbellCluster>>,
    pub secrets: Box<dyn ResourceStore<Secret>>,
    pub hardware: Box<dyn ResourceStore<Hardware>>,
    pub templates: Box<dyn ResourceStore<Template>>,
    pub workflows: Box<dyn ResourceStore<Workflow>>,
    pub bmcs: Box<dyn ResourceStore<BMC>>,
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

/// Result of one reconciliation, used by the watch engine to pick the next run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Upstream data is not there yet; check again later
    NotReady { reason: String },
    /// Dependents exist but provisioning has not finished
    Progressing,
    /// Nothing left to do until something changes
    Complete,
    /// The TinkerbellMachine no longer exists
    Gone,
}

/// Reconciles TinkerbellMachine resources.
#[derive(Debug)]
pub struct Reconciler {
    stores: Stores,
}

impl Reconciler {
    /// Creates a new reconciler over `stores`.
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Reconciles the TinkerbellMachine at `key` once.
    ///
    /// Every store call is abandoned with a cancelled error as soon as
    /// `cancel` fires.
    pub async fn reconcile_machine(
        &self,
        key: &ObjectKey,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let span = info_span!("reconcile", tinkerbell_machine = %key);
        async move {
            let machine = cancellable(cancel, self.stores.machines.get_opt(key))
                .await
                .map_err(ControllerError::store("getting TinkerbellMachine"))?;
            let Some(machine) = machine else {
                debug!("TinkerbellMachine not found");
                return Ok(ReconcileOutcome::Gone);
            };

            let mut scope = MachineScope::new(&self.stores, machine, cancel)?;
            match LifecyclePhase::of(&scope.machine) {
                LifecyclePhase::Active => scope.provision().await,
                LifecyclePhase::DeletionRequested => scope.teardown().await,
            }
        }
        .instrument(span)
        .await
    }
}
