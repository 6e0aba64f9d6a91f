//! Machine lifecycle.
//!
//! The phase is derived from the machine on every call, never stored:
//! no deletion timestamp means `Active`, a deletion timestamp means
//! `DeletionRequested`. Removing the machine finalizer is always the last
//! write of a teardown.

use crds::finalizers::{add_finalizer, remove_finalizer};
use crds::{MACHINE_FINALIZER, TinkerbellMachine, WorkflowState};
use tracing::{debug, info, warn};

use super::ReconcileOutcome;
use super::readiness::Readiness;
use super::scope::MachineScope;
use crate::error::ControllerError;
use crate::render::{RenderInput, render_template};

/// Lifecycle phase of a TinkerbellMachine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Not being deleted; provisioning applies
    Active,
    /// Deletion intent recorded; teardown applies
    DeletionRequested,
}

impl LifecyclePhase {
    /// Phase of `machine` as currently observed.
    pub fn of(machine: &TinkerbellMachine) -> Self {
        if machine.deletion_requested() {
            LifecyclePhase::DeletionRequested
        } else {
            LifecyclePhase::Active
        }
    }
}

impl MachineScope<'_> {
    /// Provisioning path: gate on readiness, then claim hardware and ensure dependents.
    pub async fn provision(&mut self) -> Result<ReconcileOutcome, ControllerError> {
        let intent = match self.assess_readiness().await? {
            Readiness::NotReady(reason) => return Ok(ReconcileOutcome::NotReady { reason }),
            Readiness::Ready(intent) => intent,
        };

        self.ensure_finalizer().await?;
        let hardware = self.claim_hardware().await?;

        let version = intent
            .machine
            .version()
            .ok_or(ControllerError::MachineVersionEmpty)?;
        let template_data = render_template(RenderInput {
            machine: &self.machine,
            cluster: &intent.cluster,
            version,
            bootstrap_data: &intent.bootstrap_data,
        })?;

        match self.ensure_dependents(&hardware, template_data).await? {
            Some(WorkflowState::Success) => {
                debug!("Workflow succeeded");
                Ok(ReconcileOutcome::Complete)
            }
            Some(state @ (WorkflowState::Failed | WorkflowState::Timeout)) => {
                warn!(?state, "Workflow did not succeed");
                Ok(ReconcileOutcome::Complete)
            }
            _ => Ok(ReconcileOutcome::Progressing),
        }
    }

    async fn ensure_finalizer(&mut self) -> Result<(), ControllerError> {
        if !add_finalizer(&mut self.machine.metadata, MACHINE_FINALIZER) {
            return Ok(());
        }
        info!("Adding finalizer to TinkerbellMachine");
        self.machine = self
            .call(
                format!("adding finalizer to TinkerbellMachine {}", self.key),
                self.stores.machines.update(&self.machine),
            )
            .await?;
        Ok(())
    }

    /// Teardown path: remove dependents in order, then drop the machine finalizer.
    pub async fn teardown(&mut self) -> Result<ReconcileOutcome, ControllerError> {
        if !self.machine.has_machine_finalizer() {
            debug!("TinkerbellMachine has no finalizer, nothing to tear down");
            return Ok(ReconcileOutcome::Complete);
        }

        self.remove_dependents().await?;

        remove_finalizer(&mut self.machine.metadata, MACHINE_FINALIZER);
        info!("Patching TinkerbellMachine to remove finalizer");
        self.call(
            format!("removing finalizer from TinkerbellMachine {}", self.key),
            self.stores.machines.update(&self.machine),
        )
        .await?;
        Ok(ReconcileOutcome::Complete)
    }
}
