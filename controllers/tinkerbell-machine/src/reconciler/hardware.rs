//! Hardware ownership and BMC deprovisioning.
//!
//! The owner labels on a `Hardware` are the only record of which
//! TinkerbellMachine holds it. Claiming writes them together with the machine
//! finalizer; releasing clears both and then asks the BMC for a network boot
//! and a hard power off. Writes are skipped when nothing changed.

use crds::finalizers::{add_finalizer, remove_finalizer};
use crds::{BMC, Hardware, HardwareOwner, MACHINE_FINALIZER};
use kube::ResourceExt;
use store_client::ObjectKey;
use tracing::{debug, info, warn};

use super::scope::MachineScope;
use crate::error::ControllerError;

impl MachineScope<'_> {
    fn is_owner(&self, owner: &HardwareOwner) -> bool {
        owner.name == self.name() && owner.namespace == self.namespace()
    }

    async fn fetch_hardware(&self, name: &str) -> Result<Hardware, ControllerError> {
        let key = ObjectKey::cluster(name);
        self.call(
            format!("getting Hardware {key}"),
            self.stores.hardware.get_opt(&key),
        )
        .await?
        .ok_or_else(|| ControllerError::HardwareNotFound(name.to_string()))
    }

    /// Labels the machine's Hardware as held by this machine.
    ///
    /// Fails with `HardwareClaimed` (without writing) if another machine holds it.
    pub async fn claim_hardware(&self) -> Result<Hardware, ControllerError> {
        let name = self
            .machine
            .hardware_name()
            .ok_or_else(|| ControllerError::HardwareNameMissing(self.key.to_string()))?;
        let mut hardware = self.fetch_hardware(name).await?;

        if let Some(owner) = hardware.owner().filter(|owner| !self.is_owner(owner)) {
            return Err(ControllerError::HardwareClaimed {
                hardware: name.to_string(),
                owner: format!("{}/{}", owner.namespace, owner.name),
            });
        }

        let labelled = hardware.set_owner(self.name(), self.namespace());
        let finalized = add_finalizer(&mut hardware.metadata, MACHINE_FINALIZER);
        if !labelled && !finalized {
            debug!(hardware = name, "Hardware already held by this machine");
            return Ok(hardware);
        }

        info!(hardware = name, "Claiming Hardware");
        self.call(
            format!("updating Hardware {name}"),
            self.stores.hardware.update(&hardware),
        )
        .await
    }

    /// Clears this machine's hold on its Hardware, then deprovisions the BMC.
    pub async fn release_hardware(&self) -> Result<(), ControllerError> {
        let Some(name) = self.machine.hardware_name() else {
            info!("TinkerbellMachine has no hardwareName, nothing to release");
            return Ok(());
        };
        let mut hardware = self.fetch_hardware(name).await?;

        if let Some(owner) = hardware.owner().filter(|owner| !self.is_owner(owner)) {
            warn!(
                hardware = name,
                owner = %format!("{}/{}", owner.namespace, owner.name),
                "Hardware is held by another machine, leaving it untouched"
            );
            return Ok(());
        }

        let unlabelled = hardware.clear_owner();
        let unfinalized = remove_finalizer(&mut hardware.metadata, MACHINE_FINALIZER);
        if unlabelled || unfinalized {
            info!(hardware = name, "Releasing Hardware");
            hardware = self
                .call(
                    format!("patching Hardware {name}"),
                    self.stores.hardware.update(&hardware),
                )
                .await?;
        } else {
            debug!(hardware = name, "Hardware already released");
        }

        self.deprovision_hardware(&hardware).await
    }

    /// Requests network boot and hard power off on the Hardware's BMC.
    ///
    /// Hardware without a BMC reference is skipped.
    pub async fn deprovision_hardware(&self, hardware: &Hardware) -> Result<(), ControllerError> {
        let Some(bmc_name) = hardware.bmc_ref() else {
            info!(hardware = %hardware.name_any(), "Skipping deprovision for hardware without BMC reference");
            return Ok(());
        };

        let key = ObjectKey::cluster(bmc_name);
        let mut bmc: BMC = self
            .call(format!("getting BMC {key}"), self.stores.bmcs.get_opt(&key))
            .await?
            .ok_or_else(|| ControllerError::BmcNotFound(bmc_name.to_string()))?;

        if !bmc.request_deprovision() {
            debug!(bmc = bmc_name, "BMC already set for deprovisioning");
            return Ok(());
        }

        info!(bmc = bmc_name, "Requesting PXE boot and hard power off");
        self.call(
            format!("patching BMC {bmc_name}"),
            self.stores.bmcs.update(&bmc),
        )
        .await
        .map(|_| ())
    }
}
