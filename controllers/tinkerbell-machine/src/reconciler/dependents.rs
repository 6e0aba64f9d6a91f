//! Template and Workflow dependents.
//!
//! Both records share the TinkerbellMachine's name and namespace. Creation is
//! first-writer-wins: an existing record is left as it is. Removal runs in a
//! fixed order (Template, Workflow, then the Hardware release) and stops at
//! the first failing step.

use std::collections::BTreeMap;

use crds::{Hardware, Template, TemplateSpec, Workflow, WorkflowSpec, WorkflowState};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use tracing::{debug, info};

use super::scope::MachineScope;
use crate::error::ControllerError;

/// Template variable the generated template runs its task on.
const PRIMARY_DEVICE: &str = "device_1";

impl MachineScope<'_> {
    fn dependent_metadata(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name().to_string()),
            namespace: Some(self.namespace().to_string()),
            ..Default::default()
        }
    }

    /// Ensures the Template and Workflow exist.
    ///
    /// Returns the state reported on an already existing Workflow; `None` when
    /// it was just created or has not been picked up yet.
    pub async fn ensure_dependents(
        &self,
        hardware: &Hardware,
        template_data: String,
    ) -> Result<Option<WorkflowState>, ControllerError> {
        self.ensure_template(template_data).await?;
        self.ensure_workflow(hardware).await
    }

    async fn ensure_template(&self, data: String) -> Result<(), ControllerError> {
        if self
            .call(
                format!("checking if Template {} exists", self.key),
                self.stores.templates.get_opt(&self.key),
            )
            .await?
            .is_some()
        {
            debug!("Template already exists");
            return Ok(());
        }

        let template = Template {
            metadata: self.dependent_metadata(),
            spec: TemplateSpec { data: Some(data) },
        };
        info!("Creating Template");
        match self
            .call(
                format!("creating Template {}", self.key),
                self.stores.templates.create(&template),
            )
            .await
        {
            Err(ControllerError::Store { source, .. }) if source.is_already_exists() => {
                debug!("Template created concurrently");
                Ok(())
            }
            result => result.map(|_| ()),
        }
    }

    async fn ensure_workflow(&self, hardware: &Hardware) -> Result<Option<WorkflowState>, ControllerError> {
        if let Some(existing) = self
            .call(
                format!("checking if Workflow {} exists", self.key),
                self.stores.workflows.get_opt(&self.key),
            )
            .await?
        {
            debug!(state = ?existing.state(), "Workflow already exists");
            return Ok(existing.state());
        }

        let hardware_map: BTreeMap<String, String> = hardware
            .primary_mac()
            .map(|mac| (PRIMARY_DEVICE.to_string(), mac.to_string()))
            .into_iter()
            .collect();
        let workflow = Workflow {
            metadata: self.dependent_metadata(),
            spec: WorkflowSpec {
                template_ref: self.name().to_string(),
                hardware_ref: hardware.name_any(),
                hardware_map,
            },
            status: None,
        };
        info!(hardware = %hardware.name_any(), "Creating Workflow");
        match self
            .call(
                format!("creating Workflow {}", self.key),
                self.stores.workflows.create(&workflow),
            )
            .await
        {
            Err(ControllerError::Store { source, .. }) if source.is_already_exists() => {
                debug!("Workflow created concurrently");
                Ok(None)
            }
            result => result.map(|_| None),
        }
    }

    /// Removes the Template and Workflow, then releases the Hardware.
    ///
    /// Each failure is wrapped with the step it happened in.
    pub async fn remove_dependents(&self) -> Result<(), ControllerError> {
        info!(hardware = self.machine.hardware_name().unwrap_or_default(), "Removing machine");

        self.remove_template()
            .await
            .map_err(|e| ControllerError::step("removing Template", e))?;
        self.remove_workflow()
            .await
            .map_err(|e| ControllerError::step("removing Workflow", e))?;
        self.release_hardware()
            .await
            .map_err(|e| ControllerError::step("releasing Hardware", e))
    }

    async fn remove_template(&self) -> Result<(), ControllerError> {
        if self
            .call(
                format!("checking if Template {} exists", self.key),
                self.stores.templates.get_opt(&self.key),
            )
            .await?
            .is_none()
        {
            info!("Template already removed");
            return Ok(());
        }

        info!("Removing Template");
        self.delete_ignoring_absent(
            format!("ensuring Template {} has been removed", self.key),
            self.stores.templates.delete(&self.key),
        )
        .await
    }

    async fn remove_workflow(&self) -> Result<(), ControllerError> {
        if self
            .call(
                format!("checking if Workflow {} exists", self.key),
                self.stores.workflows.get_opt(&self.key),
            )
            .await?
            .is_none()
        {
            info!("Workflow already removed");
            return Ok(());
        }

        info!("Removing Workflow");
        self.delete_ignoring_absent(
            format!("ensuring Workflow {} has been removed", self.key),
            self.stores.workflows.delete(&self.key),
        )
        .await
    }

    async fn delete_ignoring_absent<F>(&self, context: String, delete: F) -> Result<(), ControllerError>
    where
        F: std::future::Future<Output = Result<(), store_client::StoreError>>,
    {
        match self.call(context, delete).await {
            Err(ControllerError::Store { source, .. }) if source.is_not_found() => {
                debug!("Removed concurrently");
                Ok(())
            }
            result => result,
        }
    }
}
