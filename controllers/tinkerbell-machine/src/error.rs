//! Controller-specific error types.
//!
//! Every error a reconciliation can return carries the resource and the
//! operation it failed on. [`ControllerError::class`] sorts them into the
//! categories used for logging and retry decisions.

use kube::Error as KubeError;
use store_client::StoreError;
use thiserror::Error;

/// Errors that can occur in the Tinkerbell Machine Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Owning Machine has no `spec.version`
    #[error("machine version is empty")]
    MachineVersionEmpty,

    /// Bootstrap secret lacks the `value` key
    #[error("retrieving bootstrap data: secret {0} is missing the value key")]
    MissingBootstrapKey(String),

    /// Bootstrap secret `value` is zero-length
    #[error("received bootstrap user data in secret {0} is empty")]
    EmptyBootstrapData(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Machine carries no cluster-name label
    #[error("Machine {0} has no cluster.x-k8s.io/cluster-name label")]
    ClusterNameLabelMissing(String),

    /// TinkerbellMachine has no `spec.hardwareName` to provision onto
    #[error("TinkerbellMachine {0} has no hardwareName")]
    HardwareNameMissing(String),

    /// Hardware referenced by a TinkerbellMachine does not exist
    #[error("Hardware {0} not found")]
    HardwareNotFound(String),

    /// BMC referenced by a Hardware does not exist
    #[error("BMC {0} not found")]
    BmcNotFound(String),

    /// Hardware is labelled for another TinkerbellMachine
    #[error("Hardware {hardware} is already held by {owner}")]
    HardwareClaimed { hardware: String, owner: String },

    /// Store call failed
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },

    /// A teardown step failed
    #[error("{step}: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<ControllerError>,
    },

    /// Template rendering failed
    #[error("rendering template: {0}")]
    Render(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),
}

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Missing or invalid required field on an intent record
    Configuration,
    /// Bootstrap payload missing or empty
    Data,
    /// Store call failed
    Dependency,
    /// A referenced record that must exist does not
    Consistency,
    /// Reconciliation abandoned on shutdown
    Cancelled,
}

impl ControllerError {
    /// Returns a mapper wrapping a [`StoreError`] with `context`.
    pub fn store(context: impl Into<String>) -> impl FnOnce(StoreError) -> Self {
        let context = context.into();
        move |source| ControllerError::Store { context, source }
    }

    /// Wraps `source` with the identity of the teardown step that failed.
    pub fn step(step: &'static str, source: ControllerError) -> Self {
        ControllerError::Step {
            step,
            source: Box::new(source),
        }
    }

    /// Category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            ControllerError::MachineVersionEmpty
            | ControllerError::InvalidConfig(_)
            | ControllerError::ClusterNameLabelMissing(_)
            | ControllerError::HardwareNameMissing(_) => ErrorClass::Configuration,
            ControllerError::MissingBootstrapKey(_)
            | ControllerError::EmptyBootstrapData(_)
            | ControllerError::Render(_) => ErrorClass::Data,
            ControllerError::HardwareNotFound(_)
            | ControllerError::BmcNotFound(_)
            | ControllerError::HardwareClaimed { .. } => ErrorClass::Consistency,
            ControllerError::Store { source, .. } if source.is_cancelled() => ErrorClass::Cancelled,
            ControllerError::Step { source, .. } => source.class(),
            ControllerError::Store { .. } | ControllerError::Watch(_) | ControllerError::Kube(_) => {
                ErrorClass::Dependency
            }
        }
    }

    /// True if a conditional write lost against a newer resource version.
    pub fn is_conflict(&self) -> bool {
        match self {
            ControllerError::Store { source, .. } => source.is_conflict(),
            ControllerError::Step { source, .. } => source.is_conflict(),
            _ => false,
        }
    }
}
