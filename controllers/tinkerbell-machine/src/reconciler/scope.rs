//! Per-invocation reconciliation scope.

use std::future::Future;

use crds::TinkerbellMachine;
use kube::ResourceExt;
use store_client::{ObjectKey, StoreError, cancellable};
use tokio_util::sync::CancellationToken;

use super::Stores;
use crate::error::ControllerError;

/// Everything one reconciliation of one TinkerbellMachine works with.
///
/// Lives for a single call of `reconcile_machine`; nothing is carried over
/// between calls.
pub struct MachineScope<'a> {
    pub(crate) stores: &'a Stores,
    pub(crate) machine: TinkerbellMachine,
    pub(crate) key: ObjectKey,
    namespace: String,
    cancel: &'a CancellationToken,
}

impl<'a> MachineScope<'a> {
    /// Builds the scope for a freshly fetched `machine`.
    pub fn new(
        stores: &'a Stores,
        machine: TinkerbellMachine,
        cancel: &'a CancellationToken,
    ) -> Result<Self, ControllerError> {
        let key = ObjectKey::of(&machine);
        let namespace = machine.namespace().ok_or_else(|| {
            ControllerError::InvalidConfig(format!("TinkerbellMachine {key} has no namespace"))
        })?;
        Ok(Self {
            stores,
            machine,
            key,
            namespace,
            cancel,
        })
    }

    /// Namespace of the TinkerbellMachine.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the TinkerbellMachine.
    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Key of a namespaced object in the machine's namespace.
    pub fn local_key(&self, name: &str) -> ObjectKey {
        ObjectKey::namespaced(self.namespace.clone(), name)
    }

    /// Runs a store call under this invocation's cancellation token, wrapping
    /// failures with `context`.
    pub async fn call<T, F>(&self, context: impl Into<String>, call: F) -> Result<T, ControllerError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        cancellable(self.cancel, call)
            .await
            .map_err(ControllerError::store(context))
    }
}
