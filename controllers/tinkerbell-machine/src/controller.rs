//! Main controller implementation.
//!
//! Builds the typed stores over a Kubernetes client, starts the
//! TinkerbellMachine watcher and waits for it or for a shutdown signal.

use std::sync::Arc;

use kube::Client;
use store_client::KubeStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::{Reconciler, Stores};
use crate::watcher::{WatchContext, watch_tinkerbell_machines};

/// Main controller for TinkerbellMachine lifecycle management.
pub struct Controller {
    machine_watcher: JoinHandle<Result<(), ControllerError>>,
    shutdown: CancellationToken,
}

/// Stores for every kind the reconciler reads or writes.
pub fn kube_stores(client: &Client) -> Stores {
    Stores {
        machines: Box::new(KubeStore::namespaced(client.clone())),
        capi_machines: Box::new(KubeStore::namespaced(client.clone())),
        capi_clusters: Box::new(KubeStore::namespaced(client.clone())),
        tinkerbell_clusters: Box::new(KubeStore::namespaced(client.clone())),
        secrets: Box::new(KubeStore::namespaced(client.clone())),
        hardware: Box::new(KubeStore::cluster(client.clone())),
        templates: Box::new(KubeStore::namespaced(client.clone())),
        workflows: Box::new(KubeStore::namespaced(client.clone())),
        bmcs: Box::new(KubeStore::cluster(client.clone())),
    }
}

impl Controller {
    /// Connects to the cluster and starts watching.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing Tinkerbell Machine Controller");

        let client = Client::try_default().await?;
        let shutdown = CancellationToken::new();

        let reconciler = Reconciler::new(kube_stores(&client));
        let ctx = Arc::new(WatchContext::new(reconciler, config, shutdown.clone()));

        let machine_watcher = tokio::spawn(watch_tinkerbell_machines(client, ctx));

        Ok(Self {
            machine_watcher,
            shutdown,
        })
    }

    /// Runs the controller until the watcher exits or the process is interrupted.
    ///
    /// On interrupt, in-flight reconciliations are cancelled and the watcher
    /// is awaited before returning.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Tinkerbell Machine Controller running");

        tokio::select! {
            result = &mut self.machine_watcher => {
                return result
                    .map_err(|e| ControllerError::Watch(format!("TinkerbellMachine watcher panicked: {}", e)))?;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Shutdown requested, stopping reconciliation");
            }
        }

        self.shutdown.cancel();
        self.machine_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("TinkerbellMachine watcher panicked: {}", e)))?
    }
}
