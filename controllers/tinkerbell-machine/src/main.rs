//! Tinkerbell Machine Controller
//!
//! Drives TinkerbellMachine resources through their lifecycle:
//! - waits for the owning Machine, bootstrap data and cluster to be ready
//! - claims the referenced Hardware and creates its Template and Workflow
//! - on deletion removes both, releases the Hardware and powers it off via its BMC

mod backoff;
mod config;
mod controller;
mod error;
mod reconciler;
mod render;
mod watcher;

#[cfg(test)]
mod test_utils;

use controller::Controller;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| ControllerError::InvalidConfig("failed to install rustls crypto provider".to_string()))?;

    info!("Starting Tinkerbell Machine Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Watch filter: {}", config.watch_filter.as_deref().unwrap_or("none"));
    info!("  Concurrency: {}", config.concurrency);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
