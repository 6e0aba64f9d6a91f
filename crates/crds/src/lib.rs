//! Tinkerbell machine controller resource types
//!
//! Typed definitions for every record the machine lifecycle controller reads
//! or writes:
//! - `TinkerbellMachine` / `TinkerbellCluster`: the infrastructure provider CRDs
//! - `Machine` / `Cluster`: the subset of Cluster API intent read by the readiness gate
//! - `Hardware`, `Template`, `Workflow`: Tinkerbell provisioning records
//! - `BMC`: the PBNJ power endpoint for a piece of hardware

pub mod bmc;
pub mod capi;
pub mod constants;
pub mod finalizers;
pub mod hardware;
pub mod references;
pub mod template;
pub mod tinkerbell_cluster;
pub mod tinkerbell_machine;
pub mod workflow;

pub use bmc::*;
pub use capi::*;
pub use constants::*;
pub use hardware::*;
pub use references::*;
pub use template::*;
pub use tinkerbell_cluster::*;
pub use tinkerbell_machine::*;
pub use workflow::*;
