//! Kubernetes resource watchers.
//!
//! Drives [`Reconciler::reconcile_machine`] from a `kube_runtime::Controller`
//! over TinkerbellMachine. Changes to the owning Cluster API Machine and to
//! the machine's Workflow also trigger a reconcile. Reconcile outcomes and
//! errors are turned into requeue actions here; the reconciler itself knows
//! nothing about retry timing.

use std::sync::Arc;

use crds::{Machine, TinkerbellMachine, Workflow};
use futures::StreamExt;
use kube::{Api, Client, ResourceExt};
use kube_runtime::controller::{Action, Config as RuntimeConfig};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{Controller, watcher};
use store_client::ObjectKey;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::BackoffTracker;
use crate::config::ControllerConfig;
use crate::error::{ControllerError, ErrorClass};
use crate::reconciler::{ReconcileOutcome, Reconciler};

/// Shared state handed to every reconcile.
#[derive(Debug)]
pub struct WatchContext {
    reconciler: Reconciler,
    config: ControllerConfig,
    backoff: BackoffTracker,
    shutdown: CancellationToken,
}

impl WatchContext {
    /// Creates the context; `shutdown` cancels in-flight reconciles.
    pub fn new(reconciler: Reconciler, config: ControllerConfig, shutdown: CancellationToken) -> Self {
        let backoff = BackoffTracker::new(config.backoff_min, config.backoff_max);
        Self {
            reconciler,
            config,
            backoff,
            shutdown,
        }
    }
}

/// Requeue action for a successful reconcile.
pub fn outcome_action(outcome: &ReconcileOutcome, config: &ControllerConfig) -> Action {
    match outcome {
        ReconcileOutcome::NotReady { .. } => Action::requeue(config.not_ready_requeue),
        ReconcileOutcome::Progressing => Action::requeue(config.follow_up_requeue),
        ReconcileOutcome::Complete | ReconcileOutcome::Gone => Action::await_change(),
    }
}

async fn reconcile(
    machine: Arc<TinkerbellMachine>,
    ctx: Arc<WatchContext>,
) -> Result<Action, ControllerError> {
    let key = ObjectKey::of(machine.as_ref());
    let cancel = ctx.shutdown.child_token();

    let outcome = ctx.reconciler.reconcile_machine(&key, &cancel).await?;
    ctx.backoff.on_success(&key);
    debug!(tinkerbell_machine = %key, ?outcome, "Reconciliation finished");
    Ok(outcome_action(&outcome, &ctx.config))
}

fn error_policy(machine: Arc<TinkerbellMachine>, error: &ControllerError, ctx: Arc<WatchContext>) -> Action {
    let key = ObjectKey::of(machine.as_ref());
    let (delay, attempts) = ctx.backoff.on_error(&key);
    match error.class() {
        ErrorClass::Cancelled => debug!(tinkerbell_machine = %key, "Reconciliation cancelled"),
        _ if error.is_conflict() => {
            debug!(tinkerbell_machine = %key, %error, "Conflict, retrying from a fresh read")
        }
        class => warn!(
            tinkerbell_machine = %key,
            ?class,
            attempts,
            retry_in = ?delay,
            "Reconciliation failed: {}",
            error
        ),
    }
    Action::requeue(delay)
}

/// Maps a Cluster API Machine to the TinkerbellMachine it points at.
fn machine_to_tinkerbell_machine(machine: Machine) -> Option<ObjectRef<TinkerbellMachine>> {
    let infrastructure_ref = &machine.spec.infrastructure_ref;
    if infrastructure_ref.name.is_empty()
        || !infrastructure_ref.is_kind("infrastructure.cluster.x-k8s.io", "TinkerbellMachine")
    {
        return None;
    }
    let namespace = infrastructure_ref.namespace.clone().or_else(|| machine.namespace())?;
    Some(ObjectRef::new(&infrastructure_ref.name).within(&namespace))
}

/// Maps a Workflow to the TinkerbellMachine of the same name.
fn workflow_to_tinkerbell_machine(workflow: Workflow) -> Option<ObjectRef<TinkerbellMachine>> {
    let namespace = workflow.namespace()?;
    Some(ObjectRef::new(&workflow.name_any()).within(&namespace))
}

fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

/// Watches TinkerbellMachines until `ctx`'s shutdown token fires.
pub async fn watch_tinkerbell_machines(client: Client, ctx: Arc<WatchContext>) -> Result<(), ControllerError> {
    let config = ctx.config.clone();
    let namespace = config.watch_namespace.as_deref();

    let mut machine_watch = watcher::Config::default();
    if let Some(selector) = config.label_selector() {
        info!(%selector, "Filtering watched objects by label");
        machine_watch = machine_watch.labels(&selector);
    }

    info!("Starting TinkerbellMachine watcher");

    Controller::new(scoped_api::<TinkerbellMachine>(&client, namespace), machine_watch)
        .watches(
            scoped_api::<Machine>(&client, namespace),
            watcher::Config::default(),
            machine_to_tinkerbell_machine,
        )
        .watches(
            scoped_api::<Workflow>(&client, namespace),
            watcher::Config::default(),
            workflow_to_tinkerbell_machine,
        )
        .with_config(RuntimeConfig::default().concurrency(config.concurrency))
        .graceful_shutdown_on(ctx.shutdown.clone().cancelled_owned())
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((object, _)) => debug!(tinkerbell_machine = %object, "Reconciled"),
                Err(e) => error!("Controller error for TinkerbellMachine: {}", e),
            }
        })
        .await;

    info!("TinkerbellMachine watcher stopped");
    Ok(())
}
