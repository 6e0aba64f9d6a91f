//! Well-known finalizer tokens, labels and API groups.

/// Finalizer placed on a `TinkerbellMachine` (and on the `Hardware` it holds)
/// while the machine owns provisioning resources.
pub const MACHINE_FINALIZER: &str = "tinkerbellmachine.infrastructure.cluster.x-k8s.io";

/// Label on `Hardware` naming the `TinkerbellMachine` that holds it.
pub const HARDWARE_OWNER_NAME_LABEL: &str = "v1alpha1.tinkerbell.org/ownerName";

/// Label on `Hardware` naming the namespace of the `TinkerbellMachine` that holds it.
pub const HARDWARE_OWNER_NAMESPACE_LABEL: &str = "v1alpha1.tinkerbell.org/ownerNamespace";

/// Label Cluster API puts on every object belonging to a cluster.
pub const CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";

/// Label used to shard controllers with `--watch-filter`.
pub const WATCH_FILTER_LABEL: &str = "cluster.x-k8s.io/watch-filter";

/// API group of Cluster API core types.
pub const CLUSTER_API_GROUP: &str = "cluster.x-k8s.io";

/// Key in the bootstrap data secret holding the rendered user data.
pub const BOOTSTRAP_DATA_KEY: &str = "value";
