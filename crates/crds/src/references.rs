//! Kubernetes object references
//!
//! Mirrors the subset of `corev1.ObjectReference` that Cluster API uses for
//! cross-resource references (`infrastructureRef`, `bootstrap.configRef`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to another Kubernetes object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    /// API version of the referenced object (e.g. "infrastructure.cluster.x-k8s.io/v1beta1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Kind of the referenced object (e.g. "TinkerbellCluster")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Name of the referenced object
    #[serde(default)]
    pub name: String,

    /// Namespace of the referenced object (defaults to the referencing object's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ObjectRef {
    /// Returns the API group portion of `api_version`, or an empty string for the core group.
    pub fn group(&self) -> &str {
        match self.api_version.as_deref() {
            Some(api_version) => api_version_group(api_version),
            None => "",
        }
    }

    /// Returns true if this reference points at `kind` in `group`.
    pub fn is_kind(&self, group: &str, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind) && self.group() == group
    }
}

/// Splits the group out of an `apiVersion` string ("group/version" or "version").
pub fn api_version_group(api_version: &str) -> &str {
    match api_version.split_once('/') {
        Some((group, _)) => group,
        None => "",
    }
}
