//! TinkerbellCluster CRD
//!
//! Infrastructure record for a workload cluster. The machine controller only
//! reads it: provisioning waits until `status.ready` is set.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Image location used when a cluster does not set one.
pub const DEFAULT_IMAGE_LOOKUP_BASE_URL: &str = "http://192.168.1.1:8080";

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "infrastructure.cluster.x-k8s.io",
    version = "v1beta1",
    kind = "TinkerbellCluster",
    namespaced,
    status = "TinkerbellClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct TinkerbellClusterSpec {
    /// Endpoint used to reach the control plane
    #[serde(default)]
    pub control_plane_endpoint: ApiEndpoint,

    /// Base URL OS images are streamed from during provisioning
    #[serde(default, rename = "imageLookupBaseURL", skip_serializing_if = "Option::is_none")]
    pub image_lookup_base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// Hostname or IP of the API server
    #[serde(default)]
    pub host: String,

    /// Port of the API server
    #[serde(default)]
    pub port: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TinkerbellClusterStatus {
    /// Set once the cluster infrastructure is ready for machines
    #[serde(default)]
    pub ready: bool,
}

impl TinkerbellCluster {
    /// True once the cluster infrastructure has reported ready.
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|status| status.ready)
    }

    /// Image base URL, falling back to [`DEFAULT_IMAGE_LOOKUP_BASE_URL`].
    pub fn image_lookup_base_url(&self) -> &str {
        self.spec
            .image_lookup_base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_IMAGE_LOOKUP_BASE_URL)
    }
}
