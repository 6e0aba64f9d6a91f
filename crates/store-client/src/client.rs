//! Kubernetes-backed resource store

use std::fmt;

use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::StoreError;
use crate::key::ObjectKey;
use crate::store_trait::ResourceStore;

/// Builds the `Api` handle used for a single-object call.
type ApiFor<K> = fn(&Client, Option<&str>) -> Api<K>;

/// [`ResourceStore`] over the Kubernetes API server.
///
/// Namespaced kinds are addressed through the key's namespace (falling back to
/// the client's default namespace); cluster-scoped kinds ignore it.
pub struct KubeStore<K> {
    client: Client,
    api_for: ApiFor<K>,
}

impl<K> KubeStore<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    K::DynamicType: Default,
{
    /// Store for a namespaced kind.
    pub fn namespaced(client: Client) -> Self {
        Self {
            client,
            api_for: namespaced_api::<K>,
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<Scope = ClusterResourceScope>,
    K::DynamicType: Default,
{
    /// Store for a cluster-scoped kind.
    pub fn cluster(client: Client) -> Self {
        Self {
            client,
            api_for: cluster_api::<K>,
        }
    }
}

fn namespaced_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::default_namespaced(client.clone()),
    }
}

fn cluster_api<K>(client: &Client, _namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = ClusterResourceScope>,
    K::DynamicType: Default,
{
    Api::all(client.clone())
}

impl<K> Clone for KubeStore<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api_for: self.api_for,
        }
    }
}

impl<K> fmt::Debug for KubeStore<K>
where
    K: Resource<DynamicType = ()>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeStore")
            .field("kind", &K::kind(&()))
            .finish_non_exhaustive()
    }
}

impl<K> KubeStore<K>
where
    K: Resource<DynamicType = ()>,
{
    fn api(&self, key: &ObjectKey) -> Api<K> {
        (self.api_for)(&self.client, key.namespace.as_deref())
    }

    fn kind() -> String {
        K::kind(&()).to_string()
    }

    fn key_for_write(obj: &K) -> Result<ObjectKey, StoreError> {
        if obj.meta().name.is_none() {
            return Err(StoreError::InvalidObject(format!(
                "{} without metadata.name",
                Self::kind()
            )));
        }
        Ok(ObjectKey::of(obj))
    }
}

#[async_trait::async_trait]
impl<K> ResourceStore<K> for KubeStore<K>
where
    K: Resource<DynamicType = ()>
        + Clone
        + Serialize
        + DeserializeOwned
        + fmt::Debug
        + Send
        + Sync
        + 'static,
{
    async fn get(&self, key: &ObjectKey) -> Result<K, StoreError> {
        debug!("GET {} {}", Self::kind(), key);
        self.api(key)
            .get(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(e, &Self::kind(), key))
    }

    async fn list(&self, namespace: Option<&str>) -> Result<Vec<K>, StoreError> {
        let api = match namespace {
            Some(namespace) => (self.api_for)(&self.client, Some(namespace)),
            None => Api::all(self.client.clone()),
        };
        let key = ObjectKey {
            namespace: namespace.map(str::to_string),
            name: String::new(),
        };
        debug!("LIST {} in {}", Self::kind(), namespace.unwrap_or("all namespaces"));
        api.list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| StoreError::from_kube(e, &Self::kind(), &key))
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        let key = Self::key_for_write(obj)?;
        debug!("CREATE {} {}", Self::kind(), key);
        self.api(&key)
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &Self::kind(), &key))
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        let key = Self::key_for_write(obj)?;
        if obj.resource_version().is_none() {
            return Err(StoreError::InvalidObject(format!(
                "{} {} has no resourceVersion; updates must start from a read",
                Self::kind(),
                key
            )));
        }
        debug!("UPDATE {} {}", Self::kind(), key);
        self.api(&key)
            .replace(&key.name, &PostParams::default(), obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &Self::kind(), &key))
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        debug!("DELETE {} {}", Self::kind(), key);
        self.api(key)
            .delete(&key.name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, &Self::kind(), key))
    }
}
