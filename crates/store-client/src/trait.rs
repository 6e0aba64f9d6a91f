//! ResourceStore trait for mocking
//!
//! This trait abstracts the resource store so reconcilers can be exercised
//! against an in-memory implementation. The Kubernetes-backed `KubeStore`
//! implements it for production, `MockStore` for tests.

use crate::error::StoreError;
use crate::key::ObjectKey;

/// Typed store operations for one resource kind `K`.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ResourceStore<K>: Send + Sync
where
    K: Send + Sync + 'static,
{
    /// Fetch one object. Missing objects are [`StoreError::NotFound`].
    async fn get(&self, key: &ObjectKey) -> Result<K, StoreError>;

    /// List objects, optionally restricted to one namespace.
    async fn list(&self, namespace: Option<&str>) -> Result<Vec<K>, StoreError>;

    /// Create a new object. An existing object is [`StoreError::AlreadyExists`].
    async fn create(&self, obj: &K) -> Result<K, StoreError>;

    /// Replace an object, conditioned on the `resourceVersion` it was read at.
    /// A stale version is [`StoreError::Conflict`].
    async fn update(&self, obj: &K) -> Result<K, StoreError>;

    /// Delete an object. Objects carrying finalizers are only marked for deletion.
    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError>;

    /// Like [`ResourceStore::get`], with not-found mapped to `None`.
    async fn get_opt(&self, key: &ObjectKey) -> Result<Option<K>, StoreError> {
        match self.get(key).await {
            Ok(obj) => Ok(Some(obj)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
