//! Mock resource store for unit testing
//!
//! `MockStore` keeps objects in memory and reproduces the API server
//! behaviour reconcilers depend on:
//! - every write bumps `metadata.resourceVersion`, and `update` from a stale
//!   version is a conflict
//! - `delete` of an object carrying finalizers only sets
//!   `metadata.deletionTimestamp`; the object disappears once an update
//!   clears its last finalizer
//!
//! Every call is recorded in a [`Journal`], which can be shared between the
//! stores of one test so assertions like "no writes happened" span all kinds.
//! One-shot failures can be queued per operation with [`MockStore::fail_next`].

mod journal;

pub use journal::{Journal, StoreCall, StoreOp};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::{Resource, ResourceExt};

use crate::error::StoreError;
use crate::key::ObjectKey;
use crate::store_trait::ResourceStore;

/// Failure to return from the next matching call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Behave as if another writer got there first
    Conflict,
    /// Behave as if another writer created the object first
    AlreadyExists,
    /// Behave as if another writer removed the object first
    NotFound,
    /// Store unavailable / internal error
    Unavailable(String),
}

#[derive(Debug)]
struct Injected {
    op: StoreOp,
    failure: Failure,
}

/// In-memory [`ResourceStore`] for tests.
pub struct MockStore<K> {
    objects: Arc<Mutex<BTreeMap<ObjectKey, K>>>,
    failures: Arc<Mutex<Vec<Injected>>>,
    next_version: Arc<AtomicU64>,
    journal: Journal,
}

impl<K> Clone for MockStore<K> {
    fn clone(&self) -> Self {
        Self {
            objects: Arc::clone(&self.objects),
            failures: Arc::clone(&self.failures),
            next_version: Arc::clone(&self.next_version),
            journal: self.journal.clone(),
        }
    }
}

impl<K> std::fmt::Debug for MockStore<K>
where
    K: Resource<DynamicType = ()>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("kind", &K::kind(&()))
            .field("objects", &lock(&self.objects).len())
            .finish_non_exhaustive()
    }
}

impl<K> Default for MockStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixed timestamp stamped on objects marked for deletion.
fn deletion_timestamp() -> Option<Time> {
    serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z")).ok()
}

impl<K> MockStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    /// Create an empty store with its own journal.
    pub fn new() -> Self {
        Self::with_journal(Journal::default())
    }

    /// Create an empty store recording into a shared journal.
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            next_version: Arc::new(AtomicU64::new(1)),
            journal,
        }
    }

    /// Journal this store records into.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Seed an object (for test setup). Not journaled; assigns a resource version.
    pub fn insert(&self, mut obj: K) -> K {
        obj.meta_mut().resource_version = Some(self.bump_version());
        lock(&self.objects).insert(ObjectKey::of(&obj), obj.clone());
        obj
    }

    /// Current stored object (for assertions). Not journaled.
    pub fn peek(&self, key: &ObjectKey) -> Option<K> {
        lock(&self.objects).get(key).cloned()
    }

    /// True if the object is currently stored. Not journaled.
    pub fn contains(&self, key: &ObjectKey) -> bool {
        lock(&self.objects).contains_key(key)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        lock(&self.objects).is_empty()
    }

    /// Make the next `op` call on this store fail with `failure`.
    pub fn fail_next(&self, op: StoreOp, failure: Failure) {
        lock(&self.failures).push(Injected { op, failure });
    }

    fn kind() -> String {
        K::kind(&()).to_string()
    }

    fn bump_version(&self) -> String {
        self.next_version.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn record(&self, op: StoreOp, key: &ObjectKey) -> Result<(), StoreError> {
        self.journal.record(StoreCall {
            kind: Self::kind(),
            op,
            key: key.clone(),
        });

        let mut failures = lock(&self.failures);
        let Some(index) = failures.iter().position(|injected| injected.op == op) else {
            return Ok(());
        };
        let injected = failures.remove(index);
        Err(match injected.failure {
            Failure::Conflict => StoreError::Conflict {
                kind: Self::kind(),
                key: key.clone(),
                message: "injected conflict".to_string(),
            },
            Failure::AlreadyExists => StoreError::AlreadyExists {
                kind: Self::kind(),
                key: key.clone(),
            },
            Failure::NotFound => Self::not_found(key),
            Failure::Unavailable(message) => StoreError::Api(message),
        })
    }

    fn not_found(key: &ObjectKey) -> StoreError {
        StoreError::NotFound {
            kind: Self::kind(),
            key: key.clone(),
        }
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
impl<K> ResourceStore<K> for MockStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &ObjectKey) -> Result<K, StoreError> {
        self.record(StoreOp::Get, key)?;
        self.peek(key).ok_or_else(|| Self::not_found(key))
    }

    async fn list(&self, namespace: Option<&str>) -> Result<Vec<K>, StoreError> {
        let scope = ObjectKey {
            namespace: namespace.map(str::to_string),
            name: String::new(),
        };
        self.record(StoreOp::List, &scope)?;
        Ok(lock(&self.objects)
            .iter()
            .filter(|(key, _)| namespace.is_none() || key.namespace.as_deref() == namespace)
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        let key = Self::key_for_write(obj)?;
        self.record(StoreOp::Create, &key)?;

        let mut objects = lock(&self.objects);
        if objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: Self::kind(),
                key,
            });
        }
        let mut created = obj.clone();
        created.meta_mut().resource_version = Some(self.bump_version());
        created.meta_mut().deletion_timestamp = None;
        objects.insert(key, created.clone());
        Ok(created)
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        let key = Self::key_for_write(obj)?;
        self.record(StoreOp::Update, &key)?;

        let mut objects = lock(&self.objects);
        let Some(stored) = objects.get(&key) else {
            return Err(Self::not_found(&key));
        };
        if obj.resource_version().is_none() || obj.resource_version() != stored.resource_version() {
            return Err(StoreError::Conflict {
                kind: Self::kind(),
                message: format!(
                    "resourceVersion {:?} does not match stored {:?}",
                    obj.resource_version(),
                    stored.resource_version()
                ),
                key,
            });
        }

        let mut updated = obj.clone();
        // Deletion intent is owned by the store, not the writer.
        updated.meta_mut().deletion_timestamp = stored.meta().deletion_timestamp.clone();
        updated.meta_mut().resource_version = Some(self.bump_version());

        if updated.meta().deletion_timestamp.is_some() && updated.finalizers().is_empty() {
            objects.remove(&key);
        } else {
            objects.insert(key, updated.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.record(StoreOp::Delete, key)?;

        let mut objects = lock(&self.objects);
        let Some(stored) = objects.get_mut(key) else {
            return Err(Self::not_found(key));
        };
        if stored.finalizers().is_empty() {
            objects.remove(key);
        } else if stored.meta().deletion_timestamp.is_none() {
            stored.meta_mut().deletion_timestamp = deletion_timestamp();
            stored.meta_mut().resource_version = Some(self.bump_version());
        }
        Ok(())
    }
}
