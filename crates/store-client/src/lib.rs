//! Resource Store Client
//!
//! Typed access to the Kubernetes objects the Tinkerbell controllers work
//! with. Every kind goes through the same five operations (`get`, `list`,
//! `create`, conditional `update`, `delete`) and reports not-found, conflict
//! and already-exists as distinct [`StoreError`] variants, so reconcilers can
//! treat "already gone" as success where that is the contract.
//!
//! # Example
//!
//! ```no_run
//! use k8s_openapi::api::core::v1::Secret;
//! use store_client::{KubeStore, ObjectKey, ResourceStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let secrets: KubeStore<Secret> = KubeStore::namespaced(client);
//!
//! let key = ObjectKey::namespaced("default", "bootstrap-data");
//! match secrets.get_opt(&key).await? {
//!     Some(secret) => println!("found {:?}", secret.metadata.name),
//!     None => println!("{key} does not exist yet"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Optimistic concurrency**: `update` is a replace conditioned on the
//!   fetched `resourceVersion`; a stale write is a [`StoreError::Conflict`]
//! - **Cancellation**: [`cancellable`] races any store call against a
//!   `CancellationToken`
//! - **Mocking** (`test-util`): [`MockStore`] keeps objects in memory with the
//!   same conflict and finalizer-gated deletion semantics as the API server

pub mod cancel;
pub mod client;
pub mod error;
pub mod key;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use cancel::cancellable;
pub use client::KubeStore;
pub use error::StoreError;
pub use key::ObjectKey;
pub use store_trait::ResourceStore;
#[cfg(feature = "test-util")]
pub use mock::{Failure, Journal, MockStore, StoreCall, StoreOp};
