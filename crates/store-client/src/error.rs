//! Store client errors

use thiserror::Error;

use crate::key::ObjectKey;

/// Errors that can occur when talking to the resource store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("{kind} {key} not found")]
    NotFound { kind: String, key: ObjectKey },

    /// Conditional write lost against a newer resource version
    #[error("conflict writing {kind} {key}: {message}")]
    Conflict {
        kind: String,
        key: ObjectKey,
        message: String,
    },

    /// Create of an object that already exists
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: String, key: ObjectKey },

    /// Call abandoned because the reconcile was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// Object cannot be written as given (e.g. missing name)
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// Store rejected or failed the call for another reason
    #[error("store API error: {0}")]
    Api(String),

    /// Kubernetes client error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
}

impl StoreError {
    /// True if the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// True if a conditional write lost a race and must be retried from a fresh read.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// True if a create found the object already present.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// True if the call was abandoned due to cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled)
    }

    /// Classifies a Kubernetes client error for the object `kind`/`key`.
    pub(crate) fn from_kube(err: kube::Error, kind: &str, key: &ObjectKey) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 404 => StoreError::NotFound {
                kind: kind.to_string(),
                key: key.clone(),
            },
            kube::Error::Api(ref response)
                if response.code == 409 && response.reason == "AlreadyExists" =>
            {
                StoreError::AlreadyExists {
                    kind: kind.to_string(),
                    key: key.clone(),
                }
            }
            kube::Error::Api(ref response) if response.code == 409 => StoreError::Conflict {
                kind: kind.to_string(),
                key: key.clone(),
                message: response.message.clone(),
            },
            other => StoreError::Kube(other),
        }
    }
}
