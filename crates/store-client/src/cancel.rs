//! Cancellation support for store calls

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// Runs a store call, abandoning it as soon as `token` is cancelled.
///
/// Returns `Err(StoreError::Cancelled)` if the token fired before or while
/// the call was in flight. Cancellation wins ties so a cancelled reconcile
/// never starts a new write.
pub async fn cancellable<T, F>(token: &CancellationToken, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;

        () = token.cancelled() => Err(StoreError::Cancelled),
        result = call => result,
    }
}
