//! Finalizer helpers
//!
//! Finalizers are treated as a small ordered set of strings: insertion keeps
//! the existing order and never duplicates, removal drops every occurrence.
//! Both report whether the set actually changed so callers can skip no-op
//! writes.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Returns true if `token` is present in the object's finalizers.
pub fn has_finalizer(meta: &ObjectMeta, token: &str) -> bool {
    meta.finalizers
        .as_ref()
        .is_some_and(|finalizers| finalizers.iter().any(|f| f == token))
}

/// Adds `token` to the object's finalizers.
///
/// Returns `true` if the finalizer was missing and has been appended.
pub fn add_finalizer(meta: &mut ObjectMeta, token: &str) -> bool {
    if has_finalizer(meta, token) {
        return false;
    }
    meta.finalizers
        .get_or_insert_with(Vec::new)
        .push(token.to_string());
    true
}

/// Removes `token` from the object's finalizers.
///
/// Returns `true` if anything was removed. An emptied list is normalized to
/// `None` so it round-trips the same way the API server reports it.
pub fn remove_finalizer(meta: &mut ObjectMeta, token: &str) -> bool {
    let Some(finalizers) = meta.finalizers.as_mut() else {
        return false;
    };
    let before = finalizers.len();
    finalizers.retain(|f| f != token);
    let changed = finalizers.len() != before;
    if finalizers.is_empty() {
        meta.finalizers = None;
    }
    changed
}
