//! Call journal shared by mock stores

use std::sync::{Arc, Mutex, PoisonError};

use crate::key::ObjectKey;

/// Store operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl StoreOp {
    /// True for operations that mutate the store.
    pub fn is_write(self) -> bool {
        matches!(self, StoreOp::Create | StoreOp::Update | StoreOp::Delete)
    }
}

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    /// Resource kind, e.g. `Hardware`
    pub kind: String,
    pub op: StoreOp,
    /// Target key (empty name for `List`)
    pub key: ObjectKey,
}

/// Ordered record of store calls, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl Journal {
    pub(crate) fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// All calls, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutating calls, in order.
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.op.is_write())
            .collect()
    }

    /// Number of calls of `op` against `kind`.
    pub fn count(&self, kind: &str, op: StoreOp) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.kind == kind && call.op == op)
            .count()
    }

    /// Mutating calls as `"Op Kind key"` strings, handy for ordering assertions.
    pub fn write_log(&self) -> Vec<String> {
        self.writes()
            .iter()
            .map(|call| format!("{:?} {} {}", call.op, call.kind, call.key))
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
