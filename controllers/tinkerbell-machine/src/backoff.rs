//! # Exponential Backoff
//!
//! Per-machine retry delays for failed reconciliations. Each consecutive
//! failure doubles the delay, starting at the configured minimum and capped at
//! the maximum; a successful reconciliation resets the machine's sequence.
//! Sequences idle for longer than a few maximum delays belong to machines that
//! are no longer requeued (deleted while failing) and are pruned.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use store_client::ObjectKey;

/// Doubling backoff calculator
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    max: Duration,
    current: Duration,
}

impl ExponentialBackoff {
    /// Create a backoff starting at `min` and capped at `max`
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { max, current: min }
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        self.current = std::cmp::min(self.current.saturating_mul(2), self.max);
        result
    }
}

/// Backoff state for a machine
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: ExponentialBackoff,
    error_count: u32,
    last_error: Instant,
}

/// Number of maximum delays a sequence may stay idle before it is pruned.
const IDLE_RETENTION_FACTOR: u32 = 4;

/// Tracks one backoff sequence per machine key.
#[derive(Debug)]
pub struct BackoffTracker {
    min: Duration,
    max: Duration,
    states: Mutex<HashMap<ObjectKey, BackoffState>>,
}

impl BackoffTracker {
    /// Tracker whose sequences run from `min` to `max`.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Records a failure for `key` and returns the delay before the next attempt
    /// along with the number of consecutive failures.
    pub fn on_error(&self, key: &ObjectKey) -> (Duration, u32) {
        self.on_error_at(key, Instant::now())
    }

    fn on_error_at(&self, key: &ObjectKey, now: Instant) -> (Duration, u32) {
        let retention = self.max.saturating_mul(IDLE_RETENTION_FACTOR);
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        states.retain(|_, state| now.saturating_duration_since(state.last_error) <= retention);

        let state = states.entry(key.clone()).or_insert_with(|| BackoffState {
            backoff: ExponentialBackoff::new(self.min, self.max),
            error_count: 0,
            last_error: now,
        });
        state.error_count += 1;
        state.last_error = now;
        (state.backoff.next_backoff(), state.error_count)
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.states.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Forgets the failure history of `key`.
    pub fn on_success(&self, key: &ObjectKey) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
