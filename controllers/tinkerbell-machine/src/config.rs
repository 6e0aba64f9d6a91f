//! Controller configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use crds::WATCH_FILTER_LABEL;

use crate::error::ControllerError;

const DEFAULT_CONCURRENCY: u16 = 10;
const DEFAULT_NOT_READY_REQUEUE_SECS: u64 = 30;
const DEFAULT_FOLLOW_UP_REQUEUE_SECS: u64 = 5;
const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;
const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Runtime settings for the watch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace to watch, all namespaces when `None`
    pub watch_namespace: Option<String>,
    /// Value of the `cluster.x-k8s.io/watch-filter` label to shard on
    pub watch_filter: Option<String>,
    /// Maximum concurrent reconciliations
    pub concurrency: u16,
    /// Re-check interval for machines waiting on upstream data
    pub not_ready_requeue: Duration,
    /// Follow-up interval while provisioning is in progress
    pub follow_up_requeue: Duration,
    /// First retry delay after an error
    pub backoff_min: Duration,
    /// Retry delay cap
    pub backoff_max: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            watch_filter: None,
            concurrency: DEFAULT_CONCURRENCY,
            not_ready_requeue: Duration::from_secs(DEFAULT_NOT_READY_REQUEUE_SECS),
            follow_up_requeue: Duration::from_secs(DEFAULT_FOLLOW_UP_REQUEUE_SECS),
            backoff_min: Duration::from_secs(DEFAULT_BACKOFF_MIN_SECS),
            backoff_max: Duration::from_secs(DEFAULT_BACKOFF_MAX_SECS),
        }
    }
}

impl ControllerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let config = Self {
            watch_namespace: non_empty("WATCH_NAMESPACE"),
            watch_filter: non_empty("WATCH_FILTER"),
            concurrency: parse_or(non_empty("MACHINE_CONCURRENCY"), "MACHINE_CONCURRENCY", DEFAULT_CONCURRENCY)?,
            not_ready_requeue: Duration::from_secs(parse_or(
                non_empty("NOT_READY_REQUEUE_SECS"),
                "NOT_READY_REQUEUE_SECS",
                DEFAULT_NOT_READY_REQUEUE_SECS,
            )?),
            follow_up_requeue: Duration::from_secs(parse_or(
                non_empty("FOLLOW_UP_REQUEUE_SECS"),
                "FOLLOW_UP_REQUEUE_SECS",
                DEFAULT_FOLLOW_UP_REQUEUE_SECS,
            )?),
            backoff_min: Duration::from_secs(parse_or(
                non_empty("ERROR_BACKOFF_MIN_SECS"),
                "ERROR_BACKOFF_MIN_SECS",
                DEFAULT_BACKOFF_MIN_SECS,
            )?),
            backoff_max: Duration::from_secs(parse_or(
                non_empty("ERROR_BACKOFF_MAX_SECS"),
                "ERROR_BACKOFF_MAX_SECS",
                DEFAULT_BACKOFF_MAX_SECS,
            )?),
        };

        if config.backoff_min.is_zero() || config.backoff_min > config.backoff_max {
            return Err(ControllerError::InvalidConfig(format!(
                "ERROR_BACKOFF_MIN_SECS ({}) must be positive and not exceed ERROR_BACKOFF_MAX_SECS ({})",
                config.backoff_min.as_secs(),
                config.backoff_max.as_secs()
            )));
        }

        Ok(config)
    }

    /// Label selector restricting watched objects to this controller's shard.
    pub fn label_selector(&self) -> Option<String> {
        self.watch_filter
            .as_ref()
            .map(|value| format!("{WATCH_FILTER_LABEL}={value}"))
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &str,
    default: T,
) -> Result<T, ControllerError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ControllerError::InvalidConfig(format!("{name} must be a non-negative integer, got {raw:?}"))
        }),
    }
}
