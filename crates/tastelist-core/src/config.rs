//! Bulk-add configuration.
//!
//! Defaults match the place provider's published limits. Every option can be
//! overridden from the environment with a `TASTELIST_` prefixed variable; bad
//! values are logged and replaced by the default rather than failing startup.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry::FieldOrder;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown entry field: {0}")]
    UnknownField(String),
    #[error("field order must name exactly three fields: {0}")]
    FieldCount(String),
    #[error("field order repeats a field: {0}")]
    DuplicateField(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkAddConfig {
    /// Total attempts per external call, the first one included.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_concurrent_resolutions: usize,
    pub max_items_per_list: usize,
    pub field_order: FieldOrder,
}

impl Default for BulkAddConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            max_concurrent_resolutions: 4,
            max_items_per_list: 50,
            field_order: FieldOrder::default(),
        }
    }
}

impl BulkAddConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back per key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_retries: load_or(&lookup, "TASTELIST_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: load_or(&lookup, "TASTELIST_RETRY_DELAY_MS", defaults.retry_delay_ms),
            max_concurrent_resolutions: load_or(
                &lookup,
                "TASTELIST_MAX_CONCURRENT_RESOLUTIONS",
                defaults.max_concurrent_resolutions,
            ),
            max_items_per_list: load_or(
                &lookup,
                "TASTELIST_MAX_ITEMS_PER_LIST",
                defaults.max_items_per_list,
            ),
            field_order: load_or(&lookup, "TASTELIST_FIELD_ORDER", defaults.field_order),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries.max(1),
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Worker limit for the resolution phase, never below one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_resolutions.max(1)
    }
}

/// Fixed-delay retry policy for transient place-provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        BulkAddConfig::default().retry_policy()
    }
}

fn load_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        debug!("{key} not set, using default: {default}");
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            warn!(key, value = %raw, error = %e, "invalid config value, using default");
            default
        }
    }
}
