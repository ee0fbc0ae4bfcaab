//! Bulk processor configuration.
//!
//! ```toml
//! bulk_actions = 500
//! concurrent_requests = 2
//! flush_interval_ms = 250
//! ```

use aspekt_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Batching and flush settings for a [`BulkProcessor`](crate::BulkProcessor).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Operations per flush.
    #[serde(default = "default_bulk_actions")]
    pub bulk_actions: usize,

    /// Flushes allowed in flight at once.
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Periodic flush interval in milliseconds. `None` or `0` disables it.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: Option<u64>,
}

fn default_bulk_actions() -> usize {
    1000
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_flush_interval_ms() -> Option<u64> {
    Some(1000)
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            bulk_actions: default_bulk_actions(),
            concurrent_requests: default_concurrent_requests(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl BulkConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| Error::config(format!("Failed to parse bulk config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.bulk_actions == 0 {
            return Err(Error::config("bulk_actions must be at least 1"));
        }
        if self.concurrent_requests == 0 {
            return Err(Error::config("concurrent_requests must be at least 1"));
        }
        Ok(())
    }

    /// Periodic flush interval, if enabled.
    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
