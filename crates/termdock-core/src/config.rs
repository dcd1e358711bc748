//! Coordinator configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tunable knobs for the lifecycle coordinator, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Session ceiling used for local admission before the first
    /// snapshot arrives; the backend's `maxTerminals` governs afterwards
    pub max_sessions: usize,
    /// How long a queued creation request may wait before rejecting
    pub queue_timeout_ms: u64,
    /// Backoff between retries of a blocked queued creation
    pub queue_retry_delay_ms: u64,
    /// How long a tracked deletion waits for snapshot confirmation
    /// before optimistically auto-clearing
    pub deletion_timeout_ms: u64,
    /// Settle window granted to a layout transition when the layout
    /// engine offers no completion signal
    pub layout_settle_delay_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_sessions: 5,
            queue_timeout_ms: 10_000,
            queue_retry_delay_ms: 500,
            deletion_timeout_ms: 5_000,
            layout_settle_delay_ms: 250,
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: CoordinatorConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(Error::Config("max_sessions must be > 0".to_string()));
        }
        if self.queue_timeout_ms == 0 || self.deletion_timeout_ms == 0 {
            return Err(Error::Config("timeouts must be > 0".to_string()));
        }
        if self.queue_retry_delay_ms >= self.queue_timeout_ms {
            return Err(Error::Config(
                "queue_retry_delay_ms must be shorter than queue_timeout_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Queue expiry as a [`Duration`].
    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    /// Queue retry backoff as a [`Duration`].
    pub fn queue_retry_delay(&self) -> Duration {
        Duration::from_millis(self.queue_retry_delay_ms)
    }

    /// Deletion-tracking expiry as a [`Duration`].
    pub fn deletion_timeout(&self) -> Duration {
        Duration::from_millis(self.deletion_timeout_ms)
    }

    /// Layout settle fallback as a [`Duration`].
    pub fn layout_settle_delay(&self) -> Duration {
        Duration::from_millis(self.layout_settle_delay_ms)
    }
}
