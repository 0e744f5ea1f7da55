use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Orchestration knobs. Base URLs and credentials are the surrounding
/// application's concern and go straight to the HTTP client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Deadline for one whole attempt, headers through end of stream
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    /// Flat delay between message-send attempts
    pub message_retry_delay_ms: u64,
    /// Base of the growing delay between session-creation attempts
    pub session_retry_base_delay_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_retries: 3,
            message_retry_delay_ms: 2_000,
            session_retry_base_delay_ms: 1_000,
        }
    }
}

impl PlannerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            message_delay: Duration::from_millis(self.message_retry_delay_ms),
            session_base_delay: Duration::from_millis(self.session_retry_base_delay_ms),
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<PlannerConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: PlannerConfig = toml::from_str(&content)?;
    Ok(config)
}
