use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Client-side configuration, loaded from `floatdeck.yaml` under the
/// config root. Every field defaults, so a missing file is a working
/// local setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Backend base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Capability probe interval in seconds.
    pub poll_interval_secs: u64,
    /// Curated float ids probed in order for a non-empty depth profile.
    pub profile_candidates: Vec<String>,
    /// Cycle number used for every profile probe.
    pub profile_cycle: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            poll_interval_secs: 30,
            profile_candidates: vec![
                "2902206".to_string(),
                "2902207".to_string(),
                "2902208".to_string(),
                "2902209".to_string(),
            ],
            profile_cycle: 1,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
