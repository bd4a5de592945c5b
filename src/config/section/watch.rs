//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! stability_ms = 200   # quiet period before a changed file is compiled
//! poll_ms = 50         # how often pending files are re-checked
//! ```

use std::time::Duration;

use serde::Deserialize;

/// File watcher timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// A file is processed only after this long without further writes.
    pub stability_ms: u64,

    /// Polling granularity of the debounce loop.
    pub poll_ms: u64,
}

impl WatchConfig {
    pub fn stability(&self) -> Duration {
        Duration::from_millis(self.stability_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            stability_ms: 200,
            poll_ms: 50,
        }
    }
}
