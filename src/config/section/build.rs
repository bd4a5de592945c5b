//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "src"        # template directory, scanned recursively
//! output = "dist"       # compiled HTML lands here, mirroring `source`
//! source_ext = "mjml"
//! output_ext = "html"
//! jobs = 0              # compile workers, 0 = one per CPU
//! ```

use std::path::PathBuf;

use serde::Deserialize;

/// Build paths and worker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Source root (relative paths resolve against the working directory).
    pub source: PathBuf,

    /// Output root.
    pub output: PathBuf,

    /// Extension of template files, without the leading dot.
    pub source_ext: String,

    /// Extension of compiled files, without the leading dot.
    pub output_ext: String,

    /// Size of the batch worker pool. `0` picks the available parallelism.
    pub jobs: usize,
}

impl BuildSectionConfig {
    /// Effective worker count for the batch pool.
    pub fn worker_count(&self) -> usize {
        if self.jobs > 0 {
            return self.jobs;
        }
        std::thread::available_parallelism().map_or(4, |n| n.get())
    }
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src"),
            output: PathBuf::from("dist"),
            source_ext: "mjml".to_string(),
            output_ext: "html".to_string(),
            jobs: 0,
        }
    }
}
