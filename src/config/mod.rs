//! Project configuration management for `mjml-build.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── compiler   # [compiler]
//! │   ├── serve      # [serve]
//! │   └── watch      # [watch]
//! ├── error          # ConfigError
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! The config file is optional. Without it every field takes the default,
//! which reproduces the conventional `src/*.mjml` -> `dist/*.html` layout.

mod error;
mod section;

use error::ConfigError;
use section::{BuildSectionConfig, ServeConfig, WatchConfig};

pub use section::{CompilerConfig, ValidationLevel};

use crate::compiler::PathResolver;
use crate::warn;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "mjml-build.toml";

/// Environment variable that forces verbose output.
pub const VERBOSE_ENV: &str = "MJML_BUILD_VERBOSE";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing mjml-build.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Working directory all relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Print debug output
    pub verbose: bool,

    /// Build paths and worker pool
    pub build: BuildSectionConfig,

    /// External compiler command
    pub compiler: CompilerConfig,

    /// Preview server settings
    pub serve: ServeConfig,

    /// Watcher timing
    pub watch: WatchConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            verbose: false,
            build: BuildSectionConfig::default(),
            compiler: CompilerConfig::default(),
            serve: ServeConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration for a project rooted at the working directory.
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_from(&cwd)
    }

    /// Load configuration for a project rooted at `root`.
    ///
    /// A missing config file yields the defaults.
    pub fn load_from(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };

        config.finalize(root);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        warn!("config"; "unknown fields in {} (ignored):", display_path);
        for field in fields {
            warn!("config"; "- {}", field);
        }
    }

    /// Resolve paths against `root` and normalize extensions.
    fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        self.build.source = self.root_join(&self.build.source);
        self.build.output = self.root_join(&self.build.output);
        self.build.source_ext = normalize_ext(&self.build.source_ext);
        self.build.output_ext = normalize_ext(&self.build.output_ext);

        if std::env::var_os(VERBOSE_ENV).is_some_and(|v| !v.is_empty() && v != "0") {
            self.verbose = true;
        }
    }

    /// Reject settings the build cannot work with.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.build.source_ext.is_empty() || self.build.output_ext.is_empty() {
            return Err(ConfigError::Validation(
                "build.source_ext and build.output_ext must not be empty".into(),
            ));
        }
        if self.build.source == self.build.output {
            return Err(ConfigError::Validation(format!(
                "build.source and build.output both point to {}",
                self.build.source.display()
            )));
        }
        if self.compiler.command.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "compiler.command must name a program".into(),
            ));
        }
        if self.watch.poll_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.poll_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Join a path with the root directory (absolute paths pass through).
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Get path relative to the root, for display
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Path resolver mapping source files to their outputs.
    pub fn paths(&self) -> PathResolver<'_> {
        PathResolver::new(
            &self.build.source,
            &self.build.output,
            &self.build.source_ext,
            &self.build.output_ext,
        )
    }

    /// Default config rooted at `root`, used by tests that build on disk.
    #[cfg(test)]
    pub fn for_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.finalize(root);
        config
    }
}

/// Strip a leading dot so `.mjml` and `mjml` are equivalent.
fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

/// Parse config from a TOML snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
