//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Failures loading `mjml-build.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid config file")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Validation(String),
}
