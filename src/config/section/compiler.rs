//! `[compiler]` section configuration.
//!
//! Selects the MJML command line tool used to render templates.
//!
//! # Example
//!
//! ```toml
//! [compiler]
//! command = ["npx", "mjml"]   # program followed by leading arguments
//! validation = "soft"         # strict | soft | skip
//! ```

use serde::Deserialize;

/// MJML validation level forwarded to the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Fail the file on any validation error.
    Strict,
    /// Report validation errors as diagnostics and still render.
    #[default]
    Soft,
    /// Do not validate.
    Skip,
}

impl ValidationLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Soft => "soft",
            Self::Skip => "skip",
        }
    }
}

/// External compiler settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Program and leading arguments, e.g. `["mjml"]` or `["npx", "mjml"]`.
    pub command: Vec<String>,

    /// Validation level passed as `--config.validationLevel`.
    pub validation: ValidationLevel,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: vec!["mjml".to_string()],
            validation: ValidationLevel::Soft,
        }
    }
}
