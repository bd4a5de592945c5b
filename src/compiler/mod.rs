//! Template compilation.
//!
//! ```text
//! scan (collect_source_files) -> compile_file -> TemplateCompiler -> dist/
//!                                remove_output <- watcher unlink
//! ```
//!
//! The template language itself is handled by an external compiler behind
//! the [`TemplateCompiler`] trait; this module only moves text between the
//! source tree, the compiler and the output tree.

mod file;
mod mjml;
mod output;
mod scan;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::ProjectConfig;

pub use file::{compile_file, remove_output};
pub use mjml::MjmlCompiler;
pub use output::PathResolver;
pub use scan::{collect_orphaned_sources, collect_source_files};

/// Result of compiling one template.
#[derive(Debug, Clone, Default)]
pub struct Compiled {
    /// Rendered markup.
    pub html: String,
    /// Non-fatal diagnostics reported by the compiler.
    pub issues: Vec<Issue>,
}

/// A diagnostic about one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Message with location context, when the compiler provides one.
    pub formatted: Option<String>,
    /// Plain message.
    pub message: String,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            formatted: None,
            message: message.into(),
        }
    }

    pub fn with_formatted(mut self, formatted: impl Into<String>) -> Self {
        self.formatted = Some(formatted.into());
        self
    }

    /// Text to show the user: the formatted message, else the plain one.
    pub fn display_text(&self) -> &str {
        self.formatted.as_deref().unwrap_or(&self.message)
    }
}

/// External template-to-markup compiler.
///
/// `path` is the originating file, passed for diagnostics and include
/// resolution; the template text is authoritative.
pub trait TemplateCompiler: Send + Sync {
    fn compile(&self, template: &str, path: &Path) -> Result<Compiled>;
}

/// Shared state for compile and delete operations.
///
/// Cheap to clone; handed to worker threads and watcher tasks.
#[derive(Clone)]
pub struct CompileContext {
    pub config: Arc<ProjectConfig>,
    pub compiler: Arc<dyn TemplateCompiler>,
}

impl CompileContext {
    pub fn new(config: Arc<ProjectConfig>, compiler: Arc<dyn TemplateCompiler>) -> Self {
        Self { config, compiler }
    }

    pub fn paths(&self) -> PathResolver<'_> {
        self.config.paths()
    }
}
