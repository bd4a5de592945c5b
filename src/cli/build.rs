//! One full build pass over the source tree.
//!
//! Pipeline: check source root -> ensure output root -> scan -> compile (pooled)

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;
use thiserror::Error;

use crate::compiler::{CompileContext, collect_source_files, compile_file};
use crate::config::ProjectConfig;
use crate::utils::plural_count;
use crate::{debug, warn};

/// Source root problems that stop the run before anything is built.
#[derive(Debug, Error)]
pub enum SourceRootError {
    #[error("Missing {} directory. Create it before running mjml-build.", .0.display())]
    Missing(PathBuf),

    #[error("{} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to access {}", .0.display())]
    Io(PathBuf, #[source] io::Error),
}

/// Verify the source root exists and is a directory.
pub fn ensure_source_dir(config: &ProjectConfig) -> Result<(), SourceRootError> {
    let source = &config.build.source;
    let display = config.root_relative(source);

    match fs::metadata(source) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SourceRootError::NotADirectory(display)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SourceRootError::Missing(display)),
        Err(e) => Err(SourceRootError::Io(display, e)),
    }
}

/// Outcome of a build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub found: usize,
    pub compiled: usize,
}

impl BuildSummary {
    pub const fn failed(&self) -> usize {
        self.found - self.compiled
    }
}

/// Compile every source file into the output tree.
///
/// Per-file failures are logged by [`compile_file`] and only counted here;
/// this fails only if the output root can't be created or the scan fails.
pub fn build_all(ctx: &CompileContext) -> Result<BuildSummary> {
    let config = &ctx.config;
    let output = &config.build.output;

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let files = collect_source_files(&config.build.source, &ctx.paths())?;
    if files.is_empty() {
        warn!(
            "mjml";
            "No MJML files found under {}",
            config.root_relative(&config.build.source).display()
        );
        return Ok(BuildSummary::default());
    }

    let workers = config.build.worker_count();
    debug!("build"; "compiling {} with {} workers", plural_count(files.len(), "file"), workers);

    let compiled = compile_all(ctx, &files, workers)?;
    let summary = BuildSummary {
        found: files.len(),
        compiled,
    };

    if summary.failed() > 0 {
        warn!("mjml"; "{} failed to compile", plural_count(summary.failed(), "file"));
    }
    Ok(summary)
}

/// Compile `files` on a bounded pool, returning how many succeeded.
fn compile_all(ctx: &CompileContext, files: &[PathBuf], workers: usize) -> Result<usize> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("mjml-compile-{i}"))
        .build()
        .context("Failed to create compile worker pool")?;

    Ok(pool.install(|| {
        files
            .par_iter()
            .filter(|file| compile_file(ctx, file.as_path()).is_some())
            .count()
    }))
}

/// Display helper for log lines about the source root.
pub fn source_label(config: &ProjectConfig) -> String {
    format!(
        "{}/**/*.{}",
        config.root_relative(&config.build.source).display(),
        config.build.source_ext
    )
}
