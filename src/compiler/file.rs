//! Per-file compile and delete.
//!
//! Both operations swallow their own errors after logging them, so one bad
//! file never aborts a batch or the watch loop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{CompileContext, Issue};
use crate::utils::plural_count;
use crate::{debug, error, log, warn};

/// Compile one source file into the output tree.
///
/// Returns the written output path, or `None` if the file failed (the
/// failure has already been logged).
pub fn compile_file(ctx: &CompileContext, source: &Path) -> Option<PathBuf> {
    match try_compile(ctx, source) {
        Ok(output) => {
            log!(
                "mjml";
                "{} -> {}",
                ctx.config.root_relative(source).display(),
                ctx.config.root_relative(&output).display()
            );
            Some(output)
        }
        Err(e) => {
            error!("mjml"; "Failed to compile {}: {:#}", source.display(), e);
            None
        }
    }
}

fn try_compile(ctx: &CompileContext, source: &Path) -> Result<PathBuf> {
    let template = fs::read_to_string(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;

    let compiled = ctx.compiler.compile(&template, source)?;
    report_issues(ctx, source, &compiled.issues);

    let output = ctx.paths().resolve(source)?;
    fs::create_dir_all(&output.dir)
        .with_context(|| format!("Failed to create {}", output.dir.display()))?;
    fs::write(&output.file, compiled.html)
        .with_context(|| format!("Failed to write {}", output.file.display()))?;

    Ok(output.file)
}

fn report_issues(ctx: &CompileContext, source: &Path, issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    warn!(
        "mjml";
        "{} while compiling {}",
        plural_count(issues.len(), "issue"),
        ctx.config.root_relative(source).display()
    );
    for issue in issues {
        warn!("mjml"; "- {}", issue.display_text());
    }
}

/// Delete the output of a removed source file.
///
/// Returns `true` if an output file was actually removed. A missing output
/// is a no-op; other failures are logged.
pub fn remove_output(ctx: &CompileContext, source: &Path) -> bool {
    let output = match ctx.paths().resolve(source) {
        Ok(output) => output,
        Err(e) => {
            error!("mjml"; "Failed to remove output of {}: {}", source.display(), e);
            return false;
        }
    };

    match fs::remove_file(&output.file) {
        Ok(()) => {
            log!("mjml"; "removed {}", ctx.config.root_relative(&output.file).display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("mjml"; "no output to remove for {}", source.display());
            false
        }
        Err(e) => {
            error!("mjml"; "Failed to remove {}: {}", output.file.display(), e);
            false
        }
    }
}
