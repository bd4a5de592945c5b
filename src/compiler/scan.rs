//! Source tree discovery.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jwalk::WalkDir;

use super::PathResolver;

/// Collect every source file at or below `dir`.
///
/// A missing `dir` yields an empty list; any other access failure is an
/// error. The walk is iterative, ordering is not guaranteed.
pub fn collect_source_files(dir: &Path, paths: &PathResolver<'_>) -> Result<Vec<PathBuf>> {
    match std::fs::metadata(dir) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", dir.display())),
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).skip_hidden(false) {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if paths.is_source_file(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

/// Sources under `source_dir` whose outputs still exist but which are gone
/// themselves, e.g. after `source_dir` was moved away.
///
/// Walks the output directory mirroring `source_dir`; a missing mirror
/// yields an empty list.
pub fn collect_orphaned_sources(source_dir: &Path, paths: &PathResolver<'_>) -> Result<Vec<PathBuf>> {
    let output_dir = paths.mirror_dir(source_dir)?;
    match std::fs::metadata(&output_dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(Vec::new()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", output_dir.display())),
    }

    let mut orphans = Vec::new();
    for entry in WalkDir::new(&output_dir).skip_hidden(false) {
        let entry = entry.with_context(|| format!("Failed to scan {}", output_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(source) = paths.source_for(&entry.path())
            && !source.exists()
        {
            orphans.push(source);
        }
    }

    Ok(orphans)
}
