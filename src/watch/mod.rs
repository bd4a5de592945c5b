//! Watch mode: recompile sources as they change.
//!
//! ```text
//! notify -> channel -> WatchScope (per source file) -> Debouncer -> compile / remove
//! ```
//!
//! The watcher only reports changes made after it starts; the initial
//! population is left to the batch build. Backends report a directory moved
//! in or out of the tree as one event for the directory, so `WatchScope`
//! expands it into per-file changes.

mod debouncer;
mod types;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::cli::build::source_label;
use crate::compiler::{
    CompileContext, PathResolver, collect_orphaned_sources, collect_source_files, compile_file,
    remove_output,
};
use crate::utils::path::{normalize_path, rebase};
use crate::{debug, error, log};

use debouncer::Debouncer;
use types::{Action, ChangeKind, event_changes};

/// Watch the source root until Ctrl+C.
pub fn watch(ctx: CompileContext) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mjml-watch")
        .build()
        .context("Failed to start watch runtime")?;

    runtime.block_on(run_until(ctx, crate::core::is_shutdown))
}

/// Event loop. Returns once `stop` reports true, checked every poll tick.
async fn run_until(ctx: CompileContext, stop: impl Fn() -> bool) -> Result<()> {
    let config = &ctx.config;
    let source = &config.build.source;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .context("Failed to create file watcher")?;
    watcher
        .watch(source, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", source.display()))?;

    log!("mjml"; "Watching for changes in {}", source_label(config));

    let scope = WatchScope::new(source);
    let mut debouncer = Debouncer::new(config.watch.stability());
    let mut ticker = tokio::time::interval(config.watch.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !stop() {
        tokio::select! {
            Some(res) = rx.recv() => match res {
                Ok(event) => {
                    let now = Instant::now();
                    let paths = ctx.paths();
                    for (path, kind) in event_changes(&event) {
                        for (path, kind) in scope.expand(&path, kind, &paths) {
                            debouncer.add(path, kind, now);
                        }
                    }
                }
                Err(e) => error!("watch"; "Watcher error: {}", e),
            },
            _ = ticker.tick() => {
                if !debouncer.is_empty() {
                    for (path, kind) in debouncer.poll(Instant::now()) {
                        let ctx = ctx.clone();
                        tokio::task::spawn_blocking(move || apply(&ctx, &path, kind));
                    }
                }
            }
        }
    }

    drop(watcher);
    debug!("watch"; "stopped");
    Ok(())
}

/// Run the handler for one settled change.
fn apply(ctx: &CompileContext, path: &Path, kind: ChangeKind) {
    debug!("watch"; "{}: {}", kind.label(), ctx.config.root_relative(path).display());
    match kind.action() {
        Action::Compile => {
            compile_file(ctx, path);
        }
        Action::Remove => {
            remove_output(ctx, path);
        }
    }
}

/// Maps watcher paths onto the configured source root and turns them into
/// per-source-file changes.
struct WatchScope {
    root: PathBuf,
    /// Canonical form of `root`, some backends report paths this way.
    canonical: PathBuf,
}

impl WatchScope {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            canonical: normalize_path(root),
        }
    }

    /// Source file changes implied by one watcher change.
    ///
    /// - a source file passes through
    /// - a directory appearing yields every source file inside it
    /// - a removed path also yields the sources of any outputs left in its
    ///   mirrored output directory
    ///
    /// Paths outside the source root yield nothing.
    fn expand(
        &self,
        path: &Path,
        kind: ChangeKind,
        paths: &PathResolver<'_>,
    ) -> Vec<(PathBuf, ChangeKind)> {
        let Some(path) = self.rebase(path) else {
            return Vec::new();
        };

        match kind {
            ChangeKind::Removed => {
                let mut changes = Vec::new();
                if paths.is_source_file(&path) {
                    changes.push((path.clone(), ChangeKind::Removed));
                }
                match collect_orphaned_sources(&path, paths) {
                    Ok(orphans) => {
                        changes.extend(orphans.into_iter().map(|source| (source, ChangeKind::Removed)));
                    }
                    Err(e) => {
                        error!("watch"; "Failed to check outputs of {}: {:#}", path.display(), e);
                    }
                }
                changes
            }
            ChangeKind::Created if path.is_dir() => match collect_source_files(&path, paths) {
                Ok(files) => files
                    .into_iter()
                    .map(|file| (file, ChangeKind::Created))
                    .collect(),
                Err(e) => {
                    error!("watch"; "Failed to scan {}: {:#}", path.display(), e);
                    Vec::new()
                }
            },
            _ if paths.is_source_file(&path) && !path.is_dir() => vec![(path, kind)],
            _ => Vec::new(),
        }
    }

    fn rebase(&self, path: &Path) -> Option<PathBuf> {
        if path.starts_with(&self.root) {
            Some(path.to_path_buf())
        } else {
            rebase(path, &self.canonical, &self.root)
        }
    }
}
