use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;

/// Size and mtime of a regular file, used to detect writes still in
/// progress. `None` when the path is gone or is not a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug)]
struct Pending {
    kind: ChangeKind,
    last_change: Instant,
    fingerprint: Option<Fingerprint>,
}

/// Per-file stability debouncer.
///
/// A path is released only once it has gone `stability` without a new event
/// and without its size or mtime changing between polls.
pub(super) struct Debouncer {
    pending: FxHashMap<PathBuf, Pending>,
    stability: Duration,
}

impl Debouncer {
    pub(super) fn new(stability: Duration) -> Self {
        Self {
            pending: FxHashMap::default(),
            stability,
        }
    }

    /// Record a change, merging with whatever is already pending:
    /// - anything + Removed -> Removed
    /// - Removed + Created/Modified -> the new kind (file was restored)
    /// - otherwise the first kind wins
    ///
    /// Every event restarts the path's quiet period.
    pub(super) fn add(&mut self, path: PathBuf, kind: ChangeKind, now: Instant) {
        let fingerprint = Fingerprint::of(&path);

        if let Some(pending) = self.pending.get_mut(&path) {
            let merged = match (pending.kind, kind) {
                (_, ChangeKind::Removed) => ChangeKind::Removed,
                (ChangeKind::Removed, new) => new,
                (first, _) => first,
            };
            crate::debug!(
                "watch";
                "{}+{} -> {}: {}",
                pending.kind.label(),
                kind.label(),
                merged.label(),
                path.display()
            );
            pending.kind = merged;
            pending.last_change = now;
            pending.fingerprint = fingerprint;
            return;
        }

        crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
        self.pending.insert(
            path,
            Pending {
                kind,
                last_change: now,
                fingerprint,
            },
        );
    }

    /// Release every path that has been stable for the quiet period.
    ///
    /// Files that still exist are re-stat'ed; a changed size or mtime restarts
    /// their timer. A compile-kind change whose file is gone by release time
    /// is released as a removal.
    pub(super) fn poll(&mut self, now: Instant) -> Vec<(PathBuf, ChangeKind)> {
        let stability = self.stability;
        let mut ready = Vec::new();

        self.pending.retain(|path, pending| {
            if pending.kind != ChangeKind::Removed {
                let current = Fingerprint::of(path);
                if current != pending.fingerprint {
                    pending.fingerprint = current;
                    pending.last_change = now;
                    return true;
                }
            }

            if now.saturating_duration_since(pending.last_change) < stability {
                return true;
            }

            let kind = match (pending.kind, pending.fingerprint) {
                (ChangeKind::Removed, _) | (_, None) => ChangeKind::Removed,
                (kind, Some(_)) => kind,
            };
            ready.push((path.clone(), kind));
            false
        });

        ready
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
