use std::path::PathBuf;

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// What to do about a settled change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Action {
    Compile,
    Remove,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    pub(super) fn action(self) -> Action {
        match self {
            Self::Created | Self::Modified => Action::Compile,
            Self::Removed => Action::Remove,
        }
    }
}

/// Flatten a notify event into per-path changes.
///
/// Metadata-only modifications (mtime/atime/chmod) are dropped. Renames
/// become a removal of the old name and a creation of the new one.
pub(super) fn event_changes(event: &notify::Event) -> Vec<(PathBuf, ChangeKind)> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(mode)) => return renamed(&event.paths, mode),
        EventKind::Modify(_) => ChangeKind::Modified,
        _ => return Vec::new(),
    };

    event.paths.iter().map(|path| (path.clone(), kind)).collect()
}

fn renamed(paths: &[PathBuf], mode: RenameMode) -> Vec<(PathBuf, ChangeKind)> {
    match (mode, paths) {
        (RenameMode::From, _) => with_kind(paths, ChangeKind::Removed),
        (RenameMode::To, _) => with_kind(paths, ChangeKind::Created),
        (RenameMode::Both, [from, to]) => vec![
            (from.clone(), ChangeKind::Removed),
            (to.clone(), ChangeKind::Created),
        ],
        // Backends that can't tell the two sides apart
        _ => paths
            .iter()
            .map(|path| {
                let kind = if path.exists() {
                    ChangeKind::Created
                } else {
                    ChangeKind::Removed
                };
                (path.clone(), kind)
            })
            .collect(),
    }
}

fn with_kind(paths: &[PathBuf], kind: ChangeKind) -> Vec<(PathBuf, ChangeKind)> {
    paths.iter().map(|path| (path.clone(), kind)).collect()
}
