//! URL to filesystem path resolution.
//!
//! Paths are served literally: no extension stripping, no rewriting.

use std::path::{Path, PathBuf};

/// What a request URL points at under the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A regular file to send.
    File(PathBuf),
    /// A directory without `index.html`, rendered as a listing.
    Directory(PathBuf),
}

/// Resolve a request URL against `serve_root`.
///
/// Returns `None` for missing paths and for anything escaping the root.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<Target> {
    let clean = normalize_url(url);

    // Reject paths with suspicious patterns early
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    // Canonicalize to resolve symlinks and verify path is under serve_root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(Target::File(canonical));
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(Target::File(index));
        }
        return Some(Target::Directory(canonical));
    }

    None
}

/// Normalize URL: decode, strip query string and fragment, trim slashes
pub fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.trim_matches('/').to_string()
}
