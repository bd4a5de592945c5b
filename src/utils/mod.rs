//! Shared helpers: process execution, HTML escaping, MIME lookup, paths.

pub mod exec;
pub mod html;
pub mod mime;
pub mod path;

/// Format count with noun, handling pluralization
///
/// - `plural_count(0, "file")` -> `"0 files"`
/// - `plural_count(1, "issue")` -> `"1 issue"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
