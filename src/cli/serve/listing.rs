//! Directory listing page.

use std::fs;
use std::io;
use std::path::Path;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::utils::html::escape;

/// Characters escaped in listing links.
const LINK_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// One row of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    name: String,
    is_dir: bool,
}

/// Render an HTML listing of `dir`, whose URL path is `url_path`
/// (already normalized, without leading or trailing slashes).
pub fn render_listing(dir: &Path, url_path: &str) -> io::Result<String> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_dir = entry.file_type()?.is_dir();
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }
    sort_entries(&mut entries);

    let base = if url_path.is_empty() {
        "/".to_string()
    } else {
        format!("/{url_path}/")
    };

    let mut rows = String::new();
    if !url_path.is_empty() {
        let parent = match url_path.rsplit_once('/') {
            Some((parent, _)) => format!("/{parent}/"),
            None => "/".to_string(),
        };
        rows.push_str(&format!(
            "<li><a href=\"{}\">../</a></li>\n",
            escape(&parent)
        ));
    }
    for entry in &entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let href = format!("{base}{}{suffix}", utf8_percent_encode(&entry.name, LINK_SET));
        rows.push_str(&format!(
            "<li><a href=\"{}\">{}{suffix}</a></li>\n",
            escape(&href),
            escape(&entry.name)
        ));
    }

    let title = escape(&base);
    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Index of {title}</title>\n</head>\n<body>\n\
         <h1>Index of {title}</h1>\n<ul>\n{rows}</ul>\n</body>\n</html>\n"
    ))
}

/// Directories first, then by name.
fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
}
