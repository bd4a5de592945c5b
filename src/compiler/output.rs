//! Source path to output path mapping.
//!
//! The mapping mirrors the source tree under the output root and swaps the
//! extension: `src/sub/welcome.mjml` -> `dist/sub/welcome.html`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A source file that cannot be mapped into the output tree.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("`{path}` is not inside the source directory `{root}`")]
    OutsideSource { path: PathBuf, root: PathBuf },

    #[error("`{0}` has no file name")]
    NoFileName(PathBuf),
}

/// Where the compiled form of one source file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Directory that must exist before writing.
    pub dir: PathBuf,
    /// Output file inside `dir`.
    pub file: PathBuf,
}

/// Pure mapping from source root to output root. No I/O.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    source_root: &'a Path,
    output_root: &'a Path,
    source_ext: &'a str,
    output_ext: &'a str,
}

impl<'a> PathResolver<'a> {
    pub const fn new(
        source_root: &'a Path,
        output_root: &'a Path,
        source_ext: &'a str,
        output_ext: &'a str,
    ) -> Self {
        Self {
            source_root,
            output_root,
            source_ext,
            output_ext,
        }
    }

    /// Whether the file name of `path` ends in `.<source_ext>`.
    ///
    /// Matched on the name suffix, so a file named just `.mjml` counts.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| strip_extension(name, self.source_ext).is_some())
    }

    /// Resolve the output directory and file for a source file.
    pub fn resolve(&self, source: &Path) -> Result<OutputPaths, PathError> {
        let relative = self.relative(source)?;

        let stem = relative
            .file_name()
            .map(|name| strip_extension(name, self.source_ext).unwrap_or(name))
            .ok_or_else(|| PathError::NoFileName(source.to_path_buf()))?;

        let dir = match relative.parent() {
            Some(parent) => self.output_root.join(parent),
            None => self.output_root.to_path_buf(),
        };

        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(self.output_ext);
        let file = dir.join(file_name);

        Ok(OutputPaths { dir, file })
    }

    /// Output directory mirroring `source_dir`.
    pub fn mirror_dir(&self, source_dir: &Path) -> Result<PathBuf, PathError> {
        Ok(self.output_root.join(self.relative(source_dir)?))
    }

    /// Source file that `output` is compiled from, if `output` is an output
    /// file at all. Inverse of [`resolve`](Self::resolve).
    pub fn source_for(&self, output: &Path) -> Option<PathBuf> {
        let relative = output.strip_prefix(self.output_root).ok()?;
        let stem = strip_extension(relative.file_name()?, self.output_ext)?;

        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(self.source_ext);

        let dir = match relative.parent() {
            Some(parent) => self.source_root.join(parent),
            None => self.source_root.to_path_buf(),
        };
        Some(dir.join(file_name))
    }

    fn relative<'p>(&self, path: &'p Path) -> Result<&'p Path, PathError> {
        path.strip_prefix(self.source_root)
            .map_err(|_| PathError::OutsideSource {
                path: path.to_path_buf(),
                root: self.source_root.to_path_buf(),
            })
    }
}

/// `name` without its trailing `.<ext>`, or `None` if it doesn't end in one.
fn strip_extension<'n>(name: &'n OsStr, ext: &str) -> Option<&'n OsStr> {
    match name.to_str() {
        Some(name) => name
            .strip_suffix(ext)?
            .strip_suffix('.')
            .map(OsStr::new),
        // Non UTF-8 names fall back to the `Path` notion of an extension
        None => {
            let path = Path::new(name);
            if path.extension()? == ext {
                path.file_stem()
            } else {
                None
            }
        }
    }
}
