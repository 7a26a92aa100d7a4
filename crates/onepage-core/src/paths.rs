//! Resolved project paths and the set of watched sources.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// Every path a build touches, resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    /// Structured content document.
    pub content: PathBuf,
    /// HTML template.
    pub template: PathBuf,
    /// Directory served in development mode.
    pub output_dir: PathBuf,
    /// Rendered page inside `output_dir`.
    pub output_file: PathBuf,
    /// Optional file copied into `output_dir`.
    pub asset: Option<PathBuf>,
}

impl SitePaths {
    /// The sources whose modification triggers a rebuild.
    #[must_use]
    pub fn source_set(&self) -> SourceSet {
        SourceSet::new([self.content.clone(), self.template.clone()])
    }
}

/// Ordered, immutable set of watched source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    paths: Vec<PathBuf>,
}

impl SourceSet {
    /// Create a source set, dropping duplicates while keeping order.
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for path in paths {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        Self { paths: unique }
    }

    /// Watched paths in insertion order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Distinct parent directories, the level at which the OS watch is placed.
    #[must_use]
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for path in &self.paths {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// File names of the watched sources.
    pub fn file_names(&self) -> impl Iterator<Item = &OsStr> {
        self.paths.iter().filter_map(|p| p.file_name())
    }

    /// Whether a changed path refers to one of the watched files.
    ///
    /// Matches on exact file name, so `old.content.yaml` does not match
    /// `content.yaml`.
    #[must_use]
    pub fn matches(&self, changed: &Path) -> bool {
        changed
            .file_name()
            .is_some_and(|name| self.file_names().any(|watched| watched == name))
    }
}
