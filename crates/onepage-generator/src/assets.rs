//! Auxiliary asset copying.
//!
//! A project may name one extra file (a PDF résumé, a favicon) that is copied
//! next to the rendered page on every build.

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::output::copy_atomic;

/// The asset exists but could not be copied.
#[derive(Debug, Error)]
#[error("failed to copy asset to {}: {source}", dest.display())]
pub struct AssetError {
    /// Where the copy was headed.
    pub dest: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Outcome of copying the auxiliary asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    /// No asset is configured.
    NotConfigured,
    /// The asset is configured but absent on disk.
    Missing(PathBuf),
    /// The asset was copied to the contained destination.
    Copied(PathBuf),
}

impl AssetOutcome {
    /// Whether a file was copied.
    #[must_use]
    pub fn copied(&self) -> bool {
        matches!(self, Self::Copied(_))
    }
}

/// Copy `asset` into `dest_dir` under its own file name.
///
/// An absent source is not an error.
pub fn copy_asset(asset: Option<&Path>, dest_dir: &Path) -> Result<AssetOutcome, AssetError> {
    let Some(source) = asset else {
        return Ok(AssetOutcome::NotConfigured);
    };

    if !source.is_file() {
        debug!(path = %source.display(), "asset not present, skipping");
        return Ok(AssetOutcome::Missing(source.to_path_buf()));
    }

    let Some(name) = source.file_name() else {
        return Err(AssetError {
            dest: dest_dir.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset path has no file name: {}", source.display()),
            ),
        });
    };

    let dest = dest_dir.join(name);
    if let Err(err) = copy_atomic(source, &dest) {
        return Err(AssetError { dest, source: err });
    }
    info!(src = %source.display(), dest = %dest.display(), "copied asset");

    Ok(AssetOutcome::Copied(dest))
}
