//! Build orchestration.
//!
//! Reads the content document and the template, renders the page and
//! publishes it to the output directory.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Instant,
};

use onepage_core::{Content, CoreError, SitePaths, SourceSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    assets::{AssetError, copy_asset},
    output::stage,
    template::{RenderError, Template},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A required source file does not exist.
    #[error("required input not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// A source file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The content document is not valid.
    #[error("content error: {0}")]
    Content(#[from] CoreError),

    /// The template does not fit the content.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The output could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The auxiliary asset could not be copied.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl BuildError {
    /// Whether this error is caused by an absent source file.
    #[must_use]
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingInput { .. })
    }
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Size of the rendered page in bytes.
    pub bytes: usize,

    /// Whether the auxiliary asset was copied.
    pub asset_copied: bool,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Single-page builder.
///
/// Holds only paths; every call to [`Builder::build`] re-reads its inputs.
#[derive(Debug, Clone)]
pub struct Builder {
    paths: SitePaths,
}

impl Builder {
    /// Create a new builder.
    #[must_use]
    pub fn new(paths: SitePaths) -> Self {
        Self { paths }
    }

    /// Paths this builder reads and writes.
    #[must_use]
    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    /// Sources whose change should trigger a rebuild.
    #[must_use]
    pub fn source_set(&self) -> SourceSet {
        self.paths.source_set()
    }

    /// Execute the build.
    ///
    /// Nothing is written unless rendering succeeds. The page is staged first
    /// and only renamed into place once the asset copy has succeeded, so a
    /// failed build leaves the previous page intact.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();

        info!(
            content = %self.paths.content.display(),
            template = %self.paths.template.display(),
            output = %self.paths.output_file.display(),
            "starting build"
        );

        // 1. Both inputs must exist
        require(&self.paths.content)?;
        require(&self.paths.template)?;

        // 2. Load inputs
        let content = Content::load(&self.paths.content).map_err(|e| match e {
            CoreError::Io(source) => BuildError::Read {
                path: self.paths.content.clone(),
                source,
            },
            other => BuildError::Content(other),
        })?;
        let template_source =
            fs::read_to_string(&self.paths.template).map_err(|source| BuildError::Read {
                path: self.paths.template.clone(),
                source,
            })?;

        // 3. Render in memory
        let template = Template::parse(&template_source)?;
        let html = template.render(content.value())?;
        debug!(bytes = html.len(), "rendered page");

        // 4. Stage the page beside its target
        let page = stage(&self.paths.output_file, html.as_bytes()).map_err(|source| {
            BuildError::Write {
                path: self.paths.output_file.clone(),
                source,
            }
        })?;

        // 5. Auxiliary asset; on failure the staged page is discarded
        let asset = copy_asset(self.paths.asset.as_deref(), &self.paths.output_dir)?;

        // 6. Publish
        page.commit().map_err(|source| BuildError::Write {
            path: self.paths.output_file.clone(),
            source,
        })?;

        let stats = BuildStats {
            bytes: html.len(),
            asset_copied: asset.copied(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            bytes = stats.bytes,
            asset_copied = stats.asset_copied,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }
}

fn require(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BuildError::MissingInput {
            path: path.to_path_buf(),
        })
    }
}
