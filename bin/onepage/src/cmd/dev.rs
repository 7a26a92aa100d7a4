//! Dev command - rebuild on change and serve the output

use std::{net::SocketAddr, path::Path};

use color_eyre::eyre::{Result, WrapErr};
use onepage_core::{Config, SitePaths};
use onepage_generator::{BuildStats, Builder};
use tokio_util::sync::CancellationToken;

use crate::{server::ContentServer, watch::SourceWatcher};

/// Run the dev command.
///
/// Builds once, then serves the output directory while rebuilding on every
/// change to the content or template. Returns after Ctrl-C.
pub async fn run(
    root: &Path,
    config_path: &Path,
    host: Option<&str>,
    port: Option<u16>,
    open_browser: bool,
) -> Result<()> {
    tracing::info!(?root, ?config_path, ?host, ?port, "Starting development mode");

    let mut config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    if let Some(h) = host {
        config.serve.host = h.to_string();
    }
    if let Some(p) = port {
        config.serve.port = p;
    }

    let session = DevSession::start(root, &config).await?;
    let url = format!("http://{}", session.local_addr());

    println!();
    println!("  Dev server running at {url}");
    println!("  Watching {} for changes", session.watched().join(", "));
    println!("  Press Ctrl+C to stop");
    println!();

    if open_browser {
        let _ = open::that(&url);
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    session.run(shutdown).await?;

    println!();
    println!("  Server stopped");
    Ok(())
}

/// Wait for Ctrl-C, then cancel `shutdown`.
async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Shutdown signal received, stopping server...");
            shutdown.cancel();
        }
        Err(e) => {
            // Without a handler the process is stopped by the default signal action.
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    }
}

/// A started development session: initial build done, port bound, watcher running.
pub struct DevSession {
    paths: SitePaths,
    server: ContentServer,
    watcher: SourceWatcher,
}

impl DevSession {
    /// Build once, bind the server, then start watching.
    ///
    /// A failed initial build or an occupied port is returned as an error
    /// before any watcher is started.
    pub async fn start(root: &Path, config: &Config) -> Result<Self> {
        let paths = config.paths(root);
        let builder = Builder::new(paths.clone());

        println!("  Building site...");
        let stats = builder.build().wrap_err("Initial build failed")?;
        print_build_stats(&stats, &paths);

        let addr = format!("{}:{}", config.serve.host, config.serve.port);
        let server = ContentServer::bind(&paths.output_dir, &addr)
            .await
            .wrap_err_with(|| format!("Failed to start server on {addr}"))?
            .with_grace_period(config.grace_period());

        let watcher = SourceWatcher::start(builder.source_set(), config.debounce(), move || {
            builder.build()
        })?;

        Ok(Self {
            paths,
            server,
            watcher,
        })
    }

    /// Address the server is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// File names being watched, for display.
    #[must_use]
    pub fn watched(&self) -> Vec<String> {
        self.paths
            .source_set()
            .file_names()
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    /// Serve until `shutdown` fires, then stop the watcher.
    ///
    /// The watcher is stopped even if the server fails.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let Self {
            server,
            mut watcher,
            ..
        } = self;

        let served = server.run(shutdown).await;

        tokio::task::spawn_blocking(move || watcher.stop())
            .await
            .wrap_err("Watcher shutdown failed")?;

        served.wrap_err("Server error")
    }
}

/// Print build statistics in a user-friendly format.
fn print_build_stats(stats: &BuildStats, paths: &SitePaths) {
    println!(
        "  ✓ Built {} ({} bytes) in {}ms",
        paths.output_file.display(),
        stats.bytes,
        stats.duration_ms
    );
    if stats.asset_copied {
        if let Some(asset) = &paths.asset {
            println!("  ✓ Copied {}", asset.display());
        }
    }
}
