//! Build command - renders the site once

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use onepage_core::Config;
use onepage_generator::Builder;

/// Run the build command.
///
/// Renders the content through the template into the output directory.
pub fn run(root: &Path, config_path: &Path, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?root, ?config_path, ?output, "Starting build");

    let mut config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    // Override output directory if specified
    if let Some(dir) = output {
        config.build.output_dir = dir.to_string_lossy().to_string();
    }

    tracing::debug!(?config, "Loaded configuration");

    let paths = config.paths(root);
    let output_file = paths.output_file.clone();
    let stats = Builder::new(paths).build().wrap_err("Build failed")?;

    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Size:       {} bytes", stats.bytes);
    if stats.asset_copied {
        println!("  Asset:      copied");
    }
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", output_file.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}
