//! onepage CLI Library
//!
//! This library provides the development-mode machinery behind the `onepage`
//! binary: the one-shot build command, the source watcher, and the content
//! server.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, dev)
//! - [`server`] - Static content server with no-cache responses
//! - [`watch`] - Source watcher with debounced rebuilds
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use onepage::cmd;
//!
//! // Build the site once
//! cmd::build::run(Path::new("."), Path::new("onepage.toml"), None).unwrap();
//! ```

pub mod cmd;
pub mod server;
pub mod watch;

// Re-export core types for convenience
pub use onepage_core::{Config, SitePaths, SourceSet};
pub use onepage_generator::{BuildError, BuildStats, Builder, RenderError};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
