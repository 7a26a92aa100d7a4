//! onepage Core Library
//!
//! Core types, configuration, and error handling for the onepage site renderer.

pub mod config;
pub mod content;
pub mod error;
pub mod paths;

pub use config::Config;
pub use content::Content;
pub use error::{CoreError, Result};
pub use paths::{SitePaths, SourceSet};
