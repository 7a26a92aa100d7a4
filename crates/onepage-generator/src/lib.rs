//! onepage Generator Library
//!
//! Renders one content document through one template into one page.
//!
//! # Modules
//!
//! - [`template`] - Mustache-style template parsing and rendering
//! - [`output`] - Atomic file replacement
//! - [`assets`] - Auxiliary asset copying
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod output;
pub mod template;

pub use assets::{AssetError, AssetOutcome, copy_asset};
pub use build::{BuildError, BuildStats, Builder};
pub use template::{RenderError, Template, render};
