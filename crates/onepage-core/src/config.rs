//! Project configuration management.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    paths::SitePaths,
};

/// Default configuration file name, looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "onepage.toml";

/// Main configuration structure for onepage.
///
/// Every section is optional; a project without a configuration file uses
/// `content.yaml` + `template.html` and renders to `dist/index.html`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source files.
    #[serde(default)]
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings.
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Source file configuration, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Structured content document.
    #[serde(default = "default_content")]
    pub content: String,

    /// HTML template with placeholders.
    #[serde(default = "default_template")]
    pub template: String,

    /// Auxiliary file copied next to the output when present. An empty
    /// string disables the copy.
    #[serde(default = "default_asset")]
    pub asset: Option<String>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Name of the rendered file inside the output directory.
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

/// Development server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Minimum interval between accepted rebuilds, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Time given to in-flight requests after shutdown, in milliseconds.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

// Default value functions
fn default_content() -> String {
    "content.yaml".to_string()
}

fn default_template() -> String {
    "template.html".to_string()
}

fn default_asset() -> Option<String> {
    Some("resume.pdf".to_string())
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_output_file() -> String {
    "index.html".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_grace_period_ms() -> u64 {
    5000
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content: default_content(),
            template: default_template(),
            asset: default_asset(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            output_file: default_output_file(),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debounce_ms: default_debounce_ms(),
            grace_period_ms: default_grace_period_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate.
    ///
    /// The file is optional; `ONEPAGE__SECTION__KEY` environment variables
    /// override file values (e.g. `ONEPAGE__SERVE__PORT=9000`).
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("ONEPAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.site.content.trim().is_empty() {
            return Err(CoreError::config("site.content cannot be empty"));
        }

        if self.site.template.trim().is_empty() {
            return Err(CoreError::config("site.template cannot be empty"));
        }

        if self.build.output_file.trim().is_empty() {
            return Err(CoreError::config("build.output_file cannot be empty"));
        }

        if Path::new(&self.build.output_file).components().count() != 1 {
            return Err(CoreError::config(
                "build.output_file must be a file name, not a path",
            ));
        }

        if self.site.asset.as_deref().is_some_and(|a| a.trim().is_empty()) {
            tracing::debug!("site.asset is empty, asset copy disabled");
        }

        Ok(())
    }

    /// Debounce window for the development watcher.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.serve.debounce_ms)
    }

    /// Grace period for in-flight requests on shutdown.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.serve.grace_period_ms)
    }

    /// Resolve every configured path against the project root.
    #[must_use]
    pub fn paths(&self, root: &Path) -> SitePaths {
        let output_dir = root.join(&self.build.output_dir);
        let asset = self
            .site
            .asset
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| root.join(a));

        SitePaths {
            content: root.join(&self.site.content),
            template: root.join(&self.site.template),
            output_file: output_dir.join(&self.build.output_file),
            output_dir,
            asset,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[site]
content = "data/site.yaml"
template = "layout.html"
asset = "resume.pdf"

[build]
output_dir = "public"
output_file = "home.html"

[serve]
host = "0.0.0.0"
port = 9000
debounce_ms = 250
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("onepage.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.content, "data/site.yaml");
        assert_eq!(config.site.template, "layout.html");
        assert_eq!(config.site.asset.as_deref(), Some("resume.pdf"));
        assert_eq!(config.build.output_dir, "public");
        assert_eq!(config.build.output_file, "home.html");
        assert_eq!(config.serve.host, "0.0.0.0");
        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.grace_period(), Duration::from_millis(5000));
    }

    #[test]
    fn test_config_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("onepage.toml");
        std::fs::write(&config_path, "").expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.content, "content.yaml");
        assert_eq!(config.site.template, "template.html");
        assert_eq!(config.site.asset.as_deref(), Some("resume.pdf"));
        assert_eq!(config.build.output_dir, "dist");
        assert_eq!(config.build.output_file, "index.html");
        assert_eq!(config.serve.port, 8000);
        assert_eq!(config.debounce(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_with_env_without_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::load_with_env(&dir.path().join("onepage.toml"))
            .expect("missing file is allowed");

        assert_eq!(config.site.content, "content.yaml");
        assert_eq!(config.build.output_dir, "dist");
    }

    #[test]
    fn test_load_with_env_reads_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("onepage.toml");
        std::fs::write(&config_path, create_test_config()).expect("write");

        let config = Config::load_with_env(&config_path).expect("load config");
        assert_eq!(config.build.output_file, "home.html");
        assert_eq!(config.serve.debounce_ms, 250);
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let config = Config::default();
        let paths = config.paths(Path::new("/site"));

        assert_eq!(paths.content, Path::new("/site/content.yaml"));
        assert_eq!(paths.template, Path::new("/site/template.html"));
        assert_eq!(paths.output_dir, Path::new("/site/dist"));
        assert_eq!(paths.output_file, Path::new("/site/dist/index.html"));
        assert_eq!(paths.asset.as_deref(), Some(Path::new("/site/resume.pdf")));
    }

    #[test]
    fn test_blank_asset_is_ignored() {
        let mut config = Config::default();
        config.site.asset = Some("  ".to_string());
        assert!(config.paths(Path::new("/site")).asset.is_none());
    }

    #[test]
    fn test_empty_asset_in_file_disables_copy() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("onepage.toml");
        std::fs::write(&config_path, "[site]\nasset = \"\"\n").expect("write");

        let config = Config::load(&config_path).expect("load config");
        assert!(config.paths(dir.path()).asset.is_none());
    }

    #[test]
    fn test_config_validation_empty_template() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("onepage.toml");
        std::fs::write(&config_path, "[site]\ntemplate = \"\"\n").expect("write");

        let result = Config::load(&config_path);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("template cannot be empty")
        );
    }

    #[test]
    fn test_config_validation_nested_output_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("onepage.toml");
        std::fs::write(&config_path, "[build]\noutput_file = \"a/b.html\"\n").expect("write");

        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("must be a file name"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("onepage.toml");
        std::fs::write(&config_path, "[site\ncontent = ").expect("write");

        let err = Config::load(&config_path).unwrap_err();
        assert!(matches!(err, CoreError::Config { source: Some(_), .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/onepage.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}
