//! End-to-end tests for the build pipeline.
//!
//! These tests drive the builder through configuration the same way the CLI does.

use std::fs;

use onepage_core::Config;
use onepage_generator::{BuildError, Builder, RenderError};
use tempfile::TempDir;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>{{name}}</title></head>
<body>
  <h1>{{name}}</h1>
  <p>{{tagline?}}</p>
  {{#experience}}
  <section><h2>{{role}} at {{company}}</h2><p>{{years}}</p></section>
  {{/experience}}
  {{^experience}}<p>No experience listed.</p>{{/experience}}
  <a href="{{contact.email}}">Email</a>
</body>
</html>
"#;

const CONTENT: &str = r#"
name: Ada Lovelace
experience:
  - role: Analyst
    company: Analytical Engine Co.
    years: 1842
contact:
  email: "mailto:ada@example.com"
"#;

fn project() -> TempDir {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("content.yaml"), CONTENT).unwrap();
    fs::write(root.path().join("template.html"), TEMPLATE).unwrap();
    root
}

#[test]
fn test_default_project_builds() {
    let root = project();
    let paths = Config::default().paths(root.path());

    Builder::new(paths).build().expect("build should succeed");

    let html = fs::read_to_string(root.path().join("dist/index.html")).unwrap();
    assert!(html.contains("<title>Ada Lovelace</title>"));
    assert!(html.contains("<h2>Analyst at Analytical Engine Co.</h2>"));
    assert!(html.contains("<p>1842</p>"));
    assert!(html.contains(r#"href="mailto:ada@example.com""#));
    assert!(!html.contains("No experience listed."));
}

#[test]
fn test_configured_paths_and_asset() {
    let root = project();
    fs::write(root.path().join("resume.pdf"), b"%PDF-1.7").unwrap();
    let config_path = root.path().join("onepage.toml");
    fs::write(
        &config_path,
        "[site]\nasset = \"resume.pdf\"\n\n[build]\noutput_dir = \"public\"\n",
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    let stats = Builder::new(config.paths(root.path())).build().unwrap();

    assert!(stats.asset_copied);
    assert!(root.path().join("public/index.html").is_file());
    assert!(root.path().join("public/resume.pdf").is_file());
}

#[test]
fn test_failed_rebuild_then_recovery() {
    let root = project();
    let builder = Builder::new(Config::default().paths(root.path()));
    builder.build().unwrap();
    let good = fs::read(root.path().join("dist/index.html")).unwrap();

    // Broken template: previous output must survive.
    fs::write(root.path().join("template.html"), "{{#experience}}oops").unwrap();
    let err = builder.build().unwrap_err();
    assert!(matches!(
        err,
        BuildError::Render(RenderError::UnclosedSection { .. })
    ));
    assert_eq!(fs::read(root.path().join("dist/index.html")).unwrap(), good);

    // Fixing the template publishes again.
    fs::write(root.path().join("template.html"), "<h1>{{name}}</h1>").unwrap();
    builder.build().unwrap();
    assert_eq!(
        fs::read_to_string(root.path().join("dist/index.html")).unwrap(),
        "<h1>Ada Lovelace</h1>"
    );
}

#[test]
fn test_missing_content_creates_nothing() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("template.html"), TEMPLATE).unwrap();

    let err = Builder::new(Config::default().paths(root.path()))
        .build()
        .unwrap_err();

    assert!(err.is_missing_input());
    assert!(!root.path().join("dist").exists());
}
