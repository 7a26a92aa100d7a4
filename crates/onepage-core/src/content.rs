//! Structured content document.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{CoreError, Result};

/// The key/value document a page is rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    root: Value,
}

impl Content {
    /// Read and parse a content file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source).map_err(|e| match e {
            CoreError::Yaml(err) => CoreError::content(path, err.to_string()),
            CoreError::Content { message, .. } => CoreError::content(path, message),
            other => other,
        })
    }

    /// Parse a YAML document. The top level must be a mapping; an empty
    /// document is treated as an empty mapping.
    pub fn parse(source: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(source)?;
        match root {
            Value::Mapping(_) => Ok(Self { root }),
            Value::Null => Ok(Self::default()),
            other => Err(CoreError::content(
                "<inline>",
                format!(
                    "top level must be a mapping, found {}",
                    describe(&other)
                ),
            )),
        }
    }

    /// The document root, always a mapping.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Look up a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }
}

impl Default for Content {
    fn default() -> Self {
        Self {
            root: Value::Mapping(Mapping::new()),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
