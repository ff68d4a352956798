//! Flat dotted-path settings store.
//!
//! ```text
//! # comment
//! global.border = "gray:default"
//! class.dialog.border = white:blue:bold
//! window.status.caption = black:cyan
//! global.keys.quit = <Ctrl-q>;<F10>
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, WmError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigStore {
    values: BTreeMap<String, String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut store = Self::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(WmError::Config {
                    line: idx + 1,
                    reason: "expected `key = value`".to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() || key.split('.').any(str::is_empty) {
                return Err(WmError::Config {
                    line: idx + 1,
                    reason: format!("malformed key `{key}`"),
                });
            }
            store.set(key, unquote(value.trim()));
        }
        Ok(store)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let store = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), entries = store.len(), "loaded config");
        Ok(store)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve `key` for a window: its own node, then each class of its
    /// lineage (nearest first), then the global node.
    pub fn lookup<'a>(
        &self,
        window_name: Option<&str>,
        classes: impl IntoIterator<Item = &'a str>,
        key: &str,
    ) -> Option<&str> {
        if let Some(name) = window_name
            && let Some(value) = self.get(&format!("window.{name}.{key}"))
        {
            return Some(value);
        }
        for class in classes {
            if let Some(value) = self.get(&format!("class.{class}.{key}")) {
                return Some(value);
            }
        }
        self.get(&format!("global.{key}"))
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}
