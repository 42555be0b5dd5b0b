//! Mergeable nested configuration with dotted-path lookup and dump/load
//! helpers, mirroring the settings object the orchestration engine exposes
//! to its modules.

#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::core::errors::{HarnessError, Result};

/// Nested key/value configuration. Objects deep-merge, everything else
/// replaces wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    root: Map<String, Value>,
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-merge `overlay` into this configuration. Non-object overlays
    /// are ignored; nested objects combine recursively, scalars and arrays
    /// replace the previous value.
    pub fn merge(&mut self, overlay: Value) {
        if let Value::Object(map) = overlay {
            Self::merge_map(&mut self.root, map);
        }
    }

    fn merge_map(dst: &mut Map<String, Value>, src: Map<String, Value>) {
        for (key, incoming) in src {
            match (dst.get_mut(&key), incoming) {
                (Some(Value::Object(existing)), Value::Object(overlay)) => {
                    Self::merge_map(existing, overlay);
                }
                (_, incoming) => {
                    dst.insert(key, incoming);
                }
            }
        }
    }

    /// Merge a TOML document, letting tests keep fixtures in either format.
    pub fn merge_toml_str(&mut self, text: &str) -> Result<()> {
        let parsed: toml::Value = toml::from_str(text)?;
        let as_json = serde_json::to_value(parsed)?;
        self.merge(as_json);
        Ok(())
    }

    /// Dotted-path lookup: `get("settings.check-updates")`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current: &Value = self.root.get(path.split('.').next()?)?;
        for segment in path.split('.').skip(1) {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    #[must_use]
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path)?.as_u64()
    }

    #[must_use]
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Dotted-path insert, creating intermediate objects as needed.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut segments = path.split('.').collect::<Vec<_>>();
        let leaf = segments.pop().unwrap_or(path);
        let mut current = &mut self.root;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = entry.as_object_mut().unwrap_or_else(|| unreachable!());
        }
        current.insert(leaf.to_string(), value);
    }

    /// The whole tree as a JSON value.
    #[must_use]
    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Serialize the configuration as pretty JSON to `path`.
    pub fn dump_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.as_value())?;
        fs::write(path, text).map_err(|err| HarnessError::io(path, &err))
    }
}
