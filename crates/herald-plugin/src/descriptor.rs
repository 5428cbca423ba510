// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persisted plugin descriptor (`setting.json`) and the two-tier
//! settings merge.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use herald_core::types::{JsonMap, UiNode};
use herald_core::HeraldError;

/// The declarative record of a plugin's identity, settings, and enabled
/// state, persisted as `setting.json` in the plugin's directory.
///
/// `settings` holds the persisted override tier; after registration the
/// in-memory copy holds the merged view (defaults overlaid by overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginDescriptor {
    /// Unique, stable plugin identifier. Must match the id the loaded
    /// instance reports.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Semantic version string.
    pub version: String,
    /// One-line description.
    pub description: String,
    /// Optional author identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Open settings mapping.
    pub settings: JsonMap,
    /// Optional settings-UI rendering hints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiNode>,
    /// Whether the plugin may be invoked.
    pub enabled: bool,
    /// Arbitrary fixture data for the test-invoke endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_data: Option<Value>,
    /// Path of the backing descriptor file. Never serialized.
    #[serde(skip)]
    pub config_file: PathBuf,
}

impl PluginDescriptor {
    /// Read and parse a descriptor file, validating required fields.
    pub fn load(path: &Path) -> Result<Self, HeraldError> {
        let data = std::fs::read_to_string(path).map_err(|e| HeraldError::Descriptor {
            path: path.to_path_buf(),
            message: format!("failed to read descriptor file: {e}"),
        })?;

        let mut descriptor: PluginDescriptor =
            serde_json::from_str(&data).map_err(|e| HeraldError::Descriptor {
                path: path.to_path_buf(),
                message: format!("failed to parse descriptor file: {e}"),
            })?;

        if descriptor.id.is_empty() {
            return Err(HeraldError::Descriptor {
                path: path.to_path_buf(),
                message: "descriptor field `id` must not be empty".to_string(),
            });
        }
        if descriptor.name.is_empty() {
            return Err(HeraldError::Descriptor {
                path: path.to_path_buf(),
                message: "descriptor field `name` must not be empty".to_string(),
            });
        }

        descriptor.config_file = path.to_path_buf();
        Ok(descriptor)
    }

    /// Write the descriptor back to its backing file, pretty-printed.
    pub fn save(&self) -> Result<(), HeraldError> {
        let data = serde_json::to_string_pretty(self).map_err(|e| HeraldError::Persistence {
            id: self.id.clone(),
            source: std::io::Error::other(e),
        })?;
        std::fs::write(&self.config_file, data).map_err(|e| HeraldError::Persistence {
            id: self.id.clone(),
            source: e,
        })
    }
}

/// Overlay persisted settings on top of the plugin's compiled-in defaults.
///
/// The default tier is recomputed on every merge, so keys added by a newer
/// plugin build surface even when the persisted file does not mention them;
/// persisted values always win for keys present in both tiers.
pub fn merge_settings(defaults: Option<JsonMap>, persisted: &JsonMap) -> JsonMap {
    let mut merged = defaults.unwrap_or_default();
    for (key, value) in persisted {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_descriptor(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("setting.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_parses_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(
            dir.path(),
            r#"{
                "id": "demo",
                "name": "Demo Plugin",
                "version": "1.0.0",
                "description": "demo formatter",
                "author": "herald",
                "settings": {"prefix": "Demo"},
                "enabled": true,
                "test_data": {"title": "hello"}
            }"#,
        );

        let descriptor = PluginDescriptor::load(&path).unwrap();
        assert_eq!(descriptor.id, "demo");
        assert_eq!(descriptor.name, "Demo Plugin");
        assert_eq!(descriptor.version, "1.0.0");
        assert_eq!(descriptor.author.as_deref(), Some("herald"));
        assert_eq!(descriptor.settings["prefix"], "Demo");
        assert!(descriptor.enabled);
        assert_eq!(descriptor.test_data.unwrap()["title"], "hello");
        assert_eq!(descriptor.config_file, path);
    }

    #[test]
    fn load_rejects_empty_id_and_name() {
        let dir = tempfile::tempdir().unwrap();

        let path = write_descriptor(dir.path(), r#"{"name": "No Id"}"#);
        let err = PluginDescriptor::load(&path).unwrap_err();
        assert!(err.to_string().contains("`id`"));

        let path = write_descriptor(dir.path(), r#"{"id": "no-name"}"#);
        let err = PluginDescriptor::load(&path).unwrap_err();
        assert!(err.to_string().contains("`name`"));
    }

    #[test]
    fn load_rejects_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("setting.json");
        let err = PluginDescriptor::load(&missing).unwrap_err();
        assert!(err.to_string().contains("failed to read"));

        let path = write_descriptor(dir.path(), "{not json");
        let err = PluginDescriptor::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(
            dir.path(),
            r#"{"id": "demo", "name": "Demo", "enabled": false}"#,
        );

        let mut descriptor = PluginDescriptor::load(&path).unwrap();
        descriptor.enabled = true;
        descriptor
            .settings
            .insert("token".to_string(), json!("abc"));
        descriptor.save().unwrap();

        let reloaded = PluginDescriptor::load(&path).unwrap();
        assert!(reloaded.enabled);
        assert_eq!(reloaded.settings["token"], "abc");
    }

    #[test]
    fn loading_twice_yields_identical_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(
            dir.path(),
            r#"{"id": "demo", "name": "Demo", "settings": {"x": 1}, "enabled": true}"#,
        );

        let first = PluginDescriptor::load(&path).unwrap();
        let second = PluginDescriptor::load(&path).unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn merge_overlays_persisted_on_defaults() {
        let mut defaults = JsonMap::new();
        defaults.insert("x".to_string(), json!(1));
        defaults.insert("z".to_string(), json!("keep"));

        let mut persisted = JsonMap::new();
        persisted.insert("x".to_string(), json!(2));
        persisted.insert("y".to_string(), json!(3));

        let merged = merge_settings(Some(defaults), &persisted);
        assert_eq!(merged["x"], 2);
        assert_eq!(merged["y"], 3);
        assert_eq!(merged["z"], "keep");
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn merge_with_no_defaults_keeps_persisted() {
        let mut persisted = JsonMap::new();
        persisted.insert("a".to_string(), json!(true));

        let merged = merge_settings(None, &persisted);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged["a"], true);
    }
}
