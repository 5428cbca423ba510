// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin registry and lifecycle operations: startup scan,
//! registration, lookup, settings updates, and the invocation pipeline.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use herald_core::types::{JsonMap, Output, OutputMeta, UiNode};
use herald_core::{HeraldError, NotificationPlugin};

use crate::descriptor::{merge_settings, PluginDescriptor};
use crate::loader::{self, LoadStats};

/// One registered plugin: descriptor, adapted instance, load timestamp.
///
/// Constructed and destroyed only by the [`Manager`].
struct LoadedPlugin {
    descriptor: PluginDescriptor,
    instance: Arc<dyn NotificationPlugin>,
    loaded_at: DateTime<Utc>,
}

/// Summary record returned to external consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub enabled: bool,
    /// Load time as epoch milliseconds.
    #[serde(rename = "loadedAt")]
    pub loaded_at: i64,
    pub ui: Option<UiNode>,
    /// The merged two-tier settings view.
    pub settings: JsonMap,
    pub test_data: Option<Value>,
}

/// A partial settings update: only the present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    /// Full replacement for the persisted settings tier.
    pub settings: Option<JsonMap>,
    /// New enabled state.
    pub enabled: Option<bool>,
}

/// The plugin registry and invocation pipeline.
///
/// Holds all loaded plugins keyed by id behind a reader/writer lock, so
/// concurrent HTTP-triggered reads and writes against the shared map stay
/// safe. Plugin calls themselves run off the lock.
pub struct Manager {
    plugins_dir: PathBuf,
    plugins: RwLock<HashMap<String, LoadedPlugin>>,
}

impl Manager {
    /// Create a manager rooted at the given plugins directory.
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
            plugins: RwLock::new(HashMap::new()),
        }
    }

    /// Scan the plugins directory and load one plugin per subdirectory.
    ///
    /// A missing or unreadable root yields zero plugins; a failure in one
    /// subdirectory is logged and never aborts the remaining ones.
    /// Duplicate ids across subdirectories are rejected: the first
    /// registration wins and later ones count as failures.
    pub async fn load_all(&self) -> LoadStats {
        let mut stats = LoadStats::default();

        let entries = match std::fs::read_dir(&self.plugins_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = %self.plugins_dir.display(),
                    error = %e,
                    "plugins directory not readable, skipping plugin load"
                );
                return stats;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            stats.attempted += 1;
            let dir_name = entry.file_name().to_string_lossy().into_owned();

            match loader::load_one(&path) {
                Ok((descriptor, handle)) => {
                    let id = descriptor.id.clone();
                    match self.register(descriptor, Arc::new(handle)).await {
                        Ok(()) => {
                            stats.loaded += 1;
                            info!(plugin = %id, dir = %dir_name, "plugin loaded");
                        }
                        Err(e) => {
                            stats.failed += 1;
                            error!(dir = %dir_name, error = %e, "failed to register plugin");
                        }
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(dir = %dir_name, error = %e, "failed to load plugin");
                }
            }
        }

        info!(
            loaded = stats.loaded,
            failed = stats.failed,
            "plugin load complete"
        );
        stats
    }

    /// Register an adapted instance under its descriptor.
    ///
    /// Verifies the instance's self-reported id against the descriptor,
    /// rejects duplicates, computes the two-tier settings merge, and
    /// records the load timestamp.
    pub async fn register(
        &self,
        mut descriptor: PluginDescriptor,
        instance: Arc<dyn NotificationPlugin>,
    ) -> Result<(), HeraldError> {
        let reported = instance.id();
        if reported != descriptor.id {
            return Err(HeraldError::IdMismatch {
                descriptor: descriptor.id,
                reported,
            });
        }

        let mut plugins = self.plugins.write().await;
        if plugins.contains_key(&descriptor.id) {
            return Err(HeraldError::DuplicateId { id: descriptor.id });
        }

        descriptor.settings = merge_settings(instance.default_settings(), &descriptor.settings);

        plugins.insert(
            descriptor.id.clone(),
            LoadedPlugin {
                descriptor,
                instance,
                loaded_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Look up one plugin's summary record.
    pub async fn get(&self, id: &str) -> Option<PluginInfo> {
        let plugins = self.plugins.read().await;
        plugins.get(id).map(plugin_info)
    }

    /// List all plugins, sorted ascending by display name.
    pub async fn list(&self) -> Vec<PluginInfo> {
        let plugins = self.plugins.read().await;
        let mut list: Vec<PluginInfo> = plugins.values().map(plugin_info).collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Apply a partial update to a plugin's persisted descriptor.
    ///
    /// Re-reads the descriptor file from disk so concurrent external edits
    /// are not clobbered, applies only the fields present in the update,
    /// writes the file back, then recomputes the merged settings. In-memory
    /// state changes only after the write succeeds.
    pub async fn update_config(&self, id: &str, update: ConfigUpdate) -> Result<(), HeraldError> {
        let mut plugins = self.plugins.write().await;
        let entry = plugins
            .get_mut(id)
            .ok_or_else(|| HeraldError::NotFound { id: id.to_string() })?;

        // Descriptor I/O runs on the blocking pool; the write lock stays
        // held across it so concurrent updates cannot interleave their
        // read-modify-write of the file.
        let config_file = entry.descriptor.config_file.clone();
        let on_disk = tokio::task::spawn_blocking(
            move || -> Result<PluginDescriptor, HeraldError> {
                let mut on_disk = PluginDescriptor::load(&config_file)?;
                if let Some(settings) = update.settings {
                    on_disk.settings = settings;
                }
                if let Some(enabled) = update.enabled {
                    on_disk.enabled = enabled;
                }
                on_disk.save()?;
                Ok(on_disk)
            },
        )
        .await
        .map_err(|e| HeraldError::Internal(format!("descriptor update task failed: {e}")))??;

        entry.descriptor.settings =
            merge_settings(entry.instance.default_settings(), &on_disk.settings);
        entry.descriptor.enabled = on_disk.enabled;
        Ok(())
    }

    /// Flip a plugin's enabled flag, leaving its settings untouched.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), HeraldError> {
        self.update_config(
            id,
            ConfigUpdate {
                enabled: Some(enabled),
                ..ConfigUpdate::default()
            },
        )
        .await
    }

    /// Invoke a plugin with the given input.
    ///
    /// Enablement is checked before any plugin code runs. After a
    /// successful call the metadata's plugin id, timestamp, and request
    /// echo are stamped unconditionally, overwriting whatever the plugin
    /// set.
    pub async fn invoke(
        &self,
        cancel: CancellationToken,
        id: &str,
        input: JsonMap,
    ) -> Result<Output, HeraldError> {
        let (instance, settings) = {
            let plugins = self.plugins.read().await;
            let entry = plugins
                .get(id)
                .ok_or_else(|| HeraldError::NotFound { id: id.to_string() })?;
            if !entry.descriptor.enabled {
                return Err(HeraldError::Disabled { id: id.to_string() });
            }
            (Arc::clone(&entry.instance), entry.descriptor.settings.clone())
        };

        // The plugin call runs without holding the registry lock.
        let mut output = instance.process(cancel, &input, &settings).await?;

        let meta = output.meta.get_or_insert_with(OutputMeta::default);
        meta.plugin_id = id.to_string();
        meta.processed_at = Utc::now().to_rfc3339();
        meta.req = input;
        Ok(output)
    }

    /// Whether the plugin exists and is enabled.
    pub async fn is_enabled(&self, id: &str) -> bool {
        let plugins = self.plugins.read().await;
        plugins
            .get(id)
            .map(|entry| entry.descriptor.enabled)
            .unwrap_or(false)
    }

    /// Number of registered plugins.
    pub async fn len(&self) -> usize {
        self.plugins.read().await.len()
    }

    /// True if no plugins are registered.
    pub async fn is_empty(&self) -> bool {
        self.plugins.read().await.is_empty()
    }
}

fn plugin_info(entry: &LoadedPlugin) -> PluginInfo {
    PluginInfo {
        id: entry.descriptor.id.clone(),
        name: entry.descriptor.name.clone(),
        version: entry.descriptor.version.clone(),
        description: entry.descriptor.description.clone(),
        author: entry.descriptor.author.clone(),
        enabled: entry.descriptor.enabled,
        loaded_at: entry.loaded_at.timestamp_millis(),
        ui: entry.descriptor.ui.clone(),
        settings: entry.descriptor.settings.clone(),
        test_data: entry.descriptor.test_data.clone(),
    }
}
