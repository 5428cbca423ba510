// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The trait plugin authors implement.

use thiserror::Error;

use herald_core::types::{JsonMap, Output};

use crate::context::{PluginContext, PluginLogger};

/// A processing failure reported by a plugin.
///
/// Crosses the boundary as a plain message string, so all structure must
/// live in the text.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProcessError(pub String);

impl ProcessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for ProcessError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ProcessError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<serde_json::Error> for ProcessError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// A notification-formatter plugin, as its author writes it.
///
/// Implement this trait and invoke [`crate::export_plugin!`] once per
/// module; the macro wires the implementation to the well-known exported
/// symbols and the capability table. Authors never touch the raw ABI.
///
/// `id`, `default_settings`, and `process` are the required capabilities.
/// The identity methods default to an empty string, which the host treats
/// as "not provided". Implementations must be callable from any thread;
/// keep any mutable state behind interior synchronization.
pub trait HeraldPlugin: Send + Sync + 'static {
    /// Unique, stable identifier. Must match the `id` in the plugin's
    /// `setting.json`, or the host rejects the module at load.
    fn id(&self) -> String;

    /// Human-readable display name.
    fn name(&self) -> String {
        String::new()
    }

    /// Version string.
    fn version(&self) -> String {
        String::new()
    }

    /// One-line description.
    fn description(&self) -> String {
        String::new()
    }

    /// Compiled-in default settings. Persisted user overrides are merged
    /// on top of these by the host.
    fn default_settings(&self) -> Option<JsonMap> {
        None
    }

    /// Receives the host's log sink once, right after the module passes
    /// validation and before any `process` call.
    fn attach_logger(&mut self, logger: PluginLogger) {
        let _ = logger;
    }

    /// Formats one notification from `input` under the merged `settings`.
    fn process(
        &self,
        ctx: &PluginContext,
        input: &JsonMap,
        settings: &JsonMap,
    ) -> Result<Output, ProcessError>;
}
