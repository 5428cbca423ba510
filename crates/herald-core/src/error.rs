// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Herald plugin host.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across the Herald plugin loader, registry,
/// and invocation pipeline.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The plugin descriptor file is missing, unreadable, or fails validation.
    #[error("invalid plugin descriptor at {path}: {message}")]
    Descriptor { path: PathBuf, message: String },

    /// No loadable module file was found in the plugin directory.
    #[error("no plugin module found in {dir} (tried {tried})")]
    ModuleNotFound { dir: PathBuf, tried: String },

    /// The dynamic loader rejected the module file.
    #[error("failed to load plugin module {path}: {message}")]
    ModuleLoad { path: PathBuf, message: String },

    /// A well-known entry point is not exported by the module.
    #[error("plugin module {path} does not export `{symbol}`")]
    MissingSymbol { path: PathBuf, symbol: String },

    /// The module was built against a different plugin ABI revision.
    #[error("plugin module {path} declares ABI revision {found}, host expects {expected}")]
    AbiMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    /// The plugin constructor ran but reported a failure.
    #[error("plugin constructor failed for {path}: {message}")]
    Constructor { path: PathBuf, message: String },

    /// The plugin instance does not populate a required capability slot.
    #[error("plugin is missing required capability `{capability}`")]
    MissingCapability { capability: String },

    /// The descriptor's declared id does not match the id the instance reports.
    #[error("descriptor id `{descriptor}` does not match plugin id `{reported}`")]
    IdMismatch { descriptor: String, reported: String },

    /// A plugin with the same id is already registered.
    #[error("plugin id `{id}` is already registered")]
    DuplicateId { id: String },

    /// No plugin with the requested id is registered.
    #[error("plugin not found: {id}")]
    NotFound { id: String },

    /// The plugin exists but is disabled.
    #[error("plugin is disabled: {id}")]
    Disabled { id: String },

    /// The plugin's process call reported a failure.
    #[error("plugin `{id}` failed to process input: {message}")]
    Process { id: String, message: String },

    /// The plugin returned output the host could not convert.
    #[error("plugin `{id}` returned malformed output: {message}")]
    Conversion { id: String, message: String },

    /// Writing the descriptor file back to disk failed.
    #[error("failed to persist descriptor for `{id}`: {source}")]
    Persistence {
        id: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// Returns the plugin id this error refers to, when it carries one.
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            HeraldError::DuplicateId { id }
            | HeraldError::NotFound { id }
            | HeraldError::Disabled { id }
            | HeraldError::Process { id, .. }
            | HeraldError::Conversion { id, .. }
            | HeraldError::Persistence { id, .. } => Some(id),
            _ => None,
        }
    }
}
