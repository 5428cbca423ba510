// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./herald.toml` > `~/.config/herald/herald.toml`
//! > `/etc/herald/herald.toml` with environment variable overrides via the
//! `HERALD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HeraldConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/herald/herald.toml` (system-wide)
/// 3. `~/.config/herald/herald.toml` (user XDG config)
/// 4. `./herald.toml` (local directory)
/// 5. `HERALD_*` environment variables
pub fn load_config() -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file("/etc/herald/herald.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("herald/herald.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("herald.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `HERALD_PLUGINS_DIR` must map to
/// `plugins.dir`, never `plugins.di.r`-style splits.
fn env_provider() -> Env {
    Env::prefixed("HERALD_").map(|key| {
        // The key arrives in the variable's original case with the prefix
        // stripped. Example: HERALD_SERVER_PORT -> SERVER_PORT ->
        // "server.port".
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("server_", "server.", 1)
            .replacen("plugins_", "plugins.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn load_from_str_applies_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8344);
        assert_eq!(config.plugins.dir, "plugins");
    }

    #[test]
    fn load_from_str_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [plugins]
            dir = "/var/lib/herald/plugins"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.plugins.dir, "/var/lib/herald/plugins");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn load_from_str_rejects_unknown_keys() {
        let result = load_config_from_str("[server]\nhots = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn env_vars_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        unsafe { std::env::set_var("HERALD_SERVER_PORT", "9100") };
        let result = load_config_from_path(&path);
        // Clean up before asserting so a failure never leaks into the
        // other env tests.
        unsafe { std::env::remove_var("HERALD_SERVER_PORT") };

        assert_eq!(result.unwrap().server.port, 9100);
    }

    #[test]
    #[serial]
    fn env_mapping_keeps_underscore_keys_whole() {
        unsafe { std::env::set_var("HERALD_LOG_LEVEL", "debug") };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        std::fs::write(&path, "").unwrap();

        let result = load_config_from_path(&path);
        unsafe { std::env::remove_var("HERALD_LOG_LEVEL") };

        assert_eq!(result.unwrap().log.level, "debug");
    }

    #[test]
    #[serial]
    fn env_section_mapping_covers_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        std::fs::write(&path, "").unwrap();

        unsafe { std::env::set_var("HERALD_PLUGINS_DIR", "/opt/plugins") };
        let result = load_config_from_path(&path);
        unsafe { std::env::remove_var("HERALD_PLUGINS_DIR") };

        assert_eq!(result.unwrap().plugins.dir, "/opt/plugins");
    }
}
