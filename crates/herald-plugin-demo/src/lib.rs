// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Demo formatter plugin.
//!
//! Prefixes the title, splits a comma-separated `targets` string into a
//! target list, and echoes the merged settings back through `meta.extra`.
//! Exists to exercise the full host contract end to end; the shipped
//! `setting.json` next to this crate is its descriptor.

use std::sync::OnceLock;

use serde_json::{json, Value};

use herald_core::types::{JsonMap, Output, OutputMeta};
use herald_sdk::{export_plugin, HeraldPlugin, PluginContext, PluginLogger, ProcessError};

#[derive(Default)]
pub struct DemoPlugin {
    logger: OnceLock<PluginLogger>,
}

impl DemoPlugin {
    fn logger(&self) -> &PluginLogger {
        static DISABLED: OnceLock<PluginLogger> = OnceLock::new();
        self.logger
            .get()
            .unwrap_or_else(|| DISABLED.get_or_init(PluginLogger::disabled))
    }
}

fn string_input<'a>(input: &'a JsonMap, key: &str, fallback: &'a str) -> &'a str {
    input.get(key).and_then(Value::as_str).unwrap_or(fallback)
}

impl HeraldPlugin for DemoPlugin {
    fn id(&self) -> String {
        "demo".to_string()
    }

    fn name(&self) -> String {
        "Demo Plugin".to_string()
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    fn description(&self) -> String {
        "Formats raw notification data into the standard output shape".to_string()
    }

    fn default_settings(&self) -> Option<JsonMap> {
        let mut settings = JsonMap::new();
        settings.insert("prefix".into(), json!("Demo"));
        settings.insert("add_timestamp".into(), json!(true));
        settings.insert("default_image".into(), json!("https://example.com/demo.png"));
        settings.insert("debug".into(), json!(false));
        Some(settings)
    }

    fn attach_logger(&mut self, logger: PluginLogger) {
        let _ = self.logger.set(logger);
    }

    fn process(
        &self,
        ctx: &PluginContext,
        input: &JsonMap,
        settings: &JsonMap,
    ) -> Result<Output, ProcessError> {
        let logger = self.logger();
        logger.info("processing notification data");

        if ctx.is_cancelled() {
            return Err(ProcessError::new("cancelled before processing"));
        }

        let prefix = settings
            .get("prefix")
            .and_then(Value::as_str)
            .unwrap_or("Demo");
        let title = string_input(input, "title", "Demo");
        let title = format!("{prefix}: {title}");
        let content = string_input(input, "content", "Demo").to_string();
        let image = string_input(input, "image", "").to_string();
        let url = string_input(input, "url", "").to_string();

        if settings.get("debug").and_then(Value::as_bool) == Some(true) {
            logger.debug(&format!(
                "extracted: title='{title}', content='{content}', image='{image}', url='{url}'"
            ));
        }

        let targets: Vec<String> = match input.get("targets").and_then(Value::as_str) {
            Some(raw) if !raw.is_empty() => raw.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };
        if !targets.is_empty() {
            logger.debug(&format!("found {} targets", targets.len()));
        }

        let mut extra = JsonMap::new();
        extra.insert("settings".into(), Value::Object(settings.clone()));
        if settings.get("add_timestamp").and_then(Value::as_bool) != Some(false) {
            extra.insert(
                "formattedAt".into(),
                json!(chrono::Utc::now().to_rfc3339()),
            );
        }

        let image = if image.is_empty() {
            settings
                .get("default_image")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        } else {
            image
        };

        let output = Output {
            title,
            content,
            image,
            url,
            targets,
            meta: Some(OutputMeta {
                extra: Some(extra),
                ..OutputMeta::default()
            }),
            ..Output::default()
        };

        logger.info(&format!(
            "notification formatted: title='{}', targets={}",
            output.title,
            output.targets.len()
        ));

        Ok(output)
    }
}

export_plugin!(DemoPlugin);

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: Value, settings: Value) -> Result<Output, ProcessError> {
        let plugin = DemoPlugin::default();
        let ctx = PluginContext::detached();
        let input = input.as_object().cloned().unwrap_or_default();
        let settings = settings.as_object().cloned().unwrap_or_default();
        plugin.process(&ctx, &input, &settings)
    }

    #[test]
    fn title_gets_prefixed_with_setting() {
        let out = run(
            json!({"title": "deploy finished"}),
            json!({"prefix": "CI"}),
        )
        .unwrap();
        assert_eq!(out.title, "CI: deploy finished");
    }

    #[test]
    fn missing_fields_fall_back_to_demo_defaults() {
        let out = run(json!({}), json!({})).unwrap();
        assert_eq!(out.title, "Demo: Demo");
        assert_eq!(out.content, "Demo");
        assert!(out.url.is_empty());
    }

    #[test]
    fn targets_split_on_commas() {
        let out = run(json!({"targets": "mail,push,sms"}), json!({})).unwrap();
        assert_eq!(out.targets, vec!["mail", "push", "sms"]);
    }

    #[test]
    fn empty_targets_string_yields_no_targets() {
        let out = run(json!({"targets": ""}), json!({})).unwrap();
        assert!(out.targets.is_empty());
    }

    #[test]
    fn settings_echo_back_through_meta_extra() {
        let out = run(json!({}), json!({"prefix": "X", "custom": 7})).unwrap();
        let extra = out.meta.unwrap().extra.unwrap();
        assert_eq!(extra["settings"]["custom"], 7);
        assert_eq!(extra["settings"]["prefix"], "X");
    }

    #[test]
    fn default_image_fills_in_when_input_has_none() {
        let out = run(
            json!({}),
            json!({"default_image": "https://cdn.example/fallback.png"}),
        )
        .unwrap();
        assert_eq!(out.image, "https://cdn.example/fallback.png");

        let out = run(
            json!({"image": "https://cdn.example/real.png"}),
            json!({"default_image": "https://cdn.example/fallback.png"}),
        )
        .unwrap();
        assert_eq!(out.image, "https://cdn.example/real.png");
    }

    #[test]
    fn add_timestamp_false_suppresses_formatted_at() {
        let out = run(json!({}), json!({"add_timestamp": false})).unwrap();
        let extra = out.meta.unwrap().extra.unwrap();
        assert!(!extra.contains_key("formattedAt"));

        let out = run(json!({}), json!({})).unwrap();
        let extra = out.meta.unwrap().extra.unwrap();
        assert!(extra.contains_key("formattedAt"));
    }

    #[test]
    fn declared_defaults_cover_every_knob() {
        let plugin = DemoPlugin::default();
        let defaults = plugin.default_settings().unwrap();
        for key in ["prefix", "add_timestamp", "default_image", "debug"] {
            assert!(defaults.contains_key(key), "missing default for {key}");
        }
    }
}
