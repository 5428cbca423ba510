// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the host, the loader, and plugin authors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open string-keyed JSON mapping used for settings, inputs, and metadata.
pub type JsonMap = serde_json::Map<String, Value>;

/// The formatted notification a plugin produces.
///
/// Field names on the wire follow the descriptor convention: single
/// lowercase words, except `isNotify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub content: String,
    /// Optional image URL.
    pub image: String,
    /// Optional link URL.
    pub url: String,
    /// Delivery targets selected by the plugin.
    pub targets: Vec<String>,
    /// Whether this output should actually be delivered. Absent means yes.
    #[serde(rename = "isNotify")]
    pub is_notify: bool,
    /// Invocation metadata, stamped by the host after the plugin returns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<OutputMeta>,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            image: String::new(),
            url: String::new(),
            targets: Vec::new(),
            is_notify: true,
            meta: None,
        }
    }
}

/// Metadata attached to every invocation result.
///
/// `plugin_id`, `processed_at`, and `req` are overwritten by the host
/// unconditionally; `extra` is whatever the plugin chose to attach.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputMeta {
    /// The original invocation input, echoed verbatim.
    pub req: JsonMap,
    /// Id of the plugin that produced the output.
    pub plugin_id: String,
    /// RFC 3339 timestamp of when processing completed.
    pub processed_at: String,
    /// Free-form plugin-attached data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
}

/// One node of the declarative settings-UI tree a descriptor may carry.
///
/// `slots` and `props` stay open values: components accept either a single
/// nested node or a map of named nodes there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiNode {
    /// Component name the frontend should render.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub component: String,
    /// Plain-text content.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Raw HTML content.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub html: String,
    /// Child nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<UiNode>,
    /// Named slot content (node or map of nodes).
    #[serde(skip_serializing_if = "Value::is_null")]
    pub slots: Value,
    /// Component properties.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub props: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_notify_defaults_to_true() {
        let out: Output = serde_json::from_str(r#"{"title": "hi"}"#).unwrap();
        assert!(out.is_notify);
        assert_eq!(out.title, "hi");
        assert!(out.targets.is_empty());
    }

    #[test]
    fn output_is_notify_respects_explicit_false() {
        let out: Output = serde_json::from_str(r#"{"isNotify": false}"#).unwrap();
        assert!(!out.is_notify);
    }

    #[test]
    fn output_meta_uses_camel_case_wire_names() {
        let meta = OutputMeta {
            req: JsonMap::new(),
            plugin_id: "demo".to_string(),
            processed_at: "2026-01-01T00:00:00Z".to_string(),
            extra: None,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"pluginId\":\"demo\""));
        assert!(json.contains("\"processedAt\""));
        assert!(!json.contains("extra"));
    }

    #[test]
    fn ui_node_round_trips_nested_content() {
        let json = r#"{
            "component": "n-form",
            "content": [
                {"component": "n-input", "props": {"path": "token"}},
                {"text": "hint"}
            ]
        }"#;
        let node: UiNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.component, "n-form");
        assert_eq!(node.content.len(), 2);
        assert_eq!(node.content[0].props["path"], "token");
        assert_eq!(node.content[1].text, "hint");
    }
}
