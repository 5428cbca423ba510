// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin HTTP API for the Herald plugin host.
//!
//! Exposes the plugin management surface over axum: list, get, settings
//! update, enable/disable, and test invocation. Every response uses the
//! `{code, msg, data}` envelope with stable numeric error categories, so
//! clients can distinguish an unknown plugin from a disabled one from a
//! genuine processing failure.

pub mod handlers;
pub mod server;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use herald_core::HeraldError;
use herald_plugin::Manager;

/// Stable response codes shared with API clients.
pub mod codes {
    /// Operation succeeded.
    pub const SUCCESS: i32 = 0;
    /// Malformed request body or parameters.
    pub const PARAM_ERROR: i32 = 1001;
    /// No plugin registered under the requested id.
    pub const PLUGIN_NOT_FOUND: i32 = 6001;
    /// The plugin exists but is disabled.
    pub const PLUGIN_DISABLED: i32 = 6002;
    /// Descriptor read/parse/write failure.
    pub const PLUGIN_CONFIG_ERROR: i32 = 6003;
    /// Module loading or validation failure.
    pub const PLUGIN_LOAD_FAILED: i32 = 6004;
    /// The plugin's processing call failed.
    pub const PLUGIN_PROCESS_ERROR: i32 = 6005;
    /// Unexpected host-side failure.
    pub const SERVER_ERROR: i32 = 9002;
}

/// The `{code, msg, data}` response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i32,
    pub msg: String,
    pub data: Value,
}

impl Envelope {
    /// Wrap a successful payload.
    pub fn success(data: impl Serialize) -> Json<Envelope> {
        Json(Envelope {
            code: codes::SUCCESS,
            msg: "success".to_string(),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        })
    }

    /// Wrap a failure with a stable code and human-readable message.
    pub fn error(code: i32, msg: impl Into<String>) -> Json<Envelope> {
        Json(Envelope {
            code,
            msg: msg.into(),
            data: Value::Null,
        })
    }

    /// Map a host error onto its stable envelope code, keeping the
    /// error's own message.
    pub fn from_error(err: &HeraldError) -> Json<Envelope> {
        Self::error(error_code(err), err.to_string())
    }
}

/// The stable numeric category for a host error.
pub fn error_code(err: &HeraldError) -> i32 {
    match err {
        HeraldError::NotFound { .. } => codes::PLUGIN_NOT_FOUND,
        HeraldError::Disabled { .. } => codes::PLUGIN_DISABLED,
        HeraldError::Config(_) | HeraldError::Descriptor { .. } | HeraldError::Persistence { .. } => {
            codes::PLUGIN_CONFIG_ERROR
        }
        HeraldError::ModuleNotFound { .. }
        | HeraldError::ModuleLoad { .. }
        | HeraldError::MissingSymbol { .. }
        | HeraldError::AbiMismatch { .. }
        | HeraldError::Constructor { .. }
        | HeraldError::MissingCapability { .. }
        | HeraldError::IdMismatch { .. }
        | HeraldError::DuplicateId { .. } => codes::PLUGIN_LOAD_FAILED,
        HeraldError::Process { .. } | HeraldError::Conversion { .. } => {
            codes::PLUGIN_PROCESS_ERROR
        }
        HeraldError::Internal(_) => codes::SERVER_ERROR,
    }
}

/// Build the admin router over a shared manager.
pub fn admin_router(manager: Arc<Manager>) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/admin/plugins", get(handlers::list_plugins))
        .route("/admin/plugins/{plugin_id}", get(handlers::get_plugin))
        .route(
            "/admin/plugins/{plugin_id}/config",
            put(handlers::update_plugin_config),
        )
        .route(
            "/admin/plugins/{plugin_id}/enable",
            put(handlers::enable_plugin),
        )
        .route(
            "/admin/plugins/{plugin_id}/disable",
            put(handlers::disable_plugin),
        )
        .route("/admin/plugins/{plugin_id}/test", post(handlers::test_plugin))
        .layer(CorsLayer::permissive())
        .with_state(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable_categories() {
        assert_eq!(
            error_code(&HeraldError::NotFound { id: "x".into() }),
            codes::PLUGIN_NOT_FOUND
        );
        assert_eq!(
            error_code(&HeraldError::Disabled { id: "x".into() }),
            codes::PLUGIN_DISABLED
        );
        assert_eq!(
            error_code(&HeraldError::Process {
                id: "x".into(),
                message: "boom".into()
            }),
            codes::PLUGIN_PROCESS_ERROR
        );
        assert_eq!(
            error_code(&HeraldError::IdMismatch {
                descriptor: "a".into(),
                reported: "b".into()
            }),
            codes::PLUGIN_LOAD_FAILED
        );
        assert_eq!(
            error_code(&HeraldError::Internal("x".into())),
            codes::SERVER_ERROR
        );
    }

    #[test]
    fn envelope_serializes_with_wire_names() {
        let Json(envelope) = Envelope::error(codes::PLUGIN_NOT_FOUND, "plugin not found: x");
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"code\":6001"));
        assert!(json.contains("\"msg\":\"plugin not found: x\""));
        assert!(json.contains("\"data\":null"));
    }
}
