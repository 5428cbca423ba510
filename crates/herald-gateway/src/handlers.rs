// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the plugin management API.
//!
//! Every outcome except a request-body rejection returns HTTP 200 with the
//! envelope code carrying the category; malformed JSON bodies map to 400
//! with `PARAM_ERROR`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use herald_core::types::JsonMap;
use herald_plugin::{ConfigUpdate, Manager};

use crate::{codes, Envelope};

/// Request body for `PUT /admin/plugins/{plugin_id}/config`.
#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    /// Full replacement for the persisted settings tier.
    #[serde(default)]
    pub settings: Option<JsonMap>,
}

/// Request body for `POST /admin/plugins/{plugin_id}/test`.
#[derive(Debug, Deserialize)]
pub struct TestRequest {
    /// Ad-hoc input mapping handed to the plugin.
    #[serde(default)]
    pub input: JsonMap,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub plugins: usize,
}

/// GET /health
pub async fn get_health(State(manager): State<Arc<Manager>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        plugins: manager.len().await,
    })
}

/// GET /admin/plugins
pub async fn list_plugins(State(manager): State<Arc<Manager>>) -> Json<Envelope> {
    Envelope::success(manager.list().await)
}

/// GET /admin/plugins/{plugin_id}
pub async fn get_plugin(
    State(manager): State<Arc<Manager>>,
    Path(plugin_id): Path<String>,
) -> Json<Envelope> {
    match manager.get(&plugin_id).await {
        Some(info) => Envelope::success(info),
        None => Envelope::error(
            codes::PLUGIN_NOT_FOUND,
            format!("plugin not found: {plugin_id}"),
        ),
    }
}

/// PUT /admin/plugins/{plugin_id}/config
pub async fn update_plugin_config(
    State(manager): State<Arc<Manager>>,
    Path(plugin_id): Path<String>,
    body: Result<Json<UpdateConfigRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return param_error(rejection),
    };

    let update = ConfigUpdate {
        settings: request.settings,
        enabled: None,
    };
    match manager.update_config(&plugin_id, update).await {
        Ok(()) => Envelope::success("plugin config updated").into_response(),
        Err(e) => {
            warn!(plugin = %plugin_id, error = %e, "plugin config update failed");
            Envelope::from_error(&e).into_response()
        }
    }
}

/// PUT /admin/plugins/{plugin_id}/enable
pub async fn enable_plugin(
    State(manager): State<Arc<Manager>>,
    Path(plugin_id): Path<String>,
) -> Json<Envelope> {
    set_enabled(&manager, &plugin_id, true).await
}

/// PUT /admin/plugins/{plugin_id}/disable
///
/// Cross-entity usage checks before disabling are the caller's concern.
pub async fn disable_plugin(
    State(manager): State<Arc<Manager>>,
    Path(plugin_id): Path<String>,
) -> Json<Envelope> {
    set_enabled(&manager, &plugin_id, false).await
}

async fn set_enabled(manager: &Manager, plugin_id: &str, enabled: bool) -> Json<Envelope> {
    match manager.set_enabled(plugin_id, enabled).await {
        Ok(()) => Envelope::success(if enabled {
            "plugin enabled"
        } else {
            "plugin disabled"
        }),
        Err(e) => {
            warn!(plugin = %plugin_id, error = %e, "plugin enable toggle failed");
            Envelope::from_error(&e)
        }
    }
}

/// POST /admin/plugins/{plugin_id}/test
pub async fn test_plugin(
    State(manager): State<Arc<Manager>>,
    Path(plugin_id): Path<String>,
    body: Result<Json<TestRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return param_error(rejection),
    };

    let result = manager
        .invoke(CancellationToken::new(), &plugin_id, request.input.clone())
        .await;
    match result {
        Ok(output) => Envelope::success(json!({
            "pluginId": plugin_id,
            "input": request.input,
            "output": output,
        }))
        .into_response(),
        Err(e) => {
            warn!(plugin = %plugin_id, error = %e, "plugin test invocation failed");
            Envelope::from_error(&e).into_response()
        }
    }
}

fn param_error(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Envelope::error(
            codes::PARAM_ERROR,
            format!("invalid request body: {}", rejection.body_text()),
        ),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use herald_core::types::{Output, OutputMeta};
    use herald_core::{HeraldError, NotificationPlugin};
    use herald_plugin::PluginDescriptor;

    struct Echo {
        id: String,
    }

    #[async_trait]
    impl NotificationPlugin for Echo {
        fn id(&self) -> String {
            self.id.clone()
        }

        fn default_settings(&self) -> Option<JsonMap> {
            None
        }

        async fn process(
            &self,
            _cancel: CancellationToken,
            input: &JsonMap,
            _settings: &JsonMap,
        ) -> Result<Output, HeraldError> {
            Ok(Output {
                title: input
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                meta: Some(OutputMeta::default()),
                ..Output::default()
            })
        }
    }

    async fn manager_with(id: &str, name: &str, enabled: bool) -> Arc<Manager> {
        let manager = Arc::new(Manager::new("/nonexistent"));
        let descriptor = PluginDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            version: "1.0.0".to_string(),
            enabled,
            ..PluginDescriptor::default()
        };
        manager
            .register(descriptor, Arc::new(Echo { id: id.to_string() }))
            .await
            .unwrap();
        manager
    }

    async fn envelope_of(response: Response) -> (StatusCode, Envelope) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_plugin_count() {
        let manager = manager_with("demo", "Demo", true).await;
        let app = crate::admin_router(manager);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["plugins"], 1);
    }

    #[tokio::test]
    async fn list_returns_sorted_summaries() {
        let manager = manager_with("beta", "Beta", true).await;
        manager
            .register(
                PluginDescriptor {
                    id: "alpha".to_string(),
                    name: "Alpha".to_string(),
                    enabled: true,
                    ..PluginDescriptor::default()
                },
                Arc::new(Echo {
                    id: "alpha".to_string(),
                }),
            )
            .await
            .unwrap();
        let app = crate::admin_router(manager);

        let response = app
            .oneshot(Request::get("/admin/plugins").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, envelope) = envelope_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.code, codes::SUCCESS);
        let list = envelope.data.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["name"], "Alpha");
        assert_eq!(list[1]["name"], "Beta");
    }

    #[tokio::test]
    async fn get_unknown_plugin_is_not_found_code() {
        let manager = manager_with("demo", "Demo", true).await;
        let app = crate::admin_router(manager);

        let response = app
            .oneshot(
                Request::get("/admin/plugins/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, envelope) = envelope_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.code, codes::PLUGIN_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invocation_returns_full_result_envelope() {
        let manager = manager_with("demo", "Demo", true).await;
        let app = crate::admin_router(manager);

        let response = app
            .oneshot(
                Request::post("/admin/plugins/demo/test")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"input": {"title": "t"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, envelope) = envelope_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.code, codes::SUCCESS);
        assert_eq!(envelope.data["pluginId"], "demo");
        assert_eq!(envelope.data["input"]["title"], "t");
        assert_eq!(envelope.data["output"]["title"], "t");
        assert_eq!(envelope.data["output"]["meta"]["pluginId"], "demo");
    }

    #[tokio::test]
    async fn test_invocation_on_disabled_plugin_is_disabled_code() {
        let manager = manager_with("demo", "Demo", false).await;
        let app = crate::admin_router(manager);

        let response = app
            .oneshot(
                Request::post("/admin/plugins/demo/test")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"input": {}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, envelope) = envelope_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.code, codes::PLUGIN_DISABLED);
        assert!(envelope.msg.contains("demo"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_param_error() {
        let manager = manager_with("demo", "Demo", true).await;
        let app = crate::admin_router(manager);

        let response = app
            .oneshot(
                Request::post("/admin/plugins/demo/test")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, envelope) = envelope_of(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.code, codes::PARAM_ERROR);
    }

    #[tokio::test]
    async fn enable_and_disable_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(Manager::new(dir.path()));
        let descriptor = PluginDescriptor {
            id: "demo".to_string(),
            name: "Demo".to_string(),
            enabled: true,
            config_file: dir.path().join("setting.json"),
            ..PluginDescriptor::default()
        };
        std::fs::write(
            &descriptor.config_file,
            serde_json::to_string_pretty(&descriptor).unwrap(),
        )
        .unwrap();
        manager
            .register(
                descriptor,
                Arc::new(Echo {
                    id: "demo".to_string(),
                }),
            )
            .await
            .unwrap();
        let app = crate::admin_router(Arc::clone(&manager));

        let response = app
            .clone()
            .oneshot(
                Request::put("/admin/plugins/demo/disable")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let (_, envelope) = envelope_of(response).await;
        assert_eq!(envelope.code, codes::SUCCESS);
        assert!(!manager.is_enabled("demo").await);

        let response = app
            .oneshot(
                Request::put("/admin/plugins/demo/enable")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let (_, envelope) = envelope_of(response).await;
        assert_eq!(envelope.code, codes::SUCCESS);
        assert!(manager.is_enabled("demo").await);
    }

    #[tokio::test]
    async fn update_config_on_unknown_plugin_is_not_found() {
        let manager = manager_with("demo", "Demo", true).await;
        let app = crate::admin_router(manager);

        let response = app
            .oneshot(
                Request::put("/admin/plugins/ghost/config")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"settings": {"x": 1}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, envelope) = envelope_of(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.code, codes::PLUGIN_NOT_FOUND);
    }
}
