// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-side view of a loaded notification plugin.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HeraldError;
use crate::types::{JsonMap, Output};

/// The contract every loaded plugin instance satisfies from the host's
/// point of view.
///
/// `id`, `default_settings`, and `process` are the required capabilities;
/// the identity methods are optional and degrade to an empty string when
/// the plugin does not provide them.
#[async_trait]
pub trait NotificationPlugin: Send + Sync + 'static {
    /// Returns the unique, stable identifier of this plugin.
    fn id(&self) -> String;

    /// Returns the human-readable display name, or "" if not provided.
    fn name(&self) -> String {
        String::new()
    }

    /// Returns the plugin version string, or "" if not provided.
    fn version(&self) -> String {
        String::new()
    }

    /// Returns the plugin description, or "" if not provided.
    fn description(&self) -> String {
        String::new()
    }

    /// Returns the compiled-in default settings, if any.
    fn default_settings(&self) -> Option<JsonMap>;

    /// Formats one notification from `input` under the merged `settings`.
    ///
    /// The cancellation token is the only channel through which the host
    /// signals that the caller has gone away; plugins poll it at their
    /// own pace.
    async fn process(
        &self,
        cancel: CancellationToken,
        input: &JsonMap,
        settings: &JsonMap,
    ) -> Result<Output, HeraldError>;
}
