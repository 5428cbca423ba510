// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Author-facing SDK for Herald notification plugins.
//!
//! A plugin is an ordinary Rust crate compiled as a `cdylib`: implement
//! [`HeraldPlugin`], invoke [`export_plugin!`] once, and drop the built
//! module next to a `setting.json` in the host's plugin directory. The
//! host and the plugin never share Rust types at runtime; everything
//! crosses the boundary through the C ABI defined in [`abi`].
//!
//! # Usage
//!
//! ```no_run
//! use herald_core::types::{JsonMap, Output};
//! use herald_sdk::{export_plugin, HeraldPlugin, PluginContext, ProcessError};
//!
//! #[derive(Default)]
//! struct Echo;
//!
//! impl HeraldPlugin for Echo {
//!     fn id(&self) -> String {
//!         "echo".to_string()
//!     }
//!
//!     fn process(
//!         &self,
//!         _ctx: &PluginContext,
//!         input: &JsonMap,
//!         _settings: &JsonMap,
//!     ) -> Result<Output, ProcessError> {
//!         Ok(Output {
//!             title: input
//!                 .get("title")
//!                 .and_then(|v| v.as_str())
//!                 .unwrap_or_default()
//!                 .to_string(),
//!             ..Output::default()
//!         })
//!     }
//! }
//!
//! export_plugin!(Echo);
//! # fn main() {}
//! ```

pub mod abi;
pub mod context;
pub mod export;
pub mod plugin;

pub use context::{PluginContext, PluginLogger};
pub use plugin::{HeraldPlugin, ProcessError};

// Re-export the output vocabulary so a plugin crate needs only this dep.
pub use herald_core::types::{JsonMap, Output, OutputMeta};
