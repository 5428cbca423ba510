// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin loading and invocation subsystem for the Herald host.
//!
//! Ties together the four core pieces: the persisted descriptor
//! ([`descriptor::PluginDescriptor`]), the structural adapter
//! ([`adapter::PluginHandle`]) that validates and dispatches into a
//! separately compiled module, the per-directory loader, and the
//! [`manager::Manager`] registry that owns every loaded plugin and runs
//! the invocation pipeline.

pub mod adapter;
pub mod descriptor;
pub mod loader;
pub mod manager;

pub use adapter::PluginHandle;
pub use descriptor::{merge_settings, PluginDescriptor};
pub use loader::LoadStats;
pub use manager::{ConfigUpdate, Manager, PluginInfo};
