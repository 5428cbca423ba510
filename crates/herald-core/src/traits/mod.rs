// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for loaded plugin instances.

pub mod plugin;

pub use plugin::NotificationPlugin;
