// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Herald plugin host.
//!
//! This crate provides the foundational trait definition, error types, and
//! common types used throughout the Herald workspace. The loader, registry,
//! gateway, and plugin SDK all build on the vocabulary defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HeraldError;
pub use traits::NotificationPlugin;
pub use types::{JsonMap, Output, OutputMeta, UiNode};
