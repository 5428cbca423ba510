// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host facilities exposed to a running plugin: cancellation and logging.

use std::ffi::CString;

use crate::abi::{RawContext, RawLogger, LOG_DEBUG, LOG_ERROR, LOG_INFO, LOG_WARN};

/// Per-call context handed to [`crate::HeraldPlugin::process`].
///
/// Wraps the cancellation probe the host passed across the boundary.
/// Long-running plugins should poll [`PluginContext::is_cancelled`] and
/// bail out early when it turns true.
#[derive(Debug)]
pub struct PluginContext {
    raw: RawContext,
}

impl PluginContext {
    /// Wrap a raw context received from the host.
    pub fn from_raw(raw: RawContext) -> Self {
        Self { raw }
    }

    /// A context that never reports cancellation, for tests and tooling.
    pub fn detached() -> Self {
        Self {
            raw: RawContext {
                data: std::ptr::null_mut(),
                is_cancelled: None,
            },
        }
    }

    /// Returns true once the host has abandoned this call.
    pub fn is_cancelled(&self) -> bool {
        match self.raw.is_cancelled {
            // The host keeps `data` valid for the duration of the call.
            Some(probe) => unsafe { probe(self.raw.data) },
            None => false,
        }
    }
}

/// Handle to the host's log sink, delivered through the `set_logger` slot.
///
/// Messages land in the host's structured log tagged with this plugin's
/// id. Dropping the logger is harmless; it borrows nothing.
#[derive(Debug, Clone)]
pub struct PluginLogger {
    raw: RawLogger,
}

// The host guarantees `raw.data` stays valid until `destroy` runs and that
// the log function is callable from any thread.
unsafe impl Send for PluginLogger {}
unsafe impl Sync for PluginLogger {}

impl PluginLogger {
    /// Wrap a raw logger received from the host.
    pub fn from_raw(raw: RawLogger) -> Self {
        Self { raw }
    }

    /// A logger that discards everything, for tests and default state.
    pub fn disabled() -> Self {
        Self {
            raw: RawLogger {
                data: std::ptr::null_mut(),
                log: None,
            },
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LOG_DEBUG, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LOG_INFO, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LOG_WARN, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LOG_ERROR, message);
    }

    fn log(&self, level: u32, message: &str) {
        let Some(sink) = self.raw.log else {
            return;
        };
        // Messages with interior NULs cannot cross the boundary; drop them
        // rather than truncating silently mid-record.
        let Ok(message) = CString::new(message) else {
            return;
        };
        unsafe { sink(self.raw.data, level, message.as_ptr()) };
    }
}
