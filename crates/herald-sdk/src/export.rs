// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shims binding a [`HeraldPlugin`] implementation to the C ABI.
//!
//! `export_plugin!` wires these into the well-known exported symbols of a
//! `cdylib`. The generic functions are also public so the host can build
//! and exercise capability tables in-process, without a dynamic library.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use herald_core::types::JsonMap;

use crate::abi::{RawContext, RawLogger, RawNewResult, RawPlugin};
use crate::context::{PluginContext, PluginLogger};
use crate::plugin::HeraldPlugin;

/// Build the capability table for one plugin instance.
///
/// The instance moves onto the heap; the table's `destroy` slot is the
/// only thing that releases it again.
pub fn build_raw<P: HeraldPlugin>(plugin: P) -> RawPlugin {
    RawPlugin {
        state: Box::into_raw(Box::new(plugin)) as *mut c_void,
        id: Some(id_shim::<P>),
        name: Some(name_shim::<P>),
        version: Some(version_shim::<P>),
        description: Some(description_shim::<P>),
        default_settings: Some(default_settings_shim::<P>),
        process: Some(process_shim::<P>),
        set_logger: Some(set_logger_shim::<P>),
        destroy: Some(destroy_shim::<P>),
    }
}

/// Run a fallible constructor and package the outcome for the boundary.
pub fn raw_new<P, E, F>(ctor: F) -> RawNewResult
where
    P: HeraldPlugin,
    E: std::fmt::Display,
    F: FnOnce() -> Result<P, E>,
{
    match ctor() {
        Ok(plugin) => RawNewResult {
            plugin: build_raw(plugin),
            error: ptr::null_mut(),
        },
        Err(err) => RawNewResult {
            plugin: RawPlugin::null(),
            error: into_raw_string(err.to_string()),
        },
    }
}

/// Release a string previously handed out by this module's shims.
///
/// # Safety
///
/// `ptr` must be null or a pointer obtained from this module and not yet
/// freed.
pub unsafe fn str_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

fn into_raw_string(s: String) -> *mut c_char {
    // Strings with interior NULs cannot cross the boundary; they degrade
    // to an empty string.
    CString::new(s).unwrap_or_default().into_raw()
}

/// Parse a JSON object argument. Null and blank both mean "empty map".
unsafe fn parse_map(ptr: *const c_char) -> Result<JsonMap, String> {
    if ptr.is_null() {
        return Ok(JsonMap::new());
    }
    let text = unsafe { CStr::from_ptr(ptr) }.to_string_lossy();
    if text.trim().is_empty() {
        return Ok(JsonMap::new());
    }
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

unsafe extern "C" fn id_shim<P: HeraldPlugin>(state: *mut c_void) -> *mut c_char {
    let plugin = unsafe { &*(state as *const P) };
    into_raw_string(plugin.id())
}

unsafe extern "C" fn name_shim<P: HeraldPlugin>(state: *mut c_void) -> *mut c_char {
    let plugin = unsafe { &*(state as *const P) };
    into_raw_string(plugin.name())
}

unsafe extern "C" fn version_shim<P: HeraldPlugin>(state: *mut c_void) -> *mut c_char {
    let plugin = unsafe { &*(state as *const P) };
    into_raw_string(plugin.version())
}

unsafe extern "C" fn description_shim<P: HeraldPlugin>(state: *mut c_void) -> *mut c_char {
    let plugin = unsafe { &*(state as *const P) };
    into_raw_string(plugin.description())
}

unsafe extern "C" fn default_settings_shim<P: HeraldPlugin>(state: *mut c_void) -> *mut c_char {
    let plugin = unsafe { &*(state as *const P) };
    match plugin.default_settings() {
        Some(map) => match serde_json::to_string(&map) {
            Ok(json) => into_raw_string(json),
            Err(_) => ptr::null_mut(),
        },
        None => ptr::null_mut(),
    }
}

unsafe extern "C" fn process_shim<P: HeraldPlugin>(
    state: *mut c_void,
    ctx: RawContext,
    input_json: *const c_char,
    settings_json: *const c_char,
    out_error: *mut *mut c_char,
) -> *mut c_char {
    // A panicking plugin must not unwind into the host; it becomes a
    // failure string instead.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let plugin = unsafe { &*(state as *const P) };
        let input =
            unsafe { parse_map(input_json) }.map_err(|e| format!("invalid input payload: {e}"))?;
        let settings = unsafe { parse_map(settings_json) }
            .map_err(|e| format!("invalid settings payload: {e}"))?;
        let ctx = PluginContext::from_raw(ctx);
        let output = plugin
            .process(&ctx, &input, &settings)
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&output).map_err(|e| format!("output serialization failed: {e}"))
    }));

    let result = match outcome {
        Ok(result) => result,
        Err(panic) => Err(panic_message(panic)),
    };

    match result {
        Ok(json) => {
            unsafe { *out_error = ptr::null_mut() };
            into_raw_string(json)
        }
        Err(message) => {
            unsafe { *out_error = into_raw_string(message) };
            ptr::null_mut()
        }
    }
}

unsafe extern "C" fn set_logger_shim<P: HeraldPlugin>(state: *mut c_void, logger: RawLogger) {
    // The host calls this once during load, before any concurrent access
    // to the instance.
    let plugin = unsafe { &mut *(state as *mut P) };
    plugin.attach_logger(PluginLogger::from_raw(logger));
}

unsafe extern "C" fn destroy_shim<P: HeraldPlugin>(state: *mut c_void) {
    if !state.is_null() {
        drop(unsafe { Box::from_raw(state as *mut P) });
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("plugin panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("plugin panicked: {s}")
    } else {
        "plugin panicked".to_string()
    }
}

/// Exports a [`HeraldPlugin`] implementation as a loadable Herald module.
///
/// The single-argument form constructs the plugin via `Default`. The
/// two-argument form takes a `fn() -> Result<T, E>` constructor; its error
/// display becomes the constructor failure string the host reports.
///
/// # Example
///
/// ```no_run
/// use herald_core::types::{JsonMap, Output};
/// use herald_sdk::{export_plugin, HeraldPlugin, PluginContext, ProcessError};
///
/// #[derive(Default)]
/// struct Uppercase;
///
/// impl HeraldPlugin for Uppercase {
///     fn id(&self) -> String {
///         "uppercase".to_string()
///     }
///
///     fn process(
///         &self,
///         _ctx: &PluginContext,
///         input: &JsonMap,
///         _settings: &JsonMap,
///     ) -> Result<Output, ProcessError> {
///         let title = input.get("title").and_then(|v| v.as_str()).unwrap_or_default();
///         Ok(Output {
///             title: title.to_uppercase(),
///             ..Output::default()
///         })
///     }
/// }
///
/// export_plugin!(Uppercase);
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($plugin_type:ty) => {
        $crate::export_plugin!($plugin_type, || {
            ::core::result::Result::<$plugin_type, $crate::ProcessError>::Ok(
                <$plugin_type as ::core::default::Default>::default(),
            )
        });
    };
    ($plugin_type:ty, $ctor:expr) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn herald_plugin_abi_version() -> u32 {
            $crate::abi::PLUGIN_ABI_VERSION
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn herald_plugin_new() -> $crate::abi::RawNewResult {
            $crate::export::raw_new::<$plugin_type, _, _>($ctor)
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn herald_plugin_str_free(ptr: *mut ::std::os::raw::c_char) {
            unsafe { $crate::export::str_free(ptr) }
        }
    };
}
