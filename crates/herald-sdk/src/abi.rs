// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The C ABI shared between the Herald host and plugin modules.
//!
//! Host and plugin are compiled separately, so nothing here may assume
//! type identity across the boundary: the surface is a fixed set of
//! exported symbols, a `#[repr(C)]` capability table of nullable function
//! pointers, and JSON payloads carried as NUL-terminated C strings.
//!
//! Every string returned by a module is owned by that module and must be
//! released through its exported `herald_plugin_str_free`, never through
//! the host allocator.

use std::os::raw::{c_char, c_void};

/// Revision of the plugin ABI.
///
/// Bump this when making breaking changes to the capability table or the
/// well-known symbols. The host refuses modules declaring any other value.
pub const PLUGIN_ABI_VERSION: u32 = 1;

/// Symbol every module exports to declare its ABI revision.
pub const ABI_VERSION_SYMBOL: &str = "herald_plugin_abi_version";

/// Symbol for the zero-argument plugin constructor.
pub const NEW_SYMBOL: &str = "herald_plugin_new";

/// Symbol for releasing module-allocated strings.
pub const STR_FREE_SYMBOL: &str = "herald_plugin_str_free";

/// `herald_plugin_abi_version` signature.
pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

/// `herald_plugin_new` signature.
pub type NewFn = unsafe extern "C" fn() -> RawNewResult;

/// `herald_plugin_str_free` signature.
pub type StrFreeFn = unsafe extern "C" fn(ptr: *mut c_char);

/// Log severity values carried across the boundary.
///
/// Out-of-range values are treated as `LOG_INFO` by the host.
pub const LOG_DEBUG: u32 = 0;
pub const LOG_INFO: u32 = 1;
pub const LOG_WARN: u32 = 2;
pub const LOG_ERROR: u32 = 3;

/// Cancellation probe the host passes into every `process` call.
///
/// `data` is owned by the host and valid for the duration of the call.
/// A null `is_cancelled` means cancellation is not observable.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawContext {
    pub data: *mut c_void,
    pub is_cancelled: Option<unsafe extern "C" fn(data: *mut c_void) -> bool>,
}

/// Host logging sink handed to a module through the `set_logger` slot.
///
/// `data` is owned by the host and stays valid until the instance's
/// `destroy` slot runs. The `log` function may be called from any thread.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawLogger {
    pub data: *mut c_void,
    pub log: Option<unsafe extern "C" fn(data: *mut c_void, level: u32, message: *const c_char)>,
}

/// The capability table a module's constructor returns.
///
/// `state` is the opaque instance pointer threaded through every slot.
/// Populated slots define which capabilities the instance provides; the
/// host validates the required ones structurally before accepting the
/// table and never assumes anything about the optional ones.
///
/// # Safety
///
/// Slot functions must be callable from any thread; instance state must
/// be internally synchronized. `process` writes its failure string (or
/// null) through `out_error` and returns the result JSON (or null); both
/// strings are released by the host via `herald_plugin_str_free`.
#[repr(C)]
#[derive(Debug)]
pub struct RawPlugin {
    pub state: *mut c_void,
    pub id: Option<unsafe extern "C" fn(state: *mut c_void) -> *mut c_char>,
    pub name: Option<unsafe extern "C" fn(state: *mut c_void) -> *mut c_char>,
    pub version: Option<unsafe extern "C" fn(state: *mut c_void) -> *mut c_char>,
    pub description: Option<unsafe extern "C" fn(state: *mut c_void) -> *mut c_char>,
    pub default_settings: Option<unsafe extern "C" fn(state: *mut c_void) -> *mut c_char>,
    pub process: Option<
        unsafe extern "C" fn(
            state: *mut c_void,
            ctx: RawContext,
            input_json: *const c_char,
            settings_json: *const c_char,
            out_error: *mut *mut c_char,
        ) -> *mut c_char,
    >,
    pub set_logger: Option<unsafe extern "C" fn(state: *mut c_void, logger: RawLogger)>,
    pub destroy: Option<unsafe extern "C" fn(state: *mut c_void)>,
}

impl RawPlugin {
    /// A table with no state and no capabilities, used on constructor failure.
    pub fn null() -> Self {
        Self {
            state: std::ptr::null_mut(),
            id: None,
            name: None,
            version: None,
            description: None,
            default_settings: None,
            process: None,
            set_logger: None,
            destroy: None,
        }
    }
}

/// The two-value result of `herald_plugin_new`.
///
/// A non-null `error` means construction failed and the capability table
/// must be ignored; the host releases `error` via `herald_plugin_str_free`.
#[repr(C)]
#[derive(Debug)]
pub struct RawNewResult {
    pub plugin: RawPlugin,
    pub error: *mut c_char,
}

/// One entry of the capability contract: method name, number of results,
/// and whether a populated slot is mandatory.
#[derive(Debug, Clone, Copy)]
pub struct CapabilitySpec {
    pub name: &'static str,
    pub results: usize,
    pub required: bool,
}

/// The capability contract, in validation order.
///
/// `process` has two results: the output JSON and the failure string.
pub const CAPABILITIES: &[CapabilitySpec] = &[
    CapabilitySpec {
        name: "id",
        results: 1,
        required: true,
    },
    CapabilitySpec {
        name: "default_settings",
        results: 1,
        required: true,
    },
    CapabilitySpec {
        name: "process",
        results: 2,
        required: true,
    },
    CapabilitySpec {
        name: "name",
        results: 1,
        required: false,
    },
    CapabilitySpec {
        name: "version",
        results: 1,
        required: false,
    },
    CapabilitySpec {
        name: "description",
        results: 1,
        required: false,
    },
    CapabilitySpec {
        name: "set_logger",
        results: 0,
        required: false,
    },
    CapabilitySpec {
        name: "destroy",
        results: 0,
        required: false,
    },
];
