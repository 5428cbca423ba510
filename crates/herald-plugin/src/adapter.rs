// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural adapter bridging a loaded capability table to the host's
//! [`NotificationPlugin`] trait.
//!
//! The host and the module were compiled separately, so no Rust type
//! crosses the boundary: the module hands over a `#[repr(C)]` table of
//! nullable function pointers and JSON strings. The adapter validates the
//! required slots once at construction, dispatches every call through the
//! stored slots, and rebuilds composite results field by field, by name.

use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::Arc;

use async_trait::async_trait;
use libloading::Library;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use herald_core::types::{JsonMap, Output, OutputMeta};
use herald_core::{HeraldError, NotificationPlugin};
use herald_sdk::abi::{
    RawContext, RawLogger, RawPlugin, StrFreeFn, CAPABILITIES, LOG_DEBUG, LOG_ERROR, LOG_WARN,
};

/// A validated, host-side handle to one loaded plugin instance.
///
/// Owns the library handle for the process lifetime; on drop the optional
/// `destroy` slot runs before the library is released.
pub struct PluginHandle {
    shared: Arc<SharedTable>,
}

// The table is raw pointers end to end; the id is the only meaningful
// thing to show.
impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}

/// The state shared with blocking process calls.
///
/// Field order matters for drop: `logger_tag` must outlive the `destroy`
/// call (which may still log) and the library must be released last, after
/// every function pointer into it is dead. The library handle is held only
/// for that keep-alive, never read.
struct SharedTable {
    raw: RawPlugin,
    str_free: StrFreeFn,
    logger_tag: std::sync::OnceLock<Box<LoggerTag>>,
    _library: Option<Library>,
}

// The ABI contract requires every populated slot to be callable from any
// thread, with instance state internally synchronized.
unsafe impl Send for SharedTable {}
unsafe impl Sync for SharedTable {}

impl Drop for SharedTable {
    fn drop(&mut self) {
        if let Some(destroy) = self.raw.destroy
            && !self.raw.state.is_null()
        {
            unsafe { destroy(self.raw.state) };
        }
        // The library field drops after this body, releasing the module
        // only once the instance is gone.
    }
}

impl SharedTable {
    /// Copy a module-owned string out and release it through the module's
    /// allocator.
    unsafe fn take_string(&self, ptr: *mut c_char) -> Option<String> {
        if ptr.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        unsafe { (self.str_free)(ptr) };
        Some(text)
    }
}

/// Tag threaded through the host log sink so module log lines carry the
/// plugin id. Boxed and kept alive until the instance is destroyed.
struct LoggerTag {
    plugin_id: String,
}

unsafe extern "C" fn host_log(data: *mut c_void, level: u32, message: *const c_char) {
    if data.is_null() || message.is_null() {
        return;
    }
    let tag = unsafe { &*(data as *const LoggerTag) };
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    match level {
        LOG_DEBUG => debug!(plugin = %tag.plugin_id, "{text}"),
        LOG_WARN => warn!(plugin = %tag.plugin_id, "{text}"),
        LOG_ERROR => tracing::error!(plugin = %tag.plugin_id, "{text}"),
        _ => tracing::info!(plugin = %tag.plugin_id, "{text}"),
    }
}

unsafe extern "C" fn token_probe(data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let token = unsafe { &*(data as *const CancellationToken) };
    token.is_cancelled()
}

impl PluginHandle {
    /// Validate a capability table and wrap it.
    ///
    /// Every required capability slot must be populated, checked eagerly
    /// here so a malformed module is rejected before registration rather
    /// than failing mid-request. On rejection the instance is destroyed
    /// through its own `destroy` slot when one exists.
    pub fn new(
        raw: RawPlugin,
        str_free: StrFreeFn,
        library: Option<Library>,
    ) -> Result<Self, HeraldError> {
        for capability in CAPABILITIES.iter().filter(|c| c.required) {
            let populated = match capability.name {
                "id" => raw.id.is_some(),
                "default_settings" => raw.default_settings.is_some(),
                "process" => raw.process.is_some(),
                _ => true,
            };
            if !populated {
                if let Some(destroy) = raw.destroy
                    && !raw.state.is_null()
                {
                    unsafe { destroy(raw.state) };
                }
                return Err(HeraldError::MissingCapability {
                    capability: capability.name.to_string(),
                });
            }
        }

        Ok(Self {
            shared: Arc::new(SharedTable {
                raw,
                str_free,
                logger_tag: std::sync::OnceLock::new(),
                _library: library,
            }),
        })
    }

    /// Feed the host's structured log sink through the optional
    /// `set_logger` slot, tagging every line with `plugin_id`.
    ///
    /// No-op when the module does not expose the slot. Must be called
    /// before the handle is shared, while no process call is in flight.
    pub fn install_logger(&self, plugin_id: &str) {
        let Some(set_logger) = self.shared.raw.set_logger else {
            return;
        };
        let tag = self.shared.logger_tag.get_or_init(|| {
            Box::new(LoggerTag {
                plugin_id: plugin_id.to_string(),
            })
        });
        let logger = RawLogger {
            data: &**tag as *const LoggerTag as *mut c_void,
            log: Some(host_log),
        };
        unsafe { set_logger(self.shared.raw.state, logger) };
    }

    /// Call a string-returning slot, degrading to an empty string when the
    /// slot is absent.
    fn call_string(
        &self,
        slot: Option<unsafe extern "C" fn(*mut c_void) -> *mut c_char>,
    ) -> String {
        let Some(method) = slot else {
            return String::new();
        };
        let ptr = unsafe { method(self.shared.raw.state) };
        unsafe { self.shared.take_string(ptr) }.unwrap_or_default()
    }
}

#[async_trait]
impl NotificationPlugin for PluginHandle {
    fn id(&self) -> String {
        self.call_string(self.shared.raw.id)
    }

    fn name(&self) -> String {
        self.call_string(self.shared.raw.name)
    }

    fn version(&self) -> String {
        self.call_string(self.shared.raw.version)
    }

    fn description(&self) -> String {
        self.call_string(self.shared.raw.description)
    }

    fn default_settings(&self) -> Option<JsonMap> {
        let Some(method) = self.shared.raw.default_settings else {
            return None;
        };
        let ptr = unsafe { method(self.shared.raw.state) };
        let json = unsafe { self.shared.take_string(ptr) }?;
        match serde_json::from_str(&json) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!(plugin = %self.id(), error = %e, "plugin default settings are not a JSON object, ignoring");
                None
            }
        }
    }

    async fn process(
        &self,
        cancel: CancellationToken,
        input: &JsonMap,
        settings: &JsonMap,
    ) -> Result<Output, HeraldError> {
        let id = self.id();

        // Should be unreachable after construction-time validation, but a
        // null slot must fail explicitly rather than dereference.
        let Some(process) = self.shared.raw.process else {
            return Err(HeraldError::MissingCapability {
                capability: "process".to_string(),
            });
        };

        let input_json = encode_map(&id, input)?;
        let settings_json = encode_map(&id, settings)?;
        let shared = Arc::clone(&self.shared);

        // The plugin call may block for its full duration; run it on the
        // blocking pool so it never wedges the async runtime.
        let (result, failure) = tokio::task::spawn_blocking(move || {
            // Boxed so the probe pointer stays stable for the whole call.
            let token = Box::new(cancel);
            let ctx = RawContext {
                data: &*token as *const CancellationToken as *mut c_void,
                is_cancelled: Some(token_probe),
            };
            let mut err_ptr: *mut c_char = ptr::null_mut();
            let out_ptr = unsafe {
                process(
                    shared.raw.state,
                    ctx,
                    input_json.as_ptr(),
                    settings_json.as_ptr(),
                    &mut err_ptr,
                )
            };
            let failure = unsafe { shared.take_string(err_ptr) };
            let result = unsafe { shared.take_string(out_ptr) };
            (result, failure)
        })
        .await
        .map_err(|e| HeraldError::Internal(format!("plugin call task failed: {e}")))?;

        // A failure indicator wins even when a result came back with it.
        if let Some(message) = failure {
            return Err(HeraldError::Process { id, message });
        }
        let Some(json) = result else {
            return Err(HeraldError::Conversion {
                id,
                message: "process returned neither output nor failure".to_string(),
            });
        };
        convert_output(&json).map_err(|message| HeraldError::Conversion { id, message })
    }
}

fn encode_map(id: &str, map: &JsonMap) -> Result<CString, HeraldError> {
    let json = serde_json::to_string(map).map_err(|e| HeraldError::Internal(format!(
        "failed to encode payload for plugin `{id}`: {e}"
    )))?;
    CString::new(json).map_err(|_| {
        HeraldError::Internal(format!("payload for plugin `{id}` contains a NUL byte"))
    })
}

/// Rebuild a host [`Output`] from the module's result JSON, field by field.
///
/// Absent and `null` fields fall back to their defaults; unknown fields are
/// ignored. Lists and maps are rebuilt element by element rather than cast
/// wholesale, so a module built against a different SDK revision converts
/// as long as the field names line up.
fn convert_output(json: &str) -> Result<Output, String> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| format!("output is not valid JSON: {e}"))?;
    let Value::Object(fields) = value else {
        return Err("output is not a JSON object".to_string());
    };

    let mut output = Output::default();
    for (key, value) in &fields {
        match key.as_str() {
            "title" => output.title = string_field(value),
            "content" => output.content = string_field(value),
            "image" => output.image = string_field(value),
            "url" => output.url = string_field(value),
            "targets" => output.targets = string_list(value),
            "isNotify" => {
                if let Value::Bool(flag) = value {
                    output.is_notify = *flag;
                }
            }
            "meta" => output.meta = convert_meta(value)?,
            _ => {}
        }
    }
    Ok(output)
}

fn convert_meta(value: &Value) -> Result<Option<OutputMeta>, String> {
    let fields = match value {
        Value::Null => return Ok(None),
        Value::Object(fields) => fields,
        _ => return Err("meta is not a JSON object".to_string()),
    };

    let mut meta = OutputMeta::default();
    for (key, value) in fields {
        match key.as_str() {
            "req" => meta.req = map_field(value),
            "pluginId" => meta.plugin_id = string_field(value),
            "processedAt" => meta.processed_at = string_field(value),
            "extra" => {
                meta.extra = match value {
                    Value::Null => None,
                    other => Some(map_field(other)),
                }
            }
            _ => {}
        }
    }
    Ok(Some(meta))
}

fn string_field(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn string_list(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    let mut targets = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => targets.push(s.clone()),
            Value::Number(n) => targets.push(n.to_string()),
            Value::Bool(b) => targets.push(b.to_string()),
            _ => {}
        }
    }
    targets
}

fn map_field(value: &Value) -> JsonMap {
    let Value::Object(entries) = value else {
        return JsonMap::new();
    };
    let mut map = JsonMap::new();
    for (key, value) in entries {
        map.insert(key.clone(), value.clone());
    }
    map
}
