// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-directory plugin loading: descriptor parsing, platform module
//! resolution, symbol lookup, ABI gating, and constructor invocation.
//!
//! Each subdirectory of the plugins root is loaded independently; every
//! step fails with an error naming that step and never aborts the other
//! directories (the manager drives the scan and isolates failures).

use std::env::consts;
use std::ffi::CStr;
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::debug;

use herald_core::{HeraldError, NotificationPlugin};
use herald_sdk::abi::{
    AbiVersionFn, NewFn, StrFreeFn, ABI_VERSION_SYMBOL, NEW_SYMBOL, PLUGIN_ABI_VERSION,
    STR_FREE_SYMBOL,
};

use crate::adapter::PluginHandle;
use crate::descriptor::PluginDescriptor;

/// Counters from one plugins-directory scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadStats {
    /// Subdirectories attempted.
    pub attempted: usize,
    /// Plugins loaded and registered.
    pub loaded: usize,
    /// Subdirectories that failed at any step.
    pub failed: usize,
}

/// Resolve the native module file inside a plugin directory.
///
/// The platform-and-architecture-qualified name wins over the generic
/// fallback; the first existing file is taken.
pub(crate) fn resolve_module(dir: &Path) -> Result<PathBuf, HeraldError> {
    let candidates = [
        format!(
            "plugin-{}-{}.{}",
            consts::OS,
            consts::ARCH,
            consts::DLL_EXTENSION
        ),
        format!("plugin.{}", consts::DLL_EXTENSION),
    ];

    for name in &candidates {
        let path = dir.join(name);
        if path.is_file() {
            debug!(module = %path.display(), "resolved plugin module");
            return Ok(path);
        }
    }

    Err(HeraldError::ModuleNotFound {
        dir: dir.to_path_buf(),
        tried: candidates.join(", "),
    })
}

/// Load one plugin from its directory, through every step up to a
/// validated handle: descriptor, module file, library, constructor symbol,
/// ABI gate, construction, structural validation, id check.
///
/// The returned handle already carries the host logger when the module
/// exposes the `set_logger` capability.
pub(crate) fn load_one(dir: &Path) -> Result<(PluginDescriptor, PluginHandle), HeraldError> {
    let descriptor = PluginDescriptor::load(&dir.join("setting.json"))?;

    let module_path = resolve_module(dir)?;

    let library = unsafe { Library::new(&module_path) }.map_err(|e| HeraldError::ModuleLoad {
        path: module_path.clone(),
        message: e.to_string(),
    })?;

    let new_fn: NewFn = resolve_symbol(&library, &module_path, NEW_SYMBOL)?;
    let abi_version: AbiVersionFn = resolve_symbol(&library, &module_path, ABI_VERSION_SYMBOL)?;
    let str_free: StrFreeFn = resolve_symbol(&library, &module_path, STR_FREE_SYMBOL)?;

    let found = unsafe { abi_version() };
    if found != PLUGIN_ABI_VERSION {
        return Err(HeraldError::AbiMismatch {
            path: module_path,
            expected: PLUGIN_ABI_VERSION,
            found,
        });
    }

    let result = unsafe { new_fn() };
    if !result.error.is_null() {
        let message = unsafe { CStr::from_ptr(result.error) }
            .to_string_lossy()
            .into_owned();
        unsafe { str_free(result.error) };
        if let Some(destroy) = result.plugin.destroy
            && !result.plugin.state.is_null()
        {
            unsafe { destroy(result.plugin.state) };
        }
        return Err(HeraldError::Constructor {
            path: module_path,
            message,
        });
    }

    let handle = PluginHandle::new(result.plugin, str_free, Some(library))?;

    // Guards against misconfigured or copy-pasted plugin directories.
    let reported = handle.id();
    if reported != descriptor.id {
        return Err(HeraldError::IdMismatch {
            descriptor: descriptor.id,
            reported,
        });
    }

    handle.install_logger(&descriptor.id);

    Ok((descriptor, handle))
}

fn resolve_symbol<T: Copy>(
    library: &Library,
    module_path: &Path,
    symbol: &str,
) -> Result<T, HeraldError> {
    let found = unsafe { library.get::<T>(symbol.as_bytes()) }.map_err(|_| {
        HeraldError::MissingSymbol {
            path: module_path.to_path_buf(),
            symbol: symbol.to_string(),
        }
    })?;
    Ok(*found)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::os::raw::c_char;

    use herald_core::types::{JsonMap, Output};
    use herald_sdk::export::build_raw;
    use herald_sdk::{HeraldPlugin, PluginContext, ProcessError};

    struct Echo;

    impl HeraldPlugin for Echo {
        fn id(&self) -> String {
            "echo".to_string()
        }

        fn process(
            &self,
            _ctx: &PluginContext,
            _input: &JsonMap,
            _settings: &JsonMap,
        ) -> Result<Output, ProcessError> {
            Ok(Output::default())
        }
    }

    unsafe extern "C" fn free_shim(ptr: *mut c_char) {
        unsafe { herald_sdk::export::str_free(ptr) };
    }

    // The id check after construction goes through the host trait, the
    // same way the load tail does it.
    #[test]
    fn validated_handle_reports_the_module_id() {
        let handle = PluginHandle::new(build_raw(Echo), free_shim, None).unwrap();
        assert_eq!(handle.id(), "echo");
    }

    #[test]
    fn platform_qualified_module_wins_over_generic() {
        let dir = tempfile::tempdir().unwrap();
        let qualified = format!(
            "plugin-{}-{}.{}",
            consts::OS,
            consts::ARCH,
            consts::DLL_EXTENSION
        );
        std::fs::write(dir.path().join(&qualified), b"").unwrap();
        std::fs::write(
            dir.path().join(format!("plugin.{}", consts::DLL_EXTENSION)),
            b"",
        )
        .unwrap();

        let resolved = resolve_module(dir.path()).unwrap();
        assert_eq!(resolved.file_name().unwrap().to_str().unwrap(), qualified);
    }

    #[test]
    fn generic_module_is_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let generic = format!("plugin.{}", consts::DLL_EXTENSION);
        std::fs::write(dir.path().join(&generic), b"").unwrap();

        let resolved = resolve_module(dir.path()).unwrap();
        assert_eq!(resolved.file_name().unwrap().to_str().unwrap(), generic);
    }

    #[test]
    fn missing_module_names_every_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_module(dir.path()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("plugin-"));
        assert!(text.contains(&format!("plugin.{}", consts::DLL_EXTENSION)));
    }

    #[test]
    fn load_one_fails_on_missing_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_one(dir.path()).unwrap_err();
        assert!(matches!(err, HeraldError::Descriptor { .. }));
    }

    #[test]
    fn load_one_fails_on_missing_module() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("setting.json"),
            r#"{"id": "demo", "name": "Demo"}"#,
        )
        .unwrap();

        let err = load_one(dir.path()).unwrap_err();
        assert!(matches!(err, HeraldError::ModuleNotFound { .. }));
    }

    #[test]
    fn load_one_fails_on_unloadable_module() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("setting.json"),
            r#"{"id": "demo", "name": "Demo"}"#,
        )
        .unwrap();
        // An empty file is not a valid shared object.
        std::fs::write(
            dir.path().join(format!("plugin.{}", consts::DLL_EXTENSION)),
            b"",
        )
        .unwrap();

        let err = load_one(dir.path()).unwrap_err();
        assert!(matches!(err, HeraldError::ModuleLoad { .. }));
    }
}
