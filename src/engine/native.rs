//! Engine binding through a dynamically loaded library
//!
//! The engine exports four C functions. Symbols are resolved once when the
//! library is loaded; the `Library` is kept alive for as long as any of the
//! resolved function pointers can be called.

use super::{SurfaceHandle, ViewportEngine, ViewportHandle};
use crate::error::{HostError, Result};
use libloading::Library;
use std::ffi::c_void;
use std::path::Path;

pub type CreateViewportFn =
    unsafe extern "C" fn(*mut c_void, i32, i32, *mut *mut c_void) -> i32;
pub type GetWindowHandleFn = unsafe extern "C" fn(*mut *mut c_void) -> i32;
pub type ResizeViewportFn = unsafe extern "C" fn(*mut c_void, i32, i32) -> i32;
pub type RemoveViewportFn = unsafe extern "C" fn(*mut c_void) -> i32;

/// Exported symbol names of the engine library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSymbols {
    pub create_viewport: String,
    pub engine_surface: String,
    pub resize_viewport: String,
    pub remove_viewport: String,
}

impl Default for EngineSymbols {
    fn default() -> Self {
        Self {
            create_viewport: "CreateViewport".into(),
            engine_surface: "GetWindowHandle".into(),
            resize_viewport: "ResizeViewport".into(),
            remove_viewport: "RemoveViewport".into(),
        }
    }
}

/// Function table resolved from the engine library
#[derive(Clone, Copy)]
pub struct EngineVTable {
    pub create_viewport: CreateViewportFn,
    pub engine_surface: GetWindowHandleFn,
    pub resize_viewport: ResizeViewportFn,
    pub remove_viewport: RemoveViewportFn,
}

/// [`ViewportEngine`] backed by native function pointers
pub struct NativeEngine {
    vtable: EngineVTable,
    // Must outlive every call through `vtable`.
    _lib: Option<Library>,
}

impl NativeEngine {
    /// Load the engine library at `path` and resolve its entry points.
    pub fn load(path: &Path, symbols: &EngineSymbols) -> Result<Self> {
        // SAFETY: loading runs the library's initializers; the engine library
        // is trusted host configuration.
        let lib = unsafe { Library::new(path) }.map_err(|e| {
            HostError::EngineUnavailable(format!(
                "load library failed file='{}': {e}",
                path.display()
            ))
        })?;

        // SAFETY: the signatures below are the engine's documented C ABI.
        let vtable = unsafe {
            EngineVTable {
                create_viewport: resolve(&lib, &symbols.create_viewport, path)?,
                engine_surface: resolve(&lib, &symbols.engine_surface, path)?,
                resize_viewport: resolve(&lib, &symbols.resize_viewport, path)?,
                remove_viewport: resolve(&lib, &symbols.remove_viewport, path)?,
            }
        };

        tracing::info!("Engine library loaded from {}", path.display());

        Ok(Self {
            vtable,
            _lib: Some(lib),
        })
    }

    /// Wrap a function table the host already holds, e.g. a statically linked
    /// engine.
    ///
    /// # Safety
    ///
    /// Every function pointer must follow the engine's C ABI and stay callable
    /// for the lifetime of the returned value.
    pub unsafe fn from_vtable(vtable: EngineVTable) -> Self {
        Self { vtable, _lib: None }
    }
}

unsafe fn resolve<T: Copy>(lib: &Library, name: &str, path: &Path) -> Result<T> {
    let mut bytes = Vec::with_capacity(name.len() + 1);
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);

    let sym = unsafe { lib.get::<T>(&bytes) }.map_err(|e| {
        HostError::EngineUnavailable(format!(
            "missing symbol '{}' in '{}': {e}",
            name,
            path.display()
        ))
    })?;
    Ok(*sym)
}

impl ViewportEngine for NativeEngine {
    fn create_viewport(
        &self,
        parent: SurfaceHandle,
        width: i32,
        height: i32,
    ) -> Result<ViewportHandle> {
        let mut out: *mut c_void = std::ptr::null_mut();
        // SAFETY: `out` is a valid out-pointer for the duration of the call.
        let code = unsafe { (self.vtable.create_viewport)(parent.as_ptr(), width, height, &mut out) };
        HostError::check(code, width, height)?;
        ViewportHandle::from_ptr(out).ok_or(HostError::InvalidSurface)
    }

    fn engine_surface(&self) -> Result<SurfaceHandle> {
        let mut out: *mut c_void = std::ptr::null_mut();
        // SAFETY: `out` is a valid out-pointer for the duration of the call.
        let code = unsafe { (self.vtable.engine_surface)(&mut out) };
        HostError::check_call(code, "engine_surface")?;
        let surface = SurfaceHandle::from_ptr(out);
        if surface.is_null() {
            return Err(HostError::EngineUnavailable(
                "engine returned a null surface".into(),
            ));
        }
        Ok(surface)
    }

    fn resize_viewport(&self, handle: ViewportHandle, width: i32, height: i32) -> Result<()> {
        // SAFETY: handle was produced by this engine's create_viewport.
        let code = unsafe { (self.vtable.resize_viewport)(handle.as_ptr(), width, height) };
        HostError::check(code, width, height)
    }

    fn remove_viewport(&self, handle: ViewportHandle) -> Result<()> {
        // SAFETY: handle was produced by this engine's create_viewport and the
        // surface lifecycle releases it at most once.
        let code = unsafe { (self.vtable.remove_viewport)(handle.as_ptr()) };
        HostError::check_call(code, "remove_viewport")
    }
}
