//! Boundary to the external rendering engine
//!
//! The engine is a black box reachable through four synchronous calls. The
//! host never sees engine-side state; it only holds the opaque handles
//! defined here.

pub mod native;

use crate::error::Result;
use raw_window_handle::RawWindowHandle;
use std::ffi::c_void;
use std::num::NonZeroUsize;

/// Width/height pair in physical pixels.
///
/// Signed because native notifications can report zero or negative extents
/// (minimize, degenerate drag rectangles).
pub type SurfaceSize = dpi::PhysicalSize<i32>;

/// Whether a size can be handed to the engine.
pub fn is_valid_size(size: SurfaceSize) -> bool {
    size.width > 0 && size.height > 0
}

/// Opaque OS surface identifier (HWND, X11 window id, NSView pointer, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(usize);

impl SurfaceHandle {
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr as usize)
    }

    /// Extract the pointer-sized surface id from a window handle.
    ///
    /// Returns `None` for platforms the engine cannot render into.
    pub fn from_window_handle(handle: RawWindowHandle) -> Option<Self> {
        let raw = match handle {
            RawWindowHandle::Win32(h) => h.hwnd as usize,
            RawWindowHandle::Xlib(h) => h.window as usize,
            RawWindowHandle::Xcb(h) => h.window as usize,
            RawWindowHandle::Wayland(h) => h.surface as usize,
            RawWindowHandle::AppKit(h) => h.ns_view as usize,
            _ => return None,
        };
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn raw(self) -> usize {
        self.0
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Opaque identifier of a viewport bound to one surface.
///
/// Never null. Only the surface lifecycle hands these out, wrapped in a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportHandle(NonZeroUsize);

impl ViewportHandle {
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        Self::from_raw(ptr as usize)
    }

    pub fn raw(self) -> usize {
        self.0.get()
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.get() as *mut c_void
    }
}

/// The four calls the host may make into the rendering engine.
///
/// All calls run on the UI thread and are expected to return within a frame.
/// `remove_viewport` must be called at most once per handle; the caller
/// enforces that, the engine does not have to.
pub trait ViewportEngine {
    /// Allocate a viewport bound to `parent` at the given initial size.
    fn create_viewport(&self, parent: SurfaceHandle, width: i32, height: i32)
        -> Result<ViewportHandle>;

    /// The surface the engine itself renders into.
    fn engine_surface(&self) -> Result<SurfaceHandle>;

    /// Resize a live viewport. Requesting the current size is a no-op.
    fn resize_viewport(&self, handle: ViewportHandle, width: i32, height: i32) -> Result<()>;

    /// Destroy a viewport.
    fn remove_viewport(&self, handle: ViewportHandle) -> Result<()>;
}

impl<E: ViewportEngine + ?Sized> ViewportEngine for Box<E> {
    fn create_viewport(
        &self,
        parent: SurfaceHandle,
        width: i32,
        height: i32,
    ) -> Result<ViewportHandle> {
        (**self).create_viewport(parent, width, height)
    }

    fn engine_surface(&self) -> Result<SurfaceHandle> {
        (**self).engine_surface()
    }

    fn resize_viewport(&self, handle: ViewportHandle, width: i32, height: i32) -> Result<()> {
        (**self).resize_viewport(handle, width, height)
    }

    fn remove_viewport(&self, handle: ViewportHandle) -> Result<()> {
        (**self).remove_viewport(handle)
    }
}
