//! Classification of native window notifications
//!
//! This is the only place that knows platform message codes. Everything
//! downstream works with [`ResizeEvent`]. Unknown or unsupported messages are
//! simply not classified; nothing here is fatal.

use crate::engine::SurfaceSize;
use baseview::{Event, WindowEvent};

pub const WM_SIZE: u32 = 0x0005;
pub const WM_SIZING: u32 = 0x0214;
pub const WM_ENTERSIZEMOVE: u32 = 0x0231;
pub const WM_EXITSIZEMOVE: u32 = 0x0232;

/// `WM_SIZE` wparam value sent when the window is minimized.
pub const SIZE_MINIMIZED: usize = 1;

/// The four kinds of notification the resize coordinator understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEvent {
    /// The user started dragging a border or the caption.
    EnterInteractiveResize,
    /// Intermediate size during a drag; fired many times.
    SizeChanging(SurfaceSize),
    /// The drag ended. Carries the final size when the platform reports one.
    ExitInteractiveResize(Option<SurfaceSize>),
    /// The size changed, interactively or programmatically (maximize,
    /// restore, minimize).
    SizeCommitted(SurfaceSize),
}

/// Events the host adapter reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Resize(ResizeEvent),
    /// The hosting surface is about to go away.
    Close,
}

/// Classify a raw Win32 message.
///
/// `WM_SIZING` is not classified: its rectangle is the outer window frame,
/// not the client area the viewport fills. The client size of a drag arrives
/// through the `WM_SIZE` that follows it.
pub fn classify_win32(msg: u32, wparam: usize, lparam: isize) -> Option<ResizeEvent> {
    match msg {
        WM_ENTERSIZEMOVE => Some(ResizeEvent::EnterInteractiveResize),
        WM_EXITSIZEMOVE => Some(ResizeEvent::ExitInteractiveResize(None)),
        WM_SIZE => {
            if wparam == SIZE_MINIMIZED {
                return Some(ResizeEvent::SizeCommitted(SurfaceSize::new(0, 0)));
            }
            // Low word = client width, high word = client height.
            let width = (lparam & 0xFFFF) as i32;
            let height = ((lparam >> 16) & 0xFFFF) as i32;
            Some(ResizeEvent::SizeCommitted(SurfaceSize::new(width, height)))
        }
        _ => None,
    }
}

/// Pack a client size the way `WM_SIZE` carries it in `lparam`.
pub fn pack_size_lparam(width: u16, height: u16) -> isize {
    (width as isize) | ((height as isize) << 16)
}

/// Translates baseview events into host events
pub struct EventTranslator {
    scale_factor: f64,
    last_size: Option<SurfaceSize>,
}

impl EventTranslator {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            scale_factor,
            last_size: None,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Last physical size reported by the window, if any.
    pub fn last_size(&self) -> Option<SurfaceSize> {
        self.last_size
    }

    /// Convert a logical size to physical pixels at the current scale.
    pub fn to_physical(&self, width: f64, height: f64) -> SurfaceSize {
        dpi::LogicalSize::new(width, height).to_physical(self.scale_factor)
    }

    /// Translate a baseview event into a host event.
    /// Returns None if the host does not care about it.
    pub fn translate(&mut self, event: &Event) -> Option<HostEvent> {
        match event {
            Event::Window(win) => self.translate_window(win),
            Event::Mouse(_) | Event::Keyboard(_) => None,
        }
    }

    fn translate_window(&mut self, event: &WindowEvent) -> Option<HostEvent> {
        match event {
            WindowEvent::Resized(info) => {
                self.scale_factor = info.scale();
                let physical = info.physical_size();
                let size = SurfaceSize::new(
                    i32::try_from(physical.width).unwrap_or(i32::MAX),
                    i32::try_from(physical.height).unwrap_or(i32::MAX),
                );
                self.last_size = Some(size);
                Some(HostEvent::Resize(ResizeEvent::SizeCommitted(size)))
            }
            WindowEvent::WillClose => Some(HostEvent::Close),
            WindowEvent::Focused | WindowEvent::Unfocused => None,
        }
    }
}
