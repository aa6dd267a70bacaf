//! Viewport window implementation using baseview
//!
//! Creates a baseview child window inside a host-provided parent, anchors it
//! as the viewport's surface and drives a [`ViewportHost`] from baseview's
//! callbacks.

use crate::config::HostConfig;
use crate::engine::native::NativeEngine;
use crate::engine::{SurfaceHandle, SurfaceSize, ViewportEngine};
use crate::error::{HostError, Result};
use crate::event::{EventTranslator, HostEvent, ResizeEvent};
use crate::host::ViewportHost;
use baseview::{Event, EventStatus, Window, WindowHandler, WindowOpenOptions, WindowScalePolicy};
use raw_window_handle::HasRawWindowHandle;

/// Handle to a viewport window running in baseview
pub struct ViewportWindowHandle {
    inner: baseview::WindowHandle,
}

impl ViewportWindowHandle {
    /// Close the window. The viewport is destroyed by the window's handler.
    pub fn close(&mut self) {
        self.inner.close();
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

/// Builder for windows that host a native viewport
pub struct ViewportWindow;

impl ViewportWindow {
    /// Open a viewport window parented to another window
    ///
    /// This is the entry point for editor shells: `parent` is the container
    /// the viewport should appear in.
    pub fn open_parented<P, E>(
        parent: &P,
        options: WindowOpenOptions,
        engine: E,
        config: HostConfig,
    ) -> ViewportWindowHandle
    where
        P: HasRawWindowHandle,
        E: ViewportEngine + Send + 'static,
    {
        let initial = initial_size(&options);

        let inner = Window::open_parented(parent, options, move |window| {
            ViewportHandler::new(window, engine, &config, initial)
        });

        ViewportWindowHandle { inner }
    }

    /// Open a parented viewport window backed by the engine library named in
    /// `config`.
    pub fn open_native_parented<P>(
        parent: &P,
        options: WindowOpenOptions,
        config: HostConfig,
    ) -> Result<ViewportWindowHandle>
    where
        P: HasRawWindowHandle,
    {
        let engine = load_engine(&config)?;
        Ok(Self::open_parented(parent, options, engine, config))
    }

    /// Open a standalone window (for testing)
    ///
    /// Note: This blocks the current thread until the window is closed.
    pub fn open_blocking<E>(options: WindowOpenOptions, engine: E, config: HostConfig)
    where
        E: ViewportEngine + Send + 'static,
    {
        let initial = initial_size(&options);

        Window::open_blocking(options, move |window| {
            ViewportHandler::new(window, engine, &config, initial)
        });
    }
}

/// Load the engine library configured in `config`.
pub fn load_engine(config: &HostConfig) -> Result<NativeEngine> {
    let path = config.engine_library.as_deref().ok_or_else(|| {
        HostError::EngineUnavailable("no engine library configured".into())
    })?;
    NativeEngine::load(path, &config.symbols)
}

/// Logical window size and a scale guess, until baseview reports the real one.
fn initial_size(options: &WindowOpenOptions) -> (f64, f64, f64) {
    let scale = match options.scale {
        WindowScalePolicy::ScaleFactor(scale) => scale,
        WindowScalePolicy::SystemScaleFactor => 1.0,
    };
    (options.size.width, options.size.height, scale)
}

/// Times a rejected surface is offered to the engine again before giving up.
const MAX_BIND_ATTEMPTS: u32 = 8;
/// Frames to wait between bind attempts driven by the frame timer.
const BIND_RETRY_FRAMES: u32 = 30;

/// Bind attempts left after the engine rejected the surface
#[derive(Debug, Default)]
struct BindRetry {
    attempts: u32,
    wait_frames: u32,
}

impl BindRetry {
    /// Called once per frame; true when a frame-driven attempt may run.
    fn tick(&mut self) -> bool {
        if self.wait_frames > 0 {
            self.wait_frames -= 1;
            return false;
        }
        true
    }

    /// Record a rejection. Returns false once no attempts are left.
    fn rejected(&mut self) -> bool {
        self.attempts += 1;
        self.wait_frames = BIND_RETRY_FRAMES;
        self.attempts < MAX_BIND_ATTEMPTS
    }
}

/// Internal window handler that bridges baseview to the viewport host
struct ViewportHandler<E: ViewportEngine> {
    host: ViewportHost<E>,
    translator: EventTranslator,
    /// Logical size the window was opened with
    width: f64,
    height: f64,
    retry: BindRetry,
    /// Set once the viewport is given up on; it is not shown.
    failed: bool,
}

impl<E: ViewportEngine> ViewportHandler<E> {
    fn new(window: &mut Window, engine: E, config: &HostConfig, initial: (f64, f64, f64)) -> Self {
        let mut host = ViewportHost::new(engine, config.resize);
        let mut failed = false;

        match SurfaceHandle::from_window_handle(window.raw_window_handle()) {
            Some(surface) => {
                if let Err(e) = host.attach(surface) {
                    tracing::error!("Failed to attach viewport host: {}", e);
                    failed = true;
                }
            }
            None => {
                tracing::error!("Unsupported window handle for a native viewport");
                failed = true;
            }
        }

        let mut handler = Self::with_host(host, initial);
        handler.failed = failed;
        handler
    }

    fn with_host(host: ViewportHost<E>, initial: (f64, f64, f64)) -> Self {
        let (width, height, scale) = initial;
        Self {
            host,
            translator: EventTranslator::new(scale),
            width,
            height,
            retry: BindRetry::default(),
            failed: false,
        }
    }

    /// First layout pass: bind at the last reported size, or the size the
    /// window was opened with.
    fn ensure_bound(&mut self) {
        if self.failed || self.host.is_bound() || !self.host.is_attached() {
            return;
        }
        if !self.retry.tick() {
            return;
        }

        let size = self
            .translator
            .last_size()
            .unwrap_or_else(|| self.translator.to_physical(self.width, self.height));
        self.layout(size);
    }

    fn layout(&mut self, size: SurfaceSize) {
        if let Err(e) = self.host.on_layout(size) {
            self.fail(e);
        }
    }

    fn fail(&mut self, e: HostError) {
        match e {
            HostError::InvalidSurface if !self.host.is_bound() && self.retry.rejected() => {
                tracing::warn!(
                    "Engine rejected the surface (attempt {} of {}); retrying on a later layout",
                    self.retry.attempts,
                    MAX_BIND_ATTEMPTS
                );
            }
            e if e.is_fatal() => {
                tracing::error!("Viewport disabled: {}", e);
                self.failed = true;
                self.host.detach();
            }
            e => tracing::warn!("Viewport error: {}", e),
        }
    }

    fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Resize(ResizeEvent::SizeCommitted(size)) if !self.failed => {
                self.layout(size);
            }
            HostEvent::Resize(resize) if !self.failed => {
                if let Err(e) = self.host.handle_event(resize) {
                    self.fail(e);
                }
            }
            HostEvent::Resize(_) => {}
            HostEvent::Close => {
                self.host.detach();
            }
        }
    }
}

impl<E: ViewportEngine> WindowHandler for ViewportHandler<E> {
    fn on_frame(&mut self, _window: &mut Window) {
        self.ensure_bound();
    }

    fn on_event(&mut self, _window: &mut Window, event: Event) -> EventStatus {
        if let Some(host_event) = self.translator.translate(&event) {
            self.handle_host_event(host_event);
            EventStatus::Captured
        } else {
            EventStatus::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ViewportHandle;
    use crate::resize::ResizePolicy;
    use std::cell::Cell;
    use std::sync::Arc;

    /// Rejects the surface a fixed number of times, then accepts it
    #[derive(Default)]
    struct PickyEngine {
        rejections: Cell<u32>,
        creates: Cell<u32>,
        removes: Cell<u32>,
    }

    impl ViewportEngine for PickyEngine {
        fn create_viewport(&self, _: SurfaceHandle, _: i32, _: i32) -> Result<ViewportHandle> {
            self.creates.set(self.creates.get() + 1);
            if self.rejections.get() > 0 {
                self.rejections.set(self.rejections.get() - 1);
                return Err(HostError::InvalidSurface);
            }
            Ok(ViewportHandle::from_raw(3).unwrap())
        }

        fn engine_surface(&self) -> Result<SurfaceHandle> {
            Err(HostError::EngineUnavailable("host owns the surface".into()))
        }

        fn resize_viewport(&self, _: ViewportHandle, _: i32, _: i32) -> Result<()> {
            Ok(())
        }

        fn remove_viewport(&self, _: ViewportHandle) -> Result<()> {
            self.removes.set(self.removes.get() + 1);
            Ok(())
        }
    }

    fn handler(rejections: u32) -> (Arc<PickyEngine>, ViewportHandler<PickyEngine>) {
        let engine = Arc::new(PickyEngine::default());
        engine.rejections.set(rejections);
        let mut host = ViewportHost::with_shared_engine(engine.clone(), ResizePolicy::default());
        host.attach(SurfaceHandle::from_raw(0x77)).unwrap();
        (engine, ViewportHandler::with_host(host, (800.0, 600.0, 1.0)))
    }

    fn run_frames(handler: &mut ViewportHandler<PickyEngine>, frames: u32) {
        for _ in 0..frames {
            handler.ensure_bound();
        }
    }

    #[test]
    fn rejected_surface_is_retried_on_later_frames() {
        let (engine, mut handler) = handler(2);

        handler.ensure_bound();
        assert!(!handler.host.is_bound());
        assert!(handler.host.is_attached());
        assert!(!handler.failed);

        run_frames(&mut handler, 2 * (BIND_RETRY_FRAMES + 1));
        assert!(handler.host.is_bound());
        assert!(!handler.failed);
        assert_eq!(engine.creates.get(), 3);
    }

    #[test]
    fn retries_wait_between_frames() {
        let (engine, mut handler) = handler(1);
        handler.ensure_bound();
        run_frames(&mut handler, BIND_RETRY_FRAMES);
        assert_eq!(engine.creates.get(), 1);

        handler.ensure_bound();
        assert!(handler.host.is_bound());
    }

    #[test]
    fn resized_event_retries_immediately() {
        let (engine, mut handler) = handler(1);
        handler.ensure_bound();
        assert!(!handler.host.is_bound());

        handler.handle_host_event(HostEvent::Resize(ResizeEvent::SizeCommitted(
            SurfaceSize::new(1024, 768),
        )));
        assert!(handler.host.is_bound());
        assert_eq!(engine.creates.get(), 2);
        assert_eq!(handler.host.current_size(), Some(SurfaceSize::new(1024, 768)));
    }

    #[test]
    fn gives_up_after_bounded_attempts() {
        let (engine, mut handler) = handler(u32::MAX);
        run_frames(&mut handler, MAX_BIND_ATTEMPTS * (BIND_RETRY_FRAMES + 1));
        assert!(handler.failed);
        assert!(!handler.host.is_attached());
        assert_eq!(engine.creates.get(), MAX_BIND_ATTEMPTS);

        run_frames(&mut handler, BIND_RETRY_FRAMES + 1);
        assert_eq!(engine.creates.get(), MAX_BIND_ATTEMPTS);
    }

    #[test]
    fn engine_unavailable_disables_the_viewport() {
        let (engine, mut handler) = handler(0);
        handler.ensure_bound();
        handler.fail(HostError::EngineUnavailable("gone".into()));
        assert!(handler.failed);
        assert!(!handler.host.is_attached());
        assert_eq!(engine.removes.get(), 1);
    }
}
