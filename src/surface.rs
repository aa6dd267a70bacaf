//! Viewport lifecycle
//!
//! `Uncreated → Bound → Destroyed`. The viewport handle lives inside a
//! [`ViewportLease`], so it is removed exactly once however the lifecycle
//! ends: explicit destroy, drop of the owner, or an early return.

use crate::engine::{is_valid_size, SurfaceHandle, SurfaceSize, ViewportEngine, ViewportHandle};
use crate::error::{HostError, Result};
use std::sync::Arc;

/// Scoped ownership of one live viewport.
///
/// `remove_viewport` is called by [`release`](Self::release) or, failing
/// that, on drop. Never both.
pub struct ViewportLease<E: ViewportEngine> {
    engine: Arc<E>,
    handle: Option<ViewportHandle>,
}

impl<E: ViewportEngine> ViewportLease<E> {
    /// Create a viewport and take ownership of it.
    pub fn acquire(engine: Arc<E>, surface: SurfaceHandle, size: SurfaceSize) -> Result<Self> {
        let handle = engine.create_viewport(surface, size.width, size.height)?;
        Ok(Self {
            engine,
            handle: Some(handle),
        })
    }

    pub fn handle(&self) -> Option<ViewportHandle> {
        self.handle
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Remove the viewport now and report the engine's answer.
    pub fn release(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => self.engine.remove_viewport(handle),
            None => Ok(()),
        }
    }
}

impl<E: ViewportEngine> Drop for ViewportLease<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.engine.remove_viewport(handle) {
                tracing::warn!("Failed to remove viewport {:#x}: {}", handle.raw(), e);
            }
        }
    }
}

enum LifecycleState<E: ViewportEngine> {
    Uncreated,
    Bound(ViewportLease<E>),
    Destroyed,
}

/// Public view of the lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Uncreated,
    Bound,
    Destroyed,
}

/// Owns the viewport bound to one hosting surface
pub struct SurfaceLifecycle<E: ViewportEngine> {
    engine: Arc<E>,
    state: LifecycleState<E>,
    host_surface: Option<SurfaceHandle>,
    /// Surface the engine renders into, when it is not the host's own.
    engine_surface: Option<SurfaceHandle>,
}

impl<E: ViewportEngine> SurfaceLifecycle<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            state: LifecycleState::Uncreated,
            host_surface: None,
            engine_surface: None,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        match self.state {
            LifecycleState::Uncreated => LifecyclePhase::Uncreated,
            LifecycleState::Bound(_) => LifecyclePhase::Bound,
            LifecycleState::Destroyed => LifecyclePhase::Destroyed,
        }
    }

    pub fn viewport(&self) -> Option<ViewportHandle> {
        match &self.state {
            LifecycleState::Bound(lease) => lease.handle(),
            _ => None,
        }
    }

    /// The surface that shows the viewport: the engine's if it created its
    /// own, otherwise the host surface.
    pub fn content_surface(&self) -> Option<SurfaceHandle> {
        self.engine_surface.or(self.host_surface)
    }

    /// Bind a viewport to `surface`. Only the first successful call does
    /// anything.
    ///
    /// A rejected surface leaves the lifecycle `Uncreated` so binding can be
    /// retried.
    pub fn bind(&mut self, surface: SurfaceHandle, size: SurfaceSize) -> Result<()> {
        match self.state {
            LifecycleState::Uncreated => {}
            LifecycleState::Bound(_) => return Ok(()),
            LifecycleState::Destroyed => {
                tracing::warn!("Refusing to bind a viewport after it was destroyed");
                return Ok(());
            }
        }

        if !is_valid_size(size) {
            tracing::debug!("Deferring bind until a valid size, got {:?}", size);
            return Ok(());
        }

        let lease = match ViewportLease::acquire(self.engine.clone(), surface, size) {
            Ok(lease) => lease,
            Err(e) => {
                tracing::error!("Failed to create viewport: {}", e);
                return Err(e);
            }
        };

        tracing::info!(
            "Viewport bound to surface {:#x} at {}x{}",
            surface.raw(),
            size.width,
            size.height
        );

        self.host_surface = Some(surface);
        self.engine_surface = self.reconcile_surface(surface);
        self.state = LifecycleState::Bound(lease);
        Ok(())
    }

    fn reconcile_surface(&self, host: SurfaceHandle) -> Option<SurfaceHandle> {
        match self.engine.engine_surface() {
            Ok(surface) if surface != host => {
                tracing::debug!("Engine renders into its own surface {:#x}", surface.raw());
                Some(surface)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Could not query engine surface, using host surface: {}", e);
                None
            }
        }
    }

    /// Forward a resize to the bound viewport.
    ///
    /// Ignored outside `Bound`: a final message may drain after teardown.
    pub fn resize(&self, size: SurfaceSize) -> Result<()> {
        let LifecycleState::Bound(lease) = &self.state else {
            tracing::trace!("Ignoring resize outside of a bound viewport");
            return Ok(());
        };
        let Some(handle) = lease.handle() else {
            return Ok(());
        };
        if !is_valid_size(size) {
            return Ok(());
        }
        self.engine.resize_viewport(handle, size.width, size.height)
    }

    /// Destroy the viewport. Safe to call any number of times; the engine
    /// sees at most one removal.
    pub fn destroy(&mut self) {
        match std::mem::replace(&mut self.state, LifecycleState::Destroyed) {
            LifecycleState::Bound(lease) => {
                let handle = lease.handle();
                match lease.release() {
                    Ok(()) => tracing::info!("Viewport destroyed"),
                    Err(HostError::InvalidHandle) => {
                        tracing::warn!("Engine no longer knew viewport {:?}", handle)
                    }
                    Err(e) => tracing::error!("Failed to destroy viewport: {}", e),
                }
            }
            LifecycleState::Uncreated => {
                tracing::debug!("Lifecycle closed before a viewport was bound")
            }
            LifecycleState::Destroyed => {}
        }
        self.engine_surface = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeEngine {
        created: Cell<usize>,
        removed: RefCell<Vec<ViewportHandle>>,
        resized: RefCell<Vec<(i32, i32)>>,
        reject_surface: Cell<bool>,
        own_surface: Option<SurfaceHandle>,
    }

    impl ViewportEngine for FakeEngine {
        fn create_viewport(&self, _: SurfaceHandle, _: i32, _: i32) -> Result<ViewportHandle> {
            if self.reject_surface.get() {
                return Err(HostError::InvalidSurface);
            }
            self.created.set(self.created.get() + 1);
            Ok(ViewportHandle::from_raw(0x100 + self.created.get()).unwrap())
        }

        fn engine_surface(&self) -> Result<SurfaceHandle> {
            self.own_surface
                .ok_or_else(|| HostError::EngineUnavailable("no surface".into()))
        }

        fn resize_viewport(&self, _: ViewportHandle, w: i32, h: i32) -> Result<()> {
            self.resized.borrow_mut().push((w, h));
            Ok(())
        }

        fn remove_viewport(&self, handle: ViewportHandle) -> Result<()> {
            self.removed.borrow_mut().push(handle);
            Ok(())
        }
    }

    const SURFACE: SurfaceHandle = SurfaceHandle::from_raw(0xABC);

    fn size(w: i32, h: i32) -> SurfaceSize {
        SurfaceSize::new(w, h)
    }

    #[test]
    fn bind_then_destroy_removes_once() {
        let engine = Arc::new(FakeEngine::default());
        let mut lc = SurfaceLifecycle::new(engine.clone());

        lc.bind(SURFACE, size(800, 600)).unwrap();
        assert_eq!(lc.phase(), LifecyclePhase::Bound);
        lc.bind(SURFACE, size(800, 600)).unwrap();
        assert_eq!(engine.created.get(), 1);

        lc.destroy();
        lc.destroy();
        assert_eq!(lc.phase(), LifecyclePhase::Destroyed);
        assert_eq!(engine.removed.borrow().len(), 1);
    }

    #[test]
    fn drop_releases_bound_viewport() {
        let engine = Arc::new(FakeEngine::default());
        {
            let mut lc = SurfaceLifecycle::new(engine.clone());
            lc.bind(SURFACE, size(640, 480)).unwrap();
        }
        assert_eq!(engine.removed.borrow().len(), 1);
    }

    #[test]
    fn no_rebind_after_destroy() {
        let engine = Arc::new(FakeEngine::default());
        let mut lc = SurfaceLifecycle::new(engine.clone());
        lc.destroy();
        lc.bind(SURFACE, size(800, 600)).unwrap();
        assert_eq!(lc.phase(), LifecyclePhase::Destroyed);
        assert_eq!(engine.created.get(), 0);
        assert!(engine.removed.borrow().is_empty());
    }

    #[test]
    fn rejected_surface_can_be_retried() {
        let engine = Arc::new(FakeEngine::default());
        engine.reject_surface.set(true);
        let mut lc = SurfaceLifecycle::new(engine.clone());

        assert_eq!(lc.bind(SURFACE, size(800, 600)), Err(HostError::InvalidSurface));
        assert_eq!(lc.phase(), LifecyclePhase::Uncreated);

        engine.reject_surface.set(false);
        lc.bind(SURFACE, size(800, 600)).unwrap();
        assert_eq!(lc.phase(), LifecyclePhase::Bound);
    }

    #[test]
    fn zero_size_defers_bind() {
        let engine = Arc::new(FakeEngine::default());
        let mut lc = SurfaceLifecycle::new(engine.clone());
        lc.bind(SURFACE, size(0, 0)).unwrap();
        assert_eq!(lc.phase(), LifecyclePhase::Uncreated);
        assert_eq!(engine.created.get(), 0);
    }

    #[test]
    fn resize_ignored_unless_bound() {
        let engine = Arc::new(FakeEngine::default());
        let mut lc = SurfaceLifecycle::new(engine.clone());
        lc.resize(size(10, 10)).unwrap();
        lc.bind(SURFACE, size(800, 600)).unwrap();
        lc.resize(size(900, 700)).unwrap();
        lc.destroy();
        lc.resize(size(20, 20)).unwrap();
        assert_eq!(*engine.resized.borrow(), vec![(900, 700)]);
    }

    #[test]
    fn engine_owned_surface_becomes_content() {
        let engine = Arc::new(FakeEngine {
            own_surface: Some(SurfaceHandle::from_raw(0xDEF)),
            ..Default::default()
        });
        let mut lc = SurfaceLifecycle::new(engine);
        assert_eq!(lc.content_surface(), None);
        lc.bind(SURFACE, size(800, 600)).unwrap();
        assert_eq!(lc.content_surface(), Some(SurfaceHandle::from_raw(0xDEF)));
    }

    #[test]
    fn failed_surface_query_falls_back_to_host() {
        let engine = Arc::new(FakeEngine::default());
        let mut lc = SurfaceLifecycle::new(engine);
        lc.bind(SURFACE, size(800, 600)).unwrap();
        assert_eq!(lc.content_surface(), Some(SURFACE));
    }

    #[test]
    fn explicit_release_skips_drop_removal() {
        let engine = Arc::new(FakeEngine::default());
        let lease = ViewportLease::acquire(engine.clone(), SURFACE, size(1, 1)).unwrap();
        lease.release().unwrap();
        assert_eq!(engine.removed.borrow().len(), 1);
    }
}
