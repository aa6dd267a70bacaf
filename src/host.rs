//! Host adapter
//!
//! Anchors a surface inside the parent layout, binds the viewport on the first
//! valid layout, runs window notifications through the resize coordinator and
//! tears everything down once.

use crate::engine::{is_valid_size, SurfaceHandle, SurfaceSize, ViewportEngine};
use crate::error::{HostError, Result};
use crate::event::{classify_win32, ResizeEvent};
use crate::resize::{ResizeCoordinator, ResizePolicy};
use crate::surface::{LifecyclePhase, SurfaceLifecycle};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostPhase {
    Detached,
    Attached(SurfaceHandle),
    TornDown,
}

/// Hosts one native viewport inside a parent surface
pub struct ViewportHost<E: ViewportEngine> {
    lifecycle: SurfaceLifecycle<E>,
    coordinator: ResizeCoordinator,
    phase: HostPhase,
    current_size: Option<SurfaceSize>,
}

impl<E: ViewportEngine> ViewportHost<E> {
    pub fn new(engine: E, policy: ResizePolicy) -> Self {
        Self::with_shared_engine(Arc::new(engine), policy)
    }

    pub fn with_shared_engine(engine: Arc<E>, policy: ResizePolicy) -> Self {
        Self {
            lifecycle: SurfaceLifecycle::new(engine),
            coordinator: ResizeCoordinator::new(policy),
            phase: HostPhase::Detached,
            current_size: None,
        }
    }

    /// Anchor the hosting surface. The viewport is bound on the first valid
    /// layout.
    pub fn attach(&mut self, surface: SurfaceHandle) -> Result<()> {
        match self.phase {
            HostPhase::Detached => {}
            HostPhase::Attached(current) if current == surface => return Ok(()),
            HostPhase::Attached(_) => {
                tracing::warn!("Host is already attached to another surface");
                return Err(HostError::InvalidSurface);
            }
            HostPhase::TornDown => {
                tracing::warn!("Host was detached; a new host is needed to attach again");
                return Err(HostError::InvalidSurface);
            }
        }

        if surface.is_null() {
            return Err(HostError::InvalidSurface);
        }

        tracing::debug!("Host attached to surface {:#x}", surface.raw());
        self.phase = HostPhase::Attached(surface);
        Ok(())
    }

    /// Layout pass of the parent UI. The first valid size binds the viewport;
    /// later ones are size commits.
    pub fn on_layout(&mut self, size: SurfaceSize) -> Result<()> {
        let HostPhase::Attached(surface) = self.phase else {
            return Ok(());
        };

        if self.lifecycle.phase() != LifecyclePhase::Uncreated {
            return self.handle_event(ResizeEvent::SizeCommitted(size));
        }

        if is_valid_size(size) {
            self.current_size = Some(size);
        }
        self.lifecycle.bind(surface, size)?;
        if self.lifecycle.phase() == LifecyclePhase::Bound {
            self.coordinator.set_baseline(size);
        }
        Ok(())
    }

    /// Feed one classified notification.
    ///
    /// Only fatal engine errors are returned; the rest are logged.
    pub fn handle_event(&mut self, event: ResizeEvent) -> Result<()> {
        if !matches!(self.phase, HostPhase::Attached(_)) {
            tracing::trace!("Dropping {:?} outside of an attached host", event);
            return Ok(());
        }

        if let ResizeEvent::SizeChanging(size) | ResizeEvent::SizeCommitted(size) = event {
            if is_valid_size(size) {
                self.current_size = Some(size);
            }
        }

        if self.lifecycle.phase() != LifecyclePhase::Bound {
            return Ok(());
        }

        let mut next = self.coordinator.on_event(event);
        while let Some(size) = next {
            tracing::debug!("Resizing viewport to {}x{}", size.width, size.height);
            let outcome = self.lifecycle.resize(size);
            let applied = outcome.is_ok();
            next = self.coordinator.complete(applied);

            match outcome {
                Ok(()) => {}
                Err(HostError::InvalidHandle) => {
                    tracing::warn!("Engine no longer knows the viewport; resize ignored")
                }
                Err(e @ HostError::ResizeFailed { .. }) => {
                    tracing::warn!("{}; keeping {:?}", e, self.coordinator.forwarded())
                }
                Err(e) => {
                    tracing::error!("Resize failed: {}", e);
                    if let Some(size) = next.take() {
                        self.coordinator.complete(false);
                        tracing::debug!("Abandoning follow-up resize to {:?}", size);
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Classify and feed a raw Win32 message from the hosting surface's
    /// window procedure. Returns whether it was a resize notification.
    pub fn handle_win32(&mut self, msg: u32, wparam: usize, lparam: isize) -> Result<bool> {
        match classify_win32(msg, wparam, lparam) {
            Some(event) => self.handle_event(event).map(|_| true),
            None => Ok(false),
        }
    }

    /// Tear down: stop accepting messages, drop any open resize session
    /// without forwarding it, then destroy the viewport. Idempotent.
    pub fn detach(&mut self) {
        if self.phase == HostPhase::TornDown {
            return;
        }
        self.phase = HostPhase::TornDown;
        self.coordinator.discard_session();
        self.lifecycle.destroy();
        tracing::debug!("Host detached");
    }

    /// Last valid size seen, for diagnostics.
    pub fn current_size(&self) -> Option<SurfaceSize> {
        self.current_size
    }

    /// The surface to show as this host's content.
    pub fn content_surface(&self) -> Option<SurfaceHandle> {
        match self.phase {
            HostPhase::Attached(surface) => self.lifecycle.content_surface().or(Some(surface)),
            _ => None,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.phase, HostPhase::Attached(_))
    }

    pub fn is_bound(&self) -> bool {
        self.lifecycle.phase() == LifecyclePhase::Bound
    }

    pub fn coordinator(&self) -> &ResizeCoordinator {
        &self.coordinator
    }
}

impl<E: ViewportEngine> Drop for ViewportHost<E> {
    fn drop(&mut self) {
        self.detach();
    }
}
