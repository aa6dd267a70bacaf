//! Resize coordination
//!
//! Turns the high-frequency stream of classified window notifications into a
//! small number of resize calls. The coordinator never talks to the engine
//! itself: [`ResizeCoordinator::on_event`] returns the size to forward, the
//! caller performs the call and reports back through
//! [`ResizeCoordinator::complete`]. Between those two calls a forward is in
//! flight and nothing else is issued (single-flight).

use crate::engine::{is_valid_size, SurfaceSize};
use crate::event::ResizeEvent;

/// Default throttle tolerance in physical pixels.
pub const DEFAULT_TOLERANCE: u32 = 32;

/// Tuning for live resizes during an interactive drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePolicy {
    /// A live size is only forwarded once it differs from the last forwarded
    /// size by more than this many pixels on either axis.
    pub tolerance: u32,
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// State of one interactive resize/move gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSession {
    /// Size the engine had when the gesture began.
    pub started_at: Option<SurfaceSize>,
    /// Latest valid size seen during the gesture, not yet committed.
    pub pending: Option<SurfaceSize>,
}

impl ResizeSession {
    fn new(started_at: Option<SurfaceSize>) -> Self {
        Self {
            started_at,
            pending: None,
        }
    }
}

#[derive(Debug)]
pub struct ResizeCoordinator {
    policy: ResizePolicy,
    session: Option<ResizeSession>,
    /// Last size the engine accepted.
    forwarded: Option<SurfaceSize>,
    /// Last positive size observed from any notification.
    last_valid: Option<SurfaceSize>,
    in_flight: Option<SurfaceSize>,
    /// Forced size waiting for the in-flight call to finish.
    deferred: Option<SurfaceSize>,
    minimized: bool,
}

impl ResizeCoordinator {
    pub fn new(policy: ResizePolicy) -> Self {
        Self {
            policy,
            session: None,
            forwarded: None,
            last_valid: None,
            in_flight: None,
            deferred: None,
            minimized: false,
        }
    }

    /// Record the size the viewport was created with.
    pub fn set_baseline(&mut self, size: SurfaceSize) {
        if is_valid_size(size) {
            self.forwarded = Some(size);
            self.last_valid = Some(size);
        }
    }

    pub fn policy(&self) -> ResizePolicy {
        self.policy
    }

    pub fn session(&self) -> Option<&ResizeSession> {
        self.session.as_ref()
    }

    pub fn in_session(&self) -> bool {
        self.session.is_some()
    }

    /// Last size the engine accepted.
    pub fn forwarded(&self) -> Option<SurfaceSize> {
        self.forwarded
    }

    pub fn last_valid(&self) -> Option<SurfaceSize> {
        self.last_valid
    }

    pub fn in_flight(&self) -> Option<SurfaceSize> {
        self.in_flight
    }

    /// True after a zero-size commit until the next valid one.
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Feed one notification. Returns the size to forward now, if any.
    ///
    /// A returned size is in flight until [`complete`](Self::complete) is
    /// called.
    pub fn on_event(&mut self, event: ResizeEvent) -> Option<SurfaceSize> {
        match event {
            ResizeEvent::EnterInteractiveResize => {
                if self.session.is_none() {
                    tracing::trace!("Interactive resize started");
                    self.session = Some(ResizeSession::new(self.forwarded));
                }
                None
            }
            ResizeEvent::SizeChanging(size) => self.observe_live(size),
            ResizeEvent::SizeCommitted(size) if self.session.is_some() => self.commit_live(size),
            ResizeEvent::SizeCommitted(size) => self.commit(size),
            ResizeEvent::ExitInteractiveResize(size) => self.finish_session(size),
        }
    }

    /// Report the outcome of the forward returned by `on_event` or a previous
    /// `complete`. Returns the next size to forward, if one is waiting.
    ///
    /// A failed forward keeps the previous baseline; the next notification
    /// retries naturally.
    pub fn complete(&mut self, applied: bool) -> Option<SurfaceSize> {
        let sent = self.in_flight.take()?;

        if applied {
            self.forwarded = Some(sent);
        }

        if let Some(next) = self.deferred.take() {
            return self.issue(next);
        }

        if !applied {
            return None;
        }

        // Catch up with a live size that moved on while the call was running.
        let pending = self.session.and_then(|s| s.pending)?;
        if self.exceeds_tolerance(pending) {
            return self.issue(pending);
        }
        None
    }

    /// Close an open gesture without forwarding anything.
    pub fn discard_session(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("Discarding open resize session");
        }
        self.deferred = None;
    }

    fn observe_live(&mut self, size: SurfaceSize) -> Option<SurfaceSize> {
        if !is_valid_size(size) {
            tracing::trace!("Ignoring degenerate live size {:?}", size);
            return None;
        }
        self.last_valid = Some(size);

        if let Some(session) = &mut self.session {
            session.pending = Some(size);
        }

        if self.in_flight.is_some() || !self.exceeds_tolerance(size) {
            return None;
        }
        self.issue(size)
    }

    /// A commit inside a gesture is throttled like a live size, but still
    /// tracks minimize and restore.
    fn commit_live(&mut self, size: SurfaceSize) -> Option<SurfaceSize> {
        self.minimized = !is_valid_size(size);
        self.observe_live(size)
    }

    fn commit(&mut self, size: SurfaceSize) -> Option<SurfaceSize> {
        if !is_valid_size(size) {
            tracing::debug!(
                "Dropping size {}x{}, keeping {:?}",
                size.width,
                size.height,
                self.last_valid
            );
            self.minimized = true;
            return None;
        }

        if self.minimized {
            tracing::debug!("Restoring viewport at {}x{}", size.width, size.height);
            self.minimized = false;
        }
        self.last_valid = Some(size);
        self.force(size)
    }

    fn finish_session(&mut self, exit_size: Option<SurfaceSize>) -> Option<SurfaceSize> {
        let exit_size = exit_size.filter(|s| is_valid_size(*s));

        let Some(session) = self.session.take() else {
            // Exit without a matching enter carries at most a plain commit.
            return exit_size.and_then(|size| self.commit(size));
        };

        match exit_size.or(session.pending) {
            Some(size) => {
                tracing::trace!("Interactive resize finished at {}x{}", size.width, size.height);
                self.last_valid = Some(size);
                self.force(size)
            }
            None => {
                tracing::trace!("Interactive move finished without a size change");
                None
            }
        }
    }

    /// Forward regardless of tolerance, deferring behind an in-flight call.
    fn force(&mut self, size: SurfaceSize) -> Option<SurfaceSize> {
        if self.in_flight.is_some() {
            self.deferred = Some(size);
            return None;
        }
        self.issue(size)
    }

    fn issue(&mut self, size: SurfaceSize) -> Option<SurfaceSize> {
        self.in_flight = Some(size);
        Some(size)
    }

    fn exceeds_tolerance(&self, size: SurfaceSize) -> bool {
        let Some(base) = self.forwarded else {
            return true;
        };
        let tol = self.policy.tolerance;
        base.width.abs_diff(size.width) > tol || base.height.abs_diff(size.height) > tol
    }
}

impl Default for ResizeCoordinator {
    fn default() -> Self {
        Self::new(ResizePolicy::default())
    }
}
