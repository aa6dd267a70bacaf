//! Native Viewport Host
//!
//! This crate hosts a viewport owned by an external rendering engine inside an
//! editor's window tree, and keeps the viewport's existence, size and lifetime
//! in step with the hosting window.
//!
//! # Architecture
//!
//! - [`engine`]: the four calls into the engine, plus a binding to an engine
//!   shipped as a dynamic library.
//! - [`surface`]: the `Uncreated → Bound → Destroyed` lifecycle; the viewport
//!   is held in a lease that is released exactly once.
//! - [`event`]: the one place that knows platform message codes; maps them
//!   to four resize notifications.
//! - [`resize`]: decides which notifications become engine resizes. Live drag
//!   sizes are throttled and single-flight, zero sizes are never forwarded.
//! - [`host`]: the adapter the UI layer talks to (`attach`, `on_layout`,
//!   `detach`).
//! - `window`: a baseview child window wired to a [`ViewportHost`], for
//!   hosts that hand over a parent window handle.
//!
//! Everything runs on the UI thread.
//!
//! # Usage
//!
//! ```ignore
//! use viewport_host::{HostConfig, Size, ViewportWindow, WindowOpenOptions, WindowScalePolicy};
//!
//! let config = HostConfig::from_env();
//! let mut handle = ViewportWindow::open_native_parented(
//!     &parent_handle,
//!     WindowOpenOptions {
//!         title: "Viewport".into(),
//!         size: Size::new(800.0, 600.0),
//!         scale: WindowScalePolicy::SystemScaleFactor,
//!     },
//!     config,
//! )?;
//! // ...
//! handle.close();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod host;
pub mod resize;
pub mod surface;
mod window;

pub use baseview::{Size, WindowOpenOptions, WindowScalePolicy};
pub use config::HostConfig;
pub use engine::native::{EngineSymbols, NativeEngine};
pub use engine::{SurfaceHandle, SurfaceSize, ViewportEngine, ViewportHandle};
pub use error::{HostError, Result};
pub use event::{HostEvent, ResizeEvent};
pub use host::ViewportHost;
pub use resize::{ResizeCoordinator, ResizePolicy};
pub use window::{load_engine, ViewportWindow, ViewportWindowHandle};
