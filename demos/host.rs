//! Opens a standalone window that hosts a viewport
//!
//! Run with: cargo run --example host
//!
//! Set VIEWPORT_ENGINE_LIB to load a real engine; otherwise a logging stand-in
//! records the calls it would receive.

use std::sync::atomic::{AtomicUsize, Ordering};
use viewport_host::{
    load_engine, HostConfig, Result, Size, SurfaceHandle, ViewportEngine, ViewportHandle,
    ViewportWindow, WindowOpenOptions, WindowScalePolicy,
};

/// Engine stand-in that only logs what it is asked to do
#[derive(Default)]
struct LoggingEngine {
    next: AtomicUsize,
}

impl ViewportEngine for LoggingEngine {
    fn create_viewport(&self, parent: SurfaceHandle, width: i32, height: i32) -> Result<ViewportHandle> {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!("create_viewport(surface={:#x}, {}x{}) -> {}", parent.raw(), width, height, id);
        Ok(ViewportHandle::from_raw(id).expect("ids start at 1"))
    }

    fn engine_surface(&self) -> Result<SurfaceHandle> {
        Err(viewport_host::HostError::EngineUnavailable(
            "logging engine draws into the host surface".into(),
        ))
    }

    fn resize_viewport(&self, handle: ViewportHandle, width: i32, height: i32) -> Result<()> {
        tracing::info!("resize_viewport({}, {}x{})", handle.raw(), width, height);
        Ok(())
    }

    fn remove_viewport(&self, handle: ViewportHandle) -> Result<()> {
        tracing::info!("remove_viewport({})", handle.raw());
        Ok(())
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .init();

    let config = HostConfig::from_env();

    let engine: Box<dyn ViewportEngine + Send> = if config.engine_library.is_some() {
        match load_engine(&config) {
            Ok(engine) => Box::new(engine),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    } else {
        Box::new(LoggingEngine::default())
    };

    println!("Opening window...");

    let options = WindowOpenOptions {
        title: "Viewport Host Example".into(),
        size: Size::new(800.0, 600.0),
        scale: WindowScalePolicy::SystemScaleFactor,
    };

    // This blocks until the window is closed
    ViewportWindow::open_blocking(options, engine, config);

    println!("Window closed.");
}
