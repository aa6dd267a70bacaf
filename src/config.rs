//! Host configuration

use crate::engine::native::EngineSymbols;
use crate::resize::ResizePolicy;
use std::path::PathBuf;

/// Environment variable naming the engine library to load.
pub const ENGINE_LIB_VAR: &str = "VIEWPORT_ENGINE_LIB";
/// Environment variable overriding the live-resize tolerance in pixels.
pub const RESIZE_TOLERANCE_VAR: &str = "VIEWPORT_RESIZE_TOLERANCE";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostConfig {
    pub resize: ResizePolicy,
    /// Engine library to load; `None` when the engine is linked in.
    pub engine_library: Option<PathBuf>,
    pub symbols: EngineSymbols,
}

impl HostConfig {
    /// Defaults overridden by `VIEWPORT_ENGINE_LIB` and
    /// `VIEWPORT_RESIZE_TOLERANCE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(ENGINE_LIB_VAR).filter(|p| !p.is_empty()) {
            config.engine_library = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup(RESIZE_TOLERANCE_VAR) {
            match raw.trim().parse::<u32>() {
                Ok(tolerance) => config.resize.tolerance = tolerance,
                Err(e) => tracing::warn!(
                    "Ignoring {}={:?}: {}",
                    RESIZE_TOLERANCE_VAR,
                    raw,
                    e
                ),
            }
        }

        config
    }
}
