//! Errors reported by the engine boundary and the host
//!
//! Native result codes are mapped here so that every caller sees the same
//! four kinds regardless of how the engine was reached.

/// Result code the engine returns on success.
pub const CODE_OK: i32 = 0;
/// The engine could not be reached.
pub const CODE_ENGINE_UNAVAILABLE: i32 = 1;
/// The engine rejected the surface handle.
pub const CODE_INVALID_SURFACE: i32 = 2;
/// The engine no longer knows the viewport handle.
pub const CODE_INVALID_HANDLE: i32 = 3;
/// The engine failed to apply a resize.
pub const CODE_RESIZE_FAILED: i32 = 4;

/// Errors that can occur while hosting a native viewport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The engine (or its library) cannot be reached
    EngineUnavailable(String),
    /// The surface handle was not recognized by the engine
    InvalidSurface,
    /// The viewport handle was already destroyed on the engine side
    InvalidHandle,
    /// A resize was rejected; the previous size is still in effect
    ResizeFailed { width: i32, height: i32 },
}

impl HostError {
    /// Map a native result code to `Ok(())` or the matching error.
    ///
    /// `width`/`height` are only used to describe a failed resize.
    pub fn check(code: i32, width: i32, height: i32) -> Result<()> {
        match code {
            CODE_OK => Ok(()),
            CODE_ENGINE_UNAVAILABLE => Err(Self::EngineUnavailable(
                "engine reported it is unavailable".into(),
            )),
            CODE_INVALID_SURFACE => Err(Self::InvalidSurface),
            CODE_INVALID_HANDLE => Err(Self::InvalidHandle),
            CODE_RESIZE_FAILED => Err(Self::ResizeFailed { width, height }),
            other => Err(Self::EngineUnavailable(format!(
                "unrecognized engine result code {}",
                other
            ))),
        }
    }

    /// Map the result code of a call that does not resize anything.
    ///
    /// A resize failure code makes no sense there and is reported as an
    /// engine fault naming the call.
    pub fn check_call(code: i32, call: &str) -> Result<()> {
        match code {
            CODE_RESIZE_FAILED => Err(Self::EngineUnavailable(format!(
                "{} returned resize failure code {}",
                call, code
            ))),
            other => Self::check(other, 0, 0),
        }
    }

    /// Fatal errors must reach the UI layer; the rest are logged and absorbed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_) | Self::InvalidSurface)
    }
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EngineUnavailable(e) => write!(f, "Engine unavailable: {}", e),
            Self::InvalidSurface => write!(f, "Surface handle rejected by the engine"),
            Self::InvalidHandle => write!(f, "Viewport handle is no longer valid"),
            Self::ResizeFailed { width, height } => {
                write!(f, "Engine failed to resize viewport to {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HostError>;
