//! Error types for the Anvil renderer
//!
//! Errors fall into two groups:
//! - configuration errors (incomplete framebuffer, unsupported attachment
//!   format, failed initialization) abort renderer setup
//! - everything else reports a misuse or a backend failure
//!
//! Per-frame degraded conditions (degenerate shadow bounds, missing programs,
//! empty drawable sets) are never errors: they are logged and skipped.

use std::fmt;

/// Result type for Anvil renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Anvil renderer errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown handle, zero-sized target, ...)
    InvalidResource(String),

    /// Initialization failed (renderer, subsystems)
    InitializationFailed(String),

    /// Framebuffer failed its completeness check
    IncompleteFramebuffer(String),

    /// Attachment format not usable for the requested attachment point
    UnsupportedFormat(String),

    /// Frame submission is malformed (e.g. no camera)
    InvalidFrame(String),
}

impl Error {
    /// Configuration errors are not recoverable at runtime.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::IncompleteFramebuffer(_)
                | Error::UnsupportedFormat(_)
                | Error::InitializationFailed(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::IncompleteFramebuffer(msg) => write!(f, "Incomplete framebuffer: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            Error::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build an `Error::BackendError` with the same message
///
/// # Example
///
/// ```no_run
/// # use anvil_renderer::engine_err;
/// let err = engine_err!("anvil::Pool", "target {} missing", 3);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::anvil::Error::BackendError(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError(..))` from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
