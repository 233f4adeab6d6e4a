//! Error types for the vector kernels.
//!
//! The numeric operations are total and never fail. Errors only surface at the
//! checked entry points and when a specific backend is requested.

use thiserror::Error;

use crate::backend::Backend;

/// Specialized Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

/// Kernel error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Destination and source slices differ in length.
    #[error("Length mismatch: dst has {dst} elements, src has {src}")]
    LengthMismatch {
        /// Destination length
        dst: usize,
        /// Source length
        src: usize,
    },

    /// The requested backend is not available on this CPU or target.
    #[error("Backend not supported on this CPU: {0}")]
    UnsupportedBackend(Backend),

    /// Portable lane count outside the supported range.
    #[error("Invalid portable lane count {0}: must be between 1 and {max}", max = crate::portable::MAX_PORTABLE_LANES)]
    InvalidLaneCount(usize),

    /// Backend name could not be parsed.
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// The global capabilities were already resolved.
    #[error("Vector capabilities already initialized")]
    AlreadyInitialized,
}

impl KernelError {
    /// Create a length mismatch error.
    pub fn length_mismatch(dst: usize, src: usize) -> Self {
        Self::LengthMismatch { dst, src }
    }
}
