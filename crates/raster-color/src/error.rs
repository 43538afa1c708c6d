//! Error types for color operations.
//!
//! Wraps the lower-level raster and ICC errors and adds the failure modes of
//! color models: bad component arrays, operations a model does not support,
//! and rasters that do not match a model.

use thiserror::Error;

/// Color operation error.
#[derive(Debug, Clone, Error)]
pub enum ColorError {
    /// Raster, layout or storage failure.
    #[error(transparent)]
    Core(#[from] raster_core::Error),

    /// ICC profile or transform failure.
    #[error("ICC error: {0}")]
    Icc(#[from] raster_icc::IccError),

    /// An argument is out of range or the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The model does not implement this operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A raster or layout does not match the model.
    #[error("incompatible raster: {0}")]
    Incompatible(String),
}

impl ColorError {
    /// Creates an [`ColorError::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an [`ColorError::Unsupported`] error.
    #[inline]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Creates an [`ColorError::Incompatible`] error.
    #[inline]
    pub fn incompatible(msg: impl Into<String>) -> Self {
        Self::Incompatible(msg.into())
    }
}

/// Result type for color operations.
pub type ColorResult<T> = Result<T, ColorError>;
