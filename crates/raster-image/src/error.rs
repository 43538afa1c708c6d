//! Error types for pixel buffers.

use thiserror::Error;

/// Pixel buffer error.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    /// Raster, layout or storage failure.
    #[error(transparent)]
    Core(#[from] raster_core::Error),

    /// Color model failure.
    #[error(transparent)]
    Color(#[from] raster_color::ColorError),

    /// The raster does not fit the color model or the buffer.
    #[error("incompatible raster: {0}")]
    Incompatible(String),

    /// An argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ImageError {
    /// Creates an [`ImageError::Incompatible`] error.
    #[inline]
    pub fn incompatible(msg: impl Into<String>) -> Self {
        Self::Incompatible(msg.into())
    }

    /// Creates an [`ImageError::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for pixel buffer operations.
pub type ImageResult<T> = Result<T, ImageError>;
