//! Error types for raster-core operations.
//!
//! Every fallible operation on storage, sample layouts and pixel regions
//! reports through the single [`Error`] enum defined here.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{Error, Result};
//!
//! fn check(x: i32, y: i32, width: i32, height: i32) -> Result<()> {
//!     if x < 0 || y < 0 || x >= width || y >= height {
//!         return Err(Error::out_of_bounds(x, y));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(4, 0, 4, 4).unwrap_err().is_bounds_error());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation
//!
//! # Used By
//!
//! - [`crate::storage::DataBuffer`] - Element index checks
//! - [`crate::layout`] - Coordinate, band and layout validation
//! - [`crate::region::Raster`] - Region bounds and child creation

use crate::format::DataType;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while accessing raster samples.
///
/// # Categories
///
/// - **Bounds errors**: [`OutOfBounds`](Error::OutOfBounds),
///   [`BandOutOfRange`](Error::BandOutOfRange), [`IndexOutOfBounds`](Error::IndexOutOfBounds)
/// - **Argument errors**: [`BufferTooSmall`](Error::BufferTooSmall),
///   [`InvalidDimensions`](Error::InvalidDimensions), [`InvalidArgument`](Error::InvalidArgument)
/// - **Format errors**: [`InvalidRaster`](Error::InvalidRaster),
///   [`UnsupportedDataType`](Error::UnsupportedDataType), [`TypeMismatch`](Error::TypeMismatch)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Pixel coordinates are outside the layout or region bounds.
    ///
    /// # Example
    ///
    /// ```rust
    /// use raster_core::Error;
    ///
    /// let err = Error::out_of_bounds(-1, 7);
    /// assert!(err.to_string().contains("-1"));
    /// ```
    #[error("coordinate ({x}, {y}) out of bounds")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: i32,
        /// Y coordinate that was out of bounds
        y: i32,
    },

    /// Band index is not smaller than the number of bands.
    #[error("band {band} out of range for {num_bands} bands")]
    BandOutOfRange {
        /// Requested band
        band: usize,
        /// Number of bands in the layout
        num_bands: usize,
    },

    /// Bank or element index is outside the storage.
    #[error("element {index} of bank {bank} out of range (bank size {len})")]
    IndexOutOfBounds {
        /// Bank index
        bank: usize,
        /// Logical element index
        index: usize,
        /// Addressable size of the bank
        len: usize,
    },

    /// A caller-supplied array is shorter than the operation requires.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall {
        /// Elements required
        needed: usize,
        /// Elements supplied
        got: usize,
    },

    /// Width or height is not positive, or their product overflows.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// The raster layout is malformed (bad child rectangle, bad band subset,
    /// overflowing origin).
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// An argument is outside its documented domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The element type is not accepted by this operation.
    #[error("data type {data_type} not supported by {operation}")]
    UnsupportedDataType {
        /// Offending element type
        data_type: DataType,
        /// Operation that rejected it
        operation: &'static str,
    },

    /// Element type of a transfer array or buffer does not match.
    #[error("data type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Element type the layout works with
        expected: DataType,
        /// Element type supplied
        got: DataType,
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: i32, y: i32) -> Self {
        Self::OutOfBounds { x, y }
    }

    /// Creates an [`Error::BandOutOfRange`] error.
    #[inline]
    pub fn band_out_of_range(band: usize, num_bands: usize) -> Self {
        Self::BandOutOfRange { band, num_bands }
    }

    /// Creates an [`Error::BufferTooSmall`] error.
    #[inline]
    pub fn buffer_too_small(needed: usize, got: usize) -> Self {
        Self::BufferTooSmall { needed, got }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: i32, height: i32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidRaster`] error.
    #[inline]
    pub fn invalid_raster(msg: impl Into<String>) -> Self {
        Self::InvalidRaster(msg.into())
    }

    /// Creates an [`Error::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an [`Error::UnsupportedDataType`] error.
    #[inline]
    pub fn unsupported(data_type: DataType, operation: &'static str) -> Self {
        Self::UnsupportedDataType {
            data_type,
            operation,
        }
    }

    /// Returns `true` for coordinate, band and element index errors.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::BandOutOfRange { .. } | Self::IndexOutOfBounds { .. }
        )
    }

    /// Returns `true` if the raster layout itself was rejected.
    #[inline]
    pub fn is_raster_error(&self) -> bool {
        matches!(self, Self::InvalidRaster(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(100, -5);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("-5"));
        assert!(err.is_bounds_error());
        assert!(!err.is_raster_error());
    }

    #[test]
    fn test_band_and_index_are_bounds_errors() {
        assert!(Error::band_out_of_range(3, 3).is_bounds_error());
        let err = Error::IndexOutOfBounds {
            bank: 1,
            index: 10,
            len: 8,
        };
        assert!(err.is_bounds_error());
        assert!(err.to_string().contains("bank 1"));
    }

    #[test]
    fn test_unsupported_names_type() {
        let err = Error::unsupported(DataType::Float, "packed layout");
        assert!(err.to_string().contains("float"));
        assert!(err.to_string().contains("packed layout"));
    }

    #[test]
    fn test_invalid_raster() {
        let err = Error::invalid_raster("parentX lies outside raster");
        assert!(err.is_raster_error());
        assert!(!err.is_bounds_error());
    }
}
