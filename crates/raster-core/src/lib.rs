//! # raster-core
//!
//! Sample storage and addressing for in-memory rasters.
//!
//! This crate provides the layers below any color interpretation:
//!
//! - [`DataType`], [`DataElements`] - Element types and typed transfer arrays
//! - [`DataBuffer`] - Banked, aliasing sample storage
//! - [`SampleModel`], [`SampleLayout`] - How samples are addressed in storage
//! - [`Raster`], [`WritableRaster`] - Positioned regions over a layout and storage
//! - [`Rect`] - Signed rectangles in region space
//!
//! ## Data Flow
//!
//! ```text
//! Raster (external x, y)
//!    |  - sample_model_translate
//!    v
//! SampleModel (internal x, y, band)
//!    |  address arithmetic
//!    v
//! DataBuffer (bank, element)
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! raster-core (this crate)
//!    ^
//!    |
//!    +-- raster-color (color models over regions)
//!    +-- raster-image (pixel buffers)
//!    +-- raster-bench
//! ```
//!
//! ## Sharing
//!
//! `DataBuffer` and `Raster` clones are aliases. Child regions see their
//! parent's writes immediately; there is no copy-on-write.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod elements;
pub mod error;
pub mod format;
pub mod layout;
pub mod rect;
pub mod region;
pub mod storage;

pub use elements::DataElements;
pub use error::*;
pub use format::DataType;
pub use layout::{
    ComponentKind, ComponentSampleModel, MultiPixelPackedSampleModel, SampleLayout, SampleModel,
    SinglePixelPackedSampleModel,
};
pub use rect::Rect;
pub use region::{Raster, WritableRaster};
pub use storage::{BankData, DataBuffer};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use raster_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::elements::DataElements;
    pub use crate::error::{Error, Result};
    pub use crate::format::DataType;
    pub use crate::layout::{
        ComponentSampleModel, MultiPixelPackedSampleModel, SampleLayout, SampleModel,
        SinglePixelPackedSampleModel,
    };
    pub use crate::rect::Rect;
    pub use crate::region::{Raster, WritableRaster};
    pub use crate::storage::DataBuffer;
}
