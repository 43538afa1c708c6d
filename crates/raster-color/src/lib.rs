//! # raster-color
//!
//! Color spaces and color models that give meaning to raster samples.
//!
//! A [`ColorModel`] turns the samples of one pixel into a non-premultiplied
//! 8-bit ARGB int and back. Three closed variants cover the classic pixel
//! layouts:
//!
//! - [`DirectColorModel`] - RGB(A) bit fields packed into one int
//! - [`ComponentColorModel`] - One sample per component, any element type
//! - [`IndexColorModel`] - Palette indices with nearest-color reverse lookup
//!
//! Supporting pieces:
//!
//! - [`ColorSpace`] - sRGB, linear RGB, linear gray, CIE XYZ and ICC spaces
//! - [`LutRegistry`] - Bounded per-space cache of gray conversion tables
//! - [`ColorConvert`] - Color engine used to build those tables
//!
//! ## Usage
//!
//! ```
//! use raster_color::prelude::*;
//!
//! let gray = [0u8, 85, 170, 255];
//! let cm = ColorModel::from(IndexColorModel::from_components(2, 4, &gray, &gray, &gray).unwrap());
//! let px = cm.get_data_elements(0xff646464u32 as i32, None).unwrap();
//! assert_eq!(px.get_i32(0), 1);
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! raster-core  raster-transfer  raster-icc
//!      \             |              /
//!       +---- raster-color (this crate)
//!                    |
//!              raster-image
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cmm;
pub mod colorspace;
pub mod error;
pub mod lut;
pub mod model;

pub use cmm::{ColorConvert, LcmsConvert};
pub use colorspace::{ColorSpace, ColorSpaceId, ColorSpaceType};
pub use error::{ColorError, ColorResult};
pub use lut::{LutKind, LutRegistry};
pub use model::{
    ColorModel, ComponentColorModel, DirectColorModel, IndexColorModel, LOOKUP_CACHE_PAIRS, Transparency,
    ValidBits, default_palette,
};
pub use raster_icc::Intent;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use raster_color::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorspace::{ColorSpace, ColorSpaceType};
    pub use crate::error::{ColorError, ColorResult};
    pub use crate::model::{ColorModel, ComponentColorModel, DirectColorModel, IndexColorModel, Transparency};
    pub use raster_core::prelude::*;
}
