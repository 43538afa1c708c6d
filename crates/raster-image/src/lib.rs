//! # raster-image
//!
//! Addressable images built from a color model and a writable raster.
//!
//! - [`PixelBuffer`] - ARGB get/set, sub-images and premultiplication coercion
//! - [`ImageType`] - Canonical layout tags (`IntArgb`, `ThreeByteBgr`, ...)
//! - [`ConvertToIntDiscrete`] - Palette images expanded to packed ARGB
//! - [`GraphicsFactory`] - Hook for drawing contexts
//!
//! ## Usage
//!
//! ```
//! use raster_image::prelude::*;
//!
//! let img = PixelBuffer::new(8, 8, ImageType::ThreeByteBgr).unwrap();
//! img.set_rgb(3, 4, 0xff102030u32 as i32).unwrap();
//!
//! let mut bgr = [0; 3];
//! img.raster().get_pixel(3, 4, &mut bgr).unwrap();
//! assert_eq!(bgr, [0x10, 0x20, 0x30]);
//! ```
//!
//! ## Threading
//!
//! `set_rgb` and `set_rgb_rect` serialize on a per-buffer lock. Reads and
//! direct raster writes are not locked.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod discrete;
pub mod error;
pub mod graphics;
pub mod image_type;

pub use buffer::PixelBuffer;
pub use discrete::ConvertToIntDiscrete;
pub use error::{ImageError, ImageResult};
pub use graphics::GraphicsFactory;
pub use image_type::ImageType;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use raster_image::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::PixelBuffer;
    pub use crate::discrete::ConvertToIntDiscrete;
    pub use crate::error::{ImageError, ImageResult};
    pub use crate::graphics::GraphicsFactory;
    pub use crate::image_type::ImageType;
    pub use raster_color::prelude::*;
}
