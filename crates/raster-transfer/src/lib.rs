//! # raster-transfer
//!
//! sRGB encoding for color models that store linear samples.
//!
//! - [`srgb`] - the IEC 61966-2-1 curve on unit-range floats
//! - [`lut`] - process-wide 8- and 16-bit tables between sRGB and linear
//!
//! ## Usage
//!
//! ```rust
//! use raster_transfer::{lut, srgb};
//!
//! assert!(srgb::eotf(0.5) < 0.5);
//! assert_eq!(lut::srgb8_to_linear8()[128], 55);
//! ```
//!
//! ## Features
//!
//! - `parallel` (default) - build the 65536-entry table with rayon

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod lut;
pub mod srgb;
