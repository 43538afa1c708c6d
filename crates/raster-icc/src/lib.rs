//! # raster-icc
//!
//! Little CMS 2 bindings for the color spaces in `raster-color`.
//!
//! Only what ICC-backed gray and RGB spaces need is exposed:
//!
//! - [`Profile`] - parse, build (sRGB, linear sRGB, gamma gray) and serialize
//! - [`Transform`] - link two profiles and convert `u16` or `f32` samples
//! - [`Intent`] - rendering intent for the link
//!
//! ## Usage
//!
//! ```rust
//! use raster_icc::{Intent, Profile, Transform};
//!
//! let gray = Profile::gray(2.2).unwrap();
//! let t = Transform::<u16>::new(&gray, &Profile::srgb(), Intent::Perceptual).unwrap();
//! let rgb = t.convert(&[0, 65535]).unwrap();
//! assert_eq!(rgb.len(), 6);
//! ```
//!
//! ## Threading
//!
//! A [`Transform`] owns an lcms2 handle that is not `Sync`; share one
//! behind a `Mutex`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod profile;
mod transform;

pub use error::{IccError, IccResult};
pub use profile::{Profile, ProfileClass};
pub use transform::{IccSample, Transform};

/// How a transform maps colors the destination cannot reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Intent {
    /// Compress the whole gamut.
    #[default]
    Perceptual,
    /// Match white points and clip the rest.
    RelativeColorimetric,
    /// Keep saturation.
    Saturation,
    /// Match absolute colorimetry.
    AbsoluteColorimetric,
}

impl From<Intent> for lcms2::Intent {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Perceptual => Self::Perceptual,
            Intent::RelativeColorimetric => Self::RelativeColorimetric,
            Intent::Saturation => Self::Saturation,
            Intent::AbsoluteColorimetric => Self::AbsoluteColorimetric,
        }
    }
}
