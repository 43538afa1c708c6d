//! Color conversion engine interface.
//!
//! Color models build their gray lookup tables by pushing whole 16-bit ramps
//! through a [`ColorConvert`] implementation. [`LcmsConvert`] is the default
//! engine and links ICC profiles with Little CMS.

use raster_icc::{Intent, Transform};
use tracing::trace;

use crate::colorspace::ColorSpace;
use crate::error::ColorResult;

/// Converts 16-bit samples between two color spaces.
///
/// `samples` holds whole pixels of `src` (1 or 3 channels each); the result
/// holds the same pixels in `dst`.
pub trait ColorConvert: Send + Sync {
    /// Converts interleaved 16-bit samples from `src` to `dst`.
    fn convert(&self, src: &ColorSpace, dst: &ColorSpace, samples: &[u16]) -> ColorResult<Vec<u16>>;
}

/// Little CMS backed converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LcmsConvert {
    intent: Intent,
}

impl LcmsConvert {
    /// Creates a converter using `intent`.
    pub fn new(intent: Intent) -> Self {
        Self { intent }
    }

    /// Rendering intent.
    #[inline]
    pub fn intent(&self) -> Intent {
        self.intent
    }
}

impl ColorConvert for LcmsConvert {
    fn convert(&self, src: &ColorSpace, dst: &ColorSpace, samples: &[u16]) -> ColorResult<Vec<u16>> {
        trace!(src = %src, dst = %dst, samples = samples.len(), "lcms convert");
        let transform = Transform::<u16>::new(&src.profile()?, &dst.profile()?, self.intent)?;
        Ok(transform.convert(samples)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ColorError;

    #[test]
    fn test_gray_ramp_to_srgb() {
        let conv = LcmsConvert::default();
        let out = conv
            .convert(&ColorSpace::linear_gray(), &ColorSpace::srgb(), &[0, 65535])
            .unwrap();
        assert_eq!(out.len(), 6);
        assert!(out[2] < 256);
        assert!(out[5] > 65000);
    }

    #[test]
    fn test_xyz_has_no_profile() {
        let conv = LcmsConvert::new(Intent::RelativeColorimetric);
        let err = conv.convert(&ColorSpace::cie_xyz(), &ColorSpace::srgb(), &[0, 0, 0]);
        assert!(matches!(err, Err(ColorError::Unsupported(_))));
    }
}
