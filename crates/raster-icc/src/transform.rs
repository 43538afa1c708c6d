//! Color transforms between gray and RGB ICC profiles.
//!
//! A [`Transform`] converts flat, channel-interleaved sample slices. The
//! channel count of each side comes from its profile (1 for gray, 3 for RGB),
//! so gray-to-RGB and RGB-to-gray links change the slice length.

use crate::{IccError, IccResult, Intent, Profile};
use lcms2::{PixelFormat, Transform as LcmsTransform};

mod sealed {
    pub trait Sealed {}
    impl Sealed for u16 {}
    impl Sealed for f32 {}
}

/// Sample types a transform can carry: `u16` (full-range 16-bit) and `f32`
/// (normalized).
pub trait IccSample: Copy + Default + lcms2::Pod + sealed::Sealed + 'static {
    /// lcms2 format for one gray sample.
    const GRAY: PixelFormat;
    /// lcms2 format for one RGB triplet.
    const RGB: PixelFormat;
}

impl IccSample for u16 {
    const GRAY: PixelFormat = PixelFormat::GRAY_16;
    const RGB: PixelFormat = PixelFormat::RGB_16;
}

impl IccSample for f32 {
    const GRAY: PixelFormat = PixelFormat::GRAY_FLT;
    const RGB: PixelFormat = PixelFormat::RGB_FLT;
}

enum Link<S: IccSample> {
    GrayToGray(LcmsTransform<S, S>),
    GrayToRgb(LcmsTransform<S, [S; 3]>),
    RgbToGray(LcmsTransform<[S; 3], S>),
    RgbToRgb(LcmsTransform<[S; 3], [S; 3]>),
}

/// A color transform between two gray or RGB profiles.
///
/// # Example
///
/// ```rust
/// use raster_icc::{Intent, Profile, Transform};
///
/// let srgb = Profile::srgb();
/// let gray = Profile::linear_gray().unwrap();
/// let t = Transform::<u16>::new(&gray, &srgb, Intent::RelativeColorimetric).unwrap();
/// let rgb = t.convert(&[0, 65535]).unwrap();
/// assert_eq!(rgb.len(), 6);
/// ```
pub struct Transform<S: IccSample> {
    link: Link<S>,
    src_channels: usize,
    dst_channels: usize,
}

fn failed(e: impl std::fmt::Display) -> IccError {
    IccError::Link(e.to_string())
}

fn channels_of(profile: &Profile) -> IccResult<usize> {
    profile
        .channels()
        .ok_or_else(|| IccError::UnsupportedClass(profile.description()))
}

impl<S: IccSample> Transform<S> {
    /// Creates a new transform between two profiles.
    ///
    /// # Errors
    ///
    /// Fails if either profile is neither gray nor RGB, or if lcms2 cannot
    /// link them.
    pub fn new(source: &Profile, dest: &Profile, intent: Intent) -> IccResult<Self> {
        let src_channels = channels_of(source)?;
        let dst_channels = channels_of(dest)?;
        let intent: lcms2::Intent = intent.into();
        let (src, dst) = (&source.inner, &dest.inner);
        let link = match (src_channels, dst_channels) {
            (1, 1) => Link::GrayToGray(LcmsTransform::new(src, S::GRAY, dst, S::GRAY, intent).map_err(failed)?),
            (1, _) => Link::GrayToRgb(LcmsTransform::new(src, S::GRAY, dst, S::RGB, intent).map_err(failed)?),
            (_, 1) => Link::RgbToGray(LcmsTransform::new(src, S::RGB, dst, S::GRAY, intent).map_err(failed)?),
            _ => Link::RgbToRgb(LcmsTransform::new(src, S::RGB, dst, S::RGB, intent).map_err(failed)?),
        };
        Ok(Self {
            link,
            src_channels,
            dst_channels,
        })
    }

    /// Channels per source pixel.
    #[inline]
    pub fn src_channels(&self) -> usize {
        self.src_channels
    }

    /// Channels per destination pixel.
    #[inline]
    pub fn dst_channels(&self) -> usize {
        self.dst_channels
    }

    /// Converts interleaved source samples into a new destination vector.
    pub fn convert(&self, samples: &[S]) -> IccResult<Vec<S>> {
        if samples.len() % self.src_channels != 0 {
            return Err(IccError::PartialPixel {
                len: samples.len(),
                channels: self.src_channels,
            });
        }
        let out = match &self.link {
            Link::GrayToGray(t) => {
                let mut out = vec![S::default(); samples.len()];
                t.transform_pixels(samples, &mut out);
                out
            }
            Link::GrayToRgb(t) => {
                let mut out = vec![[S::default(); 3]; samples.len()];
                t.transform_pixels(samples, &mut out);
                out.into_iter().flatten().collect()
            }
            Link::RgbToGray(t) => {
                let src = triplets(samples);
                let mut out = vec![S::default(); src.len()];
                t.transform_pixels(&src, &mut out);
                out
            }
            Link::RgbToRgb(t) => {
                let src = triplets(samples);
                let mut out = vec![[S::default(); 3]; src.len()];
                t.transform_pixels(&src, &mut out);
                out.into_iter().flatten().collect()
            }
        };
        Ok(out)
    }
}

fn triplets<S: Copy>(samples: &[S]) -> Vec<[S; 3]> {
    samples.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

impl<S: IccSample> std::fmt::Debug for Transform<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("src_channels", &self.src_channels)
            .field("dst_channels", &self.dst_channels)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let srgb = Profile::srgb();
        let t = Transform::<f32>::new(&srgb, &srgb, Intent::Perceptual).unwrap();
        let out = t.convert(&[0.5, 0.3, 0.2]).unwrap();
        assert!((out[0] - 0.5).abs() < 0.01);
        assert!((out[1] - 0.3).abs() < 0.01);
        assert!((out[2] - 0.2).abs() < 0.01);
    }

    #[test]
    fn test_srgb_to_linear_darkens() {
        let t = Transform::<f32>::new(&Profile::srgb(), &Profile::linear_srgb().unwrap(), Intent::Perceptual)
            .unwrap();
        let out = t.convert(&[0.5, 0.5, 0.5, 0.8, 0.8, 0.8]).unwrap();
        assert_eq!(out.len(), 6);
        assert!(out[0] < 0.5);
        assert!(out[3] < 0.8);
    }

    #[test]
    fn test_gray_to_rgb_widens() {
        let gray = Profile::linear_gray().unwrap();
        let t = Transform::<u16>::new(&gray, &Profile::srgb(), Intent::RelativeColorimetric).unwrap();
        assert_eq!((t.src_channels(), t.dst_channels()), (1, 3));
        let out = t.convert(&[0, 32768, 65535]).unwrap();
        assert_eq!(out.len(), 9);
        assert!(out[0] < 256);
        assert!(out[6] > 65000);
        assert!(out[3] > 32768);
    }

    #[test]
    fn test_rgb_to_gray_narrows() {
        let gray = Profile::gray(2.2).unwrap();
        let t = Transform::<u16>::new(&Profile::srgb(), &gray, Intent::RelativeColorimetric).unwrap();
        let out = t.convert(&[65535, 65535, 65535]).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0] > 65000);
    }

    #[test]
    fn test_partial_pixel_rejected() {
        let srgb = Profile::srgb();
        let t = Transform::<u16>::new(&srgb, &srgb, Intent::Perceptual).unwrap();
        assert!(matches!(
            t.convert(&[1, 2]),
            Err(IccError::PartialPixel { len: 2, channels: 3 })
        ));
    }
}
