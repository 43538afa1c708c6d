//! Gray and RGB ICC profiles.
//!
//! Color spaces only ever link one- and three-channel profiles, so a
//! [`Profile`] records its [`ProfileClass`] when it is built and refuses
//! nothing else up front. Transforms reject classless profiles.

use lcms2::{CIExyY, CIExyYTRIPLE, ColorSpaceSignature, InfoType, Locale, Profile as LcmsProfile, ToneCurve};

use crate::{IccError, IccResult};

/// Channel layout of a profile's device space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileClass {
    /// One channel.
    Gray,
    /// Three channels.
    Rgb,
}

impl ProfileClass {
    /// Samples per pixel.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }

    fn of(inner: &LcmsProfile) -> Option<Self> {
        match inner.color_space() {
            ColorSpaceSignature::GrayData => Some(Self::Gray),
            ColorSpaceSignature::RgbData => Some(Self::Rgb),
            _ => None,
        }
    }
}

/// An ICC profile.
///
/// ```rust
/// use raster_icc::{Profile, ProfileClass};
///
/// let gray = Profile::gray(2.2).unwrap();
/// assert_eq!(gray.class(), Some(ProfileClass::Gray));
/// assert_eq!(Profile::srgb().channels(), Some(3));
/// ```
pub struct Profile {
    pub(crate) inner: LcmsProfile,
    class: Option<ProfileClass>,
}

fn build(e: impl std::fmt::Display) -> IccError {
    IccError::Build(e.to_string())
}

/// D65 white for the RGB profiles.
const D65: CIExyY = CIExyY { x: 0.3127, y: 0.3290, Y: 1.0 };

const SRGB_PRIMARIES: CIExyYTRIPLE = CIExyYTRIPLE {
    Red: CIExyY { x: 0.64, y: 0.33, Y: 1.0 },
    Green: CIExyY { x: 0.30, y: 0.60, Y: 1.0 },
    Blue: CIExyY { x: 0.15, y: 0.06, Y: 1.0 },
};

impl Profile {
    fn wrap(inner: LcmsProfile) -> Self {
        let class = ProfileClass::of(&inner);
        Self { inner, class }
    }

    /// Parses raw ICC data.
    pub fn from_icc(data: &[u8]) -> IccResult<Self> {
        LcmsProfile::new_icc(data)
            .map(Self::wrap)
            .map_err(|e| IccError::Parse(e.to_string()))
    }

    /// IEC 61966-2-1 sRGB.
    pub fn srgb() -> Self {
        Self::wrap(LcmsProfile::new_srgb())
    }

    /// sRGB primaries and D65 white with unit gamma.
    pub fn linear_srgb() -> IccResult<Self> {
        let curve = ToneCurve::new(1.0);
        let curves = [&curve, &curve, &curve];
        LcmsProfile::new_rgb(&D65, &SRGB_PRIMARIES, &curves)
            .map(Self::wrap)
            .map_err(build)
    }

    /// D50 gray with unit gamma.
    pub fn linear_gray() -> IccResult<Self> {
        Self::gray(1.0)
    }

    /// D50 gray with a pure power curve.
    pub fn gray(gamma: f64) -> IccResult<Self> {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(IccError::Build(format!("gamma {gamma} must be positive")));
        }
        LcmsProfile::new_gray(&CIExyY::d50(), &ToneCurve::new(gamma))
            .map(Self::wrap)
            .map_err(build)
    }

    /// Gray or RGB, if the device space is either.
    #[inline]
    pub fn class(&self) -> Option<ProfileClass> {
        self.class
    }

    /// Samples per pixel for gray and RGB profiles.
    #[inline]
    pub fn channels(&self) -> Option<usize> {
        self.class.map(ProfileClass::channels)
    }

    /// The description tag, or an empty string.
    pub fn description(&self) -> String {
        self.inner.info(InfoType::Description, Locale::none()).unwrap_or_default()
    }

    /// Serializes the profile.
    pub fn to_icc(&self) -> IccResult<Vec<u8>> {
        self.inner.icc().map_err(build)
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("description", &self.description())
            .field("class", &self.class)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_classes() {
        assert_eq!(Profile::srgb().class(), Some(ProfileClass::Rgb));
        assert_eq!(Profile::linear_srgb().unwrap().class(), Some(ProfileClass::Rgb));
        assert_eq!(Profile::linear_gray().unwrap().channels(), Some(1));
        assert!(!Profile::srgb().description().is_empty());
    }

    #[test]
    fn test_gamma_must_be_positive() {
        assert!(Profile::gray(2.2).is_ok());
        assert!(matches!(Profile::gray(0.0), Err(IccError::Build(_))));
        assert!(Profile::gray(f64::NAN).is_err());
    }

    #[test]
    fn test_serialized_profile_reloads() {
        let data = Profile::gray(1.8).unwrap().to_icc().unwrap();
        let reloaded = Profile::from_icc(&data).unwrap();
        assert_eq!(reloaded.class(), Some(ProfileClass::Gray));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(Profile::from_icc(&[1, 2, 3, 4]), Err(IccError::Parse(_))));
    }
}
