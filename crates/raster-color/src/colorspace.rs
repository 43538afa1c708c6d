//! Color spaces that color models interpret components in.
//!
//! A [`ColorSpace`] is a shared handle. Identity, not value, decides
//! equality: every constructed space gets a unique [`ColorSpaceId`], and the
//! built-in spaces are process-wide singletons, so
//! `ColorSpace::srgb() == ColorSpace::srgb()` holds while two spaces built
//! from the same ICC bytes compare unequal.
//!
//! # Built-in spaces
//!
//! | Space | Type | Components | Range |
//! |-------|------|------------|-------|
//! | sRGB | RGB | 3 | [0, 1] |
//! | linear RGB | RGB | 3 | [0, 1] |
//! | linear gray | gray | 1 | [0, 1] |
//! | CIE XYZ (D50) | XYZ | 3 | [0, 1 + 32767/32768] |
//!
//! ICC gray and RGB profiles are supported through [`ColorSpace::from_icc`].
//!
//! # Usage
//!
//! ```rust
//! use raster_color::ColorSpace;
//!
//! let linear = ColorSpace::linear_rgb();
//! let rgb = linear.to_rgb(&[0.214, 0.214, 0.214]).unwrap();
//! assert!((rgb[0] - 0.5).abs() < 0.01);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use glam::{Mat3, Vec3};
use raster_icc::{Intent, Profile, Transform};
use raster_transfer::srgb;
use tracing::trace;

use crate::error::{ColorError, ColorResult};

/// Unique identity of a [`ColorSpace`].
pub type ColorSpaceId = u64;

/// Family of a color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpaceType {
    /// Three additive primaries.
    Rgb,
    /// One luminance component.
    Gray,
    /// CIE XYZ.
    Xyz,
}

/// Rec.709 luminance weights applied to linear RGB.
pub(crate) const LUMA: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// CIE XYZ (D50) to linear sRGB, Bradford adapted.
const XYZ_TO_LINEAR: Mat3 = Mat3::from_cols_array(&[
    3.1338561, -0.9787684, 0.0719453, //
    -1.6168667, 1.9161415, -0.2289914, //
    -0.4906146, 0.0334540, 1.4052427,
]);

/// Linear sRGB to CIE XYZ (D50), Bradford adapted.
const LINEAR_TO_XYZ: Mat3 = Mat3::from_cols_array(&[
    0.4360747, 0.2225045, 0.0139322, //
    0.3850649, 0.7168786, 0.0971045, //
    0.1430804, 0.0606169, 0.7141733,
]);

const XYZ_MAX: f32 = 1.0 + 32767.0 / 32768.0;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct IccSpace {
    bytes: Vec<u8>,
    channels: usize,
    description: String,
    to_srgb: Mutex<Option<Transform<f32>>>,
    from_srgb: Mutex<Option<Transform<f32>>>,
}

enum Kind {
    Srgb,
    LinearRgb,
    LinearGray,
    CieXyz,
    Icc(IccSpace),
}

struct Inner {
    id: ColorSpaceId,
    kind: Kind,
}

/// Shared handle to a color space.
#[derive(Clone)]
pub struct ColorSpace {
    inner: Arc<Inner>,
}

fn singleton(cell: &'static OnceLock<ColorSpace>, kind: fn() -> Kind) -> ColorSpace {
    cell.get_or_init(|| ColorSpace::from_kind(kind())).clone()
}

impl ColorSpace {
    fn from_kind(kind: Kind) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                kind,
            }),
        }
    }

    /// The built-in sRGB space.
    pub fn srgb() -> Self {
        static CELL: OnceLock<ColorSpace> = OnceLock::new();
        singleton(&CELL, || Kind::Srgb)
    }

    /// The built-in linear RGB space (sRGB primaries, gamma 1.0).
    pub fn linear_rgb() -> Self {
        static CELL: OnceLock<ColorSpace> = OnceLock::new();
        singleton(&CELL, || Kind::LinearRgb)
    }

    /// The built-in linear gray space (D50 white, gamma 1.0).
    pub fn linear_gray() -> Self {
        static CELL: OnceLock<ColorSpace> = OnceLock::new();
        singleton(&CELL, || Kind::LinearGray)
    }

    /// The built-in CIE XYZ space (D50 white).
    pub fn cie_xyz() -> Self {
        static CELL: OnceLock<ColorSpace> = OnceLock::new();
        singleton(&CELL, || Kind::CieXyz)
    }

    /// A space backed by an ICC gray or RGB profile.
    ///
    /// Each call creates a new identity.
    pub fn from_icc(bytes: &[u8]) -> ColorResult<Self> {
        let profile = Profile::from_icc(bytes)?;
        let channels = profile.channels().ok_or_else(|| {
            ColorError::unsupported(format!("ICC profile '{}' is neither gray nor RGB", profile.description()))
        })?;
        let space = Self::from_kind(Kind::Icc(IccSpace {
            bytes: bytes.to_vec(),
            channels,
            description: profile.description(),
            to_srgb: Mutex::new(None),
            from_srgb: Mutex::new(None),
        }));
        trace!(id = space.id(), channels, "ICC color space");
        Ok(space)
    }

    /// Unique identity.
    #[inline]
    pub fn id(&self) -> ColorSpaceId {
        self.inner.id
    }

    /// Family of the space.
    pub fn space_type(&self) -> ColorSpaceType {
        match &self.inner.kind {
            Kind::Srgb | Kind::LinearRgb => ColorSpaceType::Rgb,
            Kind::LinearGray => ColorSpaceType::Gray,
            Kind::CieXyz => ColorSpaceType::Xyz,
            Kind::Icc(icc) if icc.channels == 1 => ColorSpaceType::Gray,
            Kind::Icc(_) => ColorSpaceType::Rgb,
        }
    }

    /// Number of color components.
    pub fn num_components(&self) -> usize {
        match &self.inner.kind {
            Kind::LinearGray => 1,
            Kind::Icc(icc) => icc.channels,
            _ => 3,
        }
    }

    /// Returns `true` for the built-in sRGB space.
    #[inline]
    pub fn is_srgb(&self) -> bool {
        matches!(self.inner.kind, Kind::Srgb)
    }

    /// Returns `true` for the built-in linear RGB space.
    #[inline]
    pub fn is_linear_rgb(&self) -> bool {
        matches!(self.inner.kind, Kind::LinearRgb)
    }

    /// Returns `true` for the built-in linear gray space.
    #[inline]
    pub fn is_linear_gray(&self) -> bool {
        matches!(self.inner.kind, Kind::LinearGray)
    }

    /// Returns `true` for spaces backed by a profile the ICC engine can
    /// convert: every built-in space except CIE XYZ, and all ICC spaces.
    #[inline]
    pub fn is_icc_capable(&self) -> bool {
        !matches!(self.inner.kind, Kind::CieXyz)
    }

    /// Human-readable name.
    pub fn name(&self) -> String {
        match &self.inner.kind {
            Kind::Srgb => "sRGB".into(),
            Kind::LinearRgb => "Linear RGB".into(),
            Kind::LinearGray => "Linear Gray".into(),
            Kind::CieXyz => "CIE XYZ".into(),
            Kind::Icc(icc) if icc.description.is_empty() => "ICC".into(),
            Kind::Icc(icc) => icc.description.clone(),
        }
    }

    /// Smallest normalized value of component `c`.
    #[inline]
    pub fn min_value(&self, _c: usize) -> f32 {
        0.0
    }

    /// Largest normalized value of component `c`.
    #[inline]
    pub fn max_value(&self, _c: usize) -> f32 {
        match self.inner.kind {
            Kind::CieXyz => XYZ_MAX,
            _ => 1.0,
        }
    }

    /// Raw ICC bytes of an ICC-backed space.
    pub fn icc_bytes(&self) -> Option<&[u8]> {
        match &self.inner.kind {
            Kind::Icc(icc) => Some(&icc.bytes),
            _ => None,
        }
    }

    /// An ICC profile describing this space.
    pub fn profile(&self) -> ColorResult<Profile> {
        let profile = match &self.inner.kind {
            Kind::Srgb => Profile::srgb(),
            Kind::LinearRgb => Profile::linear_srgb()?,
            Kind::LinearGray => Profile::linear_gray()?,
            Kind::CieXyz => return Err(ColorError::unsupported("CIE XYZ has no gray or RGB profile")),
            Kind::Icc(icc) => Profile::from_icc(&icc.bytes)?,
        };
        Ok(profile)
    }

    fn require(&self, values: &[f32], n: usize) -> ColorResult<()> {
        if values.len() < n {
            return Err(ColorError::invalid_argument(format!(
                "{} needs {n} components, got {}",
                self.name(),
                values.len()
            )));
        }
        Ok(())
    }

    /// Converts normalized components of this space to sRGB in [0, 1].
    pub fn to_rgb(&self, components: &[f32]) -> ColorResult<[f32; 3]> {
        self.require(components, self.num_components())?;
        let rgb = match &self.inner.kind {
            Kind::Srgb => [components[0], components[1], components[2]],
            Kind::LinearRgb => [components[0], components[1], components[2]].map(|v| srgb::oetf(v.clamp(0.0, 1.0))),
            Kind::LinearGray => [srgb::oetf(components[0].clamp(0.0, 1.0)); 3],
            Kind::CieXyz => {
                let linear = XYZ_TO_LINEAR * Vec3::new(components[0], components[1], components[2]);
                linear.to_array().map(|v| srgb::oetf(v.clamp(0.0, 1.0)))
            }
            Kind::Icc(icc) => {
                let out = icc_convert(icc, &icc.to_srgb, true, &components[..icc.channels])?;
                [out[0], out[1], out[2]]
            }
        };
        Ok(rgb)
    }

    /// Converts sRGB in [0, 1] to normalized components of this space.
    pub fn from_rgb(&self, rgb: &[f32]) -> ColorResult<Vec<f32>> {
        self.require(rgb, 3)?;
        let out = match &self.inner.kind {
            Kind::Srgb => rgb[..3].to_vec(),
            Kind::LinearRgb => rgb[..3].iter().map(|&v| srgb::eotf(v)).collect(),
            Kind::LinearGray => {
                let y: f32 = rgb[..3].iter().zip(LUMA).map(|(&v, w)| srgb::eotf(v) * w).sum();
                vec![y]
            }
            Kind::CieXyz => {
                let linear = Vec3::new(srgb::eotf(rgb[0]), srgb::eotf(rgb[1]), srgb::eotf(rgb[2]));
                (LINEAR_TO_XYZ * linear).to_array().to_vec()
            }
            Kind::Icc(icc) => icc_convert(icc, &icc.from_srgb, false, &rgb[..3])?,
        };
        Ok(out)
    }
}

/// Runs one pixel through the lazily built ICC link, creating it on first use.
fn icc_convert(
    icc: &IccSpace,
    slot: &Mutex<Option<Transform<f32>>>,
    to_srgb: bool,
    pixel: &[f32],
) -> ColorResult<Vec<f32>> {
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.is_none() {
        let own = Profile::from_icc(&icc.bytes)?;
        let srgb = Profile::srgb();
        let transform = if to_srgb {
            Transform::new(&own, &srgb, Intent::Perceptual)?
        } else {
            Transform::new(&srgb, &own, Intent::Perceptual)?
        };
        *guard = Some(transform);
    }
    match guard.as_ref() {
        Some(t) => Ok(t.convert(pixel)?),
        None => Err(ColorError::unsupported("ICC transform unavailable")),
    }
}

impl PartialEq for ColorSpace {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ColorSpace {}

impl std::hash::Hash for ColorSpace {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorSpace")
            .field("id", &self.inner.id)
            .field("name", &self.name())
            .field("components", &self.num_components())
            .finish()
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_singletons_share_identity() {
        assert_eq!(ColorSpace::srgb(), ColorSpace::srgb());
        assert_eq!(ColorSpace::srgb().id(), ColorSpace::srgb().id());
        assert_ne!(ColorSpace::srgb(), ColorSpace::linear_rgb());
    }

    #[test]
    fn test_icc_spaces_have_distinct_identity() {
        let bytes = Profile::linear_gray().unwrap().to_icc().unwrap();
        let a = ColorSpace::from_icc(&bytes).unwrap();
        let b = ColorSpace::from_icc(&bytes).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.space_type(), ColorSpaceType::Gray);
        assert_eq!(a.num_components(), 1);
        assert!(!a.is_linear_gray());
    }

    #[test]
    fn test_linear_rgb_round_trip() {
        let cs = ColorSpace::linear_rgb();
        let lin = cs.from_rgb(&[0.5, 0.25, 1.0]).unwrap();
        let back = cs.to_rgb(&lin).unwrap();
        assert_abs_diff_eq!(back[0], 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(back[1], 0.25, epsilon = 1e-5);
        assert_abs_diff_eq!(back[2], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_gray_luminance() {
        let cs = ColorSpace::linear_gray();
        let white = cs.from_rgb(&[1.0, 1.0, 1.0]).unwrap();
        assert_abs_diff_eq!(white[0], 1.0, epsilon = 1e-5);
        let green = cs.from_rgb(&[0.0, 1.0, 0.0]).unwrap();
        assert_abs_diff_eq!(green[0], 0.7154, epsilon = 1e-5);
        let rgb = cs.to_rgb(&[1.0]).unwrap();
        assert_abs_diff_eq!(rgb[1], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_xyz_white_is_d50() {
        let cs = ColorSpace::cie_xyz();
        let xyz = cs.from_rgb(&[1.0, 1.0, 1.0]).unwrap();
        assert_abs_diff_eq!(xyz[0], 0.9642, epsilon = 1e-3);
        assert_abs_diff_eq!(xyz[1], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(xyz[2], 0.8252, epsilon = 1e-3);
        let rgb = cs.to_rgb(&xyz).unwrap();
        assert_abs_diff_eq!(rgb[0], 1.0, epsilon = 1e-3);
        assert!(cs.max_value(0) > 1.0);
    }

    #[test]
    fn test_icc_rgb_converts() {
        let bytes = Profile::linear_srgb().unwrap().to_icc().unwrap();
        let cs = ColorSpace::from_icc(&bytes).unwrap();
        let lin = cs.from_rgb(&[0.5, 0.5, 0.5]).unwrap();
        assert_abs_diff_eq!(lin[0], 0.214, epsilon = 0.01);
        let back = cs.to_rgb(&lin).unwrap();
        assert_abs_diff_eq!(back[0], 0.5, epsilon = 0.01);
    }

    #[test]
    fn test_short_input_rejected() {
        assert!(matches!(
            ColorSpace::srgb().to_rgb(&[0.1, 0.2]),
            Err(ColorError::InvalidArgument(_))
        ));
    }
}
