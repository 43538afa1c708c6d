//! sRGB transfer function (IEC 61966-2-1).
//!
//! Encoded values below [`DECODE_KNEE`] sit on a straight segment of slope
//! [`LINEAR_SLOPE`]; the rest follow an offset power curve of exponent
//! [`GAMMA`]. Inputs and outputs are unit-range `f32`.

/// Encoded value where the decode switches from linear to power.
pub const DECODE_KNEE: f32 = 0.04045;

/// Linear value where the encode switches from linear to power.
pub const ENCODE_KNEE: f32 = 0.003_130_8;

/// Slope of the segment near black.
pub const LINEAR_SLOPE: f32 = 12.92;

/// Exponent of the power segment.
pub const GAMMA: f32 = 2.4;

const OFFSET: f32 = 0.055;

/// Encoded sRGB to linear light.
///
/// ```rust
/// use raster_transfer::srgb;
///
/// assert!((srgb::eotf(0.5) - 0.214).abs() < 1e-3);
/// ```
#[inline]
pub fn eotf(v: f32) -> f32 {
    if v <= DECODE_KNEE {
        v / LINEAR_SLOPE
    } else {
        ((v + OFFSET) / (1.0 + OFFSET)).powf(GAMMA)
    }
}

/// Linear light to encoded sRGB.
#[inline]
pub fn oetf(l: f32) -> f32 {
    if l <= ENCODE_KNEE {
        l * LINEAR_SLOPE
    } else {
        (1.0 + OFFSET) * l.powf(GAMMA.recip()) - OFFSET
    }
}

/// Clamps `v` to [0, 1] and rounds it onto `0..=max`.
#[inline]
pub(crate) fn quantize(v: f32, max: u32) -> u32 {
    (v.clamp(0.0, 1.0) * max as f32 + 0.5) as u32
}
