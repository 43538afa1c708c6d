//! One-sample-per-component color model.
//!
//! Every color and alpha component is stored in its own sample, so the model
//! works with any [`SampleModel::Component`] layout and all six element
//! types. Integer samples are unsigned fractions of `2^bits - 1`; `Short`
//! samples are fractions of 32767; float samples are used as is.
//!
//! # Scale classification
//!
//! On first use the model classifies its color space once and caches the
//! result:
//!
//! | Class | Space | Fast path |
//! |-------|-------|-----------|
//! | sRGB | built-in sRGB | direct 8-bit extraction |
//! | linear RGB | built-in linear RGB | fixed linear/sRGB LUTs |
//! | linear gray | built-in linear gray | fixed linear/sRGB LUTs |
//! | ICC gray | ICC gray, range [0, 1] | per-space LUTs from [`LutRegistry`] |
//! | non-standard | anything else | normalized components and [`ColorSpace::to_rgb`] |
//!
//! Non-standard spaces whose component range is not [0, 1] are rescaled for
//! integer samples, and the unnormalized-component APIs are then disabled,
//! as they are for signed element types.

use std::fmt;
use std::sync::{Arc, OnceLock};

use raster_core::{ComponentSampleModel, DataElements, DataType, Raster, SampleModel, WritableRaster};
use raster_transfer::lut;
use tracing::{debug, trace, warn};

use super::{ColorModel, ModelBase, Transparency, last_band_child, max_of};
use crate::colorspace::{ColorSpace, ColorSpaceType, LUMA};
use crate::error::{ColorError, ColorResult};
use crate::lut::LutRegistry;

/// Linear gray 16 to the gray of an ICC space.
#[derive(Clone)]
enum GrayOut {
    Eight(Arc<[u8]>),
    Sixteen(Arc<[u16]>),
}

#[derive(Clone)]
enum Scale {
    Srgb,
    LinearRgb,
    LinearGray,
    IccGray {
        to_srgb: Arc<[u8]>,
        to_gray: GrayOut,
    },
    NonStd {
        /// Color space `(min, max - min)` per color component.
        range: Option<Vec<(f32, f32)>>,
        /// `(offset, scale)` mapping normalized values back into [0, 1].
        rescale: Option<Vec<(f32, f32)>>,
    },
}

impl fmt::Debug for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Srgb => f.write_str("Srgb"),
            Scale::LinearRgb => f.write_str("LinearRgb"),
            Scale::LinearGray => f.write_str("LinearGray"),
            Scale::IccGray { .. } => f.write_str("IccGray"),
            Scale::NonStd { range, rescale } => f
                .debug_struct("NonStd")
                .field("range", range)
                .field("rescale", rescale)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
struct ScaleState {
    scale: Scale,
    no_unnorm: bool,
}

/// Color model with one sample per component.
#[derive(Debug, Clone)]
pub struct ComponentColorModel {
    base: ModelBase,
    signed: bool,
    state: OnceLock<ScaleState>,
}

#[inline]
fn lookup<T: Copy>(table: &[T], i: i32) -> T {
    table[(i.max(0) as usize).min(table.len() - 1)]
}

#[inline]
fn luminance(lin: [u32; 3]) -> f32 {
    LUMA[0] * lin[0] as f32 + LUMA[1] * lin[1] as f32 + LUMA[2] * lin[2] as f32
}

impl ComponentColorModel {
    /// Creates a model.
    ///
    /// `bits` is honored for `Byte`, `UShort` and `Int`; every other element
    /// type, or `None`, gives each component the full element width.
    pub fn new(
        color_space: ColorSpace,
        bits: Option<Vec<u32>>,
        has_alpha: bool,
        premultiplied: bool,
        transparency: Transparency,
        transfer_type: DataType,
    ) -> ColorResult<Self> {
        let n = color_space.num_components() + has_alpha as usize;
        let size = transfer_type.size();
        let bits = match (transfer_type, bits) {
            (DataType::Byte | DataType::UShort | DataType::Int, Some(bits)) => bits,
            _ => vec![size; n],
        };
        if let Some(&b) = bits.iter().take(n).find(|&&b| b > size) {
            return Err(ColorError::invalid_argument(format!(
                "{b} bits do not fit a {transfer_type} sample"
            )));
        }
        let base = ModelBase::new(
            size * n as u32,
            bits,
            color_space,
            has_alpha,
            premultiplied,
            transparency,
            transfer_type,
        )?;
        trace!(
            space = %base.color_space,
            bits = ?base.bits,
            has_alpha,
            premultiplied,
            %transfer_type,
            "ComponentColorModel"
        );
        Ok(Self {
            base,
            signed: transfer_type.is_signed(),
            state: OnceLock::new(),
        })
    }

    /// Model with full-width components and the matching transparency.
    pub fn with_defaults(
        color_space: ColorSpace,
        has_alpha: bool,
        premultiplied: bool,
        transfer_type: DataType,
    ) -> ColorResult<Self> {
        let transparency = if has_alpha {
            Transparency::Translucent
        } else {
            Transparency::Opaque
        };
        Self::new(color_space, None, has_alpha, premultiplied, transparency, transfer_type)
    }

    #[inline]
    pub(crate) fn base(&self) -> &ModelBase {
        &self.base
    }

    /// Whether the element type is `Short`, `Float` or `Double`.
    #[inline]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    fn state(&self) -> &ScaleState {
        self.state.get_or_init(|| self.init_state())
    }

    fn init_state(&self) -> ScaleState {
        let cs = &self.base.color_space;
        let scale = if cs.is_srgb() {
            Scale::Srgb
        } else if cs.is_linear_rgb() {
            Scale::LinearRgb
        } else if cs.is_linear_gray() {
            Scale::LinearGray
        } else if cs.space_type() == ColorSpaceType::Gray
            && cs.is_icc_capable()
            && cs.min_value(0) == 0.0
            && cs.max_value(0) == 1.0
        {
            match self.icc_gray_tables(cs) {
                Ok(scale) => scale,
                Err(e) => {
                    warn!(space = %cs, "gray lookup tables unavailable, using generic path: {}", e);
                    self.non_std()
                }
            }
        } else {
            self.non_std()
        };
        let no_unnorm = self.signed || matches!(scale, Scale::NonStd { rescale: Some(_), .. });
        debug!(space = %cs, ?scale, no_unnorm, "component scale initialized");
        ScaleState { scale, no_unnorm }
    }

    fn icc_gray_tables(&self, cs: &ColorSpace) -> ColorResult<Scale> {
        let registry = LutRegistry::global();
        if self.base.transfer_type == DataType::Byte {
            Ok(Scale::IccGray {
                to_srgb: registry.gray8_to_srgb8(cs)?,
                to_gray: GrayOut::Eight(registry.linear_gray16_to_gray8(cs)?),
            })
        } else {
            Ok(Scale::IccGray {
                to_srgb: registry.gray16_to_srgb8(cs)?,
                to_gray: GrayOut::Sixteen(registry.linear_gray16_to_gray16(cs)?),
            })
        }
    }

    /// Generic path; integer and short samples of a space whose range is not
    /// [0, 1] get an offset/scale back into [0, 1].
    fn non_std(&self) -> Scale {
        let cs = &self.base.color_space;
        let nc = self.base.num_color_components;
        if self.base.transfer_type.is_float()
            || (0..nc).all(|i| cs.min_value(i) == 0.0 && cs.max_value(i) == 1.0)
        {
            return Scale::NonStd {
                range: None,
                rescale: None,
            };
        }
        let range: Vec<(f32, f32)> = (0..nc)
            .map(|i| (cs.min_value(i), cs.max_value(i) - cs.min_value(i)))
            .collect();

        let n = self.base.num_components;
        let full = |i: usize| {
            if self.base.transfer_type == DataType::Short {
                32767
            } else {
                max_of(self.base.bits[i]) as u32 as i32
            }
        };
        let mut low = vec![0i32; n];
        if self.base.has_alpha {
            low[nc] = full(nc);
        }
        let high: Vec<i32> = (0..n).map(full).collect();
        let tt = self.base.transfer_type;
        let low = self.normalize_raw(&DataElements::from_i32s(tt, &low), Some(&range));
        let high = self.normalize_raw(&DataElements::from_i32s(tt, &high), Some(&range));
        let rescale = (0..nc)
            .any(|i| low[i] != 0.0 || high[i] != 1.0)
            .then(|| (0..nc).map(|i| (low[i], 1.0 / (high[i] - low[i]))).collect());
        Scale::NonStd {
            range: Some(range),
            rescale,
        }
    }

    fn check(&self, pixel: &DataElements) -> ColorResult<()> {
        pixel.require_type(self.base.transfer_type)?;
        pixel.require_len(self.base.num_components)?;
        Ok(())
    }

    fn require_unnorm(&self) -> ColorResult<()> {
        if self.state().no_unnorm {
            return Err(ColorError::invalid_argument(
                "this color model does not support the unnormalized form",
            ));
        }
        Ok(())
    }

    /// Normalizes a checked pixel, dividing out premultiplied alpha and
    /// mapping into the space's range.
    fn normalize_raw(&self, pixel: &DataElements, range: Option<&[(f32, f32)]>) -> Vec<f32> {
        let n = self.base.num_components;
        let nc = self.base.num_color_components;
        let mut norm: Vec<f32> = (0..n)
            .map(|i| match self.base.transfer_type {
                DataType::Byte | DataType::UShort | DataType::Int => {
                    pixel.get_i32(i) as u32 as f32 / self.base.max_value(i)
                }
                DataType::Short => pixel.get_i32(i) as f32 / 32767.0,
                DataType::Float => pixel.get_f32(i),
                DataType::Double => pixel.get_f64(i) as f32,
            })
            .collect();
        if self.base.has_alpha && self.base.premultiplied {
            let alpha = norm[nc];
            if alpha != 0.0 {
                let inv = 1.0 / alpha;
                norm[..nc].iter_mut().for_each(|v| *v *= inv);
            }
        }
        if let Some(range) = range {
            for (v, &(min, diff)) in norm.iter_mut().zip(range) {
                *v = min + diff * *v;
            }
        }
        norm
    }

    /// Component `idx` scaled to `precision` bits (8 for `Byte` samples),
    /// with premultiplied alpha divided out.
    fn extract_component(&self, pixel: &DataElements, idx: usize, precision: u32) -> i32 {
        let nc = self.base.num_color_components;
        let need_alpha = self.base.has_alpha && self.base.premultiplied;
        match self.base.transfer_type {
            DataType::Short => {
                let scale = max_of(precision) as f32;
                let c = pixel.get_i32(idx) as f32;
                if need_alpha {
                    let a = pixel.get_i32(nc);
                    if a == 0 { 0 } else { (c / a as f32 * scale + 0.5) as i32 }
                } else {
                    (c / 32767.0 * scale + 0.5) as i32
                }
            }
            DataType::Float | DataType::Double => {
                let scale = max_of(precision) as f64;
                let c = pixel.get_f64(idx);
                if need_alpha {
                    let a = pixel.get_f64(nc);
                    if a == 0.0 { 0 } else { (c / a * scale + 0.5) as i32 }
                } else {
                    (c * scale + 0.5) as i32
                }
            }
            tt => {
                let precision = if tt == DataType::Byte { 8 } else { precision };
                let mask = max_of(self.base.bits[idx]);
                let comp = pixel.get_i32(idx) as u32 as u64 & mask;
                if need_alpha {
                    let a_max = max_of(self.base.bits[nc]);
                    let a = pixel.get_i32(nc) as u32 as u64 & a_max;
                    if a == 0 {
                        return 0;
                    }
                    let fcomp = comp as f32 / mask as f32;
                    let inv_alpha = a_max as f32 / a as f32;
                    (fcomp * inv_alpha * max_of(precision) as f32 + 0.5) as i32
                } else if self.base.bits[idx] != precision {
                    (comp as f32 / mask as f32 * max_of(precision) as f32 + 0.5) as i32
                } else {
                    comp as i32
                }
            }
        }
    }

    fn linear_to_srgb8(&self, v: i32) -> i32 {
        let table = if self.base.transfer_type == DataType::Byte {
            lut::linear8_to_srgb8()
        } else {
            lut::linear16_to_srgb8()
        };
        lookup(table, v) as i32
    }

    /// sRGB channel `idx` of a checked pixel.
    fn rgb_component(&self, pixel: &DataElements, idx: usize) -> ColorResult<i32> {
        let v = match &self.state().scale {
            Scale::Srgb => self.extract_component(pixel, idx, 8),
            Scale::LinearRgb => self.linear_to_srgb8(self.extract_component(pixel, idx, 16)),
            Scale::LinearGray => self.linear_to_srgb8(self.extract_component(pixel, 0, 16)),
            Scale::IccGray { to_srgb, .. } => lookup(to_srgb, self.extract_component(pixel, 0, 16)) as i32,
            Scale::NonStd { .. } => {
                let norm = self.get_normalized_components(pixel)?;
                let rgb = self.base.color_space.to_rgb(&norm[..self.base.num_color_components])?;
                (rgb[idx] * 255.0 + 0.5) as i32
            }
        };
        Ok(v.clamp(0, 255))
    }

    /// Red of a pixel in transfer form.
    pub fn get_red_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.check(pixel)?;
        self.rgb_component(pixel, 0)
    }

    /// Green of a pixel in transfer form.
    pub fn get_green_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.check(pixel)?;
        self.rgb_component(pixel, 1)
    }

    /// Blue of a pixel in transfer form.
    pub fn get_blue_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.check(pixel)?;
        self.rgb_component(pixel, 2)
    }

    /// Alpha of a pixel in transfer form; 255 without alpha.
    pub fn get_alpha_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        if !self.base.has_alpha {
            return Ok(255);
        }
        self.check(pixel)?;
        let a_idx = self.base.num_color_components;
        let alpha = match self.base.transfer_type {
            DataType::Short => (pixel.get_i32(a_idx) as f32 / 32767.0 * 255.0 + 0.5) as i32,
            DataType::Float | DataType::Double => (pixel.get_f64(a_idx) * 255.0 + 0.5) as i32,
            _ => {
                let max = max_of(self.base.bits[a_idx]);
                let a = pixel.get_i32(a_idx) as u32 as u64 & max;
                if self.base.bits[a_idx] == 8 {
                    a as i32
                } else {
                    (a as f32 / max as f32 * 255.0 + 0.5) as i32
                }
            }
        };
        Ok(alpha.clamp(0, 255))
    }

    /// Non-premultiplied ARGB of a pixel in transfer form.
    pub fn get_rgb_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.check(pixel)?;
        let alpha = self.get_alpha_elements(pixel)?;
        let [r, g, b] = match &self.state().scale {
            Scale::Srgb | Scale::LinearRgb => [
                self.rgb_component(pixel, 0)?,
                self.rgb_component(pixel, 1)?,
                self.rgb_component(pixel, 2)?,
            ],
            _ if self.base.color_space.space_type() == ColorSpaceType::Gray => {
                [self.rgb_component(pixel, 0)?; 3]
            }
            _ => {
                let norm = self.get_normalized_components(pixel)?;
                let rgb = self.base.color_space.to_rgb(&norm[..self.base.num_color_components])?;
                rgb.map(|v| ((v * 255.0 + 0.5) as i32).clamp(0, 255))
            }
        };
        Ok((alpha << 24) | (r << 16) | (g << 8) | b)
    }

    // ------------------------------------------------------------------------
    // Single-int accessors
    // ------------------------------------------------------------------------

    fn require_single(&self) -> ColorResult<()> {
        if self.base.num_components > 1 {
            return Err(ColorError::invalid_argument("more than one component per pixel"));
        }
        if self.signed {
            return Err(ColorError::invalid_argument("component value is signed"));
        }
        Ok(())
    }

    fn int_component(&self, pixel: i32, idx: usize) -> ColorResult<i32> {
        self.require_single()?;
        let px = DataElements::from_i32s(self.base.transfer_type, &[pixel]);
        let norm = self.get_normalized_components(&px)?;
        let rgb = self.base.color_space.to_rgb(&norm[..self.base.num_color_components])?;
        Ok(((rgb[idx] * 255.0 + 0.5) as i32).clamp(0, 255))
    }

    /// Red of a one-component unsigned pixel.
    pub fn get_red(&self, pixel: i32) -> ColorResult<i32> {
        self.int_component(pixel, 0)
    }

    /// Green of a one-component unsigned pixel.
    pub fn get_green(&self, pixel: i32) -> ColorResult<i32> {
        self.int_component(pixel, 1)
    }

    /// Blue of a one-component unsigned pixel.
    pub fn get_blue(&self, pixel: i32) -> ColorResult<i32> {
        self.int_component(pixel, 2)
    }

    /// Alpha of a one-component unsigned pixel.
    pub fn get_alpha(&self, pixel: i32) -> ColorResult<i32> {
        if !self.base.has_alpha {
            return Ok(255);
        }
        self.require_single()?;
        Ok((pixel as u32 as f32 / self.base.max_value(0) * 255.0 + 0.5) as i32)
    }

    /// ARGB of a one-component unsigned pixel.
    pub fn get_rgb(&self, pixel: i32) -> ColorResult<i32> {
        self.require_single()?;
        Ok((self.get_alpha(pixel)? << 24)
            | (self.get_red(pixel)? << 16)
            | (self.get_green(pixel)? << 8)
            | self.get_blue(pixel)?)
    }

    // ------------------------------------------------------------------------
    // ARGB to pixel
    // ------------------------------------------------------------------------

    fn gray16(to_gray: &GrayOut, linear: f32) -> f32 {
        let i = (linear + 0.5) as i32;
        match to_gray {
            GrayOut::Eight(t) => lookup(t, i) as f32 * 257.0,
            GrayOut::Sixteen(t) => lookup(t, i) as f32,
        }
    }

    /// sRGB in [0, 1] to normalized color components in [0, 1].
    fn from_srgb_norm(&self, srgb: [u32; 3], rescale: Option<&[(f32, f32)]>) -> ColorResult<Vec<f32>> {
        let mut norm = self
            .base
            .color_space
            .from_rgb(&srgb.map(|c| c as f32 * (1.0 / 255.0)))?;
        if let Some(rescale) = rescale {
            for (v, &(offset, scale)) in norm.iter_mut().zip(rescale) {
                *v = ((*v - offset) * scale).clamp(0.0, 1.0);
            }
        }
        Ok(norm)
    }

    /// Converts an ARGB color to a pixel in transfer form.
    pub fn get_data_elements(&self, rgb: i32, reuse: Option<DataElements>) -> ColorResult<DataElements> {
        let argb = rgb as u32;
        let alpha = argb >> 24;
        let srgb = [(argb >> 16) & 0xff, (argb >> 8) & 0xff, argb & 0xff];
        let mut out = DataElements::reuse(self.base.transfer_type, self.base.num_components, reuse);
        match self.base.transfer_type {
            DataType::Short => self.short_elements(srgb, alpha, &mut out)?,
            DataType::Float | DataType::Double => self.float_elements(srgb, alpha, &mut out)?,
            _ => self.int_elements(srgb, alpha, &mut out)?,
        }
        Ok(out)
    }

    fn short_elements(&self, srgb: [u32; 3], alpha: u32, out: &mut DataElements) -> ColorResult<()> {
        let b = &self.base;
        let nc = b.num_color_components;
        let short_alpha = (alpha as f32 * (32767.0 / 255.0) + 0.5) as i32;
        let lin16 = || srgb.map(|c| lut::srgb8_to_linear16()[c as usize] as u32);
        match &self.state().scale {
            Scale::Srgb | Scale::LinearRgb => {
                let linear = matches!(self.state().scale, Scale::LinearRgb);
                let (c, mut factor) = if linear {
                    (lin16(), 32767.0f32 / 65535.0)
                } else {
                    (srgb, 32767.0f32 / 255.0)
                };
                if b.has_alpha {
                    out.set_i32(3, short_alpha);
                    if b.premultiplied {
                        factor = alpha as f32 * factor * (1.0 / 255.0);
                    }
                }
                for i in 0..3 {
                    out.set_i32(i, (c[i] as f32 * factor + 0.5) as i32);
                }
            }
            Scale::LinearGray | Scale::IccGray { .. } => {
                let lum = luminance(lin16());
                let (gray, mut factor) = match &self.state().scale {
                    Scale::IccGray { to_gray, .. } => (Self::gray16(to_gray, lum), 32767.0f32 / 65535.0),
                    _ => (lum / 65535.0, 32767.0f32),
                };
                if b.has_alpha {
                    out.set_i32(1, short_alpha);
                    if b.premultiplied {
                        factor = alpha as f32 * factor * (1.0 / 255.0);
                    }
                }
                out.set_i32(0, (gray * factor + 0.5) as i32);
            }
            Scale::NonStd { rescale, .. } => {
                let norm = self.from_srgb_norm(srgb, rescale.as_deref())?;
                let mut factor = 32767.0f32;
                if b.has_alpha {
                    out.set_i32(nc, short_alpha);
                    if b.premultiplied {
                        factor *= alpha as f32 * (1.0 / 255.0);
                    }
                }
                for i in 0..nc {
                    out.set_i32(i, (norm[i] * factor + 0.5) as i32);
                }
            }
        }
        Ok(())
    }

    fn float_elements(&self, srgb: [u32; 3], alpha: u32, out: &mut DataElements) -> ColorResult<()> {
        let b = &self.base;
        let nc = b.num_color_components;
        let norm_alpha = alpha as f32 * (1.0 / 255.0);
        let lin16 = || srgb.map(|c| lut::srgb8_to_linear16()[c as usize] as u32);
        match &self.state().scale {
            Scale::Srgb | Scale::LinearRgb => {
                let (c, mut factor) = if matches!(self.state().scale, Scale::LinearRgb) {
                    (lin16(), 1.0f32 / 65535.0)
                } else {
                    (srgb, 1.0f32 / 255.0)
                };
                if b.has_alpha {
                    out.set_f32(3, norm_alpha);
                    if b.premultiplied {
                        factor *= norm_alpha;
                    }
                }
                for i in 0..3 {
                    out.set_f32(i, c[i] as f32 * factor);
                }
            }
            Scale::LinearGray | Scale::IccGray { .. } => {
                let lum = luminance(lin16());
                let mut gray = match &self.state().scale {
                    Scale::IccGray { to_gray, .. } => Self::gray16(to_gray, lum) / 65535.0,
                    _ => lum / 65535.0,
                };
                if b.has_alpha {
                    out.set_f32(1, norm_alpha);
                    if b.premultiplied {
                        gray *= norm_alpha;
                    }
                }
                out.set_f32(0, gray);
            }
            Scale::NonStd { .. } => {
                let mut norm = self.from_srgb_norm(srgb, None)?;
                if b.has_alpha {
                    out.set_f32(nc, norm_alpha);
                    if b.premultiplied {
                        norm.iter_mut().for_each(|v| *v *= norm_alpha);
                    }
                }
                for (i, &v) in norm.iter().take(nc).enumerate() {
                    out.set_f32(i, v);
                }
            }
        }
        Ok(())
    }

    fn int_elements(&self, srgb: [u32; 3], alpha: u32, out: &mut DataElements) -> ColorResult<()> {
        let b = &self.base;
        let nc = b.num_color_components;
        let bits = &b.bits;
        let mut px = vec![0u64; b.num_components];
        let alpha_to_bits = |a_bits: u32| {
            if a_bits == 8 {
                alpha as u64
            } else {
                (alpha as f32 * (1.0 / 255.0) * max_of(a_bits) as f32 + 0.5) as u64
            }
        };
        let lin16 = || srgb.map(|c| lut::srgb8_to_linear16()[c as usize] as u32);

        match &self.state().scale {
            Scale::Srgb | Scale::LinearRgb => {
                let (mut c, mut precision, mut factor) = (srgb, 8, 1.0f32 / 255.0);
                if matches!(self.state().scale, Scale::LinearRgb) {
                    if b.transfer_type == DataType::Byte {
                        c = srgb.map(|v| lut::srgb8_to_linear8()[v as usize] as u32);
                    } else {
                        c = lin16();
                        precision = 16;
                        factor = 1.0 / 65535.0;
                    }
                }
                if b.has_alpha {
                    px[3] = alpha_to_bits(bits[3]);
                    if b.premultiplied {
                        factor *= alpha as f32 * (1.0 / 255.0);
                        // Forces the rescale below.
                        precision = 0;
                    }
                }
                for i in 0..3 {
                    px[i] = if bits[i] == precision {
                        c[i] as u64
                    } else {
                        (c[i] as f32 * factor * max_of(bits[i]) as f32 + 0.5) as u64
                    };
                }
            }
            Scale::LinearGray | Scale::IccGray { .. } => {
                let lum = luminance(lin16());
                let mut gray = match &self.state().scale {
                    Scale::IccGray {
                        to_gray: GrayOut::Eight(t),
                        ..
                    } => lookup(t, (lum + 0.5) as i32) as f32 / 255.0,
                    Scale::IccGray { to_gray, .. } => Self::gray16(to_gray, lum) / 65535.0,
                    _ => lum / 65535.0,
                };
                if b.has_alpha {
                    px[1] = alpha_to_bits(bits[1]);
                    if b.premultiplied {
                        gray *= alpha as f32 * (1.0 / 255.0);
                    }
                }
                px[0] = (gray * max_of(bits[0]) as f32 + 0.5) as u64;
            }
            Scale::NonStd { rescale, .. } => {
                let mut norm = self.from_srgb_norm(srgb, rescale.as_deref())?;
                if b.has_alpha {
                    px[nc] = alpha_to_bits(bits[nc]);
                    if b.premultiplied {
                        let a = alpha as f32 * (1.0 / 255.0);
                        norm.iter_mut().for_each(|v| *v *= a);
                    }
                }
                for i in 0..nc {
                    px[i] = (norm[i] * max_of(bits[i]) as f32 + 0.5) as u64;
                }
            }
        }

        if b.transfer_type == DataType::Int && b.max_bits > 23 {
            for (v, &nb) in px.iter_mut().zip(bits) {
                *v = (*v).min(max_of(nb));
            }
        }
        for (i, &v) in px.iter().enumerate() {
            out.set_i32(i, v as u32 as i32);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------------

    /// Components of a one-component unsigned pixel.
    pub fn get_components(&self, pixel: i32) -> ColorResult<Vec<i32>> {
        if self.base.num_components > 1 {
            return Err(ColorError::invalid_argument("more than one component per pixel"));
        }
        self.require_unnorm()?;
        Ok(vec![(pixel as u32 as u64 & max_of(self.base.bits[0])) as i32])
    }

    /// Unnormalized components of a pixel in transfer form.
    pub fn get_components_elements(&self, pixel: &DataElements) -> ColorResult<Vec<i32>> {
        self.require_unnorm()?;
        self.check(pixel)?;
        Ok((0..self.base.num_components).map(|i| pixel.get_i32(i)).collect())
    }

    /// The sample of a one-component model.
    pub fn get_data_element(&self, components: &[i32]) -> ColorResult<i32> {
        if self.base.num_components != 1 {
            return Err(ColorError::invalid_argument(format!(
                "this model returns {} pixel elements",
                self.base.num_components
            )));
        }
        self.require_unnorm()?;
        self.base.require_components(components.len())?;
        Ok(components[0])
    }

    /// Pixel in transfer form from unnormalized components.
    pub fn get_data_elements_from_components(
        &self,
        components: &[i32],
        reuse: Option<DataElements>,
    ) -> ColorResult<DataElements> {
        self.require_unnorm()?;
        self.base.require_components(components.len())?;
        let n = self.base.num_components;
        let mut out = DataElements::reuse(self.base.transfer_type, n, reuse);
        for (i, &c) in components.iter().take(n).enumerate() {
            out.set_i32(i, c);
        }
        Ok(out)
    }

    /// Normalized, non-premultiplied components in the space's range.
    pub fn get_normalized_components(&self, pixel: &DataElements) -> ColorResult<Vec<f32>> {
        self.check(pixel)?;
        let range = match &self.state().scale {
            Scale::NonStd { range, .. } => range.as_deref(),
            _ => None,
        };
        Ok(self.normalize_raw(pixel, range))
    }

    /// Normalized components from unnormalized ones.
    pub fn get_normalized_components_from(&self, components: &[i32]) -> ColorResult<Vec<f32>> {
        self.require_unnorm()?;
        self.base.normalized_from(components)
    }

    /// Unnormalized components from normalized ones.
    pub fn get_unnormalized_components(&self, norm: &[f32]) -> ColorResult<Vec<i32>> {
        self.require_unnorm()?;
        self.base.unnormalized(norm)
    }

    /// Pixel in transfer form from normalized components.
    pub fn get_data_elements_normalized(&self, norm: &[f32], reuse: Option<DataElements>) -> ColorResult<DataElements> {
        self.base.require_components(norm.len())?;
        let b = &self.base;
        let (n, nc) = (b.num_components, b.num_color_components);
        let mut std_norm = norm[..n].to_vec();
        if let Scale::NonStd { rescale: Some(rescale), .. } = &self.state().scale {
            for (v, &(offset, scale)) in std_norm.iter_mut().zip(rescale) {
                *v = ((*v - offset) * scale).clamp(0.0, 1.0);
            }
        }
        let need_alpha = b.has_alpha && b.premultiplied;
        let alpha = if need_alpha { std_norm[nc] } else { 1.0 };
        let mut out = DataElements::reuse(b.transfer_type, n, reuse);
        for (i, &v) in std_norm.iter().enumerate() {
            let v = if need_alpha && i < nc { v * alpha } else { v };
            match b.transfer_type {
                DataType::Short => out.set_i32(i, (v * 32767.0 + 0.5) as i32),
                DataType::Float => out.set_f32(i, v),
                DataType::Double => out.set_f64(i, v as f64),
                _ => out.set_i32(i, (v * b.max_value(i) + 0.5) as u32 as i32),
            }
        }
        Ok(out)
    }

    /// The sample of a one-component unsigned model from a normalized value.
    pub fn get_data_element_normalized(&self, norm: &[f32]) -> ColorResult<i32> {
        self.require_single()?;
        let px = self.get_data_elements_normalized(norm, None)?;
        Ok(px.get_i32(0))
    }

    // ------------------------------------------------------------------------
    // Rasters
    // ------------------------------------------------------------------------

    /// Multiplies or divides color samples by alpha in place.
    pub fn coerce_data(&self, raster: &WritableRaster, premultiplied: bool) -> ColorResult<ColorModel> {
        if !self.base.has_alpha || self.base.premultiplied == premultiplied {
            return Ok(ColorModel::Component(self.clone()));
        }
        let tt = self.base.transfer_type;
        let a_idx = raster.num_bands() - 1;
        let alpha_scale = match tt {
            DataType::Short => 1.0 / 32767.0,
            _ => 1.0 / max_of(self.base.bits[self.base.num_color_components]) as f64,
        };
        let zeros = DataElements::new(tt, raster.num_data_elements());
        let mut px = None;
        let (x0, y0) = (raster.min_x(), raster.min_y());
        for y in y0..y0 + raster.height() {
            for x in x0..x0 + raster.width() {
                let mut p = raster.get_data_elements(x, y, px.take())?;
                let write = match tt {
                    DataType::Float => {
                        let a = p.get_f32(a_idx);
                        scale_floats(&mut p, a_idx, a, premultiplied, |p, i| p.get_f32(i), |p, i, v| p.set_f32(i, v))
                    }
                    DataType::Double => {
                        let a = p.get_f64(a_idx);
                        scale_floats(&mut p, a_idx, a, premultiplied, |p, i| p.get_f64(i), |p, i, v| p.set_f64(i, v))
                    }
                    _ => {
                        let a = int_sample(&p, a_idx, tt) * alpha_scale;
                        if a != 0.0 {
                            let factor = if premultiplied { a } else { 1.0 / a };
                            for c in 0..a_idx {
                                let v = int_sample(&p, c, tt) * factor + 0.5;
                                set_int_sample(&mut p, c, tt, v);
                            }
                            Coerced::Write
                        } else if premultiplied {
                            Coerced::Zero
                        } else {
                            Coerced::Skip
                        }
                    }
                };
                match write {
                    Coerced::Write => raster.set_data_elements(x, y, &p)?,
                    Coerced::Zero => raster.set_data_elements(x, y, &zeros)?,
                    Coerced::Skip => {}
                }
                px = Some(p);
            }
        }
        debug!(premultiplied, %tt, "coerced component samples");
        let bits = (!self.signed).then(|| self.base.bits.clone());
        Self::new(
            self.base.color_space.clone(),
            bits,
            true,
            premultiplied,
            self.base.transparency,
            tt,
        )
        .map(ColorModel::Component)
    }

    /// Component layout, one band per component of at least `bits`, same
    /// transfer type.
    pub fn is_compatible_raster(&self, raster: &Raster) -> bool {
        let sm = raster.sample_model();
        if sm.as_component().is_none() {
            return false;
        }
        let layout = sm.layout();
        layout.num_bands() == self.base.num_components
            && self.base.bits.iter().enumerate().all(|(i, &b)| layout.sample_size(i) >= b)
            && raster.transfer_type() == self.base.transfer_type
    }

    /// Component layout with one band per component and the same transfer type.
    pub fn is_compatible_sample_model(&self, sample_model: &SampleModel) -> bool {
        sample_model.as_component().is_some()
            && sample_model.layout().num_bands() == self.base.num_components
            && sample_model.layout().transfer_type() == self.base.transfer_type
    }

    /// Pixel-interleaved raster for `Byte`/`UShort`, a generic component
    /// raster otherwise.
    pub fn create_compatible_writable_raster(&self, width: i32, height: i32) -> ColorResult<WritableRaster> {
        let sm = self.create_compatible_sample_model(width, height)?;
        Ok(WritableRaster::with_sample_model(sm, (0, 0))?)
    }

    /// Component layout with band `i` at offset `i`.
    pub fn create_compatible_sample_model(&self, width: i32, height: i32) -> ColorResult<SampleModel> {
        if width <= 0 || height <= 0 {
            return Err(ColorError::invalid_argument(format!(
                "width ({width}) and height ({height}) must be > 0"
            )));
        }
        let n = self.base.num_components;
        let tt = self.base.transfer_type;
        let scanline = width as usize * n;
        let offsets: Vec<usize> = (0..n).collect();
        let sm = match tt {
            DataType::Byte | DataType::UShort => {
                SampleModel::pixel_interleaved(tt, width, height, n, scanline, offsets)?
            }
            _ => SampleModel::Component(ComponentSampleModel::new(
                tt,
                width,
                height,
                n,
                scanline,
                vec![0; n],
                offsets,
            )?),
        };
        Ok(sm)
    }

    /// The last band of `raster` when the model has alpha.
    pub fn alpha_raster(&self, raster: &WritableRaster) -> ColorResult<Option<WritableRaster>> {
        if !self.base.has_alpha {
            return Ok(None);
        }
        last_band_child(raster).map(Some)
    }
}

/// Raw integer sample: `Short` is signed, every other integer type is
/// unsigned, so a 32-bit `Int` sample above `i32::MAX` stays positive.
/// Matches `normalize_raw`; the unnormalized APIs are already disabled for
/// `Short` through `no_unnorm`.
fn int_sample(p: &DataElements, i: usize, tt: DataType) -> f64 {
    match tt {
        DataType::Short => p.get_i32(i) as f64,
        _ => p.get_i32(i) as u32 as f64,
    }
}

fn set_int_sample(p: &mut DataElements, i: usize, tt: DataType, v: f64) {
    match tt {
        DataType::Short => p.set_i32(i, v as i32),
        _ => p.set_i32(i, v as u32 as i32),
    }
}

enum Coerced {
    Write,
    Zero,
    Skip,
}

fn scale_floats<T>(
    p: &mut DataElements,
    a_idx: usize,
    alpha: T,
    premultiplied: bool,
    get: impl Fn(&DataElements, usize) -> T,
    set: impl Fn(&mut DataElements, usize, T),
) -> Coerced
where
    T: Copy + PartialEq + Default + std::ops::Mul<Output = T> + std::ops::Div<Output = T>,
{
    if alpha == T::default() {
        return if premultiplied { Coerced::Zero } else { Coerced::Skip };
    }
    for c in 0..a_idx {
        let v = get(p, c);
        set(p, c, if premultiplied { v * alpha } else { v / alpha });
    }
    Coerced::Write
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use raster_icc::Profile;

    fn srgb(has_alpha: bool, premultiplied: bool, tt: DataType) -> ComponentColorModel {
        ComponentColorModel::with_defaults(ColorSpace::srgb(), has_alpha, premultiplied, tt).unwrap()
    }

    fn channel_diff(a: i32, b: i32) -> i32 {
        (0..4)
            .map(|s| (((a >> (s * 8)) & 0xff) - ((b >> (s * 8)) & 0xff)).abs())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_construction_rules() {
        let cs = ColorSpace::srgb();
        let cm = ComponentColorModel::new(cs.clone(), Some(vec![5, 6, 5]), false, false, Transparency::Opaque, DataType::UShort)
            .unwrap();
        assert_eq!(cm.base().bits, vec![5, 6, 5]);
        assert_eq!(cm.base().pixel_bits, 48);

        let f = ComponentColorModel::new(cs.clone(), Some(vec![5, 6, 5]), false, false, Transparency::Opaque, DataType::Float)
            .unwrap();
        assert_eq!(f.base().bits, vec![32; 3]);
        assert!(f.is_signed());

        let bad = |bits: Vec<u32>| {
            ComponentColorModel::new(cs.clone(), Some(bits), false, false, Transparency::Opaque, DataType::Byte)
        };
        assert!(bad(vec![8, 8]).is_err());
        assert!(bad(vec![8, 0, 8]).is_err());
        assert!(bad(vec![8, 16, 8]).is_err());
    }

    #[test]
    fn test_srgb_byte_exact() {
        let cm = srgb(true, false, DataType::Byte);
        let px = cm.get_data_elements(0x80ff4020u32 as i32, None).unwrap();
        assert_eq!(px.as_bytes(), Some(&[0xff, 0x40, 0x20, 0x80][..]));
        assert_eq!(cm.get_rgb_elements(&px).unwrap() as u32, 0x80ff4020);
        assert_eq!(cm.get_components_elements(&px).unwrap(), vec![255, 64, 32, 128]);
    }

    #[test]
    fn test_srgb_premultiplied() {
        let cm = srgb(true, true, DataType::Byte);
        let px = cm.get_data_elements(0x80ff0000u32 as i32, None).unwrap();
        assert_eq!(px.as_bytes(), Some(&[128, 0, 0, 128][..]));
        assert_eq!(cm.get_rgb_elements(&px).unwrap() as u32, 0x80ff0000);
        let clear = cm.get_data_elements(0x00ffffff, None).unwrap();
        assert_eq!(cm.get_red_elements(&clear).unwrap(), 0);
    }

    #[test]
    fn test_linear_rgb_ushort_within_one() {
        let cm = ComponentColorModel::with_defaults(ColorSpace::linear_rgb(), false, false, DataType::UShort).unwrap();
        for v in 0..256u32 {
            let rgb = (0xff00_0000 | v << 16 | (255 - v) << 8 | v / 2) as i32;
            let px = cm.get_data_elements(rgb, None).unwrap();
            let back = cm.get_rgb_elements(&px).unwrap();
            assert!(channel_diff(rgb, back) <= 1, "{rgb:#x} -> {back:#x}");
        }
    }

    #[test]
    fn test_linear_gray() {
        let cm = ComponentColorModel::with_defaults(ColorSpace::linear_gray(), false, false, DataType::Byte).unwrap();
        let px = cm.get_data_elements(0xff808080u32 as i32, None).unwrap();
        assert!((px.get_i32(0) - 55).abs() <= 1);
        let back = cm.get_rgb_elements(&px).unwrap();
        assert!(channel_diff(back, 0xff808080u32 as i32) <= 1);
        assert_eq!(cm.get_rgb(255).unwrap(), -1);
        assert_eq!(cm.get_rgb(0).unwrap() as u32, 0xff000000);

        let wide = ComponentColorModel::with_defaults(ColorSpace::linear_gray(), true, false, DataType::UShort).unwrap();
        let px = wide.get_data_elements(0x40ffffff, None).unwrap();
        assert_eq!(px.as_ushorts(), Some(&[65535, 16448][..]));
        assert_eq!(wide.get_rgb_elements(&px).unwrap(), 0x40ffffff);
    }

    #[test]
    fn test_icc_gray_uses_tables() {
        let bytes = Profile::gray(2.2).unwrap().to_icc().unwrap();
        let cs = ColorSpace::from_icc(&bytes).unwrap();
        let cm = ComponentColorModel::with_defaults(cs.clone(), false, false, DataType::Byte).unwrap();
        let white = cm.get_data_elements(-1, None).unwrap();
        assert!(white.get_i32(0) >= 253);
        assert!(channel_diff(cm.get_rgb_elements(&white).unwrap(), -1) <= 2);
        let black = cm.get_data_elements(0xff000000u32 as i32, None).unwrap();
        assert!(black.get_i32(0) <= 2);
        assert!(matches!(cm.state().scale, Scale::IccGray { .. }));
        assert!(LutRegistry::global().contains(&cs, crate::lut::LutKind::Gray8ToSrgb8));
    }

    #[test]
    fn test_float_and_short() {
        let cm = srgb(true, false, DataType::Float);
        let px = cm.get_data_elements(0x80ff0000u32 as i32, None).unwrap();
        let f = px.as_floats().unwrap();
        assert_abs_diff_eq!(f[0], 1.0);
        assert_abs_diff_eq!(f[3], 128.0 / 255.0);
        assert_eq!(cm.get_rgb_elements(&px).unwrap() as u32, 0x80ff0000);
        assert!(matches!(cm.get_unnormalized_components(&[1.0; 4]), Err(ColorError::InvalidArgument(_))));
        assert!(cm.get_components_elements(&px).is_err());

        let s = srgb(false, false, DataType::Short);
        let px = s.get_data_elements(-1, None).unwrap();
        assert_eq!(px, DataElements::Short(vec![32767; 3]));
        assert_eq!(s.get_rgb_elements(&px).unwrap(), -1);
    }

    #[test]
    fn test_xyz_rescales() {
        let cm = ComponentColorModel::with_defaults(ColorSpace::cie_xyz(), false, false, DataType::UShort).unwrap();
        let rgb = 0xff808080u32 as i32;
        let px = cm.get_data_elements(rgb, None).unwrap();
        assert!(channel_diff(cm.get_rgb_elements(&px).unwrap(), rgb) <= 2);
        assert!(matches!(cm.state().scale, Scale::NonStd { rescale: Some(_), .. }));
        assert!(cm.get_components_elements(&px).is_err());

        let norm = cm
            .get_normalized_components(&DataElements::UShort(vec![65535, 0, 0]))
            .unwrap();
        assert_abs_diff_eq!(norm[0], ColorSpace::cie_xyz().max_value(0), epsilon = 1e-5);
    }

    #[test]
    fn test_single_int_accessors() {
        let rgb = srgb(false, false, DataType::Byte);
        assert!(matches!(rgb.get_red(0), Err(ColorError::InvalidArgument(_))));
        let gray = ComponentColorModel::with_defaults(ColorSpace::linear_gray(), false, false, DataType::UShort).unwrap();
        assert_eq!(gray.get_components(0x1_ffff).unwrap(), vec![0xffff]);
        assert_eq!(gray.get_data_element(&[1234]).unwrap(), 1234);
        assert_eq!(gray.get_data_element_normalized(&[1.0]).unwrap(), 65535);
        assert!(rgb.get_data_element(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_normalized_paths() {
        let cm = srgb(true, true, DataType::Byte);
        let px = cm.get_data_elements_normalized(&[1.0, 0.5, 0.0, 0.5], None).unwrap();
        assert_eq!(px.as_bytes(), Some(&[128, 64, 0, 128][..]));
        let norm = cm.get_normalized_components(&px).unwrap();
        assert_abs_diff_eq!(norm[0], 1.0, epsilon = 0.01);
        assert_abs_diff_eq!(norm[1], 0.5, epsilon = 0.01);

        let s = srgb(false, false, DataType::Short);
        let px = s.get_data_elements_normalized(&[1.0, 0.0, 0.5], None).unwrap();
        assert_eq!(px, DataElements::Short(vec![32767, 0, 16384]));
        assert!(s.get_data_elements_normalized(&[1.0], None).is_err());
    }

    #[test]
    fn test_coerce_byte() {
        let cm = srgb(true, false, DataType::Byte);
        let raster = cm.create_compatible_writable_raster(2, 1).unwrap();
        raster.set_pixel(0, 0, &[200, 100, 50, 128]).unwrap();
        raster.set_pixel(1, 0, &[9, 9, 9, 0]).unwrap();
        let pre = cm.coerce_data(&raster, true).unwrap();
        assert!(pre.is_alpha_premultiplied());
        let mut px = [0i32; 4];
        raster.get_pixel(0, 0, &mut px).unwrap();
        assert_eq!(px, [100, 50, 25, 128]);
        raster.get_pixel(1, 0, &mut px).unwrap();
        assert_eq!(px, [0; 4]);
        let same = pre.coerce_data(&raster, true).unwrap();
        assert!(same.is_alpha_premultiplied());
        pre.coerce_data(&raster, false).unwrap();
        raster.get_pixel(0, 0, &mut px).unwrap();
        for (got, want) in px.iter().zip([200, 100, 50, 128]) {
            assert!((got - want).abs() <= 1);
        }
    }

    #[test]
    fn test_coerce_int_samples_are_unsigned() {
        let cm = srgb(true, false, DataType::Int);
        assert_eq!(cm.base().bits, vec![32; 4]);
        let raster = cm.create_compatible_writable_raster(1, 1).unwrap();
        let high = 0xc000_0000u32 as i32;
        let half = 0x8000_0000u32 as i32;
        raster.set_pixel(0, 0, &[high, 0x4000_0000, 0, half]).unwrap();
        cm.coerce_data(&raster, true).unwrap();
        let mut px = [0i32; 4];
        raster.get_pixel(0, 0, &mut px).unwrap();
        assert!((px[0] as u32).abs_diff(0x6000_0000) <= 256);
        assert!((px[1] as u32).abs_diff(0x2000_0000) <= 256);
        assert_eq!(px[3], half);

        // Short stays signed; negative samples scale toward zero.
        let short = srgb(true, false, DataType::Short);
        let raster = short.create_compatible_writable_raster(1, 1).unwrap();
        raster.set_pixel(0, 0, &[-1000, 1000, 0, 16384]).unwrap();
        short.coerce_data(&raster, true).unwrap();
        raster.get_pixel(0, 0, &mut px).unwrap();
        assert!((px[0] + 500).abs() <= 1);
        assert!((px[1] - 500).abs() <= 1);
    }

    #[test]
    fn test_coerce_float() {
        let cm = srgb(true, false, DataType::Float);
        let raster = cm.create_compatible_writable_raster(1, 1).unwrap();
        raster.set_pixel_f32(0, 0, &[0.8, 0.4, 0.2, 0.5]).unwrap();
        cm.coerce_data(&raster, true).unwrap();
        let mut px = [0f32; 4];
        raster.get_pixel_f32(0, 0, &mut px).unwrap();
        assert_abs_diff_eq!(px[0], 0.4);
        assert_abs_diff_eq!(px[3], 0.5);
    }

    #[test]
    fn test_compatible_rasters() {
        let cm = srgb(true, false, DataType::Byte);
        let r = cm.create_compatible_writable_raster(4, 3).unwrap();
        assert!(cm.is_compatible_raster(&r));
        assert!(cm.is_compatible_sample_model(r.sample_model()));
        assert_eq!(r.sample_model().as_component().unwrap().pixel_stride(), 4);
        let packed = WritableRaster::create_packed(DataType::Int, 4, 3, &[0xff0000, 0xff00, 0xff, 0xff000000], (0, 0))
            .unwrap();
        assert!(!cm.is_compatible_raster(&packed));

        let f = srgb(false, false, DataType::Double);
        let r = f.create_compatible_writable_raster(2, 2).unwrap();
        assert_eq!(r.data_type(), DataType::Double);
        assert!(f.is_compatible_raster(&r));
        assert!(f.alpha_raster(&r).unwrap().is_none());
        assert!(f.create_compatible_writable_raster(2, 0).is_err());
    }
}
