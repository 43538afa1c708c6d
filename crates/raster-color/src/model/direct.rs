//! Bit-masked RGB color model.
//!
//! Each pixel is one integer. Red, green, blue and optionally alpha occupy
//! contiguous bit fields described by masks; the rest of the int is unused.
//! The model backs the packed image types such as `IntArgb` and
//! `UShort565Rgb`.
//!
//! sRGB and linear RGB get exact fast paths through masks, scale factors and
//! the fixed transfer LUTs. Any other RGB space goes through normalized
//! components and [`ColorSpace::to_rgb`].

use raster_core::{DataElements, DataType, Raster, SampleModel, WritableRaster};
use raster_transfer::lut;
use tracing::{debug, trace};

use super::{ColorModel, ModelBase, Transparency, install_pixel, last_band_child, max_of, pixel_of};
use crate::colorspace::{ColorSpace, ColorSpaceType};
use crate::error::{ColorError, ColorResult};

const ALPHA: usize = 3;

/// Packed-int color model with one bit mask per component.
#[derive(Debug, Clone)]
pub struct DirectColorModel {
    base: ModelBase,
    masks: [u32; 4],
    offsets: [u32; 4],
    scale: [f32; 4],
    is_srgb: bool,
    is_linear: bool,
    linear_precision: u32,
    rgb_default: bool,
}

/// Offset and width of a contiguous mask.
fn decompose(mask: u32, which: &str, pixel_bits: u32) -> ColorResult<(u32, u32)> {
    if mask == 0 {
        return Err(ColorError::invalid_argument(format!("{which} mask must not be 0")));
    }
    let off = mask.trailing_zeros();
    let count = (mask >> off).trailing_ones();
    if count < 32 && (mask >> off) >> count != 0 {
        return Err(ColorError::invalid_argument(format!(
            "{which} mask {mask:#x} must be contiguous"
        )));
    }
    if off + count > pixel_bits {
        return Err(ColorError::invalid_argument(format!(
            "{which} mask {mask:#x} overflows pixel (expecting {pixel_bits} bits)"
        )));
    }
    Ok((off, count))
}

impl DirectColorModel {
    /// Opaque sRGB model with the default transfer type for `bits`.
    pub fn new(bits: u32, red_mask: u32, green_mask: u32, blue_mask: u32) -> ColorResult<Self> {
        Self::with_alpha(bits, red_mask, green_mask, blue_mask, 0)
    }

    /// sRGB model, non-premultiplied; `alpha_mask` 0 means no alpha.
    pub fn with_alpha(bits: u32, red_mask: u32, green_mask: u32, blue_mask: u32, alpha_mask: u32) -> ColorResult<Self> {
        let transfer_type = DataType::default_for_bits(bits)
            .ok_or_else(|| ColorError::invalid_argument("number of bits must be between 1 and 32"))?;
        Self::with_color_space(
            ColorSpace::srgb(),
            bits,
            [red_mask, green_mask, blue_mask, alpha_mask],
            false,
            transfer_type,
        )
    }

    /// Fully specified model.
    ///
    /// `masks` is red, green, blue, alpha; an alpha mask of 0 means no alpha.
    pub fn with_color_space(
        color_space: ColorSpace,
        bits: u32,
        masks: [u32; 4],
        premultiplied: bool,
        transfer_type: DataType,
    ) -> ColorResult<Self> {
        if !(1..=32).contains(&bits) {
            return Err(ColorError::invalid_argument("number of bits must be between 1 and 32"));
        }
        if !transfer_type.is_packable() {
            return Err(ColorError::invalid_argument(format!(
                "transfer type {transfer_type} cannot hold a packed pixel"
            )));
        }
        if color_space.space_type() != ColorSpaceType::Rgb || color_space.num_components() != 3 {
            return Err(ColorError::invalid_argument("color space must be of RGB type"));
        }
        let is_srgb = color_space.is_srgb();
        let is_linear = color_space.is_linear_rgb();
        if !is_srgb && !is_linear && (0..3).any(|i| color_space.min_value(i) != 0.0 || color_space.max_value(i) != 1.0) {
            return Err(ColorError::invalid_argument("illegal min/max RGB component value"));
        }

        let has_alpha = masks[ALPHA] != 0;
        let mut offsets = [0u32; 4];
        let mut widths = Vec::with_capacity(4);
        for (i, which) in ["red", "green", "blue", "alpha"].into_iter().enumerate() {
            if i == ALPHA && !has_alpha {
                break;
            }
            let (off, count) = decompose(masks[i], which, bits)?;
            offsets[i] = off;
            widths.push(count);
        }
        let mut scale = [1.0f32; 4];
        for (s, &w) in scale.iter_mut().zip(&widths) {
            if w != 8 {
                *s = (255.0 / max_of(w) as f64) as f32;
            }
        }
        let linear_precision = if widths[..3].iter().any(|&w| w > 8) { 16 } else { 8 };
        let transparency = if has_alpha {
            Transparency::Translucent
        } else {
            Transparency::Opaque
        };
        let base = ModelBase::new(
            bits,
            widths,
            color_space,
            has_alpha,
            premultiplied,
            transparency,
            transfer_type,
        )?;
        let rgb_default = is_srgb
            && !base.premultiplied
            && bits == 32
            && transfer_type == DataType::Int
            && masks == [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000];
        trace!(bits, ?masks, premultiplied, "DirectColorModel");
        Ok(Self {
            base,
            masks,
            offsets,
            scale,
            is_srgb,
            is_linear,
            linear_precision,
            rgb_default,
        })
    }

    /// The canonical non-premultiplied 32-bit ARGB model.
    pub fn rgb_default() -> Self {
        Self {
            base: ModelBase {
                pixel_bits: 32,
                bits: vec![8; 4],
                num_components: 4,
                num_color_components: 3,
                has_alpha: true,
                premultiplied: false,
                transparency: Transparency::Translucent,
                color_space: ColorSpace::srgb(),
                transfer_type: DataType::Int,
                max_bits: 8,
            },
            masks: [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000],
            offsets: [16, 8, 0, 24],
            scale: [1.0; 4],
            is_srgb: true,
            is_linear: false,
            linear_precision: 8,
            rgb_default: true,
        }
    }

    #[inline]
    pub(crate) fn base(&self) -> &ModelBase {
        &self.base
    }

    /// Whether this equals [`DirectColorModel::rgb_default`].
    #[inline]
    pub fn is_rgb_default(&self) -> bool {
        self.rgb_default
    }

    /// Masks of all components, alpha last when present.
    #[inline]
    pub fn masks(&self) -> &[u32] {
        &self.masks[..self.base.num_components]
    }

    /// Red mask.
    #[inline]
    pub fn red_mask(&self) -> u32 {
        self.masks[0]
    }

    /// Green mask.
    #[inline]
    pub fn green_mask(&self) -> u32 {
        self.masks[1]
    }

    /// Blue mask.
    #[inline]
    pub fn blue_mask(&self) -> u32 {
        self.masks[2]
    }

    /// Alpha mask, 0 without alpha.
    #[inline]
    pub fn alpha_mask(&self) -> u32 {
        self.masks[ALPHA]
    }

    #[inline]
    fn field(&self, pixel: u32, i: usize) -> u32 {
        (pixel & self.masks[i]) >> self.offsets[i]
    }

    fn srgb_component(&self, pixel: u32, i: usize) -> i32 {
        let c = self.field(pixel, i) as f32;
        if self.base.premultiplied {
            let a = self.field(pixel, ALPHA) as f32;
            if a == 0.0 {
                0
            } else {
                (c * self.scale[i] * 255.0 / (a * self.scale[ALPHA]) + 0.5) as i32
            }
        } else if self.scale[i] != 1.0 {
            (c * self.scale[i] + 0.5) as i32
        } else {
            c as i32
        }
    }

    fn linear_component(&self, pixel: u32, i: usize) -> i32 {
        let raw = self.field(pixel, i);
        let c = raw as f32;
        let idx = if self.base.premultiplied {
            let factor = max_of(self.linear_precision) as f32;
            let a = self.field(pixel, ALPHA) as f32;
            if a == 0.0 {
                0
            } else {
                (c * self.scale[i] * factor / (a * self.scale[ALPHA]) + 0.5) as usize
            }
        } else if self.base.bits[i] != self.linear_precision {
            if self.linear_precision == 16 {
                (c * self.scale[i] * 257.0 + 0.5) as usize
            } else {
                (c * self.scale[i] + 0.5) as usize
            }
        } else {
            raw as usize
        };
        let table = if self.linear_precision == 16 {
            lut::linear16_to_srgb8()
        } else {
            lut::linear8_to_srgb8()
        };
        table[idx.min(table.len() - 1)] as i32
    }

    /// sRGB of a pixel in a non-built-in space, in [0, 1].
    fn default_rgb(&self, pixel: u32) -> ColorResult<[f32; 3]> {
        let components = self.get_components(pixel as i32)?;
        let norm = self.base.normalized_from(&components)?;
        self.base.color_space.to_rgb(&norm[..3])
    }

    fn color(&self, pixel: i32, i: usize) -> ColorResult<i32> {
        let p = pixel as u32;
        if self.is_srgb {
            Ok(self.srgb_component(p, i))
        } else if self.is_linear {
            Ok(self.linear_component(p, i))
        } else {
            Ok((self.default_rgb(p)?[i] * 255.0 + 0.5) as i32)
        }
    }

    /// Red, 0..=255 sRGB.
    pub fn get_red(&self, pixel: i32) -> ColorResult<i32> {
        self.color(pixel, 0)
    }

    /// Green, 0..=255 sRGB.
    pub fn get_green(&self, pixel: i32) -> ColorResult<i32> {
        self.color(pixel, 1)
    }

    /// Blue, 0..=255 sRGB.
    pub fn get_blue(&self, pixel: i32) -> ColorResult<i32> {
        self.color(pixel, 2)
    }

    /// Alpha, 0..=255; 255 without alpha.
    pub fn get_alpha(&self, pixel: i32) -> ColorResult<i32> {
        if !self.base.has_alpha {
            return Ok(255);
        }
        let a = self.field(pixel as u32, ALPHA);
        if self.scale[ALPHA] != 1.0 {
            Ok((a as f32 * self.scale[ALPHA] + 0.5) as i32)
        } else {
            Ok(a as i32)
        }
    }

    /// Non-premultiplied ARGB.
    pub fn get_rgb(&self, pixel: i32) -> ColorResult<i32> {
        let alpha = self.get_alpha(pixel)?;
        let [r, g, b] = if self.is_srgb || self.is_linear {
            [self.get_red(pixel)?, self.get_green(pixel)?, self.get_blue(pixel)?]
        } else {
            self.default_rgb(pixel as u32)?.map(|v| (v * 255.0 + 0.5) as i32)
        };
        Ok((alpha << 24) | (r << 16) | (g << 8) | b)
    }

    /// Red of a single-element pixel.
    pub fn get_red_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_red(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// Green of a single-element pixel.
    pub fn get_green_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_green(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// Blue of a single-element pixel.
    pub fn get_blue_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_blue(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// Alpha of a single-element pixel.
    pub fn get_alpha_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_alpha(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// ARGB of a single-element pixel.
    pub fn get_rgb_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_rgb(pixel_of(pixel, self.base.transfer_type)?)
    }

    fn scale_alpha(&self, alpha: u32) -> u32 {
        let bits = self.base.bits[ALPHA];
        if bits == 8 {
            return alpha;
        }
        let max = max_of(bits);
        ((alpha as f32 * (1.0 / 255.0) * max as f32 + 0.5) as u64).min(max) as u32
    }

    /// Packs an ARGB color into one element of the transfer type.
    pub fn get_data_elements(&self, rgb: i32, reuse: Option<DataElements>) -> ColorResult<DataElements> {
        if self.rgb_default {
            return Ok(install_pixel(DataType::Int, rgb, reuse));
        }
        let argb = rgb as u32;
        let alpha = argb >> 24;
        let mut srgb = [(argb >> 16) & 0xff, (argb >> 8) & 0xff, argb & 0xff];
        let bits = &self.base.bits;
        let mut pixel = 0u32;
        let mut color = [0u32; 3];

        if self.is_srgb || self.is_linear {
            let mut precision = 8;
            let mut factor = 1.0f32 / 255.0;
            if self.is_linear {
                if self.linear_precision == 8 {
                    let table = lut::srgb8_to_linear8();
                    srgb = srgb.map(|c| table[c as usize] as u32);
                } else {
                    let table = lut::srgb8_to_linear16();
                    srgb = srgb.map(|c| table[c as usize] as u32);
                    precision = 16;
                    factor = 1.0 / 65535.0;
                }
            }
            if self.base.has_alpha {
                if self.base.premultiplied {
                    factor *= alpha as f32 * (1.0 / 255.0);
                    // Forces the rescale below.
                    precision = 0;
                }
                pixel = self.scale_alpha(alpha) << self.offsets[ALPHA];
            }
            for i in 0..3 {
                color[i] = if bits[i] == precision {
                    srgb[i]
                } else {
                    (srgb[i] as f32 * factor * max_of(bits[i]) as f32 + 0.5) as u32
                };
            }
        } else {
            let factor = 1.0f32 / 255.0;
            let mut norm = self
                .base
                .color_space
                .from_rgb(&srgb.map(|c| c as f32 * factor))?;
            if self.base.has_alpha {
                if self.base.premultiplied {
                    let a = alpha as f32 * factor;
                    norm.iter_mut().for_each(|v| *v *= a);
                }
                pixel = self.scale_alpha(alpha) << self.offsets[ALPHA];
            }
            for i in 0..3 {
                color[i] = (norm[i] * max_of(bits[i]) as f32 + 0.5) as u32;
            }
        }

        if self.base.max_bits > 23 {
            for i in 0..3 {
                color[i] = (color[i] as u64).min(max_of(bits[i])) as u32;
            }
        }
        for i in 0..3 {
            pixel |= (color[i] << self.offsets[i]) & self.masks[i];
        }
        Ok(install_pixel(self.base.transfer_type, pixel as i32, reuse))
    }

    /// Unnormalized components, alpha last.
    pub fn get_components(&self, pixel: i32) -> ColorResult<Vec<i32>> {
        let p = pixel as u32;
        Ok((0..self.base.num_components).map(|i| self.field(p, i) as i32).collect())
    }

    /// Unnormalized components of a single-element pixel.
    pub fn get_components_elements(&self, pixel: &DataElements) -> ColorResult<Vec<i32>> {
        self.get_components(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// Packs unnormalized components into an int pixel.
    pub fn get_data_element(&self, components: &[i32]) -> ColorResult<i32> {
        self.base.require_components(components.len())?;
        let pixel = (0..self.base.num_components).fold(0u32, |acc, i| {
            acc | (((components[i] as u32) << self.offsets[i]) & self.masks[i])
        });
        Ok(pixel as i32)
    }

    /// Packs unnormalized components into transfer form.
    pub fn get_data_elements_from_components(
        &self,
        components: &[i32],
        reuse: Option<DataElements>,
    ) -> ColorResult<DataElements> {
        let pixel = self.get_data_element(components)?;
        Ok(install_pixel(self.base.transfer_type, pixel, reuse))
    }

    /// Normalized, non-premultiplied components of a single-element pixel.
    pub fn get_normalized_components(&self, pixel: &DataElements) -> ColorResult<Vec<f32>> {
        let components = self.get_components_elements(pixel)?;
        self.base.normalized_from(&components)
    }

    /// Normalized components from unnormalized ones.
    pub fn get_normalized_components_from(&self, components: &[i32]) -> ColorResult<Vec<f32>> {
        self.base.normalized_from(components)
    }

    /// Unnormalized components from normalized ones.
    pub fn get_unnormalized_components(&self, norm: &[f32]) -> ColorResult<Vec<i32>> {
        self.base.unnormalized(norm)
    }

    /// Transfer form from normalized components.
    pub fn get_data_elements_normalized(&self, norm: &[f32], reuse: Option<DataElements>) -> ColorResult<DataElements> {
        let components = self.base.unnormalized(norm)?;
        self.get_data_elements_from_components(&components, reuse)
    }

    /// Int pixel from normalized components.
    pub fn get_data_element_normalized(&self, norm: &[f32]) -> ColorResult<i32> {
        let components = self.base.unnormalized(norm)?;
        self.get_data_element(&components)
    }

    /// Multiplies or divides color samples by alpha in place.
    pub fn coerce_data(&self, raster: &WritableRaster, premultiplied: bool) -> ColorResult<ColorModel> {
        if !self.base.has_alpha || self.base.premultiplied == premultiplied {
            return Ok(ColorModel::Direct(self.clone()));
        }
        let a_idx = self.base.num_color_components;
        let alpha_scale = 1.0 / self.base.max_value(a_idx);
        let n = self.base.num_components;
        let zeros = vec![0i32; n];
        let mut px = vec![0i32; n];
        let (x0, y0) = (raster.min_x(), raster.min_y());
        for y in y0..y0 + raster.height() {
            for x in x0..x0 + raster.width() {
                raster.get_pixel(x, y, &mut px)?;
                let alpha = px[a_idx] as f32 * alpha_scale;
                if premultiplied {
                    if alpha != 0.0 {
                        for c in &mut px[..a_idx] {
                            *c = (*c as f32 * alpha + 0.5) as i32;
                        }
                        raster.set_pixel(x, y, &px)?;
                    } else {
                        raster.set_pixel(x, y, &zeros)?;
                    }
                } else if alpha != 0.0 {
                    let inv = 1.0 / alpha;
                    for c in &mut px[..a_idx] {
                        *c = (*c as f32 * inv + 0.5) as i32;
                    }
                    raster.set_pixel(x, y, &px)?;
                }
            }
        }
        debug!(premultiplied, "coerced packed pixels");
        Self::with_color_space(
            self.base.color_space.clone(),
            self.base.pixel_bits,
            self.masks,
            premultiplied,
            self.base.transfer_type,
        )
        .map(ColorModel::Direct)
    }

    /// Single-pixel-packed with identical masks and transfer type.
    pub fn is_compatible_raster(&self, raster: &Raster) -> bool {
        self.is_compatible_sample_model(raster.sample_model()) && raster.transfer_type() == self.base.transfer_type
    }

    /// Single-pixel-packed with identical masks and transfer type.
    pub fn is_compatible_sample_model(&self, sample_model: &SampleModel) -> bool {
        let Some(spp) = sample_model.as_single_pixel_packed() else {
            return false;
        };
        spp.bit_masks() == self.masks()
            && sample_model.layout().transfer_type() == self.base.transfer_type
    }

    /// Packed raster of the narrowest element type holding `pixel_bits`.
    pub fn create_compatible_writable_raster(&self, width: i32, height: i32) -> ColorResult<WritableRaster> {
        if width <= 0 || height <= 0 {
            return Err(ColorError::invalid_argument(format!(
                "width ({width}) and height ({height}) must be > 0"
            )));
        }
        let data_type = if self.base.pixel_bits > 16 {
            DataType::Int
        } else if self.base.pixel_bits > 8 {
            DataType::UShort
        } else {
            DataType::Byte
        };
        Ok(WritableRaster::create_packed(data_type, width, height, self.masks(), (0, 0))?)
    }

    /// Single-pixel-packed layout with this model's masks.
    pub fn create_compatible_sample_model(&self, width: i32, height: i32) -> ColorResult<SampleModel> {
        Ok(SampleModel::single_pixel_packed(
            self.base.transfer_type,
            width,
            height,
            self.masks(),
        )?)
    }

    /// The last band of `raster` when the model has alpha.
    pub fn alpha_raster(&self, raster: &WritableRaster) -> ColorResult<Option<WritableRaster>> {
        if !self.base.has_alpha {
            return Ok(None);
        }
        last_band_child(raster).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb24() -> DirectColorModel {
        DirectColorModel::new(24, 0xff0000, 0xff00, 0xff).unwrap()
    }

    fn argb_pre() -> DirectColorModel {
        DirectColorModel::with_color_space(
            ColorSpace::srgb(),
            32,
            [0xff0000, 0xff00, 0xff, 0xff000000],
            true,
            DataType::Int,
        )
        .unwrap()
    }

    #[test]
    fn test_rgb24_packs_components() {
        let cm = rgb24();
        let px = cm.get_data_elements(0x00ff8000, None).unwrap();
        let comps = cm.get_components_elements(&px).unwrap();
        assert_eq!(comps, vec![255, 128, 0]);
        assert_eq!(cm.get_rgb_elements(&px).unwrap(), 0xffff8000u32 as i32);
        assert_eq!(cm.base().transparency, Transparency::Opaque);
        assert_eq!(cm.base().transfer_type, DataType::Int);
    }

    #[test]
    fn test_565_scaling() {
        let cm = DirectColorModel::new(16, 0xf800, 0x07e0, 0x001f).unwrap();
        assert_eq!(cm.base().transfer_type, DataType::UShort);
        assert_eq!(cm.get_red(0xf800).unwrap(), 255);
        assert_eq!(cm.get_green(0x07e0).unwrap(), 255);
        assert_eq!(cm.get_blue(0x0010).unwrap(), 132);
        let px = cm.get_data_elements(0xffff0000u32 as i32, None).unwrap();
        assert_eq!(px.get_i32(0), 0xf800);
    }

    #[test]
    fn test_premultiplied_round_trip() {
        let cm = argb_pre();
        let px = cm.get_data_elements(0x80ff0000u32 as i32, None).unwrap();
        assert_eq!(px.get_i32(0) as u32, 0x8080_0000);
        assert_eq!(cm.get_rgb_elements(&px).unwrap() as u32, 0x80ff_0000);
        assert_eq!(cm.get_red(0).unwrap(), 0);
    }

    #[test]
    fn test_linear_rgb_round_trip() {
        let cm = DirectColorModel::with_color_space(
            ColorSpace::linear_rgb(),
            24,
            [0xff0000, 0xff00, 0xff, 0],
            false,
            DataType::Int,
        )
        .unwrap();
        for v in [0u32, 1, 50, 128, 200, 255] {
            let rgb = (0xff << 24 | v << 16 | v << 8 | v) as i32;
            let px = cm.get_data_elements(rgb, None).unwrap();
            let back = cm.get_rgb_elements(&px).unwrap();
            assert!(((back & 0xff) - v as i32).abs() <= 1, "{v} -> {back:#x}");
        }
    }

    #[test]
    fn test_bad_masks() {
        assert!(DirectColorModel::new(24, 0xff00ff, 0xff00, 0xff).is_err());
        assert!(DirectColorModel::new(16, 0xff0000, 0xff00, 0xff).is_err());
        assert!(DirectColorModel::new(24, 0, 0xff00, 0xff).is_err());
        assert!(DirectColorModel::new(0, 0xff0000, 0xff00, 0xff).is_err());
        assert!(matches!(
            DirectColorModel::with_color_space(
                ColorSpace::linear_gray(),
                24,
                [0xff0000, 0xff00, 0xff, 0],
                false,
                DataType::Int
            ),
            Err(ColorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_data_element_from_components() {
        let cm = DirectColorModel::with_alpha(32, 0xff0000, 0xff00, 0xff, 0xff000000).unwrap();
        let px = cm.get_data_element(&[1, 2, 3, 4]).unwrap();
        assert_eq!(px, 0x04010203);
        assert_eq!(cm.get_components(px).unwrap(), vec![1, 2, 3, 4]);
        assert!(cm.get_data_element(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_coerce_round_trip() {
        let cm = DirectColorModel::with_alpha(32, 0xff0000, 0xff00, 0xff, 0xff000000).unwrap();
        let raster = cm.create_compatible_writable_raster(2, 1).unwrap();
        raster.set_pixel(0, 0, &[200, 100, 50, 128]).unwrap();
        raster.set_pixel(1, 0, &[200, 100, 50, 0]).unwrap();

        let pre = cm.coerce_data(&raster, true).unwrap();
        assert!(pre.is_alpha_premultiplied());
        let mut px = [0i32; 4];
        raster.get_pixel(0, 0, &mut px).unwrap();
        assert_eq!(px, [100, 50, 25, 128]);
        raster.get_pixel(1, 0, &mut px).unwrap();
        assert_eq!(px, [0, 0, 0, 0]);

        let straight = pre.coerce_data(&raster, false).unwrap();
        assert!(!straight.is_alpha_premultiplied());
        raster.get_pixel(0, 0, &mut px).unwrap();
        for (got, want) in px.iter().zip([200, 100, 50, 128]) {
            assert!((got - want).abs() <= 1);
        }
    }

    #[test]
    fn test_compatibility_and_alpha_raster() {
        let cm = DirectColorModel::with_alpha(32, 0xff0000, 0xff00, 0xff, 0xff000000).unwrap();
        let raster = cm.create_compatible_writable_raster(3, 2).unwrap();
        assert!(cm.is_compatible_raster(&raster));
        assert!(!rgb24().is_compatible_raster(&raster));
        let interleaved = WritableRaster::create_interleaved(DataType::Byte, 3, 2, 4, (0, 0)).unwrap();
        assert!(!cm.is_compatible_raster(&interleaved));

        raster.set_pixel(1, 1, &[1, 2, 3, 77]).unwrap();
        let alpha = cm.alpha_raster(&raster).unwrap().unwrap();
        assert_eq!(alpha.num_bands(), 1);
        assert_eq!(alpha.get_sample(1, 1, 0).unwrap(), 77);
        assert!(rgb24().alpha_raster(&raster).unwrap().is_none());

        let small = DirectColorModel::new(15, 0x7c00, 0x3e0, 0x1f).unwrap();
        let r = small.create_compatible_writable_raster(2, 2).unwrap();
        assert_eq!(r.data_type(), DataType::UShort);
        assert!(small.create_compatible_writable_raster(0, 2).is_err());
    }
}
