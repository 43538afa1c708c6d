//! Color models: the mapping between pixel values and ARGB colors.
//!
//! A color model interprets the samples a raster stores for one pixel. It
//! turns them into the canonical non-premultiplied 32-bit ARGB int and back,
//! and into normalized components of its [`ColorSpace`].
//!
//! Three models exist, each its own struct behind the closed [`ColorModel`]
//! enum:
//!
//! - [`DirectColorModel`] - all components bit-packed into one int
//! - [`ComponentColorModel`] - one sample per component, any element type
//! - [`IndexColorModel`] - one palette index per pixel
//!
//! # Usage
//!
//! ```rust
//! use raster_color::ColorModel;
//! use raster_core::DataElements;
//!
//! let cm = ColorModel::rgb_default();
//! let px = cm.get_data_elements(0x80ff8000u32 as i32, None).unwrap();
//! assert_eq!(cm.get_rgb_elements(&px).unwrap(), 0x80ff8000u32 as i32);
//! ```

mod component;
mod direct;
mod index;

pub use component::ComponentColorModel;
pub use direct::DirectColorModel;
pub use index::{IndexColorModel, LOOKUP_CACHE_PAIRS, ValidBits, default_palette};

use raster_core::{DataElements, DataType, Raster, SampleModel, WritableRaster};
use tracing::trace;

use crate::colorspace::ColorSpace;
use crate::error::{ColorError, ColorResult};

/// How a model represents coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transparency {
    /// Every pixel is fully opaque.
    Opaque,
    /// Pixels are either fully opaque or fully transparent.
    Bitmask,
    /// Pixels may have any alpha.
    Translucent,
}

// ============================================================================
// Shared state
// ============================================================================

/// Fields every model declares.
#[derive(Debug, Clone)]
pub(crate) struct ModelBase {
    pub(crate) pixel_bits: u32,
    pub(crate) bits: Vec<u32>,
    pub(crate) num_components: usize,
    pub(crate) num_color_components: usize,
    pub(crate) has_alpha: bool,
    pub(crate) premultiplied: bool,
    pub(crate) transparency: Transparency,
    pub(crate) color_space: ColorSpace,
    pub(crate) transfer_type: DataType,
    pub(crate) max_bits: u32,
}

impl ModelBase {
    pub(crate) fn new(
        pixel_bits: u32,
        bits: Vec<u32>,
        color_space: ColorSpace,
        has_alpha: bool,
        premultiplied: bool,
        transparency: Transparency,
        transfer_type: DataType,
    ) -> ColorResult<Self> {
        let num_color_components = color_space.num_components();
        let num_components = num_color_components + has_alpha as usize;
        if pixel_bits == 0 {
            return Err(ColorError::invalid_argument("number of bits must be > 0"));
        }
        if bits.len() < num_components {
            return Err(ColorError::invalid_argument(format!(
                "number of color/alpha components should be {num_components} but length of bits array is {}",
                bits.len()
            )));
        }
        if let Some(i) = bits[..num_components].iter().position(|&b| b == 0) {
            return Err(ColorError::invalid_argument(format!("component {i} has 0 bits")));
        }
        if !has_alpha && transparency != Transparency::Opaque {
            return Err(ColorError::invalid_argument("a model without alpha must be opaque"));
        }
        if has_alpha && transparency == Transparency::Opaque {
            return Err(ColorError::invalid_argument("a model with alpha cannot be opaque"));
        }
        let mut bits = bits;
        bits.truncate(num_components);
        let max_bits = bits.iter().copied().max().unwrap_or(0);
        Ok(Self {
            pixel_bits,
            bits,
            num_components,
            num_color_components,
            has_alpha,
            premultiplied: has_alpha && premultiplied,
            transparency,
            color_space,
            transfer_type,
            max_bits,
        })
    }

    /// `2^bits - 1` of component `i`.
    #[inline]
    pub(crate) fn max_value(&self, i: usize) -> f32 {
        max_of(self.bits[i]) as f32
    }

    pub(crate) fn require_components(&self, len: usize) -> ColorResult<()> {
        if len < self.num_components {
            return Err(ColorError::invalid_argument(format!(
                "need {} components, got {len}",
                self.num_components
            )));
        }
        Ok(())
    }

    /// Unnormalized to normalized, dividing out premultiplied alpha.
    pub(crate) fn normalized_from(&self, components: &[i32]) -> ColorResult<Vec<f32>> {
        self.require_components(components.len())?;
        let n = self.num_components;
        let nc = self.num_color_components;
        let mut norm = vec![0.0f32; n];
        if self.has_alpha && self.premultiplied {
            let alpha = components[nc] as f32 / self.max_value(nc);
            if alpha != 0.0 {
                for i in 0..nc {
                    norm[i] = components[i] as f32 / (alpha * self.max_value(i));
                }
                norm[nc] = alpha;
            }
        } else {
            for i in 0..n {
                norm[i] = components[i] as f32 / self.max_value(i);
            }
        }
        Ok(norm)
    }

    /// Normalized to unnormalized, multiplying color by alpha when premultiplied.
    pub(crate) fn unnormalized(&self, norm: &[f32]) -> ColorResult<Vec<i32>> {
        self.require_components(norm.len())?;
        let n = self.num_components;
        let nc = self.num_color_components;
        let mut out = vec![0i32; n];
        if self.has_alpha && self.premultiplied {
            let alpha = norm[nc];
            for i in 0..nc {
                out[i] = (norm[i] * self.max_value(i) * alpha + 0.5) as i32;
            }
            out[nc] = (alpha * self.max_value(nc) + 0.5) as i32;
        } else {
            for i in 0..n {
                out[i] = (norm[i] * self.max_value(i) + 0.5) as i32;
            }
        }
        Ok(out)
    }
}

/// `2^bits - 1` without overflow at 32 bits.
#[inline]
pub(crate) fn max_of(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Reads the single-element pixel of an integer transfer type.
pub(crate) fn pixel_of(elems: &DataElements, transfer_type: DataType) -> ColorResult<i32> {
    if elems.is_empty() {
        return Err(ColorError::invalid_argument("pixel array is empty"));
    }
    elems.require_type(transfer_type)?;
    match transfer_type {
        DataType::Byte | DataType::UShort | DataType::Int => Ok(elems.get_i32(0)),
        other => Err(ColorError::unsupported(format!(
            "single-element pixels are not defined for {other}"
        ))),
    }
}

/// Stores `pixel` as element 0 of `reuse` or a new array.
pub(crate) fn install_pixel(transfer_type: DataType, pixel: i32, reuse: Option<DataElements>) -> DataElements {
    let mut out = DataElements::reuse(transfer_type, 1, reuse);
    out.set_i32(0, pixel);
    out
}

/// Band-subset child holding only the last band.
pub(crate) fn last_band_child(raster: &WritableRaster) -> ColorResult<WritableRaster> {
    let band = [raster.num_bands() - 1];
    let (x, y) = (raster.min_x(), raster.min_y());
    Ok(raster.create_writable_child(x, y, raster.width(), raster.height(), x, y, Some(&band))?)
}

// ============================================================================
// ColorModel
// ============================================================================

/// A color model, one of the three closed variants.
#[derive(Debug, Clone)]
pub enum ColorModel {
    /// Bit-masked components packed into one int.
    Direct(DirectColorModel),
    /// One sample per component.
    Component(ComponentColorModel),
    /// Palette lookup.
    Index(IndexColorModel),
}

macro_rules! dispatch {
    ($self:ident, $m:ident => $e:expr) => {
        match $self {
            ColorModel::Direct($m) => $e,
            ColorModel::Component($m) => $e,
            ColorModel::Index($m) => $e,
        }
    };
}

impl ColorModel {
    /// The canonical 32-bit ARGB model: sRGB, not premultiplied, Int transfer.
    pub fn rgb_default() -> Self {
        Self::Direct(DirectColorModel::rgb_default())
    }

    /// Returns `true` if this model is equivalent to [`ColorModel::rgb_default`].
    pub fn is_rgb_default(&self) -> bool {
        matches!(self, Self::Direct(d) if d.is_rgb_default())
    }

    #[inline]
    fn base(&self) -> &ModelBase {
        dispatch!(self, m => m.base())
    }

    /// Total bits per pixel.
    #[inline]
    pub fn pixel_bits(&self) -> u32 {
        self.base().pixel_bits
    }

    /// Bits of component `i`, or `None` past the last component.
    #[inline]
    pub fn component_size(&self, i: usize) -> Option<u32> {
        self.base().bits.get(i).copied()
    }

    /// Bits of every component, color components first.
    #[inline]
    pub fn component_sizes(&self) -> &[u32] {
        &self.base().bits
    }

    /// Color plus alpha components.
    #[inline]
    pub fn num_components(&self) -> usize {
        self.base().num_components
    }

    /// Color components.
    #[inline]
    pub fn num_color_components(&self) -> usize {
        self.base().num_color_components
    }

    /// Whether there is an alpha component.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.base().has_alpha
    }

    /// Whether color components are stored multiplied by alpha.
    #[inline]
    pub fn is_alpha_premultiplied(&self) -> bool {
        self.base().premultiplied
    }

    /// Coverage kind.
    #[inline]
    pub fn transparency(&self) -> Transparency {
        self.base().transparency
    }

    /// Space the color components are interpreted in.
    #[inline]
    pub fn color_space(&self) -> &ColorSpace {
        &self.base().color_space
    }

    /// Element type of [`DataElements`] this model reads and writes.
    #[inline]
    pub fn transfer_type(&self) -> DataType {
        self.base().transfer_type
    }

    /// Red of an int pixel, 0..=255 sRGB.
    pub fn get_red(&self, pixel: i32) -> ColorResult<i32> {
        dispatch!(self, m => m.get_red(pixel))
    }

    /// Green of an int pixel.
    pub fn get_green(&self, pixel: i32) -> ColorResult<i32> {
        dispatch!(self, m => m.get_green(pixel))
    }

    /// Blue of an int pixel.
    pub fn get_blue(&self, pixel: i32) -> ColorResult<i32> {
        dispatch!(self, m => m.get_blue(pixel))
    }

    /// Alpha of an int pixel.
    pub fn get_alpha(&self, pixel: i32) -> ColorResult<i32> {
        dispatch!(self, m => m.get_alpha(pixel))
    }

    /// Non-premultiplied ARGB of an int pixel.
    pub fn get_rgb(&self, pixel: i32) -> ColorResult<i32> {
        dispatch!(self, m => m.get_rgb(pixel))
    }

    /// Red of a pixel in transfer form.
    pub fn get_red_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        dispatch!(self, m => m.get_red_elements(pixel))
    }

    /// Green of a pixel in transfer form.
    pub fn get_green_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        dispatch!(self, m => m.get_green_elements(pixel))
    }

    /// Blue of a pixel in transfer form.
    pub fn get_blue_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        dispatch!(self, m => m.get_blue_elements(pixel))
    }

    /// Alpha of a pixel in transfer form.
    pub fn get_alpha_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        dispatch!(self, m => m.get_alpha_elements(pixel))
    }

    /// Non-premultiplied ARGB of a pixel in transfer form.
    pub fn get_rgb_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        dispatch!(self, m => m.get_rgb_elements(pixel))
    }

    /// Transfer form of an ARGB color, written into `reuse` when it fits.
    pub fn get_data_elements(&self, rgb: i32, reuse: Option<DataElements>) -> ColorResult<DataElements> {
        dispatch!(self, m => m.get_data_elements(rgb, reuse))
    }

    /// Unnormalized components of an int pixel.
    pub fn get_components(&self, pixel: i32) -> ColorResult<Vec<i32>> {
        dispatch!(self, m => m.get_components(pixel))
    }

    /// Unnormalized components of a pixel in transfer form.
    pub fn get_components_elements(&self, pixel: &DataElements) -> ColorResult<Vec<i32>> {
        dispatch!(self, m => m.get_components_elements(pixel))
    }

    /// Int pixel built from unnormalized components.
    pub fn get_data_element(&self, components: &[i32]) -> ColorResult<i32> {
        dispatch!(self, m => m.get_data_element(components))
    }

    /// Transfer form built from unnormalized components.
    pub fn get_data_elements_from_components(
        &self,
        components: &[i32],
        reuse: Option<DataElements>,
    ) -> ColorResult<DataElements> {
        dispatch!(self, m => m.get_data_elements_from_components(components, reuse))
    }

    /// Normalized, non-premultiplied components of a pixel in transfer form.
    pub fn get_normalized_components(&self, pixel: &DataElements) -> ColorResult<Vec<f32>> {
        dispatch!(self, m => m.get_normalized_components(pixel))
    }

    /// Normalized components from unnormalized ones.
    pub fn get_normalized_components_from(&self, components: &[i32]) -> ColorResult<Vec<f32>> {
        dispatch!(self, m => m.get_normalized_components_from(components))
    }

    /// Unnormalized components from normalized ones.
    pub fn get_unnormalized_components(&self, norm: &[f32]) -> ColorResult<Vec<i32>> {
        dispatch!(self, m => m.get_unnormalized_components(norm))
    }

    /// Transfer form built from normalized components.
    pub fn get_data_elements_normalized(&self, norm: &[f32], reuse: Option<DataElements>) -> ColorResult<DataElements> {
        dispatch!(self, m => m.get_data_elements_normalized(norm, reuse))
    }

    /// Int pixel built from normalized components.
    pub fn get_data_element_normalized(&self, norm: &[f32]) -> ColorResult<i32> {
        dispatch!(self, m => m.get_data_element_normalized(norm))
    }

    /// Rewrites `raster` in place to the requested premultiplication and
    /// returns the matching model.
    pub fn coerce_data(&self, raster: &WritableRaster, premultiplied: bool) -> ColorResult<ColorModel> {
        trace!(
            width = raster.width(),
            height = raster.height(),
            premultiplied,
            "coerce_data"
        );
        dispatch!(self, m => m.coerce_data(raster, premultiplied))
    }

    /// Whether `raster` can hold pixels of this model.
    pub fn is_compatible_raster(&self, raster: &Raster) -> bool {
        dispatch!(self, m => m.is_compatible_raster(raster))
    }

    /// Whether `sample_model` can hold pixels of this model.
    pub fn is_compatible_sample_model(&self, sample_model: &SampleModel) -> bool {
        dispatch!(self, m => m.is_compatible_sample_model(sample_model))
    }

    /// A new zeroed raster with a layout this model accepts.
    pub fn create_compatible_writable_raster(&self, width: i32, height: i32) -> ColorResult<WritableRaster> {
        dispatch!(self, m => m.create_compatible_writable_raster(width, height))
    }

    /// A layout this model accepts.
    pub fn create_compatible_sample_model(&self, width: i32, height: i32) -> ColorResult<SampleModel> {
        dispatch!(self, m => m.create_compatible_sample_model(width, height))
    }

    /// Child of `raster` exposing only the alpha band, if the model has one.
    pub fn alpha_raster(&self, raster: &WritableRaster) -> ColorResult<Option<WritableRaster>> {
        dispatch!(self, m => m.alpha_raster(raster))
    }

    /// The direct variant, if this is one.
    pub fn as_direct(&self) -> Option<&DirectColorModel> {
        match self {
            Self::Direct(m) => Some(m),
            _ => None,
        }
    }

    /// The component variant, if this is one.
    pub fn as_component(&self) -> Option<&ComponentColorModel> {
        match self {
            Self::Component(m) => Some(m),
            _ => None,
        }
    }

    /// The index variant, if this is one.
    pub fn as_index(&self) -> Option<&IndexColorModel> {
        match self {
            Self::Index(m) => Some(m),
            _ => None,
        }
    }
}

impl From<DirectColorModel> for ColorModel {
    fn from(m: DirectColorModel) -> Self {
        Self::Direct(m)
    }
}

impl From<ComponentColorModel> for ColorModel {
    fn from(m: ComponentColorModel) -> Self {
        Self::Component(m)
    }
}

impl From<IndexColorModel> for ColorModel {
    fn from(m: IndexColorModel) -> Self {
        Self::Index(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn base(premultiplied: bool) -> ModelBase {
        ModelBase::new(
            32,
            vec![8, 8, 8, 8],
            ColorSpace::srgb(),
            true,
            premultiplied,
            Transparency::Translucent,
            DataType::Byte,
        )
        .unwrap()
    }

    #[test]
    fn test_base_invariants() {
        let cs = ColorSpace::srgb();
        assert!(ModelBase::new(0, vec![8; 3], cs.clone(), false, false, Transparency::Opaque, DataType::Byte).is_err());
        assert!(ModelBase::new(24, vec![8; 2], cs.clone(), false, false, Transparency::Opaque, DataType::Byte).is_err());
        assert!(ModelBase::new(24, vec![8, 0, 8], cs.clone(), false, false, Transparency::Opaque, DataType::Byte).is_err());
        assert!(ModelBase::new(24, vec![8; 3], cs.clone(), false, false, Transparency::Bitmask, DataType::Byte).is_err());
        assert!(ModelBase::new(32, vec![8; 4], cs, true, false, Transparency::Opaque, DataType::Byte).is_err());
    }

    #[test]
    fn test_normalized_plain() {
        let b = base(false);
        let norm = b.normalized_from(&[255, 0, 51, 255]).unwrap();
        assert_abs_diff_eq!(norm[0], 1.0);
        assert_abs_diff_eq!(norm[2], 0.2);
        assert_eq!(b.unnormalized(&norm).unwrap(), vec![255, 0, 51, 255]);
    }

    #[test]
    fn test_normalized_premultiplied() {
        let b = base(true);
        let norm = b.normalized_from(&[64, 0, 128, 128]).unwrap();
        assert_abs_diff_eq!(norm[0], 0.5, epsilon = 0.01);
        assert_abs_diff_eq!(norm[2], 1.0, epsilon = 0.01);
        assert_abs_diff_eq!(norm[3], 128.0 / 255.0);
        assert_eq!(b.normalized_from(&[10, 10, 10, 0]).unwrap(), vec![0.0; 4]);
        let back = b.unnormalized(&norm).unwrap();
        assert_eq!(back, vec![64, 0, 128, 128]);
    }

    #[test]
    fn test_short_components_rejected() {
        assert!(matches!(
            base(false).normalized_from(&[1, 2, 3]),
            Err(ColorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rgb_default() {
        let cm = ColorModel::rgb_default();
        assert!(cm.is_rgb_default());
        assert_eq!(cm.pixel_bits(), 32);
        assert_eq!(cm.component_sizes(), &[8, 8, 8, 8]);
        assert_eq!(cm.transparency(), Transparency::Translucent);
        assert_eq!(cm.transfer_type(), DataType::Int);
        assert!(cm.color_space().is_srgb());
        assert!(!cm.is_alpha_premultiplied());
        assert_eq!(cm.get_rgb(0x12345678).unwrap(), 0x12345678);
    }
}
