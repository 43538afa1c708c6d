//! Pixel buffer: a color model over a writable raster.
//!
//! [`PixelBuffer`] is the ARGB-level view of pixel storage. Reads go
//! raster -> data elements -> color model -> ARGB int; writes go the other
//! way under a per-buffer lock so multi-element pixels are never torn.
//!
//! # Usage
//!
//! ```
//! use raster_image::{ImageType, PixelBuffer};
//!
//! let img = PixelBuffer::new(4, 4, ImageType::IntArgb).unwrap();
//! img.set_rgb(1, 2, 0x80ff0000u32 as i32).unwrap();
//! assert_eq!(img.get_rgb(1, 2).unwrap() as u32, 0x80ff0000);
//!
//! let sub = img.subimage(1, 1, 2, 2).unwrap();
//! assert_eq!(sub.get_rgb(0, 1).unwrap() as u32, 0x80ff0000);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use raster_color::{
    ColorModel, ColorSpace, ComponentColorModel, DirectColorModel, IndexColorModel, Transparency,
};
use raster_core::{DataType, Raster, Rect, SampleModel, WritableRaster};
use tracing::{debug, trace};

use crate::error::{ImageError, ImageResult};
use crate::graphics::GraphicsFactory;
use crate::image_type::ImageType;

/// Image made of a shared color model and an owned raster at the origin.
pub struct PixelBuffer {
    color_model: Arc<ColorModel>,
    raster: WritableRaster,
    image_type: ImageType,
    properties: HashMap<String, String>,
    write_lock: Mutex<()>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("image_type", &self.image_type)
            .field("color_model", &self.color_model)
            .field("properties", &self.properties.len())
            .finish()
    }
}

// ============================================================================
// Construction
// ============================================================================

fn srgb_component(has_alpha: bool, premultiplied: bool) -> ImageResult<ColorModel> {
    let transparency = if has_alpha {
        Transparency::Translucent
    } else {
        Transparency::Opaque
    };
    let bits = vec![8; if has_alpha { 4 } else { 3 }];
    Ok(ComponentColorModel::new(
        ColorSpace::srgb(),
        Some(bits),
        has_alpha,
        premultiplied,
        transparency,
        DataType::Byte,
    )?
    .into())
}

fn gray_component(transfer_type: DataType) -> ImageResult<ColorModel> {
    Ok(ComponentColorModel::new(
        ColorSpace::linear_gray(),
        Some(vec![transfer_type.size()]),
        false,
        false,
        Transparency::Opaque,
        transfer_type,
    )?
    .into())
}

impl PixelBuffer {
    /// Zeroed buffer in one of the canonical layouts.
    pub fn new(width: i32, height: i32, image_type: ImageType) -> ImageResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(ImageError::invalid_argument(format!(
                "width ({width}) and height ({height}) must be > 0"
            )));
        }
        let cm: ColorModel = match image_type {
            ImageType::Custom => {
                return Err(ImageError::invalid_argument("custom layouts need an explicit raster"));
            }
            ImageType::IntRgb => DirectColorModel::new(24, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff)?.into(),
            ImageType::IntArgb => ColorModel::rgb_default(),
            ImageType::IntArgbPre => DirectColorModel::with_color_space(
                ColorSpace::srgb(),
                32,
                [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000],
                true,
                DataType::Int,
            )?
            .into(),
            ImageType::IntBgr => DirectColorModel::new(24, 0x0000_00ff, 0x0000_ff00, 0x00ff_0000)?.into(),
            ImageType::ThreeByteBgr => srgb_component(false, false)?,
            ImageType::FourByteAbgr => srgb_component(true, false)?,
            ImageType::FourByteAbgrPre => srgb_component(true, true)?,
            ImageType::UShort565Rgb => DirectColorModel::new(16, 0xf800, 0x07e0, 0x001f)?.into(),
            ImageType::UShort555Rgb => DirectColorModel::new(15, 0x7c00, 0x03e0, 0x001f)?.into(),
            ImageType::ByteGray => gray_component(DataType::Byte)?,
            ImageType::UShortGray => gray_component(DataType::UShort)?,
            ImageType::ByteBinary => IndexColorModel::black_white()?.into(),
            ImageType::ByteIndexed => IndexColorModel::default_indexed()?.into(),
        };
        let raster = match image_type {
            ImageType::ThreeByteBgr => {
                WritableRaster::create_interleaved_with(DataType::Byte, width, height, width as usize * 3, 3, vec![2, 1, 0], (0, 0))?
            }
            ImageType::FourByteAbgr | ImageType::FourByteAbgrPre => WritableRaster::create_interleaved_with(
                DataType::Byte,
                width,
                height,
                width as usize * 4,
                4,
                vec![3, 2, 1, 0],
                (0, 0),
            )?,
            _ => cm.create_compatible_writable_raster(width, height)?,
        };
        trace!(width, height, %image_type, "PixelBuffer::new");
        Ok(Self {
            color_model: Arc::new(cm),
            raster,
            image_type,
            properties: HashMap::new(),
            write_lock: Mutex::new(()),
        })
    }

    /// Buffer over an existing raster.
    ///
    /// The raster must start at (0, 0) and fit `color_model`. Its samples are
    /// coerced so the model's premultiplication matches
    /// `raster_premultiplied`.
    pub fn with_raster(
        color_model: impl Into<Arc<ColorModel>>,
        raster: WritableRaster,
        raster_premultiplied: bool,
        properties: Option<&HashMap<String, String>>,
    ) -> ImageResult<Self> {
        let color_model = color_model.into();
        if !color_model.is_compatible_raster(&raster) {
            return Err(ImageError::incompatible(format!(
                "raster ({} bands, {}) does not fit the color model ({} components, {})",
                raster.num_bands(),
                raster.transfer_type(),
                color_model.num_components(),
                color_model.transfer_type()
            )));
        }
        if raster.min_x() != 0 || raster.min_y() != 0 {
            return Err(ImageError::incompatible(format!(
                "raster origin ({}, {}) is not (0, 0)",
                raster.min_x(),
                raster.min_y()
            )));
        }
        let mut image = Self::from_parts(color_model, raster, properties.cloned().unwrap_or_default());
        if image.color_model.has_alpha() && image.is_alpha_premultiplied() != raster_premultiplied {
            image.coerce_data(raster_premultiplied)?;
            image.image_type = classify(&image.color_model, &image.raster);
        }
        Ok(image)
    }

    fn from_parts(color_model: Arc<ColorModel>, raster: WritableRaster, properties: HashMap<String, String>) -> Self {
        let image_type = classify(&color_model, &raster);
        trace!(
            width = raster.width(),
            height = raster.height(),
            %image_type,
            "PixelBuffer classified"
        );
        Self {
            color_model,
            raster,
            image_type,
            properties,
            write_lock: Mutex::new(()),
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

fn classify(cm: &ColorModel, raster: &Raster) -> ImageType {
    let sm = raster.sample_model();
    match cm {
        ColorModel::Direct(d) => classify_direct(d, cm, sm),
        ColorModel::Component(_) => classify_component(cm, sm),
        ColorModel::Index(_) => classify_index(cm, sm),
    }
}

fn classify_direct(d: &DirectColorModel, cm: &ColorModel, sm: &SampleModel) -> ImageType {
    if sm.as_single_pixel_packed().is_none() || !cm.color_space().is_srgb() {
        return ImageType::Custom;
    }
    let masks = (d.red_mask(), d.green_mask(), d.blue_mask(), d.alpha_mask());
    match (cm.transfer_type(), masks) {
        (DataType::Int, (0xff_0000, 0xff00, 0xff, 0xff00_0000)) => {
            if cm.is_alpha_premultiplied() {
                ImageType::IntArgbPre
            } else {
                ImageType::IntArgb
            }
        }
        (DataType::Int, (0xff_0000, 0xff00, 0xff, 0)) => ImageType::IntRgb,
        (DataType::Int, (0xff, 0xff00, 0xff_0000, 0)) => ImageType::IntBgr,
        (DataType::UShort, (0xf800, 0x07e0, 0x001f, 0)) => ImageType::UShort565Rgb,
        (DataType::UShort, (0x7c00, 0x03e0, 0x001f, 0)) => ImageType::UShort555Rgb,
        _ => ImageType::Custom,
    }
}

fn classify_component(cm: &ColorModel, sm: &SampleModel) -> ImageType {
    let Some(csm) = sm.as_component() else {
        return ImageType::Custom;
    };
    let bands = sm.layout().num_bands();
    if csm.pixel_stride() != bands || csm.bank_indices().iter().any(|&b| b != 0) {
        return ImageType::Custom;
    }
    let bits = cm.component_sizes();
    let tt = cm.transfer_type();
    let space = cm.color_space();

    if space.is_linear_gray() {
        return match (bands, tt, bits) {
            (1, DataType::Byte, [8]) => ImageType::ByteGray,
            (1, DataType::UShort, [16]) => ImageType::UShortGray,
            _ => ImageType::Custom,
        };
    }
    if !space.is_srgb() || tt != DataType::Byte || bits.iter().any(|&b| b != 8) {
        return ImageType::Custom;
    }
    match (csm.band_offsets(), cm.has_alpha(), cm.is_alpha_premultiplied()) {
        ([2, 1, 0], false, _) => ImageType::ThreeByteBgr,
        ([3, 2, 1, 0], true, false) => ImageType::FourByteAbgr,
        ([3, 2, 1, 0], true, true) => ImageType::FourByteAbgrPre,
        _ => ImageType::Custom,
    }
}

fn classify_index(cm: &ColorModel, sm: &SampleModel) -> ImageType {
    if cm.transfer_type() != DataType::Byte {
        return ImageType::Custom;
    }
    match cm.pixel_bits() {
        1 | 2 | 4 if sm.as_multi_pixel_packed().is_some() => ImageType::ByteBinary,
        8 if sm.as_component().is_some_and(|c| c.pixel_stride() == 1) => ImageType::ByteIndexed,
        _ => ImageType::Custom,
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl PixelBuffer {
    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> i32 {
        self.raster.width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> i32 {
        self.raster.height()
    }

    /// Layout tag computed at construction.
    #[inline]
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// The shared color model.
    #[inline]
    pub fn color_model(&self) -> &Arc<ColorModel> {
        &self.color_model
    }

    /// The raster; writes through it bypass the buffer lock.
    #[inline]
    pub fn raster(&self) -> &WritableRaster {
        &self.raster
    }

    /// The raster's layout.
    #[inline]
    pub fn sample_model(&self) -> &SampleModel {
        self.raster.sample_model()
    }

    /// Child raster holding only alpha, if the model has alpha.
    pub fn alpha_raster(&self) -> ImageResult<Option<WritableRaster>> {
        Ok(self.color_model.alpha_raster(&self.raster)?)
    }

    /// The color model's transparency.
    #[inline]
    pub fn transparency(&self) -> Transparency {
        self.color_model.transparency()
    }

    /// Whether samples hold premultiplied color.
    #[inline]
    pub fn is_alpha_premultiplied(&self) -> bool {
        self.color_model.is_alpha_premultiplied()
    }

    /// Property value by name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Property names, sorted.
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Calls through to `factory` for a drawing context.
    pub fn create_graphics<F: GraphicsFactory>(&self, factory: &F) -> F::Context {
        factory.create_graphics(self)
    }
}

// ============================================================================
// Pixel access
// ============================================================================

fn check_rect(x: i32, y: i32, w: i32, h: i32, len: usize, offset: usize, scansize: usize) -> ImageResult<()> {
    if w < 0 || h < 0 {
        return Err(ImageError::invalid_argument(format!("negative size {w}x{h} at ({x}, {y})")));
    }
    if w == 0 || h == 0 {
        return Ok(());
    }
    let needed = (h as usize - 1)
        .checked_mul(scansize)
        .and_then(|n| n.checked_add(offset))
        .and_then(|n| n.checked_add(w as usize))
        .ok_or_else(|| ImageError::invalid_argument(format!("offset {offset} with scansize {scansize} overflows")))?;
    if len < needed {
        return Err(raster_core::Error::buffer_too_small(needed, len).into());
    }
    Ok(())
}

impl PixelBuffer {
    /// ARGB of the pixel at `(x, y)`.
    pub fn get_rgb(&self, x: i32, y: i32) -> ImageResult<i32> {
        let px = self.raster.get_data_elements(x, y, None)?;
        Ok(self.color_model.get_rgb_elements(&px)?)
    }

    /// Stores an ARGB color at `(x, y)`.
    pub fn set_rgb(&self, x: i32, y: i32, argb: i32) -> ImageResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let px = self.color_model.get_data_elements(argb, None)?;
        self.raster.set_data_elements(x, y, &px)?;
        Ok(())
    }

    /// ARGB of a rectangle into `out`, row `r` starting at `offset + r * scansize`.
    #[allow(clippy::too_many_arguments)]
    pub fn get_rgb_rect(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        out: &mut [i32],
        offset: usize,
        scansize: usize,
    ) -> ImageResult<()> {
        check_rect(x, y, w, h, out.len(), offset, scansize)?;
        let mut scratch = None;
        for row in 0..h {
            let mut i = offset + row as usize * scansize;
            for col in 0..w {
                let px = self.raster.get_data_elements(x + col, y + row, scratch.take())?;
                out[i] = self.color_model.get_rgb_elements(&px)?;
                scratch = Some(px);
                i += 1;
            }
        }
        Ok(())
    }

    /// Stores a rectangle of ARGB colors laid out like [`get_rgb_rect`](Self::get_rgb_rect).
    #[allow(clippy::too_many_arguments)]
    pub fn set_rgb_rect(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        rgb: &[i32],
        offset: usize,
        scansize: usize,
    ) -> ImageResult<()> {
        check_rect(x, y, w, h, rgb.len(), offset, scansize)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut scratch = None;
        for row in 0..h {
            let mut i = offset + row as usize * scansize;
            for col in 0..w {
                let px = self.color_model.get_data_elements(rgb[i], scratch.take())?;
                self.raster.set_data_elements(x + col, y + row, &px)?;
                scratch = Some(px);
                i += 1;
            }
        }
        Ok(())
    }

    /// ARGB of a rectangle, row-major.
    pub fn get_rgb_region(&self, x: i32, y: i32, w: i32, h: i32) -> ImageResult<Vec<i32>> {
        let bounds = Rect::from_size(self.width(), self.height());
        if w < 0 || h < 0 || !bounds.contains_rect(&Rect::new(x, y, w, h)) {
            return Err(ImageError::invalid_argument(format!(
                "region {w}x{h} at ({x}, {y}) is outside the {}x{} image",
                self.width(),
                self.height()
            )));
        }
        let len = (w as usize)
            .checked_mul(h as usize)
            .ok_or_else(|| ImageError::invalid_argument(format!("region {w}x{h} is too large")))?;
        let mut out = vec![0; len];
        self.get_rgb_rect(x, y, w, h, &mut out, 0, w as usize)?;
        Ok(out)
    }

    /// Buffer over the area `(x, y, w, h)` sharing this buffer's storage.
    pub fn subimage(&self, x: i32, y: i32, w: i32, h: i32) -> ImageResult<PixelBuffer> {
        let child = self.raster.create_writable_child(x, y, w, h, 0, 0, None)?;
        Ok(Self::from_parts(Arc::clone(&self.color_model), child, self.properties.clone()))
    }

    /// Rewrites the samples to the requested premultiplication and swaps in
    /// the matching model. A no-op without alpha or when already matching.
    pub fn coerce_data(&mut self, premultiplied: bool) -> ImageResult<()> {
        if !self.color_model.has_alpha() || self.color_model.is_alpha_premultiplied() == premultiplied {
            return Ok(());
        }
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let cm = self.color_model.coerce_data(&self.raster, premultiplied)?;
        debug!(premultiplied, image_type = %self.image_type, "PixelBuffer coerced");
        self.color_model = Arc::new(cm);
        Ok(())
    }
}

// ============================================================================
// Data copies
// ============================================================================

impl PixelBuffer {
    /// Copy of the whole raster.
    pub fn data(&self) -> ImageResult<Raster> {
        let copy = self.raster.create_compatible_writable()?;
        copy.set_data_elements_from(0, 0, &self.raster)?;
        Ok(copy.into_raster())
    }

    /// Copy of `rect`, placed at the same coordinates.
    pub fn data_rect(&self, rect: Rect) -> ImageResult<Raster> {
        let source = self
            .raster
            .create_child(rect.x, rect.y, rect.width, rect.height, rect.x, rect.y, None)?;
        let sm = self.raster.sample_model().layout().create_compatible(rect.width, rect.height)?;
        let copy = WritableRaster::with_sample_model(sm, (rect.x, rect.y))?;
        copy.set_data_elements_from(0, 0, &source)?;
        Ok(copy.into_raster())
    }

    /// Copies the overlap of this image and `out` into `out`.
    pub fn copy_data(&self, out: &WritableRaster) -> ImageResult<()> {
        let Some(area) = self.raster.bounds().intersect(&out.bounds()) else {
            return Ok(());
        };
        let source = self
            .raster
            .create_child(area.x, area.y, area.width, area.height, area.x, area.y, None)?;
        out.set_data_elements_from(0, 0, &source)?;
        Ok(())
    }

    /// Copies the overlap of `src` and this image into the image.
    pub fn set_data(&self, src: &Raster) -> ImageResult<()> {
        if src.num_bands() != self.raster.num_bands() {
            return Err(ImageError::incompatible(format!(
                "source has {} bands, image has {}",
                src.num_bands(),
                self.raster.num_bands()
            )));
        }
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.raster.set_rect(0, 0, src)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_types_classify_as_themselves() {
        for ty in ImageType::CANONICAL {
            let img = PixelBuffer::new(5, 3, ty).unwrap();
            assert_eq!(img.image_type(), ty, "{ty}");
            assert_eq!(img.width(), 5);
            assert_eq!(img.height(), 3);
            assert_eq!(img.is_alpha_premultiplied(), ty.is_premultiplied());
        }
        assert!(PixelBuffer::new(1, 1, ImageType::Custom).is_err());
        assert!(PixelBuffer::new(0, 1, ImageType::IntRgb).is_err());
    }

    #[test]
    fn test_custom_layouts() {
        // RGB bytes in RGB order are not 3byte_bgr.
        let cm = srgb_component(false, false).unwrap();
        let raster = WritableRaster::create_interleaved(DataType::Byte, 2, 2, 3, (0, 0)).unwrap();
        let img = PixelBuffer::with_raster(cm, raster, false, None).unwrap();
        assert_eq!(img.image_type(), ImageType::Custom);

        // Two-band child of a four-band raster.
        let cm = srgb_component(true, false).unwrap();
        let wide = WritableRaster::create_interleaved(DataType::Byte, 4, 4, 6, (0, 0)).unwrap();
        let child = wide.create_writable_child(0, 0, 4, 4, 0, 0, Some(&[3, 2, 1, 0])).unwrap();
        let img = PixelBuffer::with_raster(cm, child, false, None).unwrap();
        assert_eq!(img.image_type(), ImageType::Custom);
    }

    #[test]
    fn test_with_raster_checks() {
        let cm = ColorModel::rgb_default();
        let bytes = WritableRaster::create_interleaved(DataType::Byte, 2, 2, 4, (0, 0)).unwrap();
        assert!(matches!(
            PixelBuffer::with_raster(cm.clone(), bytes, false, None),
            Err(ImageError::Incompatible(_))
        ));
        let moved = cm.create_compatible_writable_raster(2, 2).unwrap();
        let moved = moved.create_writable_translated_child(1, 0).unwrap();
        assert!(matches!(
            PixelBuffer::with_raster(cm, moved, false, None),
            Err(ImageError::Incompatible(_))
        ));
    }

    #[test]
    fn test_with_raster_coerces() {
        let cm = ColorModel::rgb_default();
        let raster = cm.create_compatible_writable_raster(1, 1).unwrap();
        raster.set_pixel(0, 0, &[200, 100, 50, 128]).unwrap();
        let img = PixelBuffer::with_raster(cm, raster, true, None).unwrap();
        assert!(img.is_alpha_premultiplied());
        assert_eq!(img.image_type(), ImageType::IntArgbPre);
        let mut px = [0; 4];
        img.raster().get_pixel(0, 0, &mut px).unwrap();
        assert_eq!(px, [100, 50, 25, 128]);
    }

    #[test]
    fn test_properties() {
        let mut props = HashMap::new();
        props.insert("title".to_string(), "tile".to_string());
        props.insert("author".to_string(), "x".to_string());
        let cm = ColorModel::rgb_default();
        let raster = cm.create_compatible_writable_raster(4, 4).unwrap();
        let img = PixelBuffer::with_raster(cm, raster, false, Some(&props)).unwrap();
        assert_eq!(img.property("title"), Some("tile"));
        assert_eq!(img.property("missing"), None);
        assert_eq!(img.property_names(), vec!["author", "title"]);
        let sub = img.subimage(1, 1, 2, 2).unwrap();
        assert_eq!(sub.property("author"), Some("x"));
        assert!(Arc::ptr_eq(sub.color_model(), img.color_model()));
    }

    #[test]
    fn test_rect_bounds_checked() {
        let img = PixelBuffer::new(4, 4, ImageType::IntRgb).unwrap();
        let mut out = vec![0; 7];
        assert!(img.get_rgb_rect(0, 0, 4, 2, &mut out, 0, 4).is_err());
        assert!(img.get_rgb_rect(0, 0, 4, 2, &mut out, 0, 3).is_ok());
        assert!(img.get_rgb(4, 0).is_err());
        assert!(img.set_rgb(0, -1, 0).is_err());
    }
}
