//! Pixel regions: a rectangle of the plane backed by a layout and storage.
//!
//! A [`Raster`] places a [`SampleModel`] at `(min_x, min_y)` and reads pixels
//! from an aliasing [`DataBuffer`]. A [`WritableRaster`] adds the setters.
//!
//! # Coordinates
//!
//! Accessors take external coordinates. Each call checks them against the
//! region bounds, subtracts the sample-model translate and delegates to the
//! layout:
//!
//! ```text
//! internal = external - sample_model_translate
//! ```
//!
//! Children created with [`Raster::create_child`] share the parent's buffer
//! and adjust the translate, so a write through either is visible to both.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{DataType, WritableRaster};
//!
//! let parent = WritableRaster::create_interleaved(DataType::Byte, 8, 8, 3, (0, 0)).unwrap();
//! let child = parent.create_writable_child(2, 2, 4, 4, 0, 0, None).unwrap();
//! child.set_sample(0, 0, 1, 99).unwrap();
//! assert_eq!(parent.get_sample(2, 2, 1).unwrap(), 99);
//! ```

use std::ops::Deref;
use std::sync::{Arc, Weak};

use crate::elements::DataElements;
use crate::error::{Error, Result};
use crate::format::DataType;
use crate::layout::{SampleLayout, SampleModel};
use crate::rect::Rect;
use crate::storage::DataBuffer;

#[derive(Debug)]
struct RasterInner {
    bounds: Rect,
    translate_x: i32,
    translate_y: i32,
    sample_model: Arc<SampleModel>,
    data: DataBuffer,
    parent: Option<Weak<RasterInner>>,
}

/// Read-only pixel region.
///
/// Cloning is cheap and yields another handle to the same region.
#[derive(Debug, Clone)]
pub struct Raster {
    inner: Arc<RasterInner>,
}

/// Pixel region with write access.
///
/// Dereferences to [`Raster`] for every read operation.
#[derive(Debug, Clone)]
pub struct WritableRaster {
    raster: Raster,
}

impl Deref for WritableRaster {
    type Target = Raster;

    #[inline]
    fn deref(&self) -> &Raster {
        &self.raster
    }
}

// ============================================================================
// Construction
// ============================================================================

impl Raster {
    /// Places `sample_model` at `origin` over `data`.
    pub fn new(sample_model: SampleModel, data: DataBuffer, origin: (i32, i32)) -> Result<Self> {
        let layout = sample_model.layout();
        let bounds = Rect::new(origin.0, origin.1, layout.width(), layout.height());
        Self::build(Arc::new(sample_model), data, bounds, origin, None)
    }

    fn build(
        sample_model: Arc<SampleModel>,
        data: DataBuffer,
        bounds: Rect,
        translate: (i32, i32),
        parent: Option<Weak<RasterInner>>,
    ) -> Result<Self> {
        if bounds.width <= 0 || bounds.height <= 0 {
            return Err(Error::invalid_raster(format!(
                "non-positive size {}x{}",
                bounds.width, bounds.height
            )));
        }
        if bounds.right() > i32::MAX as i64 || bounds.bottom() > i32::MAX as i64 {
            return Err(Error::invalid_raster(format!("bounds {bounds} overflow")));
        }
        let layout = sample_model.layout();
        if data.data_type() != layout.data_type() {
            return Err(Error::TypeMismatch {
                expected: layout.data_type(),
                got: data.data_type(),
            });
        }
        if data.num_banks() < layout.required_banks() {
            return Err(Error::invalid_raster(format!(
                "layout needs {} banks, buffer has {}",
                layout.required_banks(),
                data.num_banks()
            )));
        }
        if data.size() < layout.required_size() {
            return Err(Error::invalid_raster(format!(
                "layout needs {} elements per bank, buffer has {}",
                layout.required_size(),
                data.size()
            )));
        }
        Ok(Self {
            inner: Arc::new(RasterInner {
                bounds,
                translate_x: translate.0,
                translate_y: translate.1,
                sample_model,
                data,
                parent,
            }),
        })
    }

    /// Sub-region sharing this region's storage.
    ///
    /// `(parent_x, parent_y, width, height)` selects the area in this region's
    /// coordinates; the child places it at `(child_min_x, child_min_y)`. With
    /// `bands`, the child exposes only those bands in that order.
    #[allow(clippy::too_many_arguments)]
    pub fn create_child(
        &self,
        parent_x: i32,
        parent_y: i32,
        width: i32,
        height: i32,
        child_min_x: i32,
        child_min_y: i32,
        bands: Option<&[usize]>,
    ) -> Result<Raster> {
        let b = self.bounds();
        if parent_x < b.x {
            return Err(Error::invalid_raster("parent_x lies outside raster"));
        }
        if parent_y < b.y {
            return Err(Error::invalid_raster("parent_y lies outside raster"));
        }
        if parent_x as i64 + width as i64 > b.right() {
            return Err(Error::invalid_raster("(parent_x + width) is outside raster"));
        }
        if parent_y as i64 + height as i64 > b.bottom() {
            return Err(Error::invalid_raster("(parent_y + height) is outside raster"));
        }
        let sample_model = match bands {
            Some(list) => Arc::new(self.layout().create_subset(list)?),
            None => Arc::clone(&self.inner.sample_model),
        };
        let tx = self.inner.translate_x as i64 + child_min_x as i64 - parent_x as i64;
        let ty = self.inner.translate_y as i64 + child_min_y as i64 - parent_y as i64;
        let (Ok(tx), Ok(ty)) = (i32::try_from(tx), i32::try_from(ty)) else {
            return Err(Error::invalid_raster("child translation overflows"));
        };
        Self::build(
            sample_model,
            self.inner.data.clone(),
            Rect::new(child_min_x, child_min_y, width, height),
            (tx, ty),
            Some(Arc::downgrade(&self.inner)),
        )
    }

    /// Same area and bands, moved to `(child_min_x, child_min_y)`.
    pub fn create_translated_child(&self, child_min_x: i32, child_min_y: i32) -> Result<Raster> {
        let b = self.bounds();
        self.create_child(b.x, b.y, b.width, b.height, child_min_x, child_min_y, None)
    }

    /// Zeroed region with the same layout and size at the origin.
    pub fn create_compatible_writable(&self) -> Result<WritableRaster> {
        self.create_compatible_writable_sized(self.width(), self.height())
    }

    /// Zeroed region with the same layout at the origin, sized `width`x`height`.
    pub fn create_compatible_writable_sized(&self, width: i32, height: i32) -> Result<WritableRaster> {
        let sm = self.layout().create_compatible(width, height)?;
        WritableRaster::with_sample_model(sm, (0, 0))
    }
}

// ============================================================================
// Read access
// ============================================================================

impl Raster {
    /// Left edge.
    #[inline]
    pub fn min_x(&self) -> i32 {
        self.inner.bounds.x
    }

    /// Top edge.
    #[inline]
    pub fn min_y(&self) -> i32 {
        self.inner.bounds.y
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> i32 {
        self.inner.bounds.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> i32 {
        self.inner.bounds.height
    }

    /// Bounding rectangle.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.inner.bounds
    }

    /// Translation from layout space to region space.
    #[inline]
    pub fn sample_model_translate(&self) -> (i32, i32) {
        (self.inner.translate_x, self.inner.translate_y)
    }

    /// The layout.
    #[inline]
    pub fn sample_model(&self) -> &SampleModel {
        &self.inner.sample_model
    }

    /// Shared handle to the layout.
    #[inline]
    pub fn sample_model_arc(&self) -> Arc<SampleModel> {
        Arc::clone(&self.inner.sample_model)
    }

    #[inline]
    fn layout(&self) -> &dyn SampleLayout {
        self.inner.sample_model.layout()
    }

    /// The storage, aliased with every related region.
    #[inline]
    pub fn data_buffer(&self) -> &DataBuffer {
        &self.inner.data
    }

    /// The region this one was created from, if it is still alive.
    pub fn parent(&self) -> Option<Raster> {
        let inner = self.inner.parent.as_ref()?.upgrade()?;
        Some(Raster { inner })
    }

    /// Number of bands.
    #[inline]
    pub fn num_bands(&self) -> usize {
        self.layout().num_bands()
    }

    /// Elements per pixel in packed transfer form.
    #[inline]
    pub fn num_data_elements(&self) -> usize {
        self.layout().num_data_elements()
    }

    /// Element type of the packed transfer form.
    #[inline]
    pub fn transfer_type(&self) -> DataType {
        self.layout().transfer_type()
    }

    /// Element type of the storage.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.layout().data_type()
    }

    /// Returns `true` if both handles refer to the same region.
    #[inline]
    pub fn ptr_eq(&self, other: &Raster) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[inline]
    fn to_internal(&self, x: i32, y: i32) -> Result<(i32, i32)> {
        if !self.inner.bounds.contains(x, y) {
            return Err(Error::out_of_bounds(x, y));
        }
        Ok((x - self.inner.translate_x, y - self.inner.translate_y))
    }

    #[inline]
    fn rect_to_internal(&self, x: i32, y: i32, w: i32, h: i32) -> Result<(i32, i32)> {
        if w < 0 || h < 0 || !self.inner.bounds.contains_rect(&Rect::new(x, y, w, h)) {
            return Err(Error::out_of_bounds(x, y));
        }
        Ok((x - self.inner.translate_x, y - self.inner.translate_y))
    }

    /// Sample of `band` at `(x, y)`.
    pub fn get_sample(&self, x: i32, y: i32, band: usize) -> Result<i32> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().get_sample(ix, iy, band, &self.inner.data)
    }

    /// Sample of `band` at `(x, y)` as `f32`.
    pub fn get_sample_f32(&self, x: i32, y: i32, band: usize) -> Result<f32> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().get_sample_f32(ix, iy, band, &self.inner.data)
    }

    /// Sample of `band` at `(x, y)` as `f64`.
    pub fn get_sample_f64(&self, x: i32, y: i32, band: usize) -> Result<f64> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().get_sample_f64(ix, iy, band, &self.inner.data)
    }

    /// All samples of the pixel at `(x, y)`.
    pub fn get_pixel(&self, x: i32, y: i32, out: &mut [i32]) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().get_pixel(ix, iy, out, &self.inner.data)
    }

    /// All samples of the pixel at `(x, y)` as `f32`.
    pub fn get_pixel_f32(&self, x: i32, y: i32, out: &mut [f32]) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().get_pixel_f32(ix, iy, out, &self.inner.data)
    }

    /// All samples of the pixel at `(x, y)` as `f64`.
    pub fn get_pixel_f64(&self, x: i32, y: i32, out: &mut [f64]) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().get_pixel_f64(ix, iy, out, &self.inner.data)
    }

    /// Pixels of a rectangle, row-major, bands interleaved.
    pub fn get_pixels(&self, x: i32, y: i32, w: i32, h: i32, out: &mut [i32]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().get_pixels(ix, iy, w, h, out, &self.inner.data)
    }

    /// Pixels of a rectangle as `f32`.
    pub fn get_pixels_f32(&self, x: i32, y: i32, w: i32, h: i32, out: &mut [f32]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().get_pixels_f32(ix, iy, w, h, out, &self.inner.data)
    }

    /// Pixels of a rectangle as `f64`.
    pub fn get_pixels_f64(&self, x: i32, y: i32, w: i32, h: i32, out: &mut [f64]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().get_pixels_f64(ix, iy, w, h, out, &self.inner.data)
    }

    /// One band over a rectangle, row-major.
    pub fn get_samples(&self, x: i32, y: i32, w: i32, h: i32, band: usize, out: &mut [i32]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().get_samples(ix, iy, w, h, band, out, &self.inner.data)
    }

    /// One band over a rectangle as `f32`.
    pub fn get_samples_f32(&self, x: i32, y: i32, w: i32, h: i32, band: usize, out: &mut [f32]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().get_samples_f32(ix, iy, w, h, band, out, &self.inner.data)
    }

    /// One band over a rectangle as `f64`.
    pub fn get_samples_f64(&self, x: i32, y: i32, w: i32, h: i32, band: usize, out: &mut [f64]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().get_samples_f64(ix, iy, w, h, band, out, &self.inner.data)
    }

    /// One pixel in packed transfer form.
    pub fn get_data_elements(&self, x: i32, y: i32, reuse: Option<DataElements>) -> Result<DataElements> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().get_data_elements(ix, iy, reuse, &self.inner.data)
    }

    /// A rectangle in packed transfer form, row-major.
    pub fn get_data_elements_rect(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        reuse: Option<DataElements>,
    ) -> Result<DataElements> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().get_data_elements_rect(ix, iy, w, h, reuse, &self.inner.data)
    }
}

// ============================================================================
// Writable regions
// ============================================================================

impl WritableRaster {
    /// Places `sample_model` at `origin` over `data`.
    pub fn new(sample_model: SampleModel, data: DataBuffer, origin: (i32, i32)) -> Result<Self> {
        Raster::new(sample_model, data, origin).map(|raster| Self { raster })
    }

    /// Places `sample_model` at `origin` over a new zeroed buffer.
    pub fn with_sample_model(sample_model: SampleModel, origin: (i32, i32)) -> Result<Self> {
        let data = sample_model.layout().create_data_buffer();
        Self::new(sample_model, data, origin)
    }

    /// Pixel-interleaved region with band `i` at offset `i`.
    pub fn create_interleaved(
        data_type: DataType,
        width: i32,
        height: i32,
        bands: usize,
        origin: (i32, i32),
    ) -> Result<Self> {
        let scanline = (width.max(0) as usize).saturating_mul(bands);
        Self::create_interleaved_with(data_type, width, height, scanline, bands, (0..bands).collect(), origin)
    }

    /// Pixel-interleaved region with explicit strides and band offsets.
    #[allow(clippy::too_many_arguments)]
    pub fn create_interleaved_with(
        data_type: DataType,
        width: i32,
        height: i32,
        scanline_stride: usize,
        pixel_stride: usize,
        band_offsets: Vec<usize>,
        origin: (i32, i32),
    ) -> Result<Self> {
        let sm = SampleModel::pixel_interleaved(data_type, width, height, pixel_stride, scanline_stride, band_offsets)?;
        Self::with_sample_model(sm, origin)
    }

    /// Banded region, one bank per band.
    pub fn create_banded(
        data_type: DataType,
        width: i32,
        height: i32,
        bands: usize,
        origin: (i32, i32),
    ) -> Result<Self> {
        Self::with_sample_model(SampleModel::banded(data_type, width, height, bands)?, origin)
    }

    /// Mask-packed region.
    pub fn create_packed(
        data_type: DataType,
        width: i32,
        height: i32,
        masks: &[u32],
        origin: (i32, i32),
    ) -> Result<Self> {
        Self::with_sample_model(SampleModel::single_pixel_packed(data_type, width, height, masks)?, origin)
    }

    /// Packed region of `bands` fields of `bits_per_band` bits each.
    ///
    /// A single band uses bit packing across pixels; several bands are packed
    /// into one element per pixel with band 0 in the highest bits.
    pub fn create_packed_bits(
        data_type: DataType,
        width: i32,
        height: i32,
        bands: usize,
        bits_per_band: u32,
        origin: (i32, i32),
    ) -> Result<Self> {
        if bands == 0 || bits_per_band == 0 {
            return Err(Error::invalid_argument("bands and bits per band must be > 0"));
        }
        if bands as u64 * bits_per_band as u64 > data_type.size() as u64 {
            return Err(Error::invalid_argument(format!(
                "{bands} bands of {bits_per_band} bits exceed {} bits per element",
                data_type.size()
            )));
        }
        let sm = if bands == 1 {
            SampleModel::multi_pixel_packed(data_type, width, height, bits_per_band)?
        } else {
            let field = u32::MAX >> (32 - bits_per_band);
            let masks: Vec<u32> = (0..bands)
                .map(|i| field << ((bands - 1 - i) as u32 * bits_per_band))
                .collect();
            SampleModel::single_pixel_packed(data_type, width, height, &masks)?
        };
        Self::with_sample_model(sm, origin)
    }

    /// Read-only handle to the same region.
    #[inline]
    pub fn as_raster(&self) -> &Raster {
        &self.raster
    }

    /// Converts into a read-only handle.
    #[inline]
    pub fn into_raster(self) -> Raster {
        self.raster
    }

    /// The region this one was created from, with write access.
    pub fn writable_parent(&self) -> Option<WritableRaster> {
        self.raster.parent().map(|raster| Self { raster })
    }

    /// Writable sub-region sharing this region's storage.
    #[allow(clippy::too_many_arguments)]
    pub fn create_writable_child(
        &self,
        parent_x: i32,
        parent_y: i32,
        width: i32,
        height: i32,
        child_min_x: i32,
        child_min_y: i32,
        bands: Option<&[usize]>,
    ) -> Result<WritableRaster> {
        self.raster
            .create_child(parent_x, parent_y, width, height, child_min_x, child_min_y, bands)
            .map(|raster| Self { raster })
    }

    /// Same area and bands, moved to `(child_min_x, child_min_y)`.
    pub fn create_writable_translated_child(&self, child_min_x: i32, child_min_y: i32) -> Result<WritableRaster> {
        self.raster
            .create_translated_child(child_min_x, child_min_y)
            .map(|raster| Self { raster })
    }

    /// Stores `value` into `band` at `(x, y)`.
    pub fn set_sample(&self, x: i32, y: i32, band: usize, value: i32) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().set_sample(ix, iy, band, value, self.data_buffer())
    }

    /// Stores `value` into `band` at `(x, y)`.
    pub fn set_sample_f32(&self, x: i32, y: i32, band: usize, value: f32) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().set_sample_f32(ix, iy, band, value, self.data_buffer())
    }

    /// Stores `value` into `band` at `(x, y)`.
    pub fn set_sample_f64(&self, x: i32, y: i32, band: usize, value: f64) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().set_sample_f64(ix, iy, band, value, self.data_buffer())
    }

    /// Writes all samples of the pixel at `(x, y)`.
    pub fn set_pixel(&self, x: i32, y: i32, pixel: &[i32]) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().set_pixel(ix, iy, pixel, self.data_buffer())
    }

    /// Writes all samples of the pixel at `(x, y)` from `f32`.
    pub fn set_pixel_f32(&self, x: i32, y: i32, pixel: &[f32]) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().set_pixel_f32(ix, iy, pixel, self.data_buffer())
    }

    /// Writes all samples of the pixel at `(x, y)` from `f64`.
    pub fn set_pixel_f64(&self, x: i32, y: i32, pixel: &[f64]) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().set_pixel_f64(ix, iy, pixel, self.data_buffer())
    }

    /// Writes a rectangle of pixels, row-major, bands interleaved.
    pub fn set_pixels(&self, x: i32, y: i32, w: i32, h: i32, pixels: &[i32]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().set_pixels(ix, iy, w, h, pixels, self.data_buffer())
    }

    /// Writes a rectangle of pixels from `f32`.
    pub fn set_pixels_f32(&self, x: i32, y: i32, w: i32, h: i32, pixels: &[f32]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().set_pixels_f32(ix, iy, w, h, pixels, self.data_buffer())
    }

    /// Writes a rectangle of pixels from `f64`.
    pub fn set_pixels_f64(&self, x: i32, y: i32, w: i32, h: i32, pixels: &[f64]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().set_pixels_f64(ix, iy, w, h, pixels, self.data_buffer())
    }

    /// Writes one band over a rectangle.
    pub fn set_samples(&self, x: i32, y: i32, w: i32, h: i32, band: usize, samples: &[i32]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().set_samples(ix, iy, w, h, band, samples, self.data_buffer())
    }

    /// Writes one band over a rectangle from `f32`.
    pub fn set_samples_f32(&self, x: i32, y: i32, w: i32, h: i32, band: usize, samples: &[f32]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().set_samples_f32(ix, iy, w, h, band, samples, self.data_buffer())
    }

    /// Writes one band over a rectangle from `f64`.
    pub fn set_samples_f64(&self, x: i32, y: i32, w: i32, h: i32, band: usize, samples: &[f64]) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().set_samples_f64(ix, iy, w, h, band, samples, self.data_buffer())
    }

    /// Writes one pixel from packed transfer form.
    pub fn set_data_elements(&self, x: i32, y: i32, elems: &DataElements) -> Result<()> {
        let (ix, iy) = self.to_internal(x, y)?;
        self.layout().set_data_elements(ix, iy, elems, self.data_buffer())
    }

    /// Writes a rectangle from packed transfer form.
    pub fn set_data_elements_rect(&self, x: i32, y: i32, w: i32, h: i32, elems: &DataElements) -> Result<()> {
        let (ix, iy) = self.rect_to_internal(x, y, w, h)?;
        self.layout().set_data_elements_rect(ix, iy, w, h, elems, self.data_buffer())
    }

    /// Copies all of `src` in packed form, placing its origin at
    /// `(x + src.min_x, y + src.min_y)`.
    ///
    /// The whole source must fit inside this region.
    pub fn set_data_elements_from(&self, x: i32, y: i32, src: &Raster) -> Result<()> {
        let dst_x = x as i64 + src.min_x() as i64;
        let dst_y = y as i64 + src.min_y() as i64;
        let b = self.bounds();
        if dst_x < b.x as i64
            || dst_y < b.y as i64
            || dst_x + src.width() as i64 > b.right()
            || dst_y + src.height() as i64 > b.bottom()
        {
            return Err(Error::out_of_bounds(dst_x as i32, dst_y as i32));
        }
        let (dst_x, dst_y) = (dst_x as i32, dst_y as i32);
        let mut row = None;
        for dy in 0..src.height() {
            let data = src.get_data_elements_rect(src.min_x(), src.min_y() + dy, src.width(), 1, row.take())?;
            self.set_data_elements_rect(dst_x, dst_y + dy, src.width(), 1, &data)?;
            row = Some(data);
        }
        Ok(())
    }

    /// Copies the part of `src` that lands inside this region after
    /// offsetting it by `(dx, dy)`.
    ///
    /// Rows travel as `i32` samples for integer sources and as `f32`/`f64`
    /// for float sources. Nothing is written when the regions do not overlap.
    pub fn set_rect(&self, dx: i32, dy: i32, src: &Raster) -> Result<()> {
        let placed = Rect::new(
            (dx as i64 + src.min_x() as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            (dy as i64 + src.min_y() as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            src.width(),
            src.height(),
        );
        let Some(area) = self.bounds().intersect(&placed) else {
            return Ok(());
        };
        let src_x = (area.x as i64 - dx as i64) as i32;
        let src_y = (area.y as i64 - dy as i64) as i32;
        let w = area.width;
        let n = w as usize * src.num_bands();

        match src.data_type() {
            DataType::Float => {
                let mut row = vec![0f32; n];
                for r in 0..area.height {
                    src.get_pixels_f32(src_x, src_y + r, w, 1, &mut row)?;
                    self.set_pixels_f32(area.x, area.y + r, w, 1, &row)?;
                }
            }
            DataType::Double => {
                let mut row = vec![0f64; n];
                for r in 0..area.height {
                    src.get_pixels_f64(src_x, src_y + r, w, 1, &mut row)?;
                    self.set_pixels_f64(area.x, area.y + r, w, 1, &row)?;
                }
            }
            _ => {
                let mut row = vec![0i32; n];
                for r in 0..area.height {
                    src.get_pixels(src_x, src_y + r, w, 1, &mut row)?;
                    self.set_pixels(area.x, area.y + r, w, 1, &row)?;
                }
            }
        }
        Ok(())
    }
}

impl From<WritableRaster> for Raster {
    fn from(w: WritableRaster) -> Self {
        w.raster
    }
}
