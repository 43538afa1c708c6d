//! Sample layouts: how pixel samples are addressed inside a [`DataBuffer`].
//!
//! A layout maps `(x, y, band)` in its own 0-based coordinate space to an
//! element of a bank, and packs whole pixels into [`DataElements`] transfer
//! arrays. Three closed variants are provided:
//!
//! | Variant | Storage | Transfer form |
//! |---------|---------|---------------|
//! | [`ComponentSampleModel`] | one element per sample, interleaved or banded | `num_bands` elements of the data type |
//! | [`MultiPixelPackedSampleModel`] | several 1/2/4-bit pixels per element | one element |
//! | [`SinglePixelPackedSampleModel`] | all samples as bit masks in one element | one element |
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{DataType, SampleModel};
//!
//! let sm = SampleModel::pixel_interleaved(DataType::Byte, 4, 2, 3, 12, vec![2, 1, 0]).unwrap();
//! let buf = sm.layout().create_data_buffer();
//! sm.layout().set_sample(1, 1, 0, 200, &buf).unwrap();
//! assert_eq!(buf.elem(0, 12 + 3 + 2).unwrap(), 200);
//! ```
//!
//! # Bulk operations
//!
//! [`SampleLayout`] provides per-pixel and per-rectangle accessors as default
//! methods that loop over the per-sample primitives. Variants override the
//! packed-transfer rectangle paths with direct addressing; results are
//! identical either way.

mod component;
mod multi_pixel;
mod single_pixel;

pub use component::{ComponentKind, ComponentSampleModel};
pub use multi_pixel::MultiPixelPackedSampleModel;
pub use single_pixel::SinglePixelPackedSampleModel;

use crate::elements::DataElements;
use crate::error::{Error, Result};
use crate::format::DataType;
use crate::storage::DataBuffer;

/// Operations every sample layout supports.
///
/// Coordinates are in the layout's own space: `0 <= x < width`,
/// `0 <= y < height`. Any coordinate or band outside that range fails with a
/// bounds error; nothing is clamped.
pub trait SampleLayout: std::fmt::Debug + Send + Sync {
    /// Width in pixels.
    fn width(&self) -> i32;

    /// Height in pixels.
    fn height(&self) -> i32;

    /// Number of samples per pixel.
    fn num_bands(&self) -> usize;

    /// Element type of the backing storage.
    fn data_type(&self) -> DataType;

    /// Element type of the packed transfer form.
    fn transfer_type(&self) -> DataType;

    /// Elements per pixel in the packed transfer form.
    fn num_data_elements(&self) -> usize;

    /// Bits per sample of `band`.
    fn sample_size(&self, band: usize) -> u32;

    /// Bits per sample of every band.
    fn sample_sizes(&self) -> Vec<u32> {
        (0..self.num_bands()).map(|b| self.sample_size(b)).collect()
    }

    /// Elements per bank a buffer must address to back this layout.
    fn required_size(&self) -> usize;

    /// Number of banks a buffer must have to back this layout.
    fn required_banks(&self) -> usize {
        1
    }

    /// Allocates a zeroed buffer matching this layout.
    fn create_data_buffer(&self) -> DataBuffer {
        DataBuffer::new(self.data_type(), self.required_size(), self.required_banks())
    }

    /// Sample of `band` at `(x, y)` as an integer.
    fn get_sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32>;

    /// Stores `value` into `band` at `(x, y)`.
    fn set_sample(&self, x: i32, y: i32, band: usize, value: i32, data: &DataBuffer) -> Result<()>;

    /// Sample of `band` at `(x, y)` as `f32`.
    fn get_sample_f32(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f32> {
        Ok(self.get_sample(x, y, band, data)? as f32)
    }

    /// Sample of `band` at `(x, y)` as `f64`.
    fn get_sample_f64(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f64> {
        Ok(self.get_sample(x, y, band, data)? as f64)
    }

    /// Stores `value` into `band` at `(x, y)`, truncating for integer storage.
    fn set_sample_f32(&self, x: i32, y: i32, band: usize, value: f32, data: &DataBuffer) -> Result<()> {
        self.set_sample(x, y, band, value as i32, data)
    }

    /// Stores `value` into `band` at `(x, y)`, truncating for integer storage.
    fn set_sample_f64(&self, x: i32, y: i32, band: usize, value: f64, data: &DataBuffer) -> Result<()> {
        self.set_sample(x, y, band, value as i32, data)
    }

    /// Reads one pixel in packed transfer form.
    ///
    /// `reuse` is returned filled if it has the transfer type and is long
    /// enough; otherwise a new array is allocated.
    fn get_data_elements(
        &self,
        x: i32,
        y: i32,
        reuse: Option<DataElements>,
        data: &DataBuffer,
    ) -> Result<DataElements>;

    /// Writes one pixel from packed transfer form.
    fn set_data_elements(&self, x: i32, y: i32, elems: &DataElements, data: &DataBuffer) -> Result<()>;

    /// Same packing for a new size.
    fn create_compatible(&self, width: i32, height: i32) -> Result<SampleModel>;

    /// Layout exposing only `bands`, in that order, over the same storage.
    fn create_subset(&self, bands: &[usize]) -> Result<SampleModel>;

    /// Reads a `w`x`h` rectangle in packed transfer form, row-major.
    fn get_data_elements_rect(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        reuse: Option<DataElements>,
        data: &DataBuffer,
    ) -> Result<DataElements> {
        check_rect(self, x, y, w, h)?;
        let n = self.num_data_elements();
        let mut out = DataElements::reuse(self.transfer_type(), w as usize * h as usize * n, reuse);
        let mut pixel = None;
        let mut dst = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                let px = self.get_data_elements(xx, yy, pixel.take(), data)?;
                for k in 0..n {
                    px.copy_to(k, &mut out, dst);
                    dst += 1;
                }
                pixel = Some(px);
            }
        }
        Ok(out)
    }

    /// Writes a `w`x`h` rectangle from packed transfer form, row-major.
    fn set_data_elements_rect(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        elems: &DataElements,
        data: &DataBuffer,
    ) -> Result<()> {
        check_rect(self, x, y, w, h)?;
        let n = self.num_data_elements();
        elems.require_len(w as usize * h as usize * n)?;
        let mut pixel = DataElements::new(self.transfer_type(), n);
        let mut src = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                for k in 0..n {
                    elems.copy_to(src, &mut pixel, k);
                    src += 1;
                }
                self.set_data_elements(xx, yy, &pixel, data)?;
            }
        }
        Ok(())
    }

    /// Reads all samples of one pixel into `out`.
    fn get_pixel(&self, x: i32, y: i32, out: &mut [i32], data: &DataBuffer) -> Result<()> {
        read_pixel(self, x, y, out, data)
    }

    /// Reads all samples of one pixel into `out` as `f32`.
    fn get_pixel_f32(&self, x: i32, y: i32, out: &mut [f32], data: &DataBuffer) -> Result<()> {
        read_pixel(self, x, y, out, data)
    }

    /// Reads all samples of one pixel into `out` as `f64`.
    fn get_pixel_f64(&self, x: i32, y: i32, out: &mut [f64], data: &DataBuffer) -> Result<()> {
        read_pixel(self, x, y, out, data)
    }

    /// Writes all samples of one pixel.
    fn set_pixel(&self, x: i32, y: i32, pixel: &[i32], data: &DataBuffer) -> Result<()> {
        write_pixel(self, x, y, pixel, data)
    }

    /// Writes all samples of one pixel from `f32`.
    fn set_pixel_f32(&self, x: i32, y: i32, pixel: &[f32], data: &DataBuffer) -> Result<()> {
        write_pixel(self, x, y, pixel, data)
    }

    /// Writes all samples of one pixel from `f64`.
    fn set_pixel_f64(&self, x: i32, y: i32, pixel: &[f64], data: &DataBuffer) -> Result<()> {
        write_pixel(self, x, y, pixel, data)
    }

    /// Reads a rectangle of pixels, row-major with bands interleaved.
    fn get_pixels(&self, x: i32, y: i32, w: i32, h: i32, out: &mut [i32], data: &DataBuffer) -> Result<()> {
        read_pixels(self, x, y, w, h, out, data)
    }

    /// Reads a rectangle of pixels as `f32`.
    fn get_pixels_f32(&self, x: i32, y: i32, w: i32, h: i32, out: &mut [f32], data: &DataBuffer) -> Result<()> {
        read_pixels(self, x, y, w, h, out, data)
    }

    /// Reads a rectangle of pixels as `f64`.
    fn get_pixels_f64(&self, x: i32, y: i32, w: i32, h: i32, out: &mut [f64], data: &DataBuffer) -> Result<()> {
        read_pixels(self, x, y, w, h, out, data)
    }

    /// Writes a rectangle of pixels, row-major with bands interleaved.
    fn set_pixels(&self, x: i32, y: i32, w: i32, h: i32, pixels: &[i32], data: &DataBuffer) -> Result<()> {
        write_pixels(self, x, y, w, h, pixels, data)
    }

    /// Writes a rectangle of pixels from `f32`.
    fn set_pixels_f32(&self, x: i32, y: i32, w: i32, h: i32, pixels: &[f32], data: &DataBuffer) -> Result<()> {
        write_pixels(self, x, y, w, h, pixels, data)
    }

    /// Writes a rectangle of pixels from `f64`.
    fn set_pixels_f64(&self, x: i32, y: i32, w: i32, h: i32, pixels: &[f64], data: &DataBuffer) -> Result<()> {
        write_pixels(self, x, y, w, h, pixels, data)
    }

    /// Reads one band over a rectangle, row-major.
    #[allow(clippy::too_many_arguments)]
    fn get_samples(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        band: usize,
        out: &mut [i32],
        data: &DataBuffer,
    ) -> Result<()> {
        read_samples(self, x, y, w, h, band, out, data)
    }

    /// Reads one band over a rectangle as `f32`.
    #[allow(clippy::too_many_arguments)]
    fn get_samples_f32(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        band: usize,
        out: &mut [f32],
        data: &DataBuffer,
    ) -> Result<()> {
        read_samples(self, x, y, w, h, band, out, data)
    }

    /// Reads one band over a rectangle as `f64`.
    #[allow(clippy::too_many_arguments)]
    fn get_samples_f64(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        band: usize,
        out: &mut [f64],
        data: &DataBuffer,
    ) -> Result<()> {
        read_samples(self, x, y, w, h, band, out, data)
    }

    /// Writes one band over a rectangle.
    #[allow(clippy::too_many_arguments)]
    fn set_samples(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        band: usize,
        samples: &[i32],
        data: &DataBuffer,
    ) -> Result<()> {
        write_samples(self, x, y, w, h, band, samples, data)
    }

    /// Writes one band over a rectangle from `f32`.
    #[allow(clippy::too_many_arguments)]
    fn set_samples_f32(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        band: usize,
        samples: &[f32],
        data: &DataBuffer,
    ) -> Result<()> {
        write_samples(self, x, y, w, h, band, samples, data)
    }

    /// Writes one band over a rectangle from `f64`.
    #[allow(clippy::too_many_arguments)]
    fn set_samples_f64(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        band: usize,
        samples: &[f64],
        data: &DataBuffer,
    ) -> Result<()> {
        write_samples(self, x, y, w, h, band, samples, data)
    }
}

/// A sample layout, one of the three closed variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleModel {
    /// One element per sample: interleaved, banded or general.
    Component(ComponentSampleModel),
    /// Several sub-byte pixels per element, single band.
    MultiPixelPacked(MultiPixelPackedSampleModel),
    /// All samples of a pixel packed as bit masks into one element.
    SinglePixelPacked(SinglePixelPackedSampleModel),
}

impl SampleModel {
    /// The variant as a [`SampleLayout`] trait object.
    #[inline]
    pub fn layout(&self) -> &dyn SampleLayout {
        match self {
            Self::Component(sm) => sm,
            Self::MultiPixelPacked(sm) => sm,
            Self::SinglePixelPacked(sm) => sm,
        }
    }

    /// Pixel-interleaved layout in a single bank.
    pub fn pixel_interleaved(
        data_type: DataType,
        width: i32,
        height: i32,
        pixel_stride: usize,
        scanline_stride: usize,
        band_offsets: Vec<usize>,
    ) -> Result<Self> {
        ComponentSampleModel::pixel_interleaved(
            data_type,
            width,
            height,
            pixel_stride,
            scanline_stride,
            band_offsets,
        )
        .map(Self::Component)
    }

    /// Banded layout with one bank per band and zero offsets.
    pub fn banded(data_type: DataType, width: i32, height: i32, num_bands: usize) -> Result<Self> {
        ComponentSampleModel::banded_default(data_type, width, height, num_bands).map(Self::Component)
    }

    /// Bit-packed single-band layout.
    pub fn multi_pixel_packed(data_type: DataType, width: i32, height: i32, num_bits: u32) -> Result<Self> {
        MultiPixelPackedSampleModel::new(data_type, width, height, num_bits).map(Self::MultiPixelPacked)
    }

    /// Mask-packed layout.
    pub fn single_pixel_packed(data_type: DataType, width: i32, height: i32, masks: &[u32]) -> Result<Self> {
        SinglePixelPackedSampleModel::new(data_type, width, height, masks).map(Self::SinglePixelPacked)
    }

    /// The component variant, if this is one.
    #[inline]
    pub fn as_component(&self) -> Option<&ComponentSampleModel> {
        match self {
            Self::Component(sm) => Some(sm),
            _ => None,
        }
    }

    /// The single-pixel-packed variant, if this is one.
    #[inline]
    pub fn as_single_pixel_packed(&self) -> Option<&SinglePixelPackedSampleModel> {
        match self {
            Self::SinglePixelPacked(sm) => Some(sm),
            _ => None,
        }
    }

    /// The multi-pixel-packed variant, if this is one.
    #[inline]
    pub fn as_multi_pixel_packed(&self) -> Option<&MultiPixelPackedSampleModel> {
        match self {
            Self::MultiPixelPacked(sm) => Some(sm),
            _ => None,
        }
    }
}

// ============================================================================
// Shared validation
// ============================================================================

/// Rejects non-positive sizes and sizes whose product overflows `i32`.
pub(crate) fn check_dimensions(width: i32, height: i32) -> Result<()> {
    if width <= 0 || height <= 0 {
        return Err(Error::invalid_dimensions(width, height, "width and height must be > 0"));
    }
    if width as i64 * height as i64 > i32::MAX as i64 {
        return Err(Error::invalid_dimensions(
            width,
            height,
            "width * height exceeds i32::MAX",
        ));
    }
    Ok(())
}

#[inline]
pub(crate) fn check_pixel<L: SampleLayout + ?Sized>(layout: &L, x: i32, y: i32) -> Result<()> {
    if x < 0 || y < 0 || x >= layout.width() || y >= layout.height() {
        return Err(Error::out_of_bounds(x, y));
    }
    Ok(())
}

#[inline]
pub(crate) fn check_band<L: SampleLayout + ?Sized>(layout: &L, band: usize) -> Result<()> {
    if band >= layout.num_bands() {
        return Err(Error::band_out_of_range(band, layout.num_bands()));
    }
    Ok(())
}

#[inline]
pub(crate) fn check_rect<L: SampleLayout + ?Sized>(layout: &L, x: i32, y: i32, w: i32, h: i32) -> Result<()> {
    if x < 0
        || y < 0
        || w < 0
        || h < 0
        || x as i64 + w as i64 > layout.width() as i64
        || y as i64 + h as i64 > layout.height() as i64
    {
        return Err(Error::out_of_bounds(x, y));
    }
    Ok(())
}

/// Band indices must exist in the source layout.
pub(crate) fn check_band_list(bands: &[usize], num_bands: usize) -> Result<()> {
    if bands.is_empty() {
        return Err(Error::invalid_raster("band list must not be empty"));
    }
    if bands.len() > num_bands {
        return Err(Error::invalid_raster(format!(
            "there are only {num_bands} bands"
        )));
    }
    if let Some(&b) = bands.iter().find(|&&b| b >= num_bands) {
        return Err(Error::band_out_of_range(b, num_bands));
    }
    Ok(())
}

// ============================================================================
// Per-sample fallbacks
// ============================================================================

trait Sample: Copy {
    fn read<L: SampleLayout + ?Sized>(l: &L, x: i32, y: i32, b: usize, data: &DataBuffer) -> Result<Self>;
    fn write<L: SampleLayout + ?Sized>(l: &L, x: i32, y: i32, b: usize, v: Self, data: &DataBuffer) -> Result<()>;
}

impl Sample for i32 {
    fn read<L: SampleLayout + ?Sized>(l: &L, x: i32, y: i32, b: usize, data: &DataBuffer) -> Result<Self> {
        l.get_sample(x, y, b, data)
    }
    fn write<L: SampleLayout + ?Sized>(l: &L, x: i32, y: i32, b: usize, v: Self, data: &DataBuffer) -> Result<()> {
        l.set_sample(x, y, b, v, data)
    }
}

impl Sample for f32 {
    fn read<L: SampleLayout + ?Sized>(l: &L, x: i32, y: i32, b: usize, data: &DataBuffer) -> Result<Self> {
        l.get_sample_f32(x, y, b, data)
    }
    fn write<L: SampleLayout + ?Sized>(l: &L, x: i32, y: i32, b: usize, v: Self, data: &DataBuffer) -> Result<()> {
        l.set_sample_f32(x, y, b, v, data)
    }
}

impl Sample for f64 {
    fn read<L: SampleLayout + ?Sized>(l: &L, x: i32, y: i32, b: usize, data: &DataBuffer) -> Result<Self> {
        l.get_sample_f64(x, y, b, data)
    }
    fn write<L: SampleLayout + ?Sized>(l: &L, x: i32, y: i32, b: usize, v: Self, data: &DataBuffer) -> Result<()> {
        l.set_sample_f64(x, y, b, v, data)
    }
}

fn read_pixel<L: SampleLayout + ?Sized, T: Sample>(
    l: &L,
    x: i32,
    y: i32,
    out: &mut [T],
    data: &DataBuffer,
) -> Result<()> {
    let n = l.num_bands();
    if out.len() < n {
        return Err(Error::buffer_too_small(n, out.len()));
    }
    for (b, slot) in out.iter_mut().take(n).enumerate() {
        *slot = T::read(l, x, y, b, data)?;
    }
    Ok(())
}

fn write_pixel<L: SampleLayout + ?Sized, T: Sample>(
    l: &L,
    x: i32,
    y: i32,
    pixel: &[T],
    data: &DataBuffer,
) -> Result<()> {
    let n = l.num_bands();
    if pixel.len() < n {
        return Err(Error::buffer_too_small(n, pixel.len()));
    }
    for (b, &v) in pixel.iter().take(n).enumerate() {
        T::write(l, x, y, b, v, data)?;
    }
    Ok(())
}

fn read_pixels<L: SampleLayout + ?Sized, T: Sample>(
    l: &L,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    out: &mut [T],
    data: &DataBuffer,
) -> Result<()> {
    check_rect(l, x, y, w, h)?;
    let n = l.num_bands();
    let needed = w as usize * h as usize * n;
    if out.len() < needed {
        return Err(Error::buffer_too_small(needed, out.len()));
    }
    let mut i = 0;
    for yy in y..y + h {
        for xx in x..x + w {
            for b in 0..n {
                out[i] = T::read(l, xx, yy, b, data)?;
                i += 1;
            }
        }
    }
    Ok(())
}

fn write_pixels<L: SampleLayout + ?Sized, T: Sample>(
    l: &L,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    pixels: &[T],
    data: &DataBuffer,
) -> Result<()> {
    check_rect(l, x, y, w, h)?;
    let n = l.num_bands();
    let needed = w as usize * h as usize * n;
    if pixels.len() < needed {
        return Err(Error::buffer_too_small(needed, pixels.len()));
    }
    let mut i = 0;
    for yy in y..y + h {
        for xx in x..x + w {
            for b in 0..n {
                T::write(l, xx, yy, b, pixels[i], data)?;
                i += 1;
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn read_samples<L: SampleLayout + ?Sized, T: Sample>(
    l: &L,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    band: usize,
    out: &mut [T],
    data: &DataBuffer,
) -> Result<()> {
    check_rect(l, x, y, w, h)?;
    check_band(l, band)?;
    let needed = w as usize * h as usize;
    if out.len() < needed {
        return Err(Error::buffer_too_small(needed, out.len()));
    }
    let mut i = 0;
    for yy in y..y + h {
        for xx in x..x + w {
            out[i] = T::read(l, xx, yy, band, data)?;
            i += 1;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_samples<L: SampleLayout + ?Sized, T: Sample>(
    l: &L,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    band: usize,
    samples: &[T],
    data: &DataBuffer,
) -> Result<()> {
    check_rect(l, x, y, w, h)?;
    check_band(l, band)?;
    let needed = w as usize * h as usize;
    if samples.len() < needed {
        return Err(Error::buffer_too_small(needed, samples.len()));
    }
    let mut i = 0;
    for yy in y..y + h {
        for xx in x..x + w {
            T::write(l, xx, yy, band, samples[i], data)?;
            i += 1;
        }
    }
    Ok(())
}
