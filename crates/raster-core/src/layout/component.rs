//! One element per sample: interleaved, banded and general component layouts.

use super::{
    SampleLayout, SampleModel, check_band, check_band_list, check_dimensions, check_pixel, check_rect,
};
use crate::elements::DataElements;
use crate::error::{Error, Result};
use crate::format::DataType;
use crate::storage::DataBuffer;

/// Which constructor family produced a [`ComponentSampleModel`].
///
/// The kind decides how compatible and subset layouts are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Arbitrary strides and banks.
    Generic,
    /// All bands in one bank, pixel stride covering the band offsets.
    PixelInterleaved,
    /// Pixel stride 1, typically one bank per band.
    Banded,
}

/// Layout storing each sample in its own element.
///
/// Sample `b` of pixel `(x, y)` is element
/// `y * scanline_stride + x * pixel_stride + band_offsets[b]` of bank
/// `bank_indices[b]`.
///
/// # Example
///
/// ```rust
/// use raster_core::{ComponentSampleModel, DataType, SampleLayout};
///
/// // BGR byte triplets
/// let sm = ComponentSampleModel::pixel_interleaved(DataType::Byte, 2, 2, 3, 6, vec![2, 1, 0]).unwrap();
/// assert_eq!(sm.num_data_elements(), 3);
/// assert_eq!(sm.required_size(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSampleModel {
    kind: ComponentKind,
    data_type: DataType,
    width: i32,
    height: i32,
    pixel_stride: usize,
    scanline_stride: usize,
    band_offsets: Vec<usize>,
    bank_indices: Vec<usize>,
    num_banks: usize,
}

impl ComponentSampleModel {
    /// General component layout.
    pub fn new(
        data_type: DataType,
        width: i32,
        height: i32,
        pixel_stride: usize,
        scanline_stride: usize,
        bank_indices: Vec<usize>,
        band_offsets: Vec<usize>,
    ) -> Result<Self> {
        Self::build(
            ComponentKind::Generic,
            data_type,
            width,
            height,
            pixel_stride,
            scanline_stride,
            bank_indices,
            band_offsets,
        )
    }

    /// Pixel-interleaved layout: one bank, bands at `band_offsets` within
    /// each pixel.
    ///
    /// The band offsets must span no more than the pixel stride, and a row
    /// of pixels must fit in the scanline stride.
    pub fn pixel_interleaved(
        data_type: DataType,
        width: i32,
        height: i32,
        pixel_stride: usize,
        scanline_stride: usize,
        band_offsets: Vec<usize>,
    ) -> Result<Self> {
        let min = band_offsets.iter().copied().min().unwrap_or(0);
        let max = band_offsets.iter().copied().max().unwrap_or(0);
        if max - min > scanline_stride {
            return Err(Error::invalid_argument(
                "offsets between bands must be less than the scanline stride",
            ));
        }
        if pixel_stride.saturating_mul(width.max(0) as usize) > scanline_stride {
            return Err(Error::invalid_argument(
                "pixel stride times width must not exceed the scanline stride",
            ));
        }
        if pixel_stride < max - min {
            return Err(Error::invalid_argument(
                "pixel stride must be at least the span of the band offsets",
            ));
        }
        let banks = vec![0; band_offsets.len()];
        Self::build(
            ComponentKind::PixelInterleaved,
            data_type,
            width,
            height,
            pixel_stride,
            scanline_stride,
            banks,
            band_offsets,
        )
    }

    /// Banded layout with pixel stride 1.
    pub fn banded(
        data_type: DataType,
        width: i32,
        height: i32,
        scanline_stride: usize,
        bank_indices: Vec<usize>,
        band_offsets: Vec<usize>,
    ) -> Result<Self> {
        Self::build(
            ComponentKind::Banded,
            data_type,
            width,
            height,
            1,
            scanline_stride,
            bank_indices,
            band_offsets,
        )
    }

    /// Banded layout with band `i` in bank `i` at offset 0.
    pub fn banded_default(data_type: DataType, width: i32, height: i32, num_bands: usize) -> Result<Self> {
        Self::banded(
            data_type,
            width,
            height,
            width.max(0) as usize,
            (0..num_bands).collect(),
            vec![0; num_bands],
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        kind: ComponentKind,
        data_type: DataType,
        width: i32,
        height: i32,
        pixel_stride: usize,
        scanline_stride: usize,
        bank_indices: Vec<usize>,
        band_offsets: Vec<usize>,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        if band_offsets.is_empty() {
            return Err(Error::invalid_argument("number of bands must be > 0"));
        }
        if bank_indices.len() != band_offsets.len() {
            return Err(Error::invalid_argument(
                "length of band offsets must equal length of bank indices",
            ));
        }
        let num_banks = bank_indices.iter().copied().max().unwrap_or(0) + 1;
        Ok(Self {
            kind,
            data_type,
            width,
            height,
            pixel_stride,
            scanline_stride,
            band_offsets,
            bank_indices,
            num_banks,
        })
    }

    /// Constructor family.
    #[inline]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Elements between horizontally adjacent samples of one band.
    #[inline]
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// Elements between vertically adjacent samples of one band.
    #[inline]
    pub fn scanline_stride(&self) -> usize {
        self.scanline_stride
    }

    /// Per-band offset of the first sample.
    #[inline]
    pub fn band_offsets(&self) -> &[usize] {
        &self.band_offsets
    }

    /// Per-band bank index.
    #[inline]
    pub fn bank_indices(&self) -> &[usize] {
        &self.bank_indices
    }

    /// Number of banks addressed.
    #[inline]
    pub fn num_banks(&self) -> usize {
        self.num_banks
    }

    #[inline]
    fn address(&self, x: i32, y: i32, band: usize) -> (usize, usize) {
        (
            self.bank_indices[band],
            y as usize * self.scanline_stride + x as usize * self.pixel_stride + self.band_offsets[band],
        )
    }

    fn compatible_interleaved(&self, width: i32, height: i32) -> Result<SampleModel> {
        let min = self.band_offsets.iter().copied().min().unwrap_or(0);
        let offsets = self.band_offsets.iter().map(|&o| o - min).collect();
        Self::pixel_interleaved(
            self.data_type,
            width,
            height,
            self.pixel_stride,
            self.pixel_stride * width.max(0) as usize,
            offsets,
        )
        .map(SampleModel::Component)
    }

    fn compatible_banded(&self, width: i32, height: i32) -> Result<SampleModel> {
        let plane = width.max(0) as usize * height.max(0) as usize;
        let offsets = if self.num_banks == 1 {
            order_bands(&self.band_offsets, plane)
        } else {
            vec![0; self.band_offsets.len()]
        };
        Self::banded(
            self.data_type,
            width,
            height,
            width.max(0) as usize,
            self.bank_indices.clone(),
            offsets,
        )
        .map(SampleModel::Component)
    }

    /// Keeps the relative order of the three strides and packs them tightly.
    fn compatible_generic(&self, width: i32, height: i32) -> Result<SampleModel> {
        let w = width.max(0) as usize;
        let h = height.max(0) as usize;
        let bands = self.band_offsets.len();
        let min = self.band_offsets.iter().copied().min().unwrap_or(0);
        let band_span = self.band_offsets.iter().copied().max().unwrap_or(0) - min;
        let mut p_stride = self.pixel_stride;
        let mut l_stride = self.scanline_stride;
        let packed = || self.band_offsets.iter().map(|&o| o - min).collect::<Vec<_>>();

        let offsets = if p_stride > l_stride {
            if p_stride > band_span {
                if l_stride > band_span {
                    // pixel > line > band
                    l_stride = band_span + 1;
                    p_stride = l_stride * h;
                    packed()
                } else {
                    // pixel > band > line
                    let offs = order_bands(&self.band_offsets, l_stride * h);
                    p_stride = bands * l_stride * h;
                    offs
                }
            } else {
                // band > pixel > line
                p_stride = l_stride * h;
                order_bands(&self.band_offsets, p_stride * w)
            }
        } else if p_stride > band_span {
            // line > pixel > band
            p_stride = band_span + 1;
            l_stride = p_stride * w;
            packed()
        } else if l_stride > band_span {
            // line > band > pixel
            let offs = order_bands(&self.band_offsets, p_stride * w);
            l_stride = bands * p_stride * w;
            offs
        } else {
            // band > line > pixel
            l_stride = p_stride * w;
            order_bands(&self.band_offsets, l_stride * h)
        };

        Self::new(
            self.data_type,
            width,
            height,
            p_stride,
            l_stride,
            self.bank_indices.clone(),
            offsets,
        )
        .map(SampleModel::Component)
    }
}

/// Assigns `0, step, 2*step, ...` to bands in ascending order of their
/// original offsets.
fn order_bands(orig: &[usize], step: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..orig.len()).collect();
    order.sort_by_key(|&i| orig[i]);
    let mut out = vec![0; orig.len()];
    for (rank, &band) in order.iter().enumerate() {
        out[band] = rank * step;
    }
    out
}

impl SampleLayout for ComponentSampleModel {
    #[inline]
    fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn num_bands(&self) -> usize {
        self.band_offsets.len()
    }

    #[inline]
    fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    fn transfer_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    fn num_data_elements(&self) -> usize {
        self.band_offsets.len()
    }

    #[inline]
    fn sample_size(&self, _band: usize) -> u32 {
        self.data_type.size()
    }

    fn required_size(&self) -> usize {
        let max_band = self.band_offsets.iter().copied().max().unwrap_or(0);
        max_band
            + 1
            + self.pixel_stride * (self.width as usize - 1)
            + self.scanline_stride * (self.height as usize - 1)
    }

    fn required_banks(&self) -> usize {
        self.num_banks
    }

    fn get_sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let (bank, i) = self.address(x, y, band);
        data.elem(bank, i)
    }

    fn set_sample(&self, x: i32, y: i32, band: usize, value: i32, data: &DataBuffer) -> Result<()> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let (bank, i) = self.address(x, y, band);
        data.set_elem(bank, i, value)
    }

    fn get_sample_f32(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f32> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let (bank, i) = self.address(x, y, band);
        data.elem_f32(bank, i)
    }

    fn get_sample_f64(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f64> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let (bank, i) = self.address(x, y, band);
        data.elem_f64(bank, i)
    }

    fn set_sample_f32(&self, x: i32, y: i32, band: usize, value: f32, data: &DataBuffer) -> Result<()> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let (bank, i) = self.address(x, y, band);
        data.set_elem_f32(bank, i, value)
    }

    fn set_sample_f64(&self, x: i32, y: i32, band: usize, value: f64, data: &DataBuffer) -> Result<()> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let (bank, i) = self.address(x, y, band);
        data.set_elem_f64(bank, i, value)
    }

    fn get_data_elements(
        &self,
        x: i32,
        y: i32,
        reuse: Option<DataElements>,
        data: &DataBuffer,
    ) -> Result<DataElements> {
        check_pixel(self, x, y)?;
        let mut out = DataElements::reuse(self.data_type, self.num_bands(), reuse);
        let banks = data.read();
        for band in 0..self.num_bands() {
            let (bank, i) = self.address(x, y, band);
            banks.load(bank, i, &mut out, band)?;
        }
        Ok(out)
    }

    fn set_data_elements(&self, x: i32, y: i32, elems: &DataElements, data: &DataBuffer) -> Result<()> {
        check_pixel(self, x, y)?;
        elems.require_type(self.data_type)?;
        elems.require_len(self.num_bands())?;
        let mut banks = data.write();
        for band in 0..self.num_bands() {
            let (bank, i) = self.address(x, y, band);
            banks.store(bank, i, elems, band)?;
        }
        Ok(())
    }

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
        let n = self.num_bands();
        let mut out = DataElements::reuse(self.data_type, w as usize * h as usize * n, reuse);
        let banks = data.read();
        let mut dst = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                for band in 0..n {
                    let (bank, i) = self.address(xx, yy, band);
                    banks.load(bank, i, &mut out, dst)?;
                    dst += 1;
                }
            }
        }
        Ok(out)
    }

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
        let n = self.num_bands();
        elems.require_type(self.data_type)?;
        elems.require_len(w as usize * h as usize * n)?;
        let mut banks = data.write();
        let mut src = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                for band in 0..n {
                    let (bank, i) = self.address(xx, yy, band);
                    banks.store(bank, i, elems, src)?;
                    src += 1;
                }
            }
        }
        Ok(())
    }

    fn create_compatible(&self, width: i32, height: i32) -> Result<SampleModel> {
        match self.kind {
            ComponentKind::PixelInterleaved => self.compatible_interleaved(width, height),
            ComponentKind::Banded => self.compatible_banded(width, height),
            ComponentKind::Generic => self.compatible_generic(width, height),
        }
    }

    fn create_subset(&self, bands: &[usize]) -> Result<SampleModel> {
        check_band_list(bands, self.num_bands())?;
        let offsets: Vec<usize> = bands.iter().map(|&b| self.band_offsets[b]).collect();
        let banks: Vec<usize> = bands.iter().map(|&b| self.bank_indices[b]).collect();
        let sm = match self.kind {
            ComponentKind::PixelInterleaved => Self::pixel_interleaved(
                self.data_type,
                self.width,
                self.height,
                self.pixel_stride,
                self.scanline_stride,
                offsets,
            )?,
            ComponentKind::Banded => Self::banded(
                self.data_type,
                self.width,
                self.height,
                self.scanline_stride,
                banks,
                offsets,
            )?,
            ComponentKind::Generic => Self::new(
                self.data_type,
                self.width,
                self.height,
                self.pixel_stride,
                self.scanline_stride,
                banks,
                offsets,
            )?,
        };
        Ok(SampleModel::Component(sm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bgr(w: i32, h: i32) -> ComponentSampleModel {
        ComponentSampleModel::pixel_interleaved(DataType::Byte, w, h, 3, 3 * w as usize, vec![2, 1, 0]).unwrap()
    }

    #[test]
    fn test_interleaved_addressing() {
        let sm = bgr(4, 3);
        let buf = sm.create_data_buffer();
        assert_eq!(buf.size(), 36);
        sm.set_pixel(1, 2, &[10, 20, 30], &buf).unwrap();
        let base = 2 * 12 + 3;
        assert_eq!(buf.elem(0, base).unwrap(), 30);
        assert_eq!(buf.elem(0, base + 1).unwrap(), 20);
        assert_eq!(buf.elem(0, base + 2).unwrap(), 10);
    }

    #[test]
    fn test_interleaved_validation() {
        assert!(ComponentSampleModel::pixel_interleaved(DataType::Byte, 4, 1, 1, 8, vec![0, 1, 2]).is_err());
        assert!(ComponentSampleModel::pixel_interleaved(DataType::Byte, 4, 1, 3, 8, vec![0, 1, 2]).is_err());
        assert!(ComponentSampleModel::new(DataType::Byte, 4, 1, 1, 4, vec![0], vec![0, 1]).is_err());
        assert!(ComponentSampleModel::new(DataType::Byte, 0, 1, 1, 4, vec![0], vec![0]).is_err());
    }

    #[test]
    fn test_banded_addressing() {
        let sm = ComponentSampleModel::banded_default(DataType::UShort, 3, 2, 3).unwrap();
        let buf = sm.create_data_buffer();
        assert_eq!(buf.num_banks(), 3);
        assert_eq!(buf.size(), 6);
        sm.set_pixel(2, 1, &[100, 200, 300], &buf).unwrap();
        assert_eq!(buf.elem(0, 5).unwrap(), 100);
        assert_eq!(buf.elem(1, 5).unwrap(), 200);
        assert_eq!(buf.elem(2, 5).unwrap(), 300);
    }

    #[test]
    fn test_subset_reorders_bands() {
        let sm = ComponentSampleModel::pixel_interleaved(DataType::Byte, 2, 1, 3, 6, vec![0, 1, 2]).unwrap();
        let buf = sm.create_data_buffer();
        sm.set_pixel(0, 0, &[1, 2, 3], &buf).unwrap();
        sm.set_pixel(1, 0, &[4, 5, 6], &buf).unwrap();

        let sub = sm.create_subset(&[2, 0]).unwrap();
        let sub = sub.layout();
        assert_eq!(sub.num_bands(), 2);
        let mut px = [0; 2];
        sub.get_pixel(0, 0, &mut px, &buf).unwrap();
        assert_eq!(px, [3, 1]);
        sub.get_pixel(1, 0, &mut px, &buf).unwrap();
        assert_eq!(px, [6, 4]);

        sub.set_sample(1, 0, 0, 60, &buf).unwrap();
        assert_eq!(sm.get_sample(1, 0, 2, &buf).unwrap(), 60);
    }

    #[test]
    fn test_subset_rejects_bad_band() {
        let sm = bgr(2, 2);
        assert!(sm.create_subset(&[3]).unwrap_err().is_bounds_error());
        assert!(sm.create_subset(&[0, 1, 2, 0]).unwrap_err().is_raster_error());
    }

    #[test]
    fn test_compatible_interleaved_normalizes_offsets() {
        let sm = ComponentSampleModel::pixel_interleaved(DataType::Byte, 2, 2, 4, 8, vec![3, 2, 1]).unwrap();
        let SampleModel::Component(c) = sm.create_compatible(5, 7).unwrap() else {
            panic!("expected component layout");
        };
        assert_eq!(c.band_offsets(), &[2, 1, 0]);
        assert_eq!(c.pixel_stride(), 4);
        assert_eq!(c.scanline_stride(), 20);
        assert_eq!(c.kind(), ComponentKind::PixelInterleaved);
    }

    #[test]
    fn test_compatible_banded_single_bank() {
        let sm = ComponentSampleModel::banded(DataType::Byte, 2, 2, 2, vec![0, 0], vec![4, 0]).unwrap();
        let SampleModel::Component(c) = sm.create_compatible(3, 3).unwrap() else {
            panic!("expected component layout");
        };
        assert_eq!(c.band_offsets(), &[9, 0]);
        assert_eq!(c.scanline_stride(), 3);
    }

    #[test]
    fn test_compatible_generic_line_pixel_band() {
        let sm = ComponentSampleModel::new(DataType::Int, 4, 4, 3, 12, vec![0, 0, 0], vec![0, 1, 2]).unwrap();
        let SampleModel::Component(c) = sm.create_compatible(2, 2).unwrap() else {
            panic!("expected component layout");
        };
        assert_eq!(c.pixel_stride(), 3);
        assert_eq!(c.scanline_stride(), 6);
        assert_eq!(c.band_offsets(), &[0, 1, 2]);
    }

    #[test]
    fn test_float_samples_keep_fraction() {
        let sm = ComponentSampleModel::banded_default(DataType::Float, 2, 2, 1).unwrap();
        let buf = sm.create_data_buffer();
        sm.set_sample_f32(1, 1, 0, 0.75, &buf).unwrap();
        assert_eq!(sm.get_sample_f32(1, 1, 0, &buf).unwrap(), 0.75);
        assert_eq!(sm.get_sample(1, 1, 0, &buf).unwrap(), 0);
    }

    #[test]
    fn test_data_elements_rect_matches_per_pixel() {
        let sm = bgr(3, 2);
        let buf = sm.create_data_buffer();
        let values: Vec<i32> = (0..18).collect();
        sm.set_pixels(0, 0, 3, 2, &values, &buf).unwrap();
        let rect = sm.get_data_elements_rect(1, 0, 2, 2, None, &buf).unwrap();
        let mut expected = Vec::new();
        for y in 0..2 {
            for x in 1..3 {
                let px = sm.get_data_elements(x, y, None, &buf).unwrap();
                expected.extend(px.to_i32_vec());
            }
        }
        assert_eq!(rect.to_i32_vec(), expected);
    }

    #[test]
    fn test_set_data_elements_type_checked() {
        let sm = bgr(1, 1);
        let buf = sm.create_data_buffer();
        let wrong = DataElements::Int(vec![1, 2, 3]);
        assert!(matches!(
            sm.set_data_elements(0, 0, &wrong, &buf),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_out_of_bounds() {
        let sm = bgr(2, 2);
        let buf = sm.create_data_buffer();
        assert!(sm.get_sample(2, 0, 0, &buf).unwrap_err().is_bounds_error());
        assert!(sm.get_sample(0, -1, 0, &buf).unwrap_err().is_bounds_error());
        assert!(sm.get_sample(0, 0, 3, &buf).unwrap_err().is_bounds_error());
    }
}
