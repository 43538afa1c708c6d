//! Mask-packed layout: every sample of a pixel lives in one element.

use super::{SampleLayout, SampleModel, check_band, check_band_list, check_dimensions, check_pixel, check_rect};
use crate::elements::DataElements;
use crate::error::{Error, Result};
use crate::format::DataType;
use crate::storage::DataBuffer;

/// Layout storing each pixel as one element with one bit field per band.
///
/// # Example
///
/// ```rust
/// use raster_core::{DataType, SampleLayout, SinglePixelPackedSampleModel};
///
/// let sm = SinglePixelPackedSampleModel::new(DataType::UShort, 4, 4, &[0xf800, 0x07e0, 0x001f]).unwrap();
/// assert_eq!(sm.bit_offsets(), &[11, 5, 0]);
/// assert_eq!(sm.sample_sizes(), vec![5, 6, 5]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinglePixelPackedSampleModel {
    data_type: DataType,
    width: i32,
    height: i32,
    scanline_stride: usize,
    bit_masks: Vec<u32>,
    bit_offsets: Vec<u32>,
    bit_sizes: Vec<u32>,
}

impl SinglePixelPackedSampleModel {
    /// Rows of `width` elements.
    pub fn new(data_type: DataType, width: i32, height: i32, masks: &[u32]) -> Result<Self> {
        Self::with_stride(data_type, width, height, width.max(0) as usize, masks)
    }

    /// Rows of `scanline_stride` elements.
    pub fn with_stride(
        data_type: DataType,
        width: i32,
        height: i32,
        scanline_stride: usize,
        masks: &[u32],
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        if !data_type.is_packable() {
            return Err(Error::unsupported(data_type, "single-pixel packing"));
        }
        if masks.is_empty() {
            return Err(Error::invalid_argument("at least one bit mask is required"));
        }
        let limit = u32::MAX >> (32 - data_type.size());
        let mut bit_offsets = Vec::with_capacity(masks.len());
        let mut bit_sizes = Vec::with_capacity(masks.len());
        for &mask in masks {
            if mask == 0 {
                return Err(Error::invalid_argument("bit masks must be non-zero"));
            }
            if mask & !limit != 0 {
                return Err(Error::invalid_argument(format!(
                    "mask {mask:#x} does not fit in {} bits",
                    data_type.size()
                )));
            }
            let offset = mask.trailing_zeros();
            let size = mask.count_ones();
            if (mask >> offset).trailing_ones() != size {
                return Err(Error::invalid_argument(format!("mask {mask:#x} must be contiguous")));
            }
            bit_offsets.push(offset);
            bit_sizes.push(size);
        }
        Ok(Self {
            data_type,
            width,
            height,
            scanline_stride,
            bit_masks: masks.to_vec(),
            bit_offsets,
            bit_sizes,
        })
    }

    /// Per-band bit masks.
    #[inline]
    pub fn bit_masks(&self) -> &[u32] {
        &self.bit_masks
    }

    /// Per-band shift of the lowest mask bit.
    #[inline]
    pub fn bit_offsets(&self) -> &[u32] {
        &self.bit_offsets
    }

    /// Elements per row.
    #[inline]
    pub fn scanline_stride(&self) -> usize {
        self.scanline_stride
    }

    /// Element index of pixel `(x, y)`.
    #[inline]
    pub fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.scanline_stride + x as usize
    }

    #[inline]
    fn extract(&self, element: i32, band: usize) -> i32 {
        ((element as u32 & self.bit_masks[band]) >> self.bit_offsets[band]) as i32
    }
}

impl SampleLayout for SinglePixelPackedSampleModel {
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
        self.bit_masks.len()
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
        1
    }

    #[inline]
    fn sample_size(&self, band: usize) -> u32 {
        self.bit_sizes.get(band).copied().unwrap_or(0)
    }

    fn required_size(&self) -> usize {
        self.scanline_stride * (self.height as usize - 1) + self.width as usize
    }

    fn get_sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let element = data.elem(0, self.offset(x, y))?;
        Ok(self.extract(element, band))
    }

    fn set_sample(&self, x: i32, y: i32, band: usize, value: i32, data: &DataBuffer) -> Result<()> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let i = self.offset(x, y);
        let mask = self.bit_masks[band];
        let mut banks = data.write();
        let element = banks.elem(0, i)? as u32;
        let packed = (element & !mask) | (((value as u32) << self.bit_offsets[band]) & mask);
        banks.set_elem(0, i, packed as i32)
    }

    fn get_data_elements(
        &self,
        x: i32,
        y: i32,
        reuse: Option<DataElements>,
        data: &DataBuffer,
    ) -> Result<DataElements> {
        check_pixel(self, x, y)?;
        let mut out = DataElements::reuse(self.data_type, 1, reuse);
        data.read().load(0, self.offset(x, y), &mut out, 0)?;
        Ok(out)
    }

    fn set_data_elements(&self, x: i32, y: i32, elems: &DataElements, data: &DataBuffer) -> Result<()> {
        check_pixel(self, x, y)?;
        elems.require_type(self.data_type)?;
        elems.require_len(1)?;
        data.write().store(0, self.offset(x, y), elems, 0)
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
        let mut out = DataElements::reuse(self.data_type, w as usize * h as usize, reuse);
        let banks = data.read();
        let mut dst = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                banks.load(0, self.offset(xx, yy), &mut out, dst)?;
                dst += 1;
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
        elems.require_type(self.data_type)?;
        elems.require_len(w as usize * h as usize)?;
        let mut banks = data.write();
        let mut src = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                banks.store(0, self.offset(xx, yy), elems, src)?;
                src += 1;
            }
        }
        Ok(())
    }

    fn get_pixels(&self, x: i32, y: i32, w: i32, h: i32, out: &mut [i32], data: &DataBuffer) -> Result<()> {
        check_rect(self, x, y, w, h)?;
        let n = self.num_bands();
        let needed = w as usize * h as usize * n;
        if out.len() < needed {
            return Err(Error::buffer_too_small(needed, out.len()));
        }
        let banks = data.read();
        let mut i = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                let element = banks.elem(0, self.offset(xx, yy))?;
                for band in 0..n {
                    out[i] = self.extract(element, band);
                    i += 1;
                }
            }
        }
        Ok(())
    }

    fn create_compatible(&self, width: i32, height: i32) -> Result<SampleModel> {
        Self::new(self.data_type, width, height, &self.bit_masks).map(SampleModel::SinglePixelPacked)
    }

    fn create_subset(&self, bands: &[usize]) -> Result<SampleModel> {
        check_band_list(bands, self.num_bands())?;
        let masks: Vec<u32> = bands.iter().map(|&b| self.bit_masks[b]).collect();
        Self::with_stride(self.data_type, self.width, self.height, self.scanline_stride, &masks)
            .map(SampleModel::SinglePixelPacked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argb(w: i32, h: i32) -> SinglePixelPackedSampleModel {
        SinglePixelPackedSampleModel::new(DataType::Int, w, h, &[0xff0000, 0xff00, 0xff, 0xff00_0000]).unwrap()
    }

    #[test]
    fn test_mask_extraction() {
        let sm = argb(2, 2);
        let buf = sm.create_data_buffer();
        buf.set_elem(0, 3, 0x8012_3456u32 as i32).unwrap();
        let mut px = [0; 4];
        sm.get_pixel(1, 1, &mut px, &buf).unwrap();
        assert_eq!(px, [0x12, 0x34, 0x56, 0x80]);
    }

    #[test]
    fn test_set_sample_preserves_other_bits() {
        let sm = argb(1, 1);
        let buf = sm.create_data_buffer();
        buf.set_elem(0, 0, 0x1122_3344).unwrap();
        sm.set_sample(0, 0, 1, 0x1ff, &buf).unwrap();
        assert_eq!(buf.elem(0, 0).unwrap(), 0x1122_ff44);
    }

    #[test]
    fn test_rejects_bad_masks() {
        assert!(SinglePixelPackedSampleModel::new(DataType::Int, 2, 2, &[0xf0f]).is_err());
        assert!(SinglePixelPackedSampleModel::new(DataType::Int, 2, 2, &[0xff, 0]).is_err());
        assert!(SinglePixelPackedSampleModel::new(DataType::Byte, 2, 2, &[0x1e0]).is_err());
        assert!(SinglePixelPackedSampleModel::new(DataType::Short, 2, 2, &[0xff]).is_err());
    }

    #[test]
    fn test_buffer_size_with_stride() {
        let sm = SinglePixelPackedSampleModel::with_stride(DataType::UShort, 3, 4, 5, &[0xf00, 0xf0, 0xf]).unwrap();
        assert_eq!(sm.required_size(), 18);
    }

    #[test]
    fn test_subset_picks_masks() {
        let sm = argb(2, 1);
        let SampleModel::SinglePixelPacked(sub) = sm.create_subset(&[2, 0]).unwrap() else {
            panic!("expected single-pixel packed layout");
        };
        assert_eq!(sub.bit_masks(), &[0xff, 0xff0000]);
        assert_eq!(sub.bit_offsets(), &[0, 16]);
    }

    #[test]
    fn test_get_pixels_override_matches_samples() {
        let sm = SinglePixelPackedSampleModel::new(DataType::UShort, 3, 2, &[0xf800, 0x07e0, 0x001f]).unwrap();
        let buf = sm.create_data_buffer();
        for i in 0..6 {
            buf.set_elem(0, i, (i as i32 * 7919) & 0xffff).unwrap();
        }
        let mut fast = vec![0; 18];
        sm.get_pixels(0, 0, 3, 2, &mut fast, &buf).unwrap();
        let mut slow = Vec::new();
        for y in 0..2 {
            for x in 0..3 {
                for b in 0..3 {
                    slow.push(sm.get_sample(x, y, b, &buf).unwrap());
                }
            }
        }
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_data_elements_round_trip() {
        let sm = argb(2, 2);
        let buf = sm.create_data_buffer();
        let px = DataElements::Int(vec![0x7f00_ff00]);
        sm.set_data_elements(1, 0, &px, &buf).unwrap();
        assert_eq!(sm.get_data_elements(1, 0, None, &buf).unwrap(), px);
        assert_eq!(sm.get_sample(1, 0, 3, &buf).unwrap(), 0x7f);
    }
}
