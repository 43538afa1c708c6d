//! Bit-packed single-band layout: 1, 2, 4 (or 8/16/32) bits per pixel.
//!
//! Pixels are stored MSB-first inside each element. For pixel `x` the bit
//! number is `data_bit_offset + x * num_bits`, and
//!
//! ```text
//! element = y * scanline_stride + bitnum / element_bits
//! shift   = element_bits - (bitnum % element_bits) - num_bits
//! ```

use super::{SampleLayout, SampleModel, check_band, check_dimensions, check_pixel, check_rect};
use crate::elements::DataElements;
use crate::error::{Error, Result};
use crate::format::DataType;
use crate::storage::DataBuffer;

/// Single-band layout packing several pixels into one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPixelPackedSampleModel {
    data_type: DataType,
    width: i32,
    height: i32,
    num_bits: u32,
    element_bits: u32,
    scanline_stride: usize,
    data_bit_offset: usize,
    transfer_type: DataType,
}

impl MultiPixelPackedSampleModel {
    /// Tightly packed rows starting at bit 0.
    pub fn new(data_type: DataType, width: i32, height: i32, num_bits: u32) -> Result<Self> {
        let element_bits = data_type.size() as usize;
        let stride = (width.max(0) as usize * num_bits as usize).div_ceil(element_bits);
        Self::with_layout(data_type, width, height, num_bits, stride, 0)
    }

    /// Packed rows with an explicit scanline stride (in elements) and a bit
    /// offset of the first pixel.
    pub fn with_layout(
        data_type: DataType,
        width: i32,
        height: i32,
        num_bits: u32,
        scanline_stride: usize,
        data_bit_offset: usize,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        if !data_type.is_packable() {
            return Err(Error::unsupported(data_type, "multi-pixel packing"));
        }
        let element_bits = data_type.size();
        if num_bits == 0 || element_bits % num_bits != 0 {
            return Err(Error::invalid_raster(format!(
                "{num_bits}-bit pixels would span {element_bits}-bit element boundaries"
            )));
        }
        if data_bit_offset % num_bits as usize != 0 {
            return Err(Error::invalid_raster(format!(
                "data bit offset {data_bit_offset} is not a multiple of {num_bits}"
            )));
        }
        let transfer_type = match num_bits {
            0..=8 => DataType::Byte,
            9..=16 => DataType::UShort,
            _ => DataType::Int,
        };
        Ok(Self {
            data_type,
            width,
            height,
            num_bits,
            element_bits,
            scanline_stride,
            data_bit_offset,
            transfer_type,
        })
    }

    /// Bits per pixel.
    #[inline]
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// Elements per row.
    #[inline]
    pub fn scanline_stride(&self) -> usize {
        self.scanline_stride
    }

    /// Bit offset of the first pixel of every row.
    #[inline]
    pub fn data_bit_offset(&self) -> usize {
        self.data_bit_offset
    }

    /// Index of the element holding pixel `(x, y)`.
    #[inline]
    pub fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.scanline_stride + self.bit_number(x) / self.element_bits as usize
    }

    /// Bit position of pixel `x` inside its element, counted from the MSB.
    #[inline]
    pub fn bit_offset(&self, x: i32) -> usize {
        self.bit_number(x) % self.element_bits as usize
    }

    #[inline]
    fn bit_number(&self, x: i32) -> usize {
        self.data_bit_offset + x as usize * self.num_bits as usize
    }

    #[inline]
    fn mask(&self) -> u32 {
        u32::MAX >> (32 - self.num_bits)
    }

    #[inline]
    fn shift(&self, x: i32) -> u32 {
        self.element_bits - self.bit_offset(x) as u32 - self.num_bits
    }

    #[inline]
    fn extract(&self, element: i32, x: i32) -> i32 {
        ((element as u32 >> self.shift(x)) & self.mask()) as i32
    }

    #[inline]
    fn insert(&self, element: i32, x: i32, value: i32) -> i32 {
        let shift = self.shift(x);
        let mask = self.mask() << shift;
        ((element as u32 & !mask) | ((value as u32 & self.mask()) << shift)) as i32
    }
}

impl SampleLayout for MultiPixelPackedSampleModel {
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
        1
    }

    #[inline]
    fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    fn transfer_type(&self) -> DataType {
        self.transfer_type
    }

    #[inline]
    fn num_data_elements(&self) -> usize {
        1
    }

    #[inline]
    fn sample_size(&self, _band: usize) -> u32 {
        self.num_bits
    }

    fn required_size(&self) -> usize {
        self.scanline_stride * self.height as usize + self.data_bit_offset.div_ceil(self.element_bits as usize)
    }

    fn get_sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let element = data.elem(0, self.offset(x, y))?;
        Ok(self.extract(element, x))
    }

    fn set_sample(&self, x: i32, y: i32, band: usize, value: i32, data: &DataBuffer) -> Result<()> {
        check_pixel(self, x, y)?;
        check_band(self, band)?;
        let i = self.offset(x, y);
        let mut banks = data.write();
        let element = banks.elem(0, i)?;
        banks.set_elem(0, i, self.insert(element, x, value))
    }

    fn get_data_elements(
        &self,
        x: i32,
        y: i32,
        reuse: Option<DataElements>,
        data: &DataBuffer,
    ) -> Result<DataElements> {
        check_pixel(self, x, y)?;
        let mut out = DataElements::reuse(self.transfer_type, 1, reuse);
        let element = data.elem(0, self.offset(x, y))?;
        out.set_i32(0, self.extract(element, x));
        Ok(out)
    }

    fn set_data_elements(&self, x: i32, y: i32, elems: &DataElements, data: &DataBuffer) -> Result<()> {
        elems.require_type(self.transfer_type)?;
        elems.require_len(1)?;
        self.set_sample(x, y, 0, elems.get_i32(0), data)
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
        let mut out = DataElements::reuse(self.transfer_type, w as usize * h as usize, reuse);
        let banks = data.read();
        let mut dst = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                let element = banks.elem(0, self.offset(xx, yy))?;
                out.set_i32(dst, self.extract(element, xx));
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
        elems.require_type(self.transfer_type)?;
        elems.require_len(w as usize * h as usize)?;
        let mut banks = data.write();
        let mut src = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                let i = self.offset(xx, yy);
                let element = banks.elem(0, i)?;
                banks.set_elem(0, i, self.insert(element, xx, elems.get_i32(src)))?;
                src += 1;
            }
        }
        Ok(())
    }

    fn create_compatible(&self, width: i32, height: i32) -> Result<SampleModel> {
        Self::new(self.data_type, width, height, self.num_bits).map(SampleModel::MultiPixelPacked)
    }

    fn create_subset(&self, bands: &[usize]) -> Result<SampleModel> {
        if bands != [0] {
            return Err(Error::invalid_raster("multi-pixel packed layouts have only one band"));
        }
        Ok(SampleModel::MultiPixelPacked(self.clone()))
    }
}
