//! Expanding palette images to packed ARGB.

use raster_color::{ColorModel, DirectColorModel, IndexColorModel, Transparency};
use raster_core::{DataElements, DataType, Raster};
use tracing::trace;

use crate::buffer::PixelBuffer;
use crate::error::{ImageError, ImageResult};

/// Palette-to-int expansion for [`IndexColorModel`].
pub trait ConvertToIntDiscrete {
    /// Expands every index of `raster` to its palette color.
    ///
    /// The output is `IntArgb` when `force_argb` is set or the palette is
    /// translucent, a 25-bit RGB plus 1-bit alpha packing for bitmask
    /// palettes, and `IntRgb` otherwise.
    fn convert_to_int_discrete(&self, raster: &Raster, force_argb: bool) -> ImageResult<PixelBuffer>;
}

impl ConvertToIntDiscrete for IndexColorModel {
    fn convert_to_int_discrete(&self, raster: &Raster, force_argb: bool) -> ImageResult<PixelBuffer> {
        if !self.is_compatible_raster(raster) {
            return Err(ImageError::incompatible(
                "raster is not compatible with this palette model",
            ));
        }
        let transparency = self.transparency();
        let cm: ColorModel = if force_argb || transparency == Transparency::Translucent {
            ColorModel::rgb_default()
        } else if transparency == Transparency::Bitmask {
            DirectColorModel::with_alpha(25, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0x0100_0000)?.into()
        } else {
            DirectColorModel::new(24, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff)?.into()
        };
        let (w, h) = (raster.width(), raster.height());
        trace!(w, h, force_argb, ?transparency, "convert_to_int_discrete");

        let out = cm.create_compatible_writable_raster(w, h)?;
        let mut indices = None;
        let mut argb = DataElements::new(DataType::Int, w as usize);
        for y in 0..h {
            let row = raster.get_data_elements_rect(raster.min_x(), raster.min_y() + y, w, 1, indices.take())?;
            for x in 0..w as usize {
                argb.set_i32(x, self.get_rgb(row.get_i32(x))?);
            }
            out.set_data_elements_rect(0, y, w, 1, &argb)?;
            indices = Some(row);
        }
        PixelBuffer::with_raster(cm, out, false, None)
    }
}
