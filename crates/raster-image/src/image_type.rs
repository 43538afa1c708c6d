//! Canonical pixel layouts.

use std::fmt;

/// Tag naming the layout of a [`PixelBuffer`](crate::PixelBuffer).
///
/// Every variant except [`ImageType::Custom`] is one fixed combination of
/// color model and raster layout; anything else is `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// Any layout without a canonical tag.
    Custom,
    /// 8-bit RGB packed into an int, `0x00RRGGBB`.
    IntRgb,
    /// 8-bit ARGB packed into an int.
    IntArgb,
    /// 8-bit premultiplied ARGB packed into an int.
    IntArgbPre,
    /// 8-bit BGR packed into an int, `0x00BBGGRR`.
    IntBgr,
    /// Three interleaved bytes per pixel, blue first.
    ThreeByteBgr,
    /// Four interleaved bytes per pixel, alpha first then blue.
    FourByteAbgr,
    /// Like [`ImageType::FourByteAbgr`] with premultiplied color.
    FourByteAbgrPre,
    /// 5-6-5 RGB in a ushort.
    UShort565Rgb,
    /// 5-5-5 RGB in a ushort.
    UShort555Rgb,
    /// One byte of linear gray.
    ByteGray,
    /// One ushort of linear gray.
    UShortGray,
    /// 1-bit black and white palette.
    ByteBinary,
    /// 8-bit index into the default palette.
    ByteIndexed,
}

impl ImageType {
    /// All canonical tags, without [`ImageType::Custom`].
    pub const CANONICAL: [ImageType; 13] = [
        ImageType::IntRgb,
        ImageType::IntArgb,
        ImageType::IntArgbPre,
        ImageType::IntBgr,
        ImageType::ThreeByteBgr,
        ImageType::FourByteAbgr,
        ImageType::FourByteAbgrPre,
        ImageType::UShort565Rgb,
        ImageType::UShort555Rgb,
        ImageType::ByteGray,
        ImageType::UShortGray,
        ImageType::ByteBinary,
        ImageType::ByteIndexed,
    ];

    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            ImageType::Custom => "custom",
            ImageType::IntRgb => "int_rgb",
            ImageType::IntArgb => "int_argb",
            ImageType::IntArgbPre => "int_argb_pre",
            ImageType::IntBgr => "int_bgr",
            ImageType::ThreeByteBgr => "3byte_bgr",
            ImageType::FourByteAbgr => "4byte_abgr",
            ImageType::FourByteAbgrPre => "4byte_abgr_pre",
            ImageType::UShort565Rgb => "ushort_565_rgb",
            ImageType::UShort555Rgb => "ushort_555_rgb",
            ImageType::ByteGray => "byte_gray",
            ImageType::UShortGray => "ushort_gray",
            ImageType::ByteBinary => "byte_binary",
            ImageType::ByteIndexed => "byte_indexed",
        }
    }

    /// Whether pixels of this layout carry premultiplied color.
    #[inline]
    pub fn is_premultiplied(self) -> bool {
        matches!(self, ImageType::IntArgbPre | ImageType::FourByteAbgrPre)
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
