//! Pixel buffer behavior over shared storage.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use raster_image::prelude::*;

fn pixel(raster: &Raster, x: i32, y: i32) -> Vec<i32> {
    let mut out = vec![0; raster.num_bands()];
    raster.get_pixel(x, y, &mut out).unwrap();
    out
}

// ============================================================================
// Aliasing
// ============================================================================

#[test]
fn test_subimage_shares_storage() {
    let img = PixelBuffer::new(6, 4, ImageType::IntArgb).unwrap();
    let sub = img.subimage(2, 1, 3, 2).unwrap();
    assert_eq!((sub.width(), sub.height()), (3, 2));

    sub.set_rgb(0, 0, 0x7f11_2233).unwrap();
    assert_eq!(img.get_rgb(2, 1).unwrap(), 0x7f11_2233);

    img.set_rgb(4, 2, 0xff44_5566u32 as i32).unwrap();
    assert_eq!(sub.get_rgb(2, 1).unwrap() as u32, 0xff44_5566);

    assert!(sub.get_rgb(3, 0).is_err());
    assert!(img.subimage(4, 0, 3, 1).is_err());
}

#[test]
fn test_child_raster_writes_reach_parent() {
    let parent = WritableRaster::create_interleaved(DataType::Byte, 4, 4, 3, (0, 0)).unwrap();
    let child = parent.create_writable_child(1, 1, 2, 2, 10, 20, None).unwrap();
    assert_eq!((child.min_x(), child.min_y()), (10, 20));

    child.set_pixel(11, 21, &[7, 8, 9]).unwrap();
    assert_eq!(pixel(&parent, 2, 2), vec![7, 8, 9]);

    parent.set_pixel(1, 1, &[1, 2, 3]).unwrap();
    assert_eq!(pixel(&child, 10, 20), vec![1, 2, 3]);
    assert!(child.parent().is_some());
}

#[test]
fn test_band_subset_child() {
    let parent = WritableRaster::create_interleaved(DataType::Byte, 2, 2, 3, (0, 0)).unwrap();
    parent.set_pixel(0, 0, &[1, 2, 3]).unwrap();
    let child = parent.create_writable_child(0, 0, 2, 2, 0, 0, Some(&[2, 0])).unwrap();
    assert_eq!(child.num_bands(), 2);
    assert_eq!(pixel(&child, 0, 0), vec![3, 1]);

    child.set_pixel(0, 0, &[9, 8]).unwrap();
    assert_eq!(pixel(&parent, 0, 0), vec![8, 2, 9]);
}

// ============================================================================
// Layouts
// ============================================================================

#[test]
fn test_int_rgb_layout() {
    let img = PixelBuffer::new(2, 2, ImageType::IntRgb).unwrap();
    img.set_rgb(1, 0, 0x00ff_8000).unwrap();
    assert_eq!(pixel(img.raster(), 1, 0), vec![255, 128, 0]);
    // No alpha: reads come back opaque.
    assert_eq!(img.get_rgb(1, 0).unwrap() as u32, 0xffff_8000);
    assert_eq!(img.transparency(), Transparency::Opaque);
    assert!(img.alpha_raster().unwrap().is_none());
}

#[test]
fn test_ushort_565_layout() {
    let img = PixelBuffer::new(1, 1, ImageType::UShort565Rgb).unwrap();
    img.set_rgb(0, 0, 0xffff_ffffu32 as i32).unwrap();
    assert_eq!(pixel(img.raster(), 0, 0), vec![31, 63, 31]);
    assert_eq!(img.get_rgb(0, 0).unwrap() as u32, 0xffff_ffff);
}

#[test]
fn test_float_component_samples() {
    let cm: ColorModel = ComponentColorModel::with_defaults(ColorSpace::srgb(), true, false, DataType::Float)
        .unwrap()
        .into();
    let raster = cm.create_compatible_writable_raster(1, 1).unwrap();
    let img = PixelBuffer::with_raster(cm, raster, false, None).unwrap();
    assert_eq!(img.image_type(), ImageType::Custom);

    img.set_rgb(0, 0, 0x80ff_8000u32 as i32).unwrap();
    let mut px = [0f32; 4];
    img.raster().get_pixel_f32(0, 0, &mut px).unwrap();
    assert_relative_eq!(px[0], 1.0);
    assert_relative_eq!(px[1], 128.0 / 255.0, epsilon = 1e-6);
    assert_relative_eq!(px[2], 0.0);
    assert_relative_eq!(px[3], 128.0 / 255.0, epsilon = 1e-6);
}

#[test]
fn test_byte_binary_white_is_index_one() {
    let img = PixelBuffer::new(9, 1, ImageType::ByteBinary).unwrap();
    assert_eq!(img.get_rgb(0, 0).unwrap() as u32, 0xff00_0000);
    img.set_rgb(8, 0, 0xffff_ffffu32 as i32).unwrap();
    assert_eq!(img.raster().get_sample(8, 0, 0).unwrap(), 1);
    assert_eq!(img.get_rgb(8, 0).unwrap() as u32, 0xffff_ffff);
    img.set_rgb(8, 0, 0xff20_2020u32 as i32).unwrap();
    assert_eq!(img.raster().get_sample(8, 0, 0).unwrap(), 0);
}

#[test]
fn test_alpha_raster_views_alpha_band() {
    let img = PixelBuffer::new(2, 2, ImageType::FourByteAbgr).unwrap();
    img.set_rgb(1, 1, 0x40ff_ffff).unwrap();
    let alpha = img.alpha_raster().unwrap().unwrap();
    assert_eq!(alpha.num_bands(), 1);
    assert_eq!(alpha.get_sample(1, 1, 0).unwrap(), 0x40);
    alpha.set_sample(0, 0, 0, 0x99).unwrap();
    assert_eq!(img.get_rgb(0, 0).unwrap() as u32 >> 24, 0x99);
}

// ============================================================================
// Premultiplication
// ============================================================================

fn fill_random(img: &PixelBuffer, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for y in 0..img.height() {
        for x in 0..img.width() {
            img.set_rgb(x, y, rng.gen_range(0..=u32::MAX) as i32).unwrap();
        }
    }
}

fn snapshot(img: &PixelBuffer) -> Vec<Vec<i32>> {
    let mut out = Vec::new();
    for y in 0..img.height() {
        for x in 0..img.width() {
            out.push(pixel(img.raster(), x, y));
        }
    }
    out
}

#[test]
fn test_coerce_is_idempotent() {
    for (ty, seed) in [(ImageType::IntArgb, 11), (ImageType::FourByteAbgr, 12)] {
        let mut img = PixelBuffer::new(8, 8, ty).unwrap();
        fill_random(&img, seed);
        img.coerce_data(true).unwrap();
        assert!(img.is_alpha_premultiplied());
        let once = snapshot(&img);
        img.coerce_data(true).unwrap();
        assert_eq!(snapshot(&img), once, "{ty}");
        for px in &once {
            assert!(px[..3].iter().all(|&c| c <= px[3]), "{ty}: {px:?}");
        }
    }
}

#[test]
fn test_coerce_back_within_rounding() {
    for (ty, seed) in [(ImageType::IntArgb, 21), (ImageType::FourByteAbgr, 22)] {
        let mut img = PixelBuffer::new(8, 8, ty).unwrap();
        fill_random(&img, seed);
        let before = snapshot(&img);
        img.coerce_data(true).unwrap();
        img.coerce_data(false).unwrap();
        assert!(!img.is_alpha_premultiplied());
        for (a, b) in before.iter().zip(snapshot(&img)) {
            assert_eq!(a[3], b[3]);
            // Low alphas keep too few bits of color to compare.
            if a[3] >= 128 {
                assert!(a.iter().zip(&b).all(|(x, y)| x.abs_diff(*y) <= 2), "{ty}: {a:?} vs {b:?}");
            }
        }
    }
}

#[test]
fn test_coerce_zero_alpha_clears_color() {
    for ty in [ImageType::IntArgb, ImageType::FourByteAbgr] {
        let mut img = PixelBuffer::new(1, 1, ty).unwrap();
        img.set_rgb(0, 0, 0x00ff_ffff).unwrap();
        img.coerce_data(true).unwrap();
        assert_eq!(pixel(img.raster(), 0, 0), vec![0, 0, 0, 0], "{ty}");
    }
}

#[test]
fn test_coerce_without_alpha_is_noop() {
    let mut img = PixelBuffer::new(1, 1, ImageType::IntRgb).unwrap();
    img.set_rgb(0, 0, 0x0012_3456).unwrap();
    img.coerce_data(true).unwrap();
    assert!(!img.is_alpha_premultiplied());
    assert_eq!(pixel(img.raster(), 0, 0), vec![0x12, 0x34, 0x56]);
}

// ============================================================================
// Rectangles and copies
// ============================================================================

#[test]
fn test_rgb_rect_with_offset_and_scansize() {
    let img = PixelBuffer::new(4, 3, ImageType::IntArgb).unwrap();
    // Two rows of three, starting at 2 with a stride of 5.
    let mut rgb = vec![-1; 10];
    for (i, v) in [2usize, 3, 4, 7, 8, 9].into_iter().zip(1..) {
        rgb[i] = 0xff00_0000u32 as i32 | v;
    }
    img.set_rgb_rect(1, 1, 3, 2, &rgb, 2, 5).unwrap();
    assert_eq!(img.get_rgb(0, 1).unwrap(), 0);
    assert_eq!(img.get_rgb(3, 2).unwrap() as u32, 0xff00_0006);

    let mut out = vec![0; 10];
    img.get_rgb_rect(1, 1, 3, 2, &mut out, 2, 5).unwrap();
    assert_eq!(&out[2..5], &rgb[2..5]);
    assert_eq!(&out[7..10], &rgb[7..10]);
    assert_eq!(out[5], 0);

    let region = img.get_rgb_region(1, 2, 3, 1).unwrap();
    assert_eq!(region, rgb[7..10].to_vec());
    assert!(img.set_rgb_rect(2, 2, 3, 1, &rgb, 0, 3).is_err());
}

#[test]
fn test_rgb_region_bounds() {
    let img = PixelBuffer::new(4, 3, ImageType::IntArgb).unwrap();
    assert_eq!(img.get_rgb_region(0, 0, 4, 3).unwrap().len(), 12);
    assert!(img.get_rgb_region(2, 0, 0, 0).unwrap().is_empty());
    assert!(matches!(img.get_rgb_region(3, 0, 2, 1), Err(ImageError::InvalidArgument(_))));
    assert!(matches!(img.get_rgb_region(0, 0, -1, 1), Err(ImageError::InvalidArgument(_))));
    assert!(img.get_rgb_region(0, 0, i32::MAX, i32::MAX).is_err());

    let mut out = vec![0; 4];
    assert!(img.get_rgb_rect(0, 0, 1, 2, &mut out, usize::MAX, usize::MAX).is_err());
}

// ============================================================================
// Concurrent writers
// ============================================================================

#[test]
fn test_concurrent_writers_never_tear_pixels() {
    const WRITERS: usize = 4;
    let colors: Vec<i32> = (0..WRITERS as u32)
        .map(|t| (0xff00_0000 | (0x11 * (t + 1)) << 16 | (0x22 * (t + 1)) << 8 | (0x33 * (t + 1))) as i32)
        .collect();

    for image_type in [ImageType::ThreeByteBgr, ImageType::FourByteAbgr, ImageType::IntArgb] {
        let img = PixelBuffer::new(8, 6, image_type).unwrap();
        let (w, h) = (img.width(), img.height());
        std::thread::scope(|s| {
            for &color in &colors {
                let img = &img;
                s.spawn(move || {
                    let row = vec![color; w as usize * h as usize];
                    for _ in 0..20 {
                        for y in 0..h {
                            for x in 0..w {
                                img.set_rgb(x, y, color).unwrap();
                            }
                        }
                        img.set_rgb_rect(0, 0, w, h, &row, 0, w as usize).unwrap();
                    }
                });
            }
        });

        for (i, argb) in img.get_rgb_region(0, 0, w, h).unwrap().into_iter().enumerate() {
            assert!(colors.contains(&argb), "{image_type}: pixel {i} reads {:08x}", argb as u32);
        }
    }
}

#[test]
fn test_data_copies_are_detached() {
    let img = PixelBuffer::new(4, 4, ImageType::IntRgb).unwrap();
    img.set_rgb(1, 1, 0x0001_0203).unwrap();
    img.set_rgb(2, 2, 0x0004_0506).unwrap();

    let all = img.data().unwrap();
    assert_eq!(all.bounds(), Rect::new(0, 0, 4, 4));
    let rect = img.data_rect(Rect::new(1, 1, 2, 2)).unwrap();
    assert_eq!((rect.min_x(), rect.min_y()), (1, 1));
    assert_eq!(pixel(&rect, 2, 2), vec![4, 5, 6]);

    img.set_rgb(1, 1, 0x00ff_ffff).unwrap();
    assert_eq!(pixel(&all, 1, 1), vec![1, 2, 3]);
    assert_eq!(pixel(&rect, 1, 1), vec![1, 2, 3]);
}

#[test]
fn test_copy_data_and_set_data() {
    let img = PixelBuffer::new(4, 4, ImageType::IntArgb).unwrap();
    img.set_rgb(3, 3, 0x8010_2030u32 as i32).unwrap();

    let out = img.raster().create_compatible_writable_sized(2, 2).unwrap();
    let out = out.create_writable_translated_child(2, 2).unwrap();
    img.copy_data(&out).unwrap();
    assert_eq!(pixel(&out, 3, 3), vec![0x10, 0x20, 0x30, 0x80]);

    let src = img.raster().create_compatible_writable_sized(2, 2).unwrap();
    src.set_pixel(0, 0, &[1, 2, 3, 4]).unwrap();
    let src = src.create_writable_translated_child(1, 0).unwrap();
    img.set_data(&src).unwrap();
    assert_eq!(pixel(img.raster(), 1, 0), vec![1, 2, 3, 4]);

    let three = WritableRaster::create_interleaved(DataType::Byte, 2, 2, 3, (0, 0)).unwrap();
    assert!(matches!(img.set_data(&three), Err(ImageError::Incompatible(_))));
}

// ============================================================================
// Hooks and conversions
// ============================================================================

struct Recorder;

impl GraphicsFactory for Recorder {
    type Context = (i32, i32, ImageType);

    fn create_graphics(&self, image: &PixelBuffer) -> Self::Context {
        (image.width(), image.height(), image.image_type())
    }
}

#[test]
fn test_graphics_factory() {
    let img = PixelBuffer::new(3, 2, ImageType::ByteGray).unwrap();
    assert_eq!(img.create_graphics(&Recorder), (3, 2, ImageType::ByteGray));
}

fn gray_palette(transparent: Option<usize>) -> IndexColorModel {
    let levels = [0u8, 85, 170, 255];
    match transparent {
        Some(t) => IndexColorModel::from_components_with_transparent(2, 4, &levels, &levels, &levels, t).unwrap(),
        None => IndexColorModel::from_components(2, 4, &levels, &levels, &levels).unwrap(),
    }
}

fn index_raster(cm: &IndexColorModel) -> WritableRaster {
    let raster = cm.create_compatible_writable_raster(2, 1).unwrap();
    raster.set_sample(0, 0, 0, 0).unwrap();
    raster.set_sample(1, 0, 0, 3).unwrap();
    raster
}

#[test]
fn test_convert_opaque_palette() {
    let cm = gray_palette(None);
    let img = cm.convert_to_int_discrete(&index_raster(&cm), false).unwrap();
    assert_eq!(img.image_type(), ImageType::IntRgb);
    assert_eq!(img.get_rgb(0, 0).unwrap() as u32, 0xff00_0000);
    assert_eq!(img.get_rgb(1, 0).unwrap() as u32, 0xffff_ffff);
}

#[test]
fn test_convert_bitmask_palette() {
    let cm = gray_palette(Some(0));
    assert_eq!(cm.transparency(), Transparency::Bitmask);
    let img = cm.convert_to_int_discrete(&index_raster(&cm), false).unwrap();
    assert_eq!(img.image_type(), ImageType::Custom);
    assert_eq!(img.color_model().pixel_bits(), 25);
    assert_eq!(img.get_rgb(0, 0).unwrap(), 0);
    assert_eq!(img.get_rgb(1, 0).unwrap() as u32, 0xffff_ffff);
}

#[test]
fn test_convert_forced_argb() {
    let cm = gray_palette(None);
    let img = cm.convert_to_int_discrete(&index_raster(&cm), true).unwrap();
    assert_eq!(img.image_type(), ImageType::IntArgb);
    assert_eq!(img.get_rgb(1, 0).unwrap() as u32, 0xffff_ffff);

    let wrong = WritableRaster::create_interleaved(DataType::Byte, 2, 1, 3, (0, 0)).unwrap();
    assert!(cm.convert_to_int_discrete(&wrong, true).is_err());
}
