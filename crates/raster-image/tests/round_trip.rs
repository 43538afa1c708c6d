//! ARGB -> pixel -> ARGB round trips through every model family.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use raster_color::default_palette;
use raster_image::prelude::*;

const SEED: u64 = 0x5eed_0001;
const RANDOM_SAMPLES: usize = 10_000;

/// All 256 grays, the 216 web-cube colors and seeded random ARGB values.
fn samples() -> Vec<u32> {
    let mut out: Vec<u32> = (0..256u32).map(|g| 0xff00_0000 | g * 0x0001_0101).collect();
    for r in (0..256u32).step_by(51) {
        for g in (0..256u32).step_by(51) {
            for b in (0..256u32).step_by(51) {
                out.push(0xff00_0000 | r << 16 | g << 8 | b);
            }
        }
    }
    let mut rng = StdRng::seed_from_u64(SEED);
    out.extend((0..RANDOM_SAMPLES).map(|_| rng.gen_range(0..=u32::MAX)));
    out
}

fn opaque(c: u32) -> u32 {
    c | 0xff00_0000
}

fn max_channel_diff(a: u32, b: u32) -> u32 {
    a.to_be_bytes()
        .iter()
        .zip(b.to_be_bytes())
        .map(|(&x, y)| x.abs_diff(y) as u32)
        .max()
        .unwrap_or(0)
}

fn round_trip(cm: &ColorModel, argb: u32) -> u32 {
    let px = cm.get_data_elements(argb as i32, None).unwrap();
    cm.get_rgb_elements(&px).unwrap() as u32
}

#[test]
fn test_direct_models_are_exact() {
    let argb = ColorModel::rgb_default();
    let rgb: ColorModel = DirectColorModel::new(24, 0xff0000, 0xff00, 0xff).unwrap().into();
    let bgr: ColorModel = DirectColorModel::new(24, 0xff, 0xff00, 0xff0000).unwrap().into();
    for c in samples() {
        assert_eq!(round_trip(&argb, c), c, "argb {c:#010x}");
        assert_eq!(round_trip(&rgb, opaque(c)), opaque(c), "rgb {c:#010x}");
        assert_eq!(round_trip(&bgr, opaque(c)), opaque(c), "bgr {c:#010x}");
    }
}

#[test]
fn test_component_srgb_bytes_are_exact() {
    let abgr = PixelBuffer::new(1, 1, ImageType::FourByteAbgr).unwrap();
    let bgr = PixelBuffer::new(1, 1, ImageType::ThreeByteBgr).unwrap();
    for c in samples() {
        abgr.set_rgb(0, 0, c as i32).unwrap();
        assert_eq!(abgr.get_rgb(0, 0).unwrap() as u32, c);
        bgr.set_rgb(0, 0, c as i32).unwrap();
        assert_eq!(bgr.get_rgb(0, 0).unwrap() as u32, opaque(c));
    }
}

#[test]
fn test_component_linear_rgb_ushort_within_one() {
    let cm: ColorModel = ComponentColorModel::with_defaults(ColorSpace::linear_rgb(), false, false, DataType::UShort)
        .unwrap()
        .into();
    let raster = cm.create_compatible_writable_raster(1, 1).unwrap();
    let img = PixelBuffer::with_raster(cm, raster, false, None).unwrap();
    assert_eq!(img.image_type(), ImageType::Custom);
    for c in samples() {
        let c = opaque(c);
        img.set_rgb(0, 0, c as i32).unwrap();
        let back = img.get_rgb(0, 0).unwrap() as u32;
        assert!(max_channel_diff(c, back) <= 1, "{c:#010x} -> {back:#010x}");
    }
}

#[test]
fn test_index_palette_colors_are_exact() {
    let img = PixelBuffer::new(1, 1, ImageType::ByteIndexed).unwrap();
    let palette = img.color_model().as_index().unwrap().palette().to_vec();
    let mut checked = 0;
    for c in samples().into_iter().map(opaque).filter(|c| palette.contains(c)) {
        img.set_rgb(0, 0, c as i32).unwrap();
        assert_eq!(img.get_rgb(0, 0).unwrap() as u32, c);
        checked += 1;
    }
    // Every cube color plus the grays of the ramp.
    assert!(checked >= 216);
}

#[test]
fn test_index_lookup_is_deterministic() {
    let cm = IndexColorModel::default_indexed().unwrap();
    let mut rng = StdRng::seed_from_u64(SEED ^ 1);
    let queries: Vec<i32> = (0..500).map(|_| rng.gen_range(0..=u32::MAX) as i32).collect();
    let cold: Vec<i32> = queries
        .iter()
        .map(|&q| cm.get_data_elements(q, None).unwrap().get_i32(0))
        .collect();
    let warm: Vec<i32> = queries
        .iter()
        .rev()
        .map(|&q| cm.get_data_elements(q, None).unwrap().get_i32(0))
        .collect();
    assert!(cold.iter().eq(warm.iter().rev()));
}

#[test]
fn test_gray_palette_nearest() {
    let levels = [0u8, 85, 170, 255];
    let cm = IndexColorModel::from_components(2, 4, &levels, &levels, &levels).unwrap();
    let px = cm.get_data_elements(0xff64_6464u32 as i32, None).unwrap();
    assert_eq!(px.get_i32(0), 1);
}

#[test]
fn test_default_palette_layout() {
    let cmap = default_palette();
    assert_eq!(cmap[0], 0);
    assert_eq!(cmap[215], 0xffffff);
    let on_cube = |c: &&i32| c.to_be_bytes()[1..].iter().all(|&v| v % 51 == 0);
    assert_eq!(cmap[..216].iter().filter(on_cube).count(), 216);
    // Ramp grays 102 and 204 also sit on the cube.
    assert_eq!(cmap.iter().filter(on_cube).count(), 218);
}
