//! Process-wide sRGB ⇄ linear lookup tables.
//!
//! Each table is built on first use and shared for the life of the process.
//! The 65536-entry table is built with rayon when the `parallel` feature is
//! enabled.
//!
//! | Table | Entries | Entry |
//! |-------|---------|-------|
//! | [`linear8_to_srgb8`] | 256 | `round(oetf(i / 255) * 255)` |
//! | [`linear16_to_srgb8`] | 65536 | `round(oetf(i / 65535) * 255)` |
//! | [`srgb8_to_linear8`] | 256 | `round(eotf(i / 255) * 255)` |
//! | [`srgb8_to_linear16`] | 256 | `round(eotf(i / 255) * 65535)` |
//!
//! # Usage
//!
//! ```rust
//! use raster_transfer::lut;
//!
//! let to_srgb = lut::linear8_to_srgb8();
//! assert_eq!(to_srgb[0], 0);
//! assert_eq!(to_srgb[255], 255);
//! ```

use std::sync::OnceLock;

use tracing::debug;

use crate::srgb::{eotf, oetf, quantize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

static LINEAR8_TO_SRGB8: OnceLock<Vec<u8>> = OnceLock::new();
static LINEAR16_TO_SRGB8: OnceLock<Vec<u8>> = OnceLock::new();
static SRGB8_TO_LINEAR8: OnceLock<Vec<u8>> = OnceLock::new();
static SRGB8_TO_LINEAR16: OnceLock<Vec<u16>> = OnceLock::new();

/// 8-bit linear to 8-bit sRGB.
pub fn linear8_to_srgb8() -> &'static [u8] {
    LINEAR8_TO_SRGB8.get_or_init(|| {
        debug!(entries = 256, "building linear8 -> sRGB8 table");
        (0..256u32)
            .map(|i| quantize(oetf(i as f32 / 255.0), 255) as u8)
            .collect()
    })
}

/// 16-bit linear to 8-bit sRGB.
pub fn linear16_to_srgb8() -> &'static [u8] {
    LINEAR16_TO_SRGB8.get_or_init(|| {
        debug!(entries = 65536, "building linear16 -> sRGB8 table");
        build_65536(|i| quantize(oetf(i as f32 / 65535.0), 255) as u8)
    })
}

/// 8-bit sRGB to 8-bit linear.
pub fn srgb8_to_linear8() -> &'static [u8] {
    SRGB8_TO_LINEAR8.get_or_init(|| {
        debug!(entries = 256, "building sRGB8 -> linear8 table");
        (0..256u32)
            .map(|i| quantize(eotf(i as f32 / 255.0), 255) as u8)
            .collect()
    })
}

/// 8-bit sRGB to 16-bit linear.
pub fn srgb8_to_linear16() -> &'static [u16] {
    SRGB8_TO_LINEAR16.get_or_init(|| {
        debug!(entries = 256, "building sRGB8 -> linear16 table");
        (0..256u32)
            .map(|i| quantize(eotf(i as f32 / 255.0), 65535) as u16)
            .collect()
    })
}

#[cfg(feature = "parallel")]
fn build_65536<T: Send>(f: impl Fn(u32) -> T + Sync + Send) -> Vec<T> {
    (0..65536u32).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn build_65536<T>(f: impl Fn(u32) -> T) -> Vec<T> {
    (0..65536u32).map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        assert_eq!(linear8_to_srgb8().len(), 256);
        assert_eq!(linear16_to_srgb8().len(), 65536);
        assert_eq!(srgb8_to_linear8().len(), 256);
        assert_eq!(srgb8_to_linear16().len(), 256);
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(linear16_to_srgb8()[0], 0);
        assert_eq!(linear16_to_srgb8()[65535], 255);
        assert_eq!(srgb8_to_linear16()[255], 65535);
        assert_eq!(srgb8_to_linear8()[0], 0);
    }

    #[test]
    fn test_monotonic() {
        let t = linear16_to_srgb8();
        assert!(t.windows(2).all(|w| w[0] <= w[1]));
        let t = srgb8_to_linear16();
        assert!(t.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_known_values() {
        // sRGB 128 is about 21.6% linear
        assert_eq!(srgb8_to_linear8()[128], 55);
        assert_eq!(linear8_to_srgb8()[55], 128);
    }

    #[test]
    fn test_tables_are_shared() {
        assert!(std::ptr::eq(linear8_to_srgb8(), linear8_to_srgb8()));
    }
}
