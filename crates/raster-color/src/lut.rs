//! Process-wide cache of gray lookup tables.
//!
//! Component color models over ICC gray spaces need four tables per space:
//!
//! | Table | Input | Output |
//! |-------|-------|--------|
//! | gray8 to sRGB8 | 256 gray levels | 8-bit sRGB |
//! | gray16 to sRGB8 | 65536 gray levels | 8-bit sRGB |
//! | linear gray16 to gray8 | 65536 linear levels | 8-bit gray of the space |
//! | linear gray16 to gray16 | 65536 linear levels | 16-bit gray of the space |
//!
//! Tables are built once per (space, kind) through a [`ColorConvert`] engine
//! and shared as `Arc` slices. The registry holds a bounded number of tables
//! and evicts the least recently used one when full.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::cmm::{ColorConvert, LcmsConvert};
use crate::colorspace::{ColorSpace, ColorSpaceId};
use crate::error::{ColorError, ColorResult};

/// Kind of gray table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LutKind {
    /// 8-bit gray of the space to 8-bit sRGB.
    Gray8ToSrgb8,
    /// 16-bit gray of the space to 8-bit sRGB.
    Gray16ToSrgb8,
    /// 16-bit linear gray to 8-bit gray of the space.
    LinearGray16ToGray8,
    /// 16-bit linear gray to 16-bit gray of the space.
    LinearGray16ToGray16,
}

#[derive(Debug, Clone)]
enum Lut {
    U8(Arc<[u8]>),
    U16(Arc<[u16]>),
}

#[derive(Debug)]
struct Entry {
    lut: Lut,
    last_used: AtomicU64,
}

/// Bounded, thread-safe gray table cache.
pub struct LutRegistry {
    converter: Arc<dyn ColorConvert>,
    capacity: usize,
    entries: RwLock<HashMap<(ColorSpaceId, LutKind), Entry>>,
    tick: AtomicU64,
}

static GLOBAL: OnceLock<LutRegistry> = OnceLock::new();

#[inline]
fn to_u8(v: u16) -> u8 {
    (v as f32 * (1.0 / 257.0) + 0.5) as u8
}

impl LutRegistry {
    /// Default number of cached tables.
    pub const DEFAULT_CAPACITY: usize = 32;

    /// Creates an empty registry using Little CMS.
    pub fn new() -> Self {
        Self::with_converter(Arc::new(LcmsConvert::default()))
    }

    /// Creates an empty registry using `converter` to build tables.
    pub fn with_converter(converter: Arc<dyn ColorConvert>) -> Self {
        Self {
            converter,
            capacity: Self::DEFAULT_CAPACITY,
            entries: RwLock::new(HashMap::new()),
            tick: AtomicU64::new(0),
        }
    }

    /// Sets the table limit (at least 1).
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// The shared registry used by color models.
    pub fn global() -> &'static LutRegistry {
        GLOBAL.get_or_init(LutRegistry::new)
    }

    /// Installs `registry` as the shared one.
    ///
    /// Fails, returning the registry, once the shared registry has been used.
    pub fn install(registry: LutRegistry) -> Result<(), LutRegistry> {
        GLOBAL.set(registry)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no table is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached table.
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Returns `true` if a table of `kind` is cached for `space`.
    pub fn contains(&self, space: &ColorSpace, kind: LutKind) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(space.id(), kind))
    }

    /// 256-entry table from 8-bit gray of `space` to 8-bit sRGB.
    pub fn gray8_to_srgb8(&self, space: &ColorSpace) -> ColorResult<Arc<[u8]>> {
        let lut = self.get_or_build(space, LutKind::Gray8ToSrgb8, || {
            let ramp: Vec<u16> = (0..256u16).map(|i| i * 257).collect();
            let rgb = self.converter.convert(space, &ColorSpace::srgb(), &ramp)?;
            Ok(Lut::U8(third_channel(&rgb, 256)?.map(to_u8).collect()))
        })?;
        as_u8(lut)
    }

    /// 65536-entry table from 16-bit gray of `space` to 8-bit sRGB.
    pub fn gray16_to_srgb8(&self, space: &ColorSpace) -> ColorResult<Arc<[u8]>> {
        let lut = self.get_or_build(space, LutKind::Gray16ToSrgb8, || {
            let ramp: Vec<u16> = (0..=u16::MAX).collect();
            let rgb = self.converter.convert(space, &ColorSpace::srgb(), &ramp)?;
            Ok(Lut::U8(third_channel(&rgb, 65536)?.map(to_u8).collect()))
        })?;
        as_u8(lut)
    }

    /// 65536-entry table from 16-bit linear gray to 8-bit gray of `space`.
    pub fn linear_gray16_to_gray8(&self, space: &ColorSpace) -> ColorResult<Arc<[u8]>> {
        let lut = self.get_or_build(space, LutKind::LinearGray16ToGray8, || {
            let gray = self.linear_ramp_to(space)?;
            Ok(Lut::U8(gray.into_iter().map(to_u8).collect()))
        })?;
        as_u8(lut)
    }

    /// 65536-entry table from 16-bit linear gray to 16-bit gray of `space`.
    pub fn linear_gray16_to_gray16(&self, space: &ColorSpace) -> ColorResult<Arc<[u16]>> {
        let lut = self.get_or_build(space, LutKind::LinearGray16ToGray16, || {
            Ok(Lut::U16(self.linear_ramp_to(space)?.into()))
        })?;
        match lut {
            Lut::U16(t) => Ok(t),
            Lut::U8(_) => Err(ColorError::unsupported("gray table has 8-bit entries")),
        }
    }

    fn linear_ramp_to(&self, space: &ColorSpace) -> ColorResult<Vec<u16>> {
        let ramp: Vec<u16> = (0..=u16::MAX).collect();
        let gray = self.converter.convert(&ColorSpace::linear_gray(), space, &ramp)?;
        if gray.len() != ramp.len() {
            return Err(ColorError::unsupported(format!(
                "converter returned {} samples for {} gray inputs",
                gray.len(),
                ramp.len()
            )));
        }
        Ok(gray)
    }

    fn get_or_build(
        &self,
        space: &ColorSpace,
        kind: LutKind,
        build: impl FnOnce() -> ColorResult<Lut>,
    ) -> ColorResult<Lut> {
        let key = (space.id(), kind);
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&key) {
                entry.last_used.store(self.next_tick(), Ordering::Relaxed);
                return Ok(entry.lut.clone());
            }
        }

        let lut = build().inspect_err(|e| warn!(space = %space, ?kind, "gray table build failed: {}", e))?;
        debug!(space = %space, ?kind, "built gray table");

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have built the same table meanwhile; keep the first.
        let entry = entries.entry(key).or_insert_with(|| Entry {
            lut,
            last_used: AtomicU64::new(0),
        });
        entry.last_used.store(self.next_tick(), Ordering::Relaxed);
        let out = entry.lut.clone();

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used.load(Ordering::Relaxed))
                .map(|(k, _)| *k);
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                    debug!(space_id = k.0, kind = ?k.1, "evicted gray table");
                }
                None => break,
            }
        }
        Ok(out)
    }

    #[inline]
    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for LutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LutRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LutRegistry")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Takes channel index 2 of each RGB triplet; the three channels of a gray
/// input are equal up to rounding.
fn third_channel(rgb: &[u16], pixels: usize) -> ColorResult<impl Iterator<Item = u16> + '_> {
    if rgb.len() != pixels * 3 {
        return Err(ColorError::unsupported(format!(
            "converter returned {} samples for {pixels} gray inputs",
            rgb.len()
        )));
    }
    Ok(rgb.chunks_exact(3).map(|px| px[2]))
}

fn as_u8(lut: Lut) -> ColorResult<Arc<[u8]>> {
    match lut {
        Lut::U8(t) => Ok(t),
        Lut::U16(_) => Err(ColorError::unsupported("gray table has 16-bit entries")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_icc::Profile;
    use std::sync::atomic::AtomicUsize;

    /// Maps gray to itself and replicates it to RGB, counting calls.
    #[derive(Default)]
    struct Identity {
        calls: AtomicUsize,
    }

    impl ColorConvert for Identity {
        fn convert(&self, _src: &ColorSpace, dst: &ColorSpace, samples: &[u16]) -> ColorResult<Vec<u16>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(if dst.num_components() == 3 {
                samples.iter().flat_map(|&v| [v, v, v]).collect()
            } else {
                samples.to_vec()
            })
        }
    }

    struct Failing;

    impl ColorConvert for Failing {
        fn convert(&self, _: &ColorSpace, _: &ColorSpace, _: &[u16]) -> ColorResult<Vec<u16>> {
            Err(ColorError::unsupported("no engine"))
        }
    }

    fn icc_gray() -> ColorSpace {
        let bytes = Profile::gray(2.2).unwrap().to_icc().unwrap();
        ColorSpace::from_icc(&bytes).unwrap()
    }

    #[test]
    fn test_identity_tables() {
        let reg = LutRegistry::with_converter(Arc::new(Identity::default()));
        let cs = icc_gray();
        let t8 = reg.gray8_to_srgb8(&cs).unwrap();
        assert_eq!(t8.len(), 256);
        assert!(t8.iter().enumerate().all(|(i, &v)| v as usize == i));

        let t16 = reg.gray16_to_srgb8(&cs).unwrap();
        assert_eq!(t16.len(), 65536);
        assert_eq!(t16[257 * 100], 100);
        assert_eq!(t16[65535], 255);

        let g16 = reg.linear_gray16_to_gray16(&cs).unwrap();
        assert_eq!(g16[1234], 1234);
        let g8 = reg.linear_gray16_to_gray8(&cs).unwrap();
        assert_eq!(g8[257 * 7], 7);
    }

    #[test]
    fn test_tables_are_cached() {
        let conv = Arc::new(Identity::default());
        let reg = LutRegistry::with_converter(conv.clone());
        let cs = icc_gray();
        let a = reg.gray8_to_srgb8(&cs).unwrap();
        let b = reg.gray8_to_srgb8(&cs).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(conv.calls.load(Ordering::Relaxed), 1);
        assert!(reg.contains(&cs, LutKind::Gray8ToSrgb8));
        assert!(!reg.contains(&cs, LutKind::Gray16ToSrgb8));
    }

    #[test]
    fn test_lru_eviction() {
        let reg = LutRegistry::with_converter(Arc::new(Identity::default())).capacity(2);
        let (a, b, c) = (icc_gray(), icc_gray(), icc_gray());
        reg.gray8_to_srgb8(&a).unwrap();
        reg.gray8_to_srgb8(&b).unwrap();
        // Touch a so b becomes the oldest.
        reg.gray8_to_srgb8(&a).unwrap();
        reg.gray8_to_srgb8(&c).unwrap();
        assert_eq!(reg.len(), 2);
        assert!(reg.contains(&a, LutKind::Gray8ToSrgb8));
        assert!(!reg.contains(&b, LutKind::Gray8ToSrgb8));
        assert!(reg.contains(&c, LutKind::Gray8ToSrgb8));
    }

    #[test]
    fn test_failure_is_not_cached() {
        let reg = LutRegistry::with_converter(Arc::new(Failing));
        let cs = icc_gray();
        assert!(reg.gray8_to_srgb8(&cs).is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_lcms_gray_table() {
        let reg = LutRegistry::new();
        let cs = icc_gray();
        let t = reg.gray8_to_srgb8(&cs).unwrap();
        assert!(t[0] <= 1);
        assert!(t[255] >= 254);
        assert!(t.windows(2).all(|w| w[0] <= w[1].saturating_add(1)));
        reg.clear();
        assert!(reg.is_empty());
    }
}
