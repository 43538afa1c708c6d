//! Palette color model.
//!
//! Pixels are indices into a table of up to 65536 ARGB entries. Forward
//! lookups are a masked array read. Reverse lookups (ARGB to index) search
//! the palette for the nearest entry and remember recent answers in a small
//! most-recently-used cache.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use raster_core::{DataElements, DataType, Raster, SampleModel, WritableRaster};
use tracing::trace;

use super::{ColorModel, ModelBase, Transparency, install_pixel, pixel_of};
use crate::colorspace::ColorSpace;
use crate::error::{ColorError, ColorResult};

/// Reverse-lookup cache depth in `(argb, index)` pairs.
pub const LOOKUP_CACHE_PAIRS: usize = 20;

const MAX_BITS: u32 = 16;
const MAX_SIZE: usize = 1 << 16;

// ============================================================================
// ValidBits
// ============================================================================

/// Set of palette indices that may be produced by reverse lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidBits {
    words: Vec<u64>,
}

impl ValidBits {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding `0..len`.
    pub fn all(len: usize) -> Self {
        (0..len).collect()
    }

    /// Adds `index`.
    pub fn insert(&mut self, index: usize) {
        let word = index / 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (index % 64);
    }

    /// Removes `index`.
    pub fn remove(&mut self, index: usize) {
        if let Some(w) = self.words.get_mut(index / 64) {
            *w &= !(1 << (index % 64));
        }
    }

    /// Whether `index` is in the set.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / 64)
            .is_some_and(|w| w & (1 << (index % 64)) != 0)
    }

    /// Indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            (0..64).filter(move |b| w & (1 << b) != 0).map(move |b| wi * 64 + b)
        })
    }
}

impl FromIterator<usize> for ValidBits {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut bits = Self::new();
        for i in iter {
            bits.insert(i);
        }
        bits
    }
}

// ============================================================================
// IndexColorModel
// ============================================================================

/// sRGB palette model over `Byte` or `UShort` pixels.
pub struct IndexColorModel {
    base: ModelBase,
    rgb: Vec<u32>,
    map_size: usize,
    transparent_index: Option<usize>,
    all_gray_opaque: bool,
    pixel_mask: u32,
    valid: Option<ValidBits>,
    cache: Mutex<VecDeque<(i32, u32)>>,
}

impl Clone for IndexColorModel {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            rgb: self.rgb.clone(),
            map_size: self.map_size,
            transparent_index: self.transparent_index,
            all_gray_opaque: self.all_gray_opaque,
            pixel_mask: self.pixel_mask,
            valid: self.valid.clone(),
            cache: Mutex::new(VecDeque::with_capacity(LOOKUP_CACHE_PAIRS)),
        }
    }
}

impl fmt::Debug for IndexColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexColorModel")
            .field("pixel_bits", &self.base.pixel_bits)
            .field("map_size", &self.map_size)
            .field("transparency", &self.base.transparency)
            .field("transparent_index", &self.transparent_index)
            .field("all_gray_opaque", &self.all_gray_opaque)
            .field("transfer_type", &self.base.transfer_type)
            .finish_non_exhaustive()
    }
}

fn check_args(bits: u32, size: usize, transfer_type: DataType) -> ColorResult<()> {
    if !(1..=MAX_BITS).contains(&bits) {
        return Err(ColorError::invalid_argument(format!(
            "number of bits must be between 1 and {MAX_BITS}, got {bits}"
        )));
    }
    if size < 1 {
        return Err(ColorError::invalid_argument("map size must be >= 1"));
    }
    if size > MAX_SIZE {
        return Err(ColorError::invalid_argument(format!(
            "map size {size} exceeds {MAX_SIZE}"
        )));
    }
    if !matches!(transfer_type, DataType::Byte | DataType::UShort) {
        return Err(ColorError::invalid_argument(format!(
            "transfer type must be Byte or UShort, got {transfer_type}"
        )));
    }
    Ok(())
}

fn require_source(what: &str, len: usize, needed: usize) -> ColorResult<()> {
    if len < needed {
        return Err(ColorError::invalid_argument(format!(
            "{what} holds {len} entries, need {needed}"
        )));
    }
    Ok(())
}

/// End of `count` entries of `stride` elements starting at `start`.
fn source_end(what: &str, len: usize, start: usize, count: usize, stride: usize) -> ColorResult<usize> {
    let end = count
        .checked_mul(stride)
        .and_then(|n| n.checked_add(start))
        .ok_or_else(|| ColorError::invalid_argument(format!("{what} offset {start} overflows")))?;
    require_source(what, len, end)?;
    Ok(end)
}

fn default_transfer(bits: u32) -> DataType {
    if bits <= 8 { DataType::Byte } else { DataType::UShort }
}

/// Mask applied to pixels before indexing; odd widths round up.
fn pixel_mask(bits: u32) -> u32 {
    let mask_bits = match bits {
        3 => 4,
        5..=7 => 8,
        b => b,
    };
    (1u32 << mask_bits) - 1
}

#[inline]
fn channels(argb: u32) -> [i32; 4] {
    [
        ((argb >> 16) & 0xff) as i32,
        ((argb >> 8) & 0xff) as i32,
        (argb & 0xff) as i32,
        (argb >> 24) as i32,
    ]
}

impl IndexColorModel {
    /// Opaque palette from separate red, green and blue arrays.
    pub fn from_components(bits: u32, size: usize, reds: &[u8], greens: &[u8], blues: &[u8]) -> ColorResult<Self> {
        Self::from_arrays(bits, size, reds, greens, blues, None, None)
    }

    /// Opaque palette whose entry `trans` is transparent.
    pub fn from_components_with_transparent(
        bits: u32,
        size: usize,
        reds: &[u8],
        greens: &[u8],
        blues: &[u8],
        trans: usize,
    ) -> ColorResult<Self> {
        Self::from_arrays(bits, size, reds, greens, blues, None, Some(trans))
    }

    /// Palette from separate red, green, blue and alpha arrays.
    pub fn from_components_with_alpha(
        bits: u32,
        size: usize,
        reds: &[u8],
        greens: &[u8],
        blues: &[u8],
        alphas: &[u8],
    ) -> ColorResult<Self> {
        Self::from_arrays(bits, size, reds, greens, blues, Some(alphas), None)
    }

    fn from_arrays(
        bits: u32,
        size: usize,
        reds: &[u8],
        greens: &[u8],
        blues: &[u8],
        alphas: Option<&[u8]>,
        trans: Option<usize>,
    ) -> ColorResult<Self> {
        let tt = default_transfer(bits);
        check_args(bits, size, tt)?;
        require_source("red array", reds.len(), size)?;
        require_source("green array", greens.len(), size)?;
        require_source("blue array", blues.len(), size)?;
        if let Some(a) = alphas {
            require_source("alpha array", a.len(), size)?;
        }
        let argb: Vec<u32> = (0..size)
            .map(|i| {
                let a = alphas.map_or(0xff, |a| a[i] as u32);
                a << 24 | (reds[i] as u32) << 16 | (greens[i] as u32) << 8 | blues[i] as u32
            })
            .collect();
        Self::build(bits, size, argb, trans, tt, None)
    }

    /// Palette from interleaved `R, G, B[, A]` bytes starting at `start`.
    pub fn from_interleaved(
        bits: u32,
        size: usize,
        cmap: &[u8],
        start: usize,
        has_alpha: bool,
        trans: Option<usize>,
    ) -> ColorResult<Self> {
        let tt = default_transfer(bits);
        check_args(bits, size, tt)?;
        let n = if has_alpha { 4 } else { 3 };
        let end = source_end("color map", cmap.len(), start, size, n)?;
        let argb: Vec<u32> = cmap[start..end]
            .chunks_exact(n)
            .map(|c| {
                let a = if has_alpha { c[3] as u32 } else { 0xff };
                a << 24 | (c[0] as u32) << 16 | (c[1] as u32) << 8 | c[2] as u32
            })
            .collect();
        Self::build(bits, size, argb, trans, tt, None)
    }

    /// Palette from ARGB ints starting at `start`; without alpha every entry
    /// is opaque.
    pub fn from_packed(
        bits: u32,
        size: usize,
        cmap: &[i32],
        start: usize,
        has_alpha: bool,
        trans: Option<usize>,
        transfer_type: DataType,
    ) -> ColorResult<Self> {
        check_args(bits, size, transfer_type)?;
        let end = source_end("color map", cmap.len(), start, size, 1)?;
        let argb: Vec<u32> = cmap[start..end]
            .iter()
            .map(|&c| if has_alpha { c as u32 } else { c as u32 | 0xff00_0000 })
            .collect();
        Self::build(bits, size, argb, trans, transfer_type, None)
    }

    /// Palette from ARGB ints where only indices in `valid` may be produced
    /// by reverse lookups. Entries outside `valid` stay 0.
    pub fn from_packed_with_valid(
        bits: u32,
        size: usize,
        cmap: &[i32],
        start: usize,
        transfer_type: DataType,
        valid: &ValidBits,
    ) -> ColorResult<Self> {
        check_args(bits, size, transfer_type)?;
        let end = source_end("color map", cmap.len(), start, size, 1)?;
        let argb: Vec<u32> = cmap[start..end].iter().map(|&c| c as u32).collect();
        let valid = (0..size).any(|i| !valid.contains(i)).then(|| valid.clone());
        Self::build(bits, size, argb, None, transfer_type, valid)
    }

    fn build(
        bits: u32,
        size: usize,
        argb: Vec<u32>,
        trans: Option<usize>,
        transfer_type: DataType,
        valid: Option<ValidBits>,
    ) -> ColorResult<Self> {
        let real_size = (1usize << bits).max(size).max(256);
        let mut rgb = vec![0u32; real_size];
        let mut transparency = Transparency::Opaque;
        let mut transparent_index = None;
        let mut all_gray = true;

        for (i, &c) in argb.iter().enumerate().take(size) {
            if valid.as_ref().is_some_and(|v| !v.contains(i)) {
                continue;
            }
            rgb[i] = c;
            let [r, g, b, a] = channels(c);
            if a != 0xff {
                if a == 0 {
                    if transparency == Transparency::Opaque {
                        transparency = Transparency::Bitmask;
                    }
                    transparent_index.get_or_insert(i);
                } else {
                    transparency = Transparency::Translucent;
                }
                all_gray = false;
            }
            all_gray = all_gray && r == g && g == b;
        }

        if let Some(t) = trans.filter(|&t| t < size) {
            rgb[t] &= 0x00ff_ffff;
            transparent_index = Some(t);
            all_gray = false;
            if transparency == Transparency::Opaque {
                transparency = Transparency::Bitmask;
            }
        }

        let has_alpha = transparency != Transparency::Opaque;
        let component_bits = vec![8; if has_alpha { 4 } else { 3 }];
        let base = ModelBase::new(
            bits,
            component_bits,
            ColorSpace::srgb(),
            has_alpha,
            false,
            transparency,
            transfer_type,
        )?;
        trace!(bits, size, ?transparency, ?transparent_index, all_gray, "IndexColorModel");
        Ok(Self {
            base,
            rgb,
            map_size: size,
            transparent_index,
            all_gray_opaque: all_gray,
            pixel_mask: pixel_mask(bits),
            valid,
            cache: Mutex::new(VecDeque::with_capacity(LOOKUP_CACHE_PAIRS)),
        })
    }

    /// 8-bit palette of the 6x6x6 color cube followed by a gray ramp.
    pub fn default_indexed() -> ColorResult<Self> {
        Self::from_packed(8, 256, &default_palette(), 0, false, None, DataType::Byte)
    }

    /// 1-bit black and white palette.
    pub fn black_white() -> ColorResult<Self> {
        let levels = [0u8, 0xff];
        Self::from_components(1, 2, &levels, &levels, &levels)
    }

    #[inline]
    pub(crate) fn base(&self) -> &ModelBase {
        &self.base
    }

    /// The first `map_size` ARGB entries.
    pub fn palette(&self) -> &[u32] {
        &self.rgb[..self.map_size]
    }

    /// Red channel of each entry.
    pub fn reds(&self) -> Vec<u8> {
        self.palette().iter().map(|&c| (c >> 16) as u8).collect()
    }

    /// Green channel of each entry.
    pub fn greens(&self) -> Vec<u8> {
        self.palette().iter().map(|&c| (c >> 8) as u8).collect()
    }

    /// Blue channel of each entry.
    pub fn blues(&self) -> Vec<u8> {
        self.palette().iter().map(|&c| c as u8).collect()
    }

    /// Alpha channel of each entry.
    pub fn alphas(&self) -> Vec<u8> {
        self.palette().iter().map(|&c| (c >> 24) as u8).collect()
    }

    /// Number of palette entries.
    #[inline]
    pub fn map_size(&self) -> usize {
        self.map_size
    }

    /// Opaque, bitmask or translucent, from the palette alphas.
    #[inline]
    pub fn transparency(&self) -> Transparency {
        self.base.transparency
    }

    /// Index returned for fully transparent colors, if any.
    #[inline]
    pub fn transparent_pixel(&self) -> Option<usize> {
        self.transparent_index
    }

    /// Whether every entry is an opaque gray.
    #[inline]
    pub fn is_all_gray_opaque(&self) -> bool {
        self.all_gray_opaque
    }

    /// Whether `pixel` is a valid palette index.
    pub fn is_valid_pixel(&self, pixel: usize) -> bool {
        pixel < self.map_size && self.valid.as_ref().is_none_or(|v| v.contains(pixel))
    }

    /// Whether every index is valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid.is_none()
    }

    /// The valid indices.
    pub fn valid_pixels(&self) -> ValidBits {
        match &self.valid {
            Some(v) => v.clone(),
            None => ValidBits::all(self.map_size),
        }
    }

    #[inline]
    fn entry(&self, pixel: i32) -> u32 {
        self.rgb[(pixel as u32 & self.pixel_mask) as usize]
    }

    /// Red of the entry `pixel` selects.
    pub fn get_red(&self, pixel: i32) -> ColorResult<i32> {
        Ok(channels(self.entry(pixel))[0])
    }

    /// Green of the entry `pixel` selects.
    pub fn get_green(&self, pixel: i32) -> ColorResult<i32> {
        Ok(channels(self.entry(pixel))[1])
    }

    /// Blue of the entry `pixel` selects.
    pub fn get_blue(&self, pixel: i32) -> ColorResult<i32> {
        Ok(channels(self.entry(pixel))[2])
    }

    /// Alpha of the entry `pixel` selects.
    pub fn get_alpha(&self, pixel: i32) -> ColorResult<i32> {
        Ok(channels(self.entry(pixel))[3])
    }

    /// ARGB of the entry `pixel` selects.
    pub fn get_rgb(&self, pixel: i32) -> ColorResult<i32> {
        Ok(self.entry(pixel) as i32)
    }

    /// Red of a pixel in transfer form.
    pub fn get_red_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_red(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// Green of a pixel in transfer form.
    pub fn get_green_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_green(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// Blue of a pixel in transfer form.
    pub fn get_blue_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_blue(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// Alpha of a pixel in transfer form.
    pub fn get_alpha_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_alpha(pixel_of(pixel, self.base.transfer_type)?)
    }

    /// ARGB of a pixel in transfer form.
    pub fn get_rgb_elements(&self, pixel: &DataElements) -> ColorResult<i32> {
        self.get_rgb(pixel_of(pixel, self.base.transfer_type)?)
    }

    // ------------------------------------------------------------------------
    // Reverse lookup
    // ------------------------------------------------------------------------

    /// Index of the palette entry closest to an ARGB color.
    pub fn get_data_elements(&self, rgb: i32, reuse: Option<DataElements>) -> ColorResult<DataElements> {
        let index = self.lookup(rgb);
        Ok(install_pixel(self.base.transfer_type, index as i32, reuse))
    }

    fn lookup(&self, rgb: i32) -> u32 {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&(_, index)) = cache.iter().rev().find(|&&(key, _)| key == rgb) {
            return index;
        }
        let index = self.search(rgb as u32) as u32;
        if cache.len() == LOOKUP_CACHE_PAIRS {
            cache.pop_front();
        }
        cache.push_back((rgb, index));
        index
    }

    fn search(&self, argb: u32) -> usize {
        let [red, green, blue, alpha] = channels(argb);
        let lut = &self.rgb[..self.map_size];

        if self.all_gray_opaque {
            let gray = (red * 77 + green * 150 + blue * 29 + 128) / 256;
            let mut min_dist = 256;
            let mut pix = 0;
            for (i, &c) in lut.iter().enumerate() {
                if c == 0 {
                    continue;
                }
                let d = ((c & 0xff) as i32 - gray).abs();
                if d < min_dist {
                    pix = i;
                    if d == 0 {
                        break;
                    }
                    min_dist = d;
                }
            }
            return pix;
        }

        if self.base.transparency == Transparency::Opaque {
            if let Some(i) = lut.iter().position(|&c| c == argb && c != 0) {
                return i;
            }
            let mut smallest = i32::MAX;
            let mut pix = 0;
            for (i, &c) in lut.iter().enumerate() {
                if c == 0 {
                    continue;
                }
                let e = channels(c);
                let mut err = (e[0] - red).pow(2);
                if err >= smallest {
                    continue;
                }
                err += (e[1] - green).pow(2);
                if err >= smallest {
                    continue;
                }
                err += (e[2] - blue).pow(2);
                if err < smallest {
                    pix = i;
                    smallest = err;
                }
            }
            return pix;
        }

        if alpha == 0 {
            if let Some(t) = self.transparent_index {
                return t;
            }
        }

        let valid = |i: usize| self.valid.as_ref().is_none_or(|v| v.contains(i));
        let mut smallest = i32::MAX;
        let mut pix = 0;
        for (i, &c) in lut.iter().enumerate() {
            if c == argb {
                if !valid(i) {
                    continue;
                }
                return i;
            }
            let e = channels(c);
            let mut err = (e[0] - red).pow(2);
            if err >= smallest {
                continue;
            }
            err += (e[1] - green).pow(2);
            if err >= smallest {
                continue;
            }
            err += (e[2] - blue).pow(2);
            if err >= smallest {
                continue;
            }
            err += (e[3] - alpha).pow(2);
            if err < smallest && valid(i) {
                pix = i;
                smallest = err;
            }
        }
        pix
    }

    // ------------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------------

    /// `[r, g, b]`, plus alpha when the model has it, of the entry `pixel` selects.
    pub fn get_components(&self, pixel: i32) -> ColorResult<Vec<i32>> {
        let c = channels(self.entry(pixel));
        Ok(c[..self.base.num_components].to_vec())
    }

    /// Components of a pixel in transfer form.
    pub fn get_components_elements(&self, pixel: &DataElements) -> ColorResult<Vec<i32>> {
        self.get_components(pixel_of(pixel, self.base.transfer_type)?)
    }

    fn argb_of(&self, components: &[i32]) -> ColorResult<i32> {
        self.base.require_components(components.len())?;
        let alpha = if self.base.has_alpha { components[3] & 0xff } else { 0xff };
        Ok(alpha << 24 | (components[0] & 0xff) << 16 | (components[1] & 0xff) << 8 | (components[2] & 0xff))
    }

    /// Index of the entry closest to the color `components` describe.
    pub fn get_data_element(&self, components: &[i32]) -> ColorResult<i32> {
        Ok(self.lookup(self.argb_of(components)?) as i32)
    }

    /// Like [`get_data_element`](Self::get_data_element), in transfer form.
    pub fn get_data_elements_from_components(
        &self,
        components: &[i32],
        reuse: Option<DataElements>,
    ) -> ColorResult<DataElements> {
        self.get_data_elements(self.argb_of(components)?, reuse)
    }

    /// Normalized components of a pixel in transfer form.
    pub fn get_normalized_components(&self, pixel: &DataElements) -> ColorResult<Vec<f32>> {
        self.base.normalized_from(&self.get_components_elements(pixel)?)
    }

    /// Normalized components from unnormalized ones.
    pub fn get_normalized_components_from(&self, components: &[i32]) -> ColorResult<Vec<f32>> {
        self.base.normalized_from(components)
    }

    /// Unnormalized components from normalized ones.
    pub fn get_unnormalized_components(&self, norm: &[f32]) -> ColorResult<Vec<i32>> {
        self.base.unnormalized(norm)
    }

    /// Pixel in transfer form from normalized components.
    pub fn get_data_elements_normalized(&self, norm: &[f32], reuse: Option<DataElements>) -> ColorResult<DataElements> {
        self.get_data_elements_from_components(&self.base.unnormalized(norm)?, reuse)
    }

    /// Index from normalized components.
    pub fn get_data_element_normalized(&self, norm: &[f32]) -> ColorResult<i32> {
        self.get_data_element(&self.base.unnormalized(norm)?)
    }

    // ------------------------------------------------------------------------
    // Rasters
    // ------------------------------------------------------------------------

    /// Always fails; palette pixels have no separable alpha.
    pub fn coerce_data(&self, _raster: &WritableRaster, _premultiplied: bool) -> ColorResult<ColorModel> {
        Err(ColorError::unsupported("coerce_data is not supported by IndexColorModel"))
    }

    /// One band of the same transfer type, wide enough for every index.
    pub fn is_compatible_raster(&self, raster: &Raster) -> bool {
        let size = raster.sample_model().layout().sample_size(0);
        raster.transfer_type() == self.base.transfer_type
            && raster.num_bands() == 1
            && (1u64 << size.min(63)) >= self.map_size as u64
    }

    /// One-band component or bit-packed layout of the same transfer type.
    pub fn is_compatible_sample_model(&self, sample_model: &SampleModel) -> bool {
        (sample_model.as_component().is_some() || sample_model.as_multi_pixel_packed().is_some())
            && sample_model.layout().transfer_type() == self.base.transfer_type
            && sample_model.layout().num_bands() == 1
    }

    /// Bit-packed for 1, 2 or 4 bits, else one interleaved byte or ushort band.
    pub fn create_compatible_writable_raster(&self, width: i32, height: i32) -> ColorResult<WritableRaster> {
        let bits = self.base.pixel_bits;
        let raster = match bits {
            1 | 2 | 4 => WritableRaster::create_packed_bits(DataType::Byte, width, height, 1, bits, (0, 0))?,
            _ if bits <= 8 => WritableRaster::create_interleaved(DataType::Byte, width, height, 1, (0, 0))?,
            _ if bits <= 16 => WritableRaster::create_interleaved(DataType::UShort, width, height, 1, (0, 0))?,
            _ => {
                return Err(ColorError::unsupported(format!(
                    "no compatible raster for {bits}-bit palettes"
                )));
            }
        };
        Ok(raster)
    }

    /// Bit-packed for 1, 2 or 4 bits, else a single-band component layout.
    pub fn create_compatible_sample_model(&self, width: i32, height: i32) -> ColorResult<SampleModel> {
        let bits = self.base.pixel_bits;
        let tt = self.base.transfer_type;
        let sm = match bits {
            1 | 2 | 4 => SampleModel::multi_pixel_packed(tt, width, height, bits)?,
            _ => SampleModel::pixel_interleaved(tt, width, height, 1, width.max(0) as usize, vec![0])?,
        };
        Ok(sm)
    }

    /// Palette models expose no alpha raster.
    pub fn alpha_raster(&self, _raster: &WritableRaster) -> ColorResult<Option<WritableRaster>> {
        Ok(None)
    }
}

/// Raw ARGB entries of [`IndexColorModel::default_indexed`], alpha 0.
pub fn default_palette() -> Vec<i32> {
    let mut cmap = Vec::with_capacity(256);
    for r in (0..256).step_by(51) {
        for g in (0..256).step_by(51) {
            for b in (0..256).step_by(51) {
                cmap.push(r << 16 | g << 8 | b);
            }
        }
    }
    let incr = 256 / (256 - cmap.len() as i32);
    let mut gray = incr * 3;
    while cmap.len() < 256 {
        cmap.push(gray << 16 | gray << 8 | gray);
        gray += incr;
    }
    cmap
}
