//! Sample storage shared between rasters.
//!
//! A [`DataBuffer`] owns one or more equally sized banks of a single
//! [`DataType`]. Cloning a `DataBuffer` does **not** copy pixels: every clone
//! is an alias of the same banks, which is how child rasters see the writes
//! of their parent and vice versa.
//!
//! # Addressing
//!
//! Element `i` of bank `b` lives at physical index `offsets[b] + i`. Offsets
//! let several buffers start at different positions of caller-supplied
//! vectors without copying.
//!
//! # Element widening
//!
//! [`BankData::elem`] returns `i32` following the transfer-array rules: bytes
//! and ushorts zero-extend, shorts sign-extend, floats truncate toward zero.
//! Float paths ([`BankData::elem_f32`], [`BankData::elem_f64`]) never lose
//! the fraction of floating-point banks.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{DataBuffer, DataType};
//!
//! let buf = DataBuffer::new(DataType::UShort, 16, 2);
//! let alias = buf.clone();
//! alias.set_elem(1, 3, 0x1_2345).unwrap();
//! assert_eq!(buf.elem(1, 3).unwrap(), 0x2345);
//! assert!(buf.ptr_eq(&alias));
//! ```
//!
//! # Locking
//!
//! Banks sit behind an `RwLock`. Bulk operations take one guard through
//! [`DataBuffer::read`] / [`DataBuffer::write`] and release it before
//! returning; no method holds a guard while calling another accessor.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::elements::DataElements;
use crate::error::{Error, Result};
use crate::format::DataType;

#[derive(Debug)]
enum Banks {
    Byte(Vec<Vec<u8>>),
    UShort(Vec<Vec<u16>>),
    Short(Vec<Vec<i16>>),
    Int(Vec<Vec<i32>>),
    Float(Vec<Vec<f32>>),
    Double(Vec<Vec<f64>>),
}

impl Banks {
    fn zeroed(data_type: DataType, lens: &[usize]) -> Self {
        match data_type {
            DataType::Byte => Self::Byte(lens.iter().map(|&n| vec![0; n]).collect()),
            DataType::UShort => Self::UShort(lens.iter().map(|&n| vec![0; n]).collect()),
            DataType::Short => Self::Short(lens.iter().map(|&n| vec![0; n]).collect()),
            DataType::Int => Self::Int(lens.iter().map(|&n| vec![0; n]).collect()),
            DataType::Float => Self::Float(lens.iter().map(|&n| vec![0.0; n]).collect()),
            DataType::Double => Self::Double(lens.iter().map(|&n| vec![0.0; n]).collect()),
        }
    }

    fn bank_len(&self, bank: usize) -> usize {
        match self {
            Self::Byte(b) => b[bank].len(),
            Self::UShort(b) => b[bank].len(),
            Self::Short(b) => b[bank].len(),
            Self::Int(b) => b[bank].len(),
            Self::Float(b) => b[bank].len(),
            Self::Double(b) => b[bank].len(),
        }
    }
}

/// Lock-scoped view of the banks of a [`DataBuffer`].
///
/// Obtained through [`DataBuffer::read`] or [`DataBuffer::write`]. All
/// indices are logical: the bank offset is added internally.
#[derive(Debug)]
pub struct BankData {
    banks: Banks,
    offsets: Vec<usize>,
    size: usize,
}

impl BankData {
    #[inline]
    fn physical(&self, bank: usize, i: usize) -> Result<usize> {
        let out = Error::IndexOutOfBounds {
            bank,
            index: i,
            len: self.size,
        };
        let Some(&offset) = self.offsets.get(bank) else {
            return Err(out);
        };
        let p = offset.checked_add(i).ok_or_else(|| out.clone())?;
        if p >= self.banks.bank_len(bank) {
            return Err(out);
        }
        Ok(p)
    }

    #[inline]
    fn put_i32(&mut self, bank: usize, p: usize, v: i32) {
        match &mut self.banks {
            Banks::Byte(b) => b[bank][p] = v as u8,
            Banks::UShort(b) => b[bank][p] = v as u16,
            Banks::Short(b) => b[bank][p] = v as i16,
            Banks::Int(b) => b[bank][p] = v,
            Banks::Float(b) => b[bank][p] = v as f32,
            Banks::Double(b) => b[bank][p] = v as f64,
        }
    }

    /// Element `i` of `bank`, widened to `i32`.
    #[inline]
    pub fn elem(&self, bank: usize, i: usize) -> Result<i32> {
        let p = self.physical(bank, i)?;
        Ok(match &self.banks {
            Banks::Byte(b) => b[bank][p] as i32,
            Banks::UShort(b) => b[bank][p] as i32,
            Banks::Short(b) => b[bank][p] as i32,
            Banks::Int(b) => b[bank][p],
            Banks::Float(b) => b[bank][p] as i32,
            Banks::Double(b) => b[bank][p] as i32,
        })
    }

    /// Element `i` of `bank` as `f32`.
    #[inline]
    pub fn elem_f32(&self, bank: usize, i: usize) -> Result<f32> {
        let p = self.physical(bank, i)?;
        Ok(match &self.banks {
            Banks::Float(b) => b[bank][p],
            Banks::Double(b) => b[bank][p] as f32,
            _ => self.elem(bank, i)? as f32,
        })
    }

    /// Element `i` of `bank` as `f64`.
    #[inline]
    pub fn elem_f64(&self, bank: usize, i: usize) -> Result<f64> {
        let p = self.physical(bank, i)?;
        Ok(match &self.banks {
            Banks::Float(b) => b[bank][p] as f64,
            Banks::Double(b) => b[bank][p],
            _ => self.elem(bank, i)? as f64,
        })
    }

    /// Stores `v` into element `i` of `bank`, truncating to the element width.
    #[inline]
    pub fn set_elem(&mut self, bank: usize, i: usize, v: i32) -> Result<()> {
        let p = self.physical(bank, i)?;
        self.put_i32(bank, p, v);
        Ok(())
    }

    /// Stores `v` into element `i` of `bank`; integer banks truncate toward zero.
    #[inline]
    pub fn set_elem_f32(&mut self, bank: usize, i: usize, v: f32) -> Result<()> {
        let p = self.physical(bank, i)?;
        let stored = match &mut self.banks {
            Banks::Float(b) => {
                b[bank][p] = v;
                true
            }
            Banks::Double(b) => {
                b[bank][p] = v as f64;
                true
            }
            _ => false,
        };
        if !stored {
            self.put_i32(bank, p, v as i32);
        }
        Ok(())
    }

    /// Stores `v` into element `i` of `bank`; integer banks truncate toward zero.
    #[inline]
    pub fn set_elem_f64(&mut self, bank: usize, i: usize, v: f64) -> Result<()> {
        let p = self.physical(bank, i)?;
        let stored = match &mut self.banks {
            Banks::Float(b) => {
                b[bank][p] = v as f32;
                true
            }
            Banks::Double(b) => {
                b[bank][p] = v;
                true
            }
            _ => false,
        };
        if !stored {
            self.put_i32(bank, p, v as i32);
        }
        Ok(())
    }

    /// Copies element `i` of `bank` into `out[slot]` without losing precision
    /// when the types match.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= out.len()`.
    #[inline]
    pub fn load(&self, bank: usize, i: usize, out: &mut DataElements, slot: usize) -> Result<()> {
        let p = self.physical(bank, i)?;
        match (&self.banks, out) {
            (Banks::Byte(b), DataElements::Byte(o)) => o[slot] = b[bank][p],
            (Banks::UShort(b), DataElements::UShort(o)) => o[slot] = b[bank][p],
            (Banks::Short(b), DataElements::Short(o)) => o[slot] = b[bank][p],
            (Banks::Int(b), DataElements::Int(o)) => o[slot] = b[bank][p],
            (Banks::Float(b), DataElements::Float(o)) => o[slot] = b[bank][p],
            (Banks::Double(b), DataElements::Double(o)) => o[slot] = b[bank][p],
            (Banks::Float(b), o) => o.set_f64(slot, b[bank][p] as f64),
            (Banks::Double(b), o) => o.set_f64(slot, b[bank][p]),
            (_, o) => o.set_i32(slot, self.elem(bank, i)?),
        }
        Ok(())
    }

    /// Stores `src[slot]` into element `i` of `bank`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= src.len()`.
    #[inline]
    pub fn store(&mut self, bank: usize, i: usize, src: &DataElements, slot: usize) -> Result<()> {
        let p = self.physical(bank, i)?;
        let stored = match (&mut self.banks, src) {
            (Banks::Byte(b), DataElements::Byte(s)) => {
                b[bank][p] = s[slot];
                true
            }
            (Banks::UShort(b), DataElements::UShort(s)) => {
                b[bank][p] = s[slot];
                true
            }
            (Banks::Short(b), DataElements::Short(s)) => {
                b[bank][p] = s[slot];
                true
            }
            (Banks::Int(b), DataElements::Int(s)) => {
                b[bank][p] = s[slot];
                true
            }
            (Banks::Float(b), s) => {
                b[bank][p] = s.get_f32(slot);
                true
            }
            (Banks::Double(b), s) => {
                b[bank][p] = s.get_f64(slot);
                true
            }
            _ => false,
        };
        if !stored {
            self.put_i32(bank, p, src.get_i32(slot));
        }
        Ok(())
    }
}

/// Banked element storage with aliasing clones.
///
/// The element type, bank count, size and offsets are fixed at construction;
/// element values are mutable through any alias.
#[derive(Debug, Clone)]
pub struct DataBuffer {
    data_type: DataType,
    size: usize,
    offsets: Arc<[usize]>,
    data: Arc<RwLock<BankData>>,
}

macro_rules! bank_constructors {
    ($one:ident, $many:ident, $t:ty, $variant:ident, $dt:expr) => {
        #[doc = concat!("Wraps a single `", stringify!($t), "` bank; size is its length.")]
        pub fn $one(data: Vec<$t>) -> Self {
            Self::$many(vec![data])
        }

        #[doc = concat!("Wraps several `", stringify!($t), "` banks; size is the shortest length.")]
        pub fn $many(banks: Vec<Vec<$t>>) -> Self {
            let size = banks.iter().map(Vec::len).min().unwrap_or(0);
            let offsets = vec![0; banks.len()];
            Self::from_parts($dt, size, offsets, Banks::$variant(banks))
        }
    };
}

impl DataBuffer {
    /// Allocates `num_banks` zeroed banks of `size` elements each.
    ///
    /// A bank count of zero is raised to one.
    pub fn new(data_type: DataType, size: usize, num_banks: usize) -> Self {
        Self::with_offsets(data_type, size, vec![0; num_banks.max(1)])
    }

    /// Allocates one zeroed bank per offset, each `offset + size` long.
    pub fn with_offsets(data_type: DataType, size: usize, offsets: Vec<usize>) -> Self {
        let lens: Vec<usize> = offsets.iter().map(|&o| o + size).collect();
        Self::from_parts(data_type, size, offsets, Banks::zeroed(data_type, &lens))
    }

    fn from_parts(data_type: DataType, size: usize, offsets: Vec<usize>, banks: Banks) -> Self {
        Self {
            data_type,
            size,
            offsets: offsets.clone().into(),
            data: Arc::new(RwLock::new(BankData {
                banks,
                offsets,
                size,
            })),
        }
    }

    bank_constructors!(from_u8, from_u8_banks, u8, Byte, DataType::Byte);
    bank_constructors!(from_u16, from_u16_banks, u16, UShort, DataType::UShort);
    bank_constructors!(from_i16, from_i16_banks, i16, Short, DataType::Short);
    bank_constructors!(from_i32, from_i32_banks, i32, Int, DataType::Int);
    bank_constructors!(from_f32, from_f32_banks, f32, Float, DataType::Float);
    bank_constructors!(from_f64, from_f64_banks, f64, Double, DataType::Double);

    /// Element type of every bank.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Addressable elements per bank.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of banks.
    #[inline]
    pub fn num_banks(&self) -> usize {
        self.offsets.len()
    }

    /// Offset of the first bank.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offsets.first().copied().unwrap_or(0)
    }

    /// Per-bank offsets.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Returns `true` if both handles alias the same banks.
    #[inline]
    pub fn ptr_eq(&self, other: &DataBuffer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Shared guard over the banks.
    pub fn read(&self) -> RwLockReadGuard<'_, BankData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive guard over the banks.
    pub fn write(&self) -> RwLockWriteGuard<'_, BankData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Element `i` of `bank`, widened to `i32`.
    #[inline]
    pub fn elem(&self, bank: usize, i: usize) -> Result<i32> {
        self.read().elem(bank, i)
    }

    /// Element `i` of `bank` as `f32`.
    #[inline]
    pub fn elem_f32(&self, bank: usize, i: usize) -> Result<f32> {
        self.read().elem_f32(bank, i)
    }

    /// Element `i` of `bank` as `f64`.
    #[inline]
    pub fn elem_f64(&self, bank: usize, i: usize) -> Result<f64> {
        self.read().elem_f64(bank, i)
    }

    /// Stores `v` into element `i` of `bank`.
    #[inline]
    pub fn set_elem(&self, bank: usize, i: usize, v: i32) -> Result<()> {
        self.write().set_elem(bank, i, v)
    }

    /// Stores `v` into element `i` of `bank`.
    #[inline]
    pub fn set_elem_f32(&self, bank: usize, i: usize, v: f32) -> Result<()> {
        self.write().set_elem_f32(bank, i, v)
    }

    /// Stores `v` into element `i` of `bank`.
    #[inline]
    pub fn set_elem_f64(&self, bank: usize, i: usize, v: f64) -> Result<()> {
        self.write().set_elem_f64(bank, i, v)
    }

    /// Copies the addressable elements of `bank` out as `f64`.
    pub fn bank_to_vec(&self, bank: usize) -> Result<Vec<f64>> {
        let guard = self.read();
        (0..self.size).map(|i| guard.elem_f64(bank, i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zeroed_banks() {
        let buf = DataBuffer::new(DataType::Int, 4, 3);
        assert_eq!(buf.num_banks(), 3);
        assert_eq!(buf.size(), 4);
        for bank in 0..3 {
            assert_eq!(buf.bank_to_vec(bank).unwrap(), vec![0.0; 4]);
        }
    }

    #[test]
    fn test_widening_rules() {
        let buf = DataBuffer::from_u8(vec![0xff]);
        assert_eq!(buf.elem(0, 0).unwrap(), 255);
        let buf = DataBuffer::from_u16(vec![0xffff]);
        assert_eq!(buf.elem(0, 0).unwrap(), 65535);
        let buf = DataBuffer::from_i16(vec![-7]);
        assert_eq!(buf.elem(0, 0).unwrap(), -7);
        let buf = DataBuffer::from_f32(vec![-1.9]);
        assert_eq!(buf.elem(0, 0).unwrap(), -1);
        assert_eq!(buf.elem_f32(0, 0).unwrap(), -1.9);
    }

    #[test]
    fn test_float_banks_widen() {
        let buf = DataBuffer::from_f32(vec![0.1, -2.5]);
        assert_relative_eq!(buf.elem_f64(0, 0).unwrap(), 0.1, epsilon = 1e-7);
        assert_relative_eq!(buf.elem_f64(0, 1).unwrap(), -2.5);
        buf.set_elem_f64(0, 1, 1.0 / 3.0).unwrap();
        assert_relative_eq!(buf.elem_f32(0, 1).unwrap(), 1.0 / 3.0, epsilon = 1e-7);
    }

    #[test]
    fn test_offsets() {
        let buf = DataBuffer::with_offsets(DataType::Byte, 2, vec![1, 3]);
        buf.set_elem(0, 0, 10).unwrap();
        buf.set_elem(1, 1, 20).unwrap();
        assert_eq!(buf.elem(0, 0).unwrap(), 10);
        assert_eq!(buf.elem(1, 1).unwrap(), 20);
        assert_eq!(buf.offsets(), &[1, 3]);
        assert!(buf.elem(1, 2).is_err());
    }

    #[test]
    fn test_clone_aliases() {
        let a = DataBuffer::new(DataType::Double, 8, 1);
        let b = a.clone();
        b.set_elem_f64(0, 5, 0.125).unwrap();
        assert_eq!(a.elem_f64(0, 5).unwrap(), 0.125);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&DataBuffer::new(DataType::Double, 8, 1)));
    }

    #[test]
    fn test_out_of_range() {
        let buf = DataBuffer::new(DataType::Short, 4, 1);
        assert!(matches!(
            buf.elem(0, 4),
            Err(Error::IndexOutOfBounds { bank: 0, index: 4, .. })
        ));
        assert!(buf.elem(1, 0).unwrap_err().is_bounds_error());
    }

    #[test]
    fn test_load_store_exact() {
        let buf = DataBuffer::from_f64(vec![0.0; 2]);
        let src = DataElements::Double(vec![1.0e-300]);
        buf.write().store(0, 1, &src, 0).unwrap();
        let mut out = DataElements::new(DataType::Double, 1);
        buf.read().load(0, 1, &mut out, 0).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_set_truncates() {
        let buf = DataBuffer::new(DataType::Byte, 1, 1);
        buf.set_elem(0, 0, 0x1234).unwrap();
        assert_eq!(buf.elem(0, 0).unwrap(), 0x34);
        buf.set_elem_f32(0, 0, 7.9).unwrap();
        assert_eq!(buf.elem(0, 0).unwrap(), 7);
    }
}
