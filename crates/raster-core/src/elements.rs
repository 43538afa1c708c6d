//! Typed transfer arrays.
//!
//! A [`DataElements`] value carries the packed form of one or more pixels
//! between a [`SampleModel`](crate::SampleModel) and a color model. Its
//! variant always equals the layout's transfer type.
//!
//! Integer accessors follow the widening rules of the storage:
//!
//! | Variant | `get_i32` |
//! |---------|-----------|
//! | `Byte` | zero-extended (`& 0xff`) |
//! | `UShort` | zero-extended (`& 0xffff`) |
//! | `Short` | sign-extended |
//! | `Int` | as is |
//! | `Float`, `Double` | truncated toward zero |
//!
//! # Reuse
//!
//! Operations that produce pixels accept an `Option<DataElements>` and hand
//! it back when it already has the right type and length, so hot loops can
//! keep one scratch array:
//!
//! ```rust
//! use raster_core::{DataElements, DataType};
//!
//! let scratch = DataElements::new(DataType::Byte, 4);
//! let again = DataElements::reuse(DataType::Byte, 3, Some(scratch));
//! assert_eq!(again.len(), 4);
//! ```

use crate::error::{Error, Result};
use crate::format::DataType;

/// Packed pixel data in one of the six element types.
#[derive(Debug, Clone, PartialEq)]
pub enum DataElements {
    /// Unsigned 8-bit elements.
    Byte(Vec<u8>),
    /// Unsigned 16-bit elements.
    UShort(Vec<u16>),
    /// Signed 16-bit elements.
    Short(Vec<i16>),
    /// 32-bit integer elements.
    Int(Vec<i32>),
    /// 32-bit float elements.
    Float(Vec<f32>),
    /// 64-bit float elements.
    Double(Vec<f64>),
}

impl DataElements {
    /// Allocates `len` zeroed elements of `data_type`.
    pub fn new(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::Byte => Self::Byte(vec![0; len]),
            DataType::UShort => Self::UShort(vec![0; len]),
            DataType::Short => Self::Short(vec![0; len]),
            DataType::Int => Self::Int(vec![0; len]),
            DataType::Float => Self::Float(vec![0.0; len]),
            DataType::Double => Self::Double(vec![0.0; len]),
        }
    }

    /// Returns `prev` if it has type `data_type` and at least `len`
    /// elements, otherwise a new zeroed array.
    pub fn reuse(data_type: DataType, len: usize, prev: Option<DataElements>) -> Self {
        match prev {
            Some(p) if p.data_type() == data_type && p.len() >= len => p,
            _ => Self::new(data_type, len),
        }
    }

    /// Builds an array of `data_type` from integer values, narrowing each.
    pub fn from_i32s(data_type: DataType, values: &[i32]) -> Self {
        let mut out = Self::new(data_type, values.len());
        for (i, &v) in values.iter().enumerate() {
            out.set_i32(i, v);
        }
        out
    }

    /// Element type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Byte(_) => DataType::Byte,
            Self::UShort(_) => DataType::UShort,
            Self::Short(_) => DataType::Short,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::UShort(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    /// Returns `true` if there are no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails with [`Error::BufferTooSmall`] if fewer than `needed` elements.
    #[inline]
    pub fn require_len(&self, needed: usize) -> Result<()> {
        if self.len() < needed {
            return Err(Error::buffer_too_small(needed, self.len()));
        }
        Ok(())
    }

    /// Fails with [`Error::TypeMismatch`] unless the variant is `expected`.
    #[inline]
    pub fn require_type(&self, expected: DataType) -> Result<()> {
        if self.data_type() != expected {
            return Err(Error::TypeMismatch {
                expected,
                got: self.data_type(),
            });
        }
        Ok(())
    }

    /// Element `i` widened to `i32`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn get_i32(&self, i: usize) -> i32 {
        match self {
            Self::Byte(v) => v[i] as i32,
            Self::UShort(v) => v[i] as i32,
            Self::Short(v) => v[i] as i32,
            Self::Int(v) => v[i],
            Self::Float(v) => v[i] as i32,
            Self::Double(v) => v[i] as i32,
        }
    }

    /// Stores `value` into element `i`, truncating to the element width.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn set_i32(&mut self, i: usize, value: i32) {
        match self {
            Self::Byte(v) => v[i] = value as u8,
            Self::UShort(v) => v[i] = value as u16,
            Self::Short(v) => v[i] = value as i16,
            Self::Int(v) => v[i] = value,
            Self::Float(v) => v[i] = value as f32,
            Self::Double(v) => v[i] = value as f64,
        }
    }

    /// Element `i` as `f32`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn get_f32(&self, i: usize) -> f32 {
        match self {
            Self::Float(v) => v[i],
            Self::Double(v) => v[i] as f32,
            _ => self.get_i32(i) as f32,
        }
    }

    /// Stores `value` into element `i`; integer variants truncate toward zero.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn set_f32(&mut self, i: usize, value: f32) {
        match self {
            Self::Float(v) => v[i] = value,
            Self::Double(v) => v[i] = value as f64,
            _ => self.set_i32(i, value as i32),
        }
    }

    /// Element `i` as `f64`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn get_f64(&self, i: usize) -> f64 {
        match self {
            Self::Float(v) => v[i] as f64,
            Self::Double(v) => v[i],
            _ => self.get_i32(i) as f64,
        }
    }

    /// Stores `value` into element `i`; integer variants truncate toward zero.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn set_f64(&mut self, i: usize, value: f64) {
        match self {
            Self::Float(v) => v[i] = value as f32,
            Self::Double(v) => v[i] = value,
            _ => self.set_i32(i, value as i32),
        }
    }

    /// Copies element `src` of `self` into element `dst` of `target`.
    ///
    /// Same-typed copies are bit-exact; otherwise the value goes through
    /// `f64` for float targets and `i32` for integer targets.
    #[inline]
    pub fn copy_to(&self, src: usize, target: &mut DataElements, dst: usize) {
        match (self, &mut *target) {
            (Self::Byte(a), Self::Byte(b)) => b[dst] = a[src],
            (Self::UShort(a), Self::UShort(b)) => b[dst] = a[src],
            (Self::Short(a), Self::Short(b)) => b[dst] = a[src],
            (Self::Int(a), Self::Int(b)) => b[dst] = a[src],
            (Self::Float(a), Self::Float(b)) => b[dst] = a[src],
            (Self::Double(a), Self::Double(b)) => b[dst] = a[src],
            (_, t) if t.data_type().is_float() => t.set_f64(dst, self.get_f64(src)),
            (_, t) => t.set_i32(dst, self.get_i32(src)),
        }
    }

    /// All elements widened to `i32`.
    pub fn to_i32_vec(&self) -> Vec<i32> {
        (0..self.len()).map(|i| self.get_i32(i)).collect()
    }

    /// Borrowed byte slice, if this is the `Byte` variant.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Byte(v) => Some(v),
            _ => None,
        }
    }

    /// Borrowed `u16` slice, if this is the `UShort` variant.
    #[inline]
    pub fn as_ushorts(&self) -> Option<&[u16]> {
        match self {
            Self::UShort(v) => Some(v),
            _ => None,
        }
    }

    /// Borrowed `i32` slice, if this is the `Int` variant.
    #[inline]
    pub fn as_ints(&self) -> Option<&[i32]> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Borrowed `f32` slice, if this is the `Float` variant.
    #[inline]
    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<u8>> for DataElements {
    fn from(v: Vec<u8>) -> Self {
        Self::Byte(v)
    }
}

impl From<Vec<u16>> for DataElements {
    fn from(v: Vec<u16>) -> Self {
        Self::UShort(v)
    }
}

impl From<Vec<i16>> for DataElements {
    fn from(v: Vec<i16>) -> Self {
        Self::Short(v)
    }
}

impl From<Vec<i32>> for DataElements {
    fn from(v: Vec<i32>) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<f32>> for DataElements {
    fn from(v: Vec<f32>) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<f64>> for DataElements {
    fn from(v: Vec<f64>) -> Self {
        Self::Double(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening() {
        let b = DataElements::Byte(vec![0xff]);
        assert_eq!(b.get_i32(0), 255);
        let u = DataElements::UShort(vec![0xffff]);
        assert_eq!(u.get_i32(0), 65535);
        let s = DataElements::Short(vec![-2]);
        assert_eq!(s.get_i32(0), -2);
        let f = DataElements::Float(vec![-3.7]);
        assert_eq!(f.get_i32(0), -3);
    }

    #[test]
    fn test_narrowing() {
        let mut b = DataElements::new(DataType::Byte, 1);
        b.set_i32(0, 0x1ff);
        assert_eq!(b.get_i32(0), 0xff);
        let mut s = DataElements::new(DataType::Short, 1);
        s.set_i32(0, 0xffff);
        assert_eq!(s.get_i32(0), -1);
    }

    #[test]
    fn test_reuse_keeps_matching_array() {
        let prev = DataElements::Int(vec![7, 8, 9]);
        let out = DataElements::reuse(DataType::Int, 2, Some(prev));
        assert_eq!(out, DataElements::Int(vec![7, 8, 9]));
    }

    #[test]
    fn test_reuse_replaces_wrong_type_or_length() {
        let out = DataElements::reuse(DataType::Byte, 2, Some(DataElements::Int(vec![1, 2])));
        assert_eq!(out, DataElements::Byte(vec![0, 0]));
        let out = DataElements::reuse(DataType::Byte, 3, Some(DataElements::Byte(vec![1])));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_copy_to_mixed_types() {
        let src = DataElements::Float(vec![2.9]);
        let mut dst = DataElements::new(DataType::Int, 1);
        src.copy_to(0, &mut dst, 0);
        assert_eq!(dst.get_i32(0), 2);

        let src = DataElements::Double(vec![0.25]);
        let mut dst = DataElements::new(DataType::Float, 1);
        src.copy_to(0, &mut dst, 0);
        assert_eq!(dst.get_f32(0), 0.25);
    }

    #[test]
    fn test_require() {
        let e = DataElements::new(DataType::UShort, 2);
        assert!(e.require_len(2).is_ok());
        assert!(matches!(e.require_len(3), Err(Error::BufferTooSmall { .. })));
        assert!(matches!(e.require_type(DataType::Byte), Err(Error::TypeMismatch { .. })));
    }
}
