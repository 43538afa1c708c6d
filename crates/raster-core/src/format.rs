//! Element data types for sample storage.
//!
//! [`DataType`] names the numeric type stored in a [`DataBuffer`](crate::DataBuffer)
//! bank and carried in a [`DataElements`](crate::DataElements) transfer array.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::DataType;
//!
//! assert_eq!(DataType::UShort.size(), 16);
//! assert!(DataType::Short.is_signed());
//! assert_eq!(DataType::default_for_bits(12), Some(DataType::UShort));
//! ```

use std::fmt;

/// Numeric type of one stored element.
///
/// # Variants
///
/// Unsigned integer storage:
/// - `Byte` - 8-bit unsigned [0, 255]
/// - `UShort` - 16-bit unsigned [0, 65535]
/// - `Int` - 32-bit, interpreted as raw bits by packed layouts
///
/// Signed storage:
/// - `Short` - 16-bit signed
/// - `Float` - 32-bit IEEE 754
/// - `Double` - 64-bit IEEE 754
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 8-bit unsigned integer.
    Byte,
    /// 16-bit unsigned integer.
    UShort,
    /// 16-bit signed integer.
    Short,
    /// 32-bit integer.
    Int,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
}

impl DataType {
    /// All element types, narrowest integer first.
    pub const ALL: [DataType; 6] = [
        Self::Byte,
        Self::UShort,
        Self::Short,
        Self::Int,
        Self::Float,
        Self::Double,
    ];

    /// Size of one element in bits.
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            Self::Byte => 8,
            Self::UShort | Self::Short => 16,
            Self::Int | Self::Float => 32,
            Self::Double => 64,
        }
    }

    /// Whether sample values may be negative.
    ///
    /// `Int` is not signed here: packed layouts and color models treat its
    /// bits as unsigned.
    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Short | Self::Float | Self::Double)
    }

    /// Whether this is a floating-point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Whether this type can back a bit-packed layout.
    #[inline]
    pub const fn is_packable(self) -> bool {
        matches!(self, Self::Byte | Self::UShort | Self::Int)
    }

    /// Smallest unsigned integer type holding `bits` bits.
    ///
    /// Returns `None` above 32 bits.
    #[inline]
    pub const fn default_for_bits(bits: u32) -> Option<Self> {
        if bits <= 8 {
            Some(Self::Byte)
        } else if bits <= 16 {
            Some(Self::UShort)
        } else if bits <= 32 {
            Some(Self::Int)
        } else {
            None
        }
    }

    /// Lowercase type name.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::UShort => "ushort",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        let sizes: Vec<u32> = DataType::ALL.iter().map(|t| t.size()).collect();
        assert_eq!(sizes, vec![8, 16, 16, 32, 32, 64]);
    }

    #[test]
    fn test_signedness() {
        assert!(!DataType::Byte.is_signed());
        assert!(!DataType::UShort.is_signed());
        assert!(!DataType::Int.is_signed());
        assert!(DataType::Short.is_signed());
        assert!(DataType::Float.is_signed());
        assert!(DataType::Double.is_signed());
    }

    #[test]
    fn test_default_for_bits() {
        assert_eq!(DataType::default_for_bits(1), Some(DataType::Byte));
        assert_eq!(DataType::default_for_bits(8), Some(DataType::Byte));
        assert_eq!(DataType::default_for_bits(9), Some(DataType::UShort));
        assert_eq!(DataType::default_for_bits(24), Some(DataType::Int));
        assert_eq!(DataType::default_for_bits(33), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::UShort.to_string(), "ushort");
    }
}
