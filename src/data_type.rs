//! Data types of on-disk and decoded arrays.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A data type.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, Debug)]
#[rustfmt::skip]
pub enum DataType {
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    #[serde(rename = "int8")]
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    #[serde(rename = "int16")]
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    #[serde(rename = "int32")]
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    #[serde(rename = "int64")]
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[serde(rename = "uint8")]
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    #[serde(rename = "uint16")]
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    #[serde(rename = "uint32")]
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    #[serde(rename = "uint64")]
    UInt64,
    /// `float32` IEEE 754 single-precision floating point: sign bit, 8 bits exponent, 23 bits mantissa.
    #[serde(rename = "float32")]
    Float32,
    /// `float64` IEEE 754 double-precision floating point: sign bit, 11 bits exponent, 52 bits mantissa.
    #[serde(rename = "float64")]
    Float64,
    /// A variable length UTF-8 encoded string.
    #[serde(rename = "string")]
    String,
    /// A datetime with a resolution of one second.
    #[serde(rename = "datetime64[s]")]
    DateTime,
}

/// The size of a data type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataTypeSize {
    /// Fixed size (in bytes).
    Fixed(usize),
    /// Variable sized.
    Variable,
}

/// An unsupported data type error.
#[derive(Clone, Debug, Error)]
#[error("unsupported data type {0}")]
pub struct UnsupportedDataTypeError(String);

impl DataType {
    /// Returns the name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::DateTime => "datetime64[s]",
        }
    }

    /// Returns the [`DataTypeSize`].
    #[must_use]
    pub const fn size(&self) -> DataTypeSize {
        match self {
            Self::Int8 | Self::UInt8 => DataTypeSize::Fixed(1),
            Self::Int16 | Self::UInt16 => DataTypeSize::Fixed(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => DataTypeSize::Fixed(4),
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::DateTime => DataTypeSize::Fixed(8),
            Self::String => DataTypeSize::Variable,
        }
    }

    /// Returns the size in bytes of an element for storage planning.
    ///
    /// Variable sized elements are counted as a reference (8 bytes).
    #[must_use]
    pub const fn element_size(&self) -> usize {
        match self.size() {
            DataTypeSize::Fixed(size) => size,
            DataTypeSize::Variable => 8,
        }
    }

    /// Returns true if the data type is a signed or unsigned integer.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    /// Returns true if the data type is a signed integer.
    #[must_use]
    pub const fn is_signed_integer(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns true if the data type is an unsigned integer.
    #[must_use]
    pub const fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    /// Returns true if the data type is a floating point type.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns the inclusive bounds of an integer data type, or [`None`] for non-integer data types.
    #[must_use]
    pub const fn integer_bounds(&self) -> Option<(i128, i128)> {
        match self {
            Self::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::UInt8 => Some((0, u8::MAX as i128)),
            Self::UInt16 => Some((0, u16::MAX as i128)),
            Self::UInt32 => Some((0, u32::MAX as i128)),
            Self::UInt64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }
}

impl FromStr for DataType {
    type Err = UnsupportedDataTypeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "int8" | "i1" | "<i1" | "|i1" => Ok(Self::Int8),
            "int16" | "i2" | "<i2" => Ok(Self::Int16),
            "int32" | "i4" | "<i4" => Ok(Self::Int32),
            "int64" | "i8" | "<i8" => Ok(Self::Int64),
            "uint8" | "u1" | "<u1" | "|u1" => Ok(Self::UInt8),
            "uint16" | "u2" | "<u2" => Ok(Self::UInt16),
            "uint32" | "u4" | "<u4" => Ok(Self::UInt32),
            "uint64" | "u8" | "<u8" => Ok(Self::UInt64),
            "float32" | "f4" | "<f4" => Ok(Self::Float32),
            "float64" | "f8" | "<f8" => Ok(Self::Float64),
            "string" | "str" | "object" => Ok(Self::String),
            "datetime64[s]" | "<M8[s]" => Ok(Self::DateTime),
            _ => Err(UnsupportedDataTypeError(name.to_string())),
        }
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}
