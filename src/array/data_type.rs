//! Data types.
//!
//! A [`Dtype`] is a fixed width scalar type: a [`DataType`] (kind and byte width) and, for multi-byte types, an [`Endianness`].
//! It is recorded in metadata as a string code like `<f8` (a little endian 8 byte float) or `|u1`.

use derive_more::Display;
use thiserror::Error;

use crate::metadata::FillValueMetadata;

use super::{Endianness, FillValue};

/// A data type kind and width.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
#[non_exhaustive]
pub enum DataType {
    /// `bool` Boolean.
    #[display("bool")]
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    #[display("int8")]
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    #[display("int16")]
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    #[display("int32")]
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    #[display("int64")]
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[display("uint8")]
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    #[display("uint16")]
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    #[display("uint32")]
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    #[display("uint64")]
    UInt64,
    /// `float16` IEEE 754 half-precision floating point.
    #[display("float16")]
    Float16,
    /// `float32` IEEE 754 single-precision floating point.
    #[display("float32")]
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    #[display("float64")]
    Float64,
}

/// An unsupported data type error.
#[derive(Debug, Error)]
#[error("data type {0} is not supported")]
pub struct UnsupportedDataTypeError(String);

/// An incompatible fill value metadata error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueMetadataError(String, FillValueMetadata);

/// A fill value incompatible with a data type.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(String, FillValue);

impl IncompatibleFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub const fn new(data_type_name: String, fill_value: FillValue) -> Self {
        Self(data_type_name, fill_value)
    }
}

impl DataType {
    /// Returns the size in bytes of an element of the data type.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    const fn kind_char(&self) -> char {
        match self {
            Self::Bool => 'b',
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => 'i',
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 => 'u',
            Self::Float16 | Self::Float32 | Self::Float64 => 'f',
        }
    }

    fn from_kind_size(kind: char, size: &str) -> Option<Self> {
        Some(match (kind, size) {
            ('b', "1") => Self::Bool,
            ('i', "1") => Self::Int8,
            ('i', "2") => Self::Int16,
            ('i', "4") => Self::Int32,
            ('i', "8") => Self::Int64,
            ('u', "1") => Self::UInt8,
            ('u', "2") => Self::UInt16,
            ('u', "4") => Self::UInt32,
            ('u', "8") => Self::UInt64,
            ('f', "2") => Self::Float16,
            ('f', "4") => Self::Float32,
            ('f', "8") => Self::Float64,
            _ => return None,
        })
    }

    /// Create a fill value from metadata.
    ///
    /// A `null` fill value is all zero bytes.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is incompatible with the data type.
    #[allow(clippy::cast_possible_truncation)]
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &FillValueMetadata,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        let err = || IncompatibleFillValueMetadataError(self.to_string(), fill_value.clone());
        macro_rules! integer {
            ( $t:ty ) => {{
                let FillValueMetadata::Number(number) = fill_value else {
                    return Err(err());
                };
                let value: $t = if let Some(value) = number.as_i64() {
                    <$t>::try_from(value).map_err(|_| err())?
                } else if let Some(value) = number.as_u64() {
                    <$t>::try_from(value).map_err(|_| err())?
                } else {
                    return Err(err());
                };
                FillValue::from(value)
            }};
        }
        let float = || -> Result<f64, IncompatibleFillValueMetadataError> {
            match fill_value {
                FillValueMetadata::Number(number) => number.as_f64().ok_or_else(err),
                FillValueMetadata::NaN => Ok(f64::NAN),
                FillValueMetadata::Infinity => Ok(f64::INFINITY),
                FillValueMetadata::NegInfinity => Ok(f64::NEG_INFINITY),
                _ => Err(err()),
            }
        };

        if fill_value == &FillValueMetadata::Null {
            return Ok(FillValue::new(vec![0; self.size()]));
        }
        Ok(match self {
            Self::Bool => match fill_value {
                FillValueMetadata::Bool(value) => FillValue::from(*value),
                FillValueMetadata::Number(number) => match number.as_u64() {
                    Some(0) => FillValue::from(false),
                    Some(1) => FillValue::from(true),
                    _ => return Err(err()),
                },
                _ => return Err(err()),
            },
            Self::Int8 => integer!(i8),
            Self::Int16 => integer!(i16),
            Self::Int32 => integer!(i32),
            Self::Int64 => integer!(i64),
            Self::UInt8 => integer!(u8),
            Self::UInt16 => integer!(u16),
            Self::UInt32 => integer!(u32),
            Self::UInt64 => integer!(u64),
            Self::Float16 => FillValue::from(half::f16::from_f64(float()?)),
            Self::Float32 => FillValue::from(float()? as f32),
            Self::Float64 => FillValue::from(float()?),
        })
    }

    /// Create fill value metadata.
    ///
    /// # Errors
    /// Returns an [`IncompatibleFillValueError`] if the size of `fill_value` does not match the data type size.
    pub fn metadata_fill_value(
        &self,
        fill_value: &FillValue,
    ) -> Result<FillValueMetadata, IncompatibleFillValueError> {
        let err = || IncompatibleFillValueError(self.to_string(), fill_value.clone());
        let bytes = fill_value.as_ne_bytes();
        if bytes.len() != self.size() {
            return Err(err());
        }
        macro_rules! from_ne_bytes {
            ( $t:ty ) => {{
                let bytes: [u8; std::mem::size_of::<$t>()] = bytes.try_into().map_err(|_| err())?;
                <$t>::from_ne_bytes(bytes)
            }};
        }
        Ok(match self {
            Self::Bool => match bytes[0] {
                0 => FillValueMetadata::Bool(false),
                1 => FillValueMetadata::Bool(true),
                _ => return Err(err()),
            },
            Self::Int8 => FillValueMetadata::from(i64::from(from_ne_bytes!(i8))),
            Self::Int16 => FillValueMetadata::from(i64::from(from_ne_bytes!(i16))),
            Self::Int32 => FillValueMetadata::from(i64::from(from_ne_bytes!(i32))),
            Self::Int64 => FillValueMetadata::from(from_ne_bytes!(i64)),
            Self::UInt8 => FillValueMetadata::from(u64::from(from_ne_bytes!(u8))),
            Self::UInt16 => FillValueMetadata::from(u64::from(from_ne_bytes!(u16))),
            Self::UInt32 => FillValueMetadata::from(u64::from(from_ne_bytes!(u32))),
            Self::UInt64 => FillValueMetadata::from(from_ne_bytes!(u64)),
            Self::Float16 => FillValueMetadata::from(from_ne_bytes!(half::f16).to_f64()),
            Self::Float32 => FillValueMetadata::from(f64::from(from_ne_bytes!(f32))),
            Self::Float64 => FillValueMetadata::from(from_ne_bytes!(f64)),
        })
    }
}

/// A fixed width scalar data type with an endianness.
///
/// Single byte data types have no endianness.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dtype {
    data_type: DataType,
    endianness: Option<Endianness>,
}

impl Dtype {
    /// Create a new [`Dtype`].
    ///
    /// `endianness` is ignored for single byte data types.
    #[must_use]
    pub const fn new(data_type: DataType, endianness: Endianness) -> Self {
        Self {
            data_type,
            endianness: if data_type.size() > 1 {
                Some(endianness)
            } else {
                None
            },
        }
    }

    /// Create a new [`Dtype`] with the endianness of the CPU.
    #[must_use]
    pub const fn native(data_type: DataType) -> Self {
        Self::new(data_type, super::NATIVE_ENDIAN)
    }

    /// Returns the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the endianness, or [`None`] for single byte data types.
    #[must_use]
    pub const fn endianness(&self) -> Option<Endianness> {
        self.endianness
    }

    /// Returns the size in bytes of an element.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.data_type.size()
    }

    /// Returns true if stored elements have a different byte order to the CPU.
    #[must_use]
    pub fn is_byte_swapped(&self) -> bool {
        self.endianness.is_some_and(|endianness| !endianness.is_native())
    }
}

impl From<DataType> for Dtype {
    fn from(data_type: DataType) -> Self {
        Self::native(data_type)
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let byteorder = self.endianness.map_or('|', Endianness::dtype_char);
        write!(
            f,
            "{byteorder}{}{}",
            self.data_type.kind_char(),
            self.data_type.size()
        )
    }
}

impl std::str::FromStr for Dtype {
    type Err = UnsupportedDataTypeError;

    fn from_str(dtype: &str) -> Result<Self, Self::Err> {
        let err = || UnsupportedDataTypeError(dtype.to_string());
        if dtype == "bool" {
            return Ok(Self::native(DataType::Bool));
        }
        let (endianness, code) = match dtype.chars().next() {
            Some('<') => (Some(Endianness::Little), &dtype[1..]),
            Some('>') => (Some(Endianness::Big), &dtype[1..]),
            Some('|') => (None, &dtype[1..]),
            _ => (None, dtype),
        };
        let mut chars = code.chars();
        let kind = chars.next().ok_or_else(err)?;
        let data_type = DataType::from_kind_size(kind, chars.as_str()).ok_or_else(err)?;
        match (data_type.size(), endianness) {
            (1, _) => Ok(Self::native(data_type)),
            (_, Some(endianness)) => Ok(Self::new(data_type, endianness)),
            (_, None) => Err(err()),
        }
    }
}
