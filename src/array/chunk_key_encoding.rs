//! Chunk key encodings. Includes a [default](default::DefaultChunkKeyEncoding) (Zarr V3) and [v2](v2::V2ChunkKeyEncoding) implementation.
//!
//! A chunk key encoding maps chunk grid indices to a key relative to the chunk prefix of an array.
//! The encoding is determined by the metadata generation of the hierarchy and the separator recorded in the array metadata.

mod default;
mod v2;

pub use default::DefaultChunkKeyEncoding;
pub use v2::V2ChunkKeyEncoding;

use derive_more::{Deref, Display, From};

use crate::{metadata::ZarrVersion, storage::StoreKey};

/// A chunk key encoding.
#[derive(Debug, Clone, From, Deref)]
pub struct ChunkKeyEncoding(Box<dyn ChunkKeyEncodingTraits>);

impl ChunkKeyEncoding {
    /// Create a chunk key encoding.
    pub fn new<T: ChunkKeyEncodingTraits + 'static>(chunk_key_encoding: T) -> Self {
        let chunk_key_encoding: Box<dyn ChunkKeyEncodingTraits> = Box::new(chunk_key_encoding);
        chunk_key_encoding.into()
    }

    /// Create the chunk key encoding of a metadata generation with `separator`.
    #[must_use]
    pub fn for_version(version: ZarrVersion, separator: ChunkKeySeparator) -> Self {
        match version {
            ZarrVersion::V2 => Self::new(V2ChunkKeyEncoding::new(separator)),
            ZarrVersion::V3 => Self::new(DefaultChunkKeyEncoding::new(separator)),
        }
    }
}

/// Chunk key encoding traits.
pub trait ChunkKeyEncodingTraits: dyn_clone::DynClone + core::fmt::Debug + Send + Sync {
    /// Returns the separator.
    fn separator(&self) -> ChunkKeySeparator;

    /// Encode chunk grid indices (grid cell coordinates) into a store key relative to the chunk prefix of an array.
    fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey;
}

dyn_clone::clone_trait_object!(ChunkKeyEncodingTraits);

/// A chunk key separator.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ChunkKeySeparator {
    /// The slash '/' character.
    #[display("/")]
    Slash,
    /// The dot '.' character.
    #[display(".")]
    Dot,
}

impl TryFrom<char> for ChunkKeySeparator {
    type Error = char;

    fn try_from(separator: char) -> Result<Self, Self::Error> {
        match separator {
            '/' => Ok(Self::Slash),
            '.' => Ok(Self::Dot),
            _ => Err(separator),
        }
    }
}

impl serde::Serialize for ChunkKeySeparator {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Slash => s.serialize_str("/"),
            Self::Dot => s.serialize_str("."),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ChunkKeySeparator {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        if let serde_json::Value::String(separator) = value {
            if separator == "/" {
                return Ok(Self::Slash);
            } else if separator == "." {
                return Ok(Self::Dot);
            }
        }
        Err(serde::de::Error::custom(
            "chunk key separator must be a `.` or `/`.",
        ))
    }
}

/// Join chunk grid indices with a separator.
fn join_indices(chunk_grid_indices: &[u64], separator: ChunkKeySeparator) -> String {
    itertools::join(chunk_grid_indices, &separator.to_string())
}
