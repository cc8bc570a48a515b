//! Zarr V2 metadata records.
//!
//! A Zarr V2 hierarchy stores
//!  - array metadata in a `.zarray` record,
//!  - group metadata in a `.zgroup` record, and
//!  - user-defined attributes separately in a `.zattrs` record.

use serde::{Deserialize, Serialize};

use crate::array::{chunk_key_encoding::ChunkKeySeparator, ArrayOrder, ArrayShape, ChunkShape};

use super::{AdditionalFields, FillValueMetadata};

/// Zarr V2 array metadata (`.zarray`).
///
/// Fields are declared in sorted order, matching the records written by other Zarr V2 implementations.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ArrayMetadataV2 {
    /// The chunk shape.
    pub chunks: ChunkShape,
    /// The primary compression codec, or [`None`] if uncompressed.
    pub compressor: Option<CompressorMetadataV2>,
    /// The separator placed between the dimensions of a chunk key.
    #[serde(
        default = "dimension_separator_default_v2",
        skip_serializing_if = "is_dimension_separator_default_v2"
    )]
    pub dimension_separator: ChunkKeySeparator,
    /// The data type string code, e.g. `<f8`.
    pub dtype: String,
    /// The fill value.
    pub fill_value: FillValueMetadata,
    /// Filter codecs. These are preserved but never applied.
    pub filters: Option<Vec<serde_json::Value>>,
    /// The memory layout of chunks.
    pub order: ArrayOrder,
    /// The shape of the array.
    pub shape: ArrayShape,
    /// The format version, always `2`.
    pub zarr_format: monostate::MustBe!(2u64),
    /// Fields not understood by this implementation.
    #[serde(flatten)]
    pub additional_fields: AdditionalFields,
}

/// Zarr V2 group metadata (`.zgroup`).
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct GroupMetadataV2 {
    /// The format version, always `2`.
    pub zarr_format: monostate::MustBe!(2u64),
}

impl Default for GroupMetadataV2 {
    fn default() -> Self {
        Self {
            zarr_format: monostate::MustBe!(2u64),
        }
    }
}

/// Zarr V2 compressor metadata, an `id` and flattened parameters like `{"id": "gzip", "level": 1}`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct CompressorMetadataV2 {
    /// The codec identifier.
    pub id: String,
    /// The codec parameters.
    #[serde(flatten)]
    pub configuration: serde_json::Map<String, serde_json::Value>,
}

const fn dimension_separator_default_v2() -> ChunkKeySeparator {
    ChunkKeySeparator::Dot
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_dimension_separator_default_v2(separator: &ChunkKeySeparator) -> bool {
    *separator == ChunkKeySeparator::Dot
}
