//! Zarr V3 metadata records (core protocol 3.0 draft).
//!
//! A Zarr V3 hierarchy stores
//!  - an entry point record at `zarr.json`,
//!  - array metadata in a `meta/root<path>.array.json` record,
//!  - explicit group metadata in a `meta/root<path>.group.json` record, and
//!  - chunks under `data/root<path>/`.
//!
//! User-defined attributes are embedded in the array and group records.

use serde::{Deserialize, Serialize};

use crate::array::{chunk_key_encoding::ChunkKeySeparator, ArrayOrder, ArrayShape, ChunkShape};

use super::{AdditionalFields, FillValueMetadata};

/// The `zarr_format` and `metadata_encoding` URI of the Zarr V3 core protocol.
pub const ZARR_FORMAT_V3: &str = "https://purl.org/zarr/spec/protocol/core/3.0";

const CODEC_URI_PREFIX: &str = "https://purl.org/zarr/spec/codec/";

/// Zarr V3 entry point metadata (`zarr.json`).
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct EntryPointMetadataV3 {
    /// Extensions to the core protocol.
    #[serde(default)]
    pub extensions: Vec<serde_json::Value>,
    /// The encoding of metadata records.
    pub metadata_encoding: String,
    /// The suffix of metadata record keys.
    #[serde(default = "metadata_key_suffix_default")]
    pub metadata_key_suffix: String,
    /// The core protocol URI.
    pub zarr_format: String,
}

impl Default for EntryPointMetadataV3 {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            metadata_encoding: ZARR_FORMAT_V3.to_string(),
            metadata_key_suffix: metadata_key_suffix_default(),
            zarr_format: ZARR_FORMAT_V3.to_string(),
        }
    }
}

fn metadata_key_suffix_default() -> String {
    ".json".to_string()
}

/// Zarr V3 array metadata (`meta/root<path>.array.json`).
///
/// Fields are declared in sorted order.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ArrayMetadataV3 {
    /// User-defined attributes.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// The regular chunk grid.
    pub chunk_grid: ChunkGridMetadataV3,
    /// The memory layout of chunks.
    #[serde(default)]
    pub chunk_memory_layout: ArrayOrder,
    /// The compressor, omitted if uncompressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressor: Option<CompressorMetadataV3>,
    /// The data type string code, e.g. `<f8`.
    pub data_type: String,
    /// Extensions to the array metadata.
    #[serde(default)]
    pub extensions: Vec<serde_json::Value>,
    /// The fill value.
    pub fill_value: FillValueMetadata,
    /// The shape of the array.
    pub shape: ArrayShape,
    /// Fields not understood by this implementation.
    #[serde(flatten)]
    pub additional_fields: AdditionalFields,
}

/// Zarr V3 regular chunk grid metadata.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ChunkGridMetadataV3 {
    /// The chunk shape.
    pub chunk_shape: ChunkShape,
    /// The separator placed between the dimensions of a chunk key.
    #[serde(default = "separator_default_v3")]
    pub separator: ChunkKeySeparator,
    /// The chunk grid type, always `regular`.
    #[serde(rename = "type")]
    pub grid_type: monostate::MustBe!("regular"),
}

impl ChunkGridMetadataV3 {
    /// Create regular chunk grid metadata.
    #[must_use]
    pub fn new(chunk_shape: ChunkShape, separator: ChunkKeySeparator) -> Self {
        Self {
            chunk_shape,
            separator,
            grid_type: monostate::MustBe!("regular"),
        }
    }
}

fn separator_default_v3() -> ChunkKeySeparator {
    ChunkKeySeparator::Slash
}

/// Zarr V3 group metadata (`meta/root<path>.group.json`).
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct GroupMetadataV3 {
    /// User-defined attributes.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Extensions to the group metadata.
    #[serde(default)]
    pub extensions: Vec<serde_json::Value>,
}

/// Zarr V3 compressor metadata, a codec URI and a configuration like
/// `{"codec": "https://purl.org/zarr/spec/codec/gzip/1.0", "configuration": {"level": 1}}`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct CompressorMetadataV3 {
    /// The codec URI.
    pub codec: String,
    /// The codec parameters.
    #[serde(default)]
    pub configuration: serde_json::Map<String, serde_json::Value>,
}

/// Return the codec URI of a codec identifier.
#[must_use]
pub fn codec_uri(id: &str) -> String {
    format!("{CODEC_URI_PREFIX}{id}/1.0")
}

/// Return the codec identifier of a codec URI.
///
/// A string which is not a codec URI is returned unchanged.
#[must_use]
pub fn codec_id(uri: &str) -> &str {
    uri.strip_prefix(CODEC_URI_PREFIX)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARRAY_JSON: &str = r#"{
        "attributes": {"question": "life", "answer": 42},
        "chunk_grid": {"chunk_shape": [2, 2], "separator": "/", "type": "regular"},
        "chunk_memory_layout": "C",
        "compressor": {
            "codec": "https://purl.org/zarr/spec/codec/gzip/1.0",
            "configuration": {"level": 1}
        },
        "data_type": "<f8",
        "extensions": [],
        "fill_value": 6.6,
        "shape": [4, 4]
    }"#;

    #[test]
    fn array_metadata_v3() {
        let metadata: ArrayMetadataV3 = serde_json::from_str(ARRAY_JSON).unwrap();
        assert_eq!(metadata.shape, vec![4, 4]);
        assert_eq!(metadata.chunk_grid.chunk_shape.to_array_shape(), vec![2, 2]);
        assert_eq!(metadata.chunk_grid.separator, ChunkKeySeparator::Slash);
        assert_eq!(metadata.attributes["question"], "life");
        assert_eq!(
            codec_id(&metadata.compressor.as_ref().unwrap().codec),
            "gzip"
        );
        let reencoded: ArrayMetadataV3 =
            serde_json::from_str(&serde_json::to_string(&metadata).unwrap()).unwrap();
        assert_eq!(reencoded, metadata);
    }

    #[test]
    fn array_metadata_v3_invalid() {
        let irregular = ARRAY_JSON.replace("\"regular\"", "\"rectilinear\"");
        assert!(serde_json::from_str::<ArrayMetadataV3>(&irregular).is_err());
        let no_fill_value = ARRAY_JSON.replace("\"fill_value\": 6.6,", "");
        assert!(serde_json::from_str::<ArrayMetadataV3>(&no_fill_value).is_err());
        let bad_shape = ARRAY_JSON.replace("[4, 4]", "\"4x4\"");
        assert!(serde_json::from_str::<ArrayMetadataV3>(&bad_shape).is_err());
    }

    #[test]
    fn array_metadata_v3_uncompressed() {
        let json = r#"{"chunk_grid":{"chunk_shape":[2],"type":"regular"},"data_type":"|u1","fill_value":0,"shape":[3]}"#;
        let metadata: ArrayMetadataV3 = serde_json::from_str(json).unwrap();
        assert!(metadata.compressor.is_none());
        assert_eq!(metadata.chunk_memory_layout, ArrayOrder::C);
        assert_eq!(metadata.chunk_grid.separator, ChunkKeySeparator::Slash);
        assert!(!serde_json::to_string(&metadata)
            .unwrap()
            .contains("compressor"));
    }

    #[test]
    fn entry_point_v3() {
        let entry_point = EntryPointMetadataV3::default();
        assert_eq!(
            serde_json::to_string(&entry_point).unwrap(),
            r#"{"extensions":[],"metadata_encoding":"https://purl.org/zarr/spec/protocol/core/3.0","metadata_key_suffix":".json","zarr_format":"https://purl.org/zarr/spec/protocol/core/3.0"}"#
        );
    }

    #[test]
    fn codec_uris() {
        assert_eq!(
            codec_uri("gzip"),
            "https://purl.org/zarr/spec/codec/gzip/1.0"
        );
        assert_eq!(codec_id(&codec_uri("zstd")), "zstd");
        assert_eq!(codec_id("zlib"), "zlib");
    }
}
