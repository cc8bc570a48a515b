//! Metadata.
//!
//! [`ArrayMetadata`] and [`GroupMetadata`] are generation independent representations of the metadata of a node.
//! They are encoded to and decoded from the records of a particular [`ZarrVersion`] with [`ArrayMetadata::encode`] and [`ArrayMetadata::decode`].
//!
//! The records of each generation are defined in the [`v2`] and [`v3`] modules.
//! Metadata is compared structurally, so two compressors are equal only if their identifiers and all of their parameters are equal.

mod fill_value;
pub mod v2;
pub mod v3;

use derive_more::Display;
use serde::Serialize;
use thiserror::Error;

use crate::{
    array::{
        chunk_key_encoding::ChunkKeySeparator, ArrayOrder, ArrayShape, ChunkShape, DataType,
        Dtype, IncompatibleFillValueMetadataError, UnsupportedDataTypeError,
    },
    config::global_config,
    storage::Bytes,
};

pub use fill_value::FillValueMetadata;

use self::{
    v2::{ArrayMetadataV2, CompressorMetadataV2, GroupMetadataV2},
    v3::{ArrayMetadataV3, ChunkGridMetadataV3, CompressorMetadataV3, GroupMetadataV3},
};

/// Fields of a metadata record which are not understood by this implementation.
pub type AdditionalFields = serde_json::Map<String, serde_json::Value>;

/// User-defined attributes.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A metadata generation.
///
/// The generation is a property of a hierarchy, fixed when it is created or opened.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum ZarrVersion {
    /// Zarr V2: flat metadata, a record per array and a marker per group.
    #[display("2")]
    V2,
    /// Zarr V3 core protocol 3.0: hierarchical metadata with explicit and implicit groups.
    #[display("3")]
    V3,
}

/// A metadata error.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A record is not valid JSON, or has an absent field or a field of the wrong kind.
    #[error("malformed metadata: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The dimensionality of the shape and chunk shape differ.
    #[error("the shape has {shape} dimensions but the chunk shape has {chunk_shape}")]
    RankMismatch {
        /// The dimensionality of the shape.
        shape: usize,
        /// The dimensionality of the chunk shape.
        chunk_shape: usize,
    },
    /// An unsupported data type.
    #[error(transparent)]
    UnsupportedDataType(#[from] UnsupportedDataTypeError),
    /// A fill value incompatible with the data type.
    #[error(transparent)]
    IncompatibleFillValue(#[from] IncompatibleFillValueMetadataError),
    /// An unsupported `zarr_format` in the entry point.
    #[error("unsupported zarr format {0}")]
    UnsupportedZarrFormat(String),
}

/// Compressor metadata, a codec identifier and its parameters.
///
/// Equality is structural.
#[derive(Clone, PartialEq, Debug)]
pub struct CompressorMetadata {
    id: String,
    configuration: serde_json::Map<String, serde_json::Value>,
}

impl CompressorMetadata {
    /// Create compressor metadata from a codec identifier and parameters.
    #[must_use]
    pub fn new(id: &str, configuration: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            id: id.to_string(),
            configuration,
        }
    }

    /// Create compressor metadata from a codec identifier and a serializable configuration.
    ///
    /// # Errors
    /// Returns a [`serde_json::Error`] if `configuration` does not serialize to a JSON object.
    pub fn new_with_serializable_configuration<T: Serialize>(
        id: &str,
        configuration: &T,
    ) -> Result<Self, serde_json::Error> {
        let configuration = serde_json::to_value(configuration)?;
        match configuration {
            serde_json::Value::Object(configuration) => Ok(Self::new(id, configuration)),
            _ => Err(serde::ser::Error::custom(
                "configuration must serialize to a JSON object",
            )),
        }
    }

    /// Returns the codec identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the codec parameters.
    #[must_use]
    pub const fn configuration(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.configuration
    }

    /// Deserialize the parameters as a codec configuration.
    ///
    /// # Errors
    /// Returns a [`serde_json::Error`] if the parameters do not match `T`.
    pub fn to_configuration<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(self.configuration.clone()))
    }
}

impl std::fmt::Display for CompressorMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.id,
            serde_json::Value::Object(self.configuration.clone())
        )
    }
}

impl From<CompressorMetadataV2> for CompressorMetadata {
    fn from(metadata: CompressorMetadataV2) -> Self {
        Self {
            id: metadata.id,
            configuration: metadata.configuration,
        }
    }
}

impl From<&CompressorMetadata> for CompressorMetadataV2 {
    fn from(metadata: &CompressorMetadata) -> Self {
        Self {
            id: metadata.id.clone(),
            configuration: metadata.configuration.clone(),
        }
    }
}

impl From<CompressorMetadataV3> for CompressorMetadata {
    fn from(metadata: CompressorMetadataV3) -> Self {
        Self {
            id: v3::codec_id(&metadata.codec).to_string(),
            configuration: metadata.configuration,
        }
    }
}

impl From<&CompressorMetadata> for CompressorMetadataV3 {
    fn from(metadata: &CompressorMetadata) -> Self {
        Self {
            codec: v3::codec_uri(&metadata.id),
            configuration: metadata.configuration.clone(),
        }
    }
}

/// Array metadata.
#[derive(Clone, PartialEq, Debug)]
pub struct ArrayMetadata {
    /// The shape of the array.
    pub shape: ArrayShape,
    /// The chunk shape.
    pub chunk_shape: ChunkShape,
    /// The data type.
    pub dtype: Dtype,
    /// The compressor, or [`None`] if chunks are stored uncompressed.
    pub compressor: Option<CompressorMetadata>,
    /// The fill value.
    pub fill_value: FillValueMetadata,
    /// The memory layout of chunks.
    pub order: ArrayOrder,
    /// The separator placed between the dimensions of a chunk key.
    pub separator: ChunkKeySeparator,
    /// User-defined attributes.
    pub attributes: Attributes,
    /// Zarr V2 filters. These are preserved but never applied.
    pub filters: Option<Vec<serde_json::Value>>,
}

impl ArrayMetadata {
    /// Returns the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Encode the metadata as the array record of a metadata generation.
    ///
    /// The Zarr V2 array record does not hold attributes, see [`ArrayMetadata::encode_attributes`].
    #[must_use]
    pub fn encode(&self, version: ZarrVersion) -> serde_json::Value {
        let value = match version {
            ZarrVersion::V2 => serde_json::to_value(self.to_v2()),
            ZarrVersion::V3 => serde_json::to_value(self.to_v3()),
        };
        // serialization of these records is infallible: all map keys are strings
        value.unwrap_or_default()
    }

    /// Encode the user-defined attributes as a standalone record.
    #[must_use]
    pub fn encode_attributes(&self) -> serde_json::Value {
        serde_json::Value::Object(self.attributes.clone())
    }

    /// Decode the metadata from the array record of a metadata generation.
    ///
    /// Zarr V2 attributes are held in a separate record, so the decoded attributes are empty for [`ZarrVersion::V2`].
    ///
    /// # Errors
    /// Returns [`MetadataError`] if the record is malformed.
    pub fn decode(version: ZarrVersion, value: serde_json::Value) -> Result<Self, MetadataError> {
        match version {
            ZarrVersion::V2 => Self::try_from_v2(serde_json::from_value(value)?, Attributes::new()),
            ZarrVersion::V3 => Self::try_from_v3(serde_json::from_value(value)?),
        }
    }

    /// Convert to a Zarr V2 `.zarray` record.
    #[must_use]
    pub fn to_v2(&self) -> ArrayMetadataV2 {
        ArrayMetadataV2 {
            chunks: self.chunk_shape.clone(),
            compressor: self.compressor.as_ref().map(Into::into),
            dimension_separator: self.separator,
            dtype: self.dtype.to_string(),
            fill_value: self.fill_value.clone(),
            filters: self.filters.clone(),
            order: self.order,
            shape: self.shape.clone(),
            zarr_format: monostate::MustBe!(2u64),
            additional_fields: AdditionalFields::new(),
        }
    }

    /// Convert to a Zarr V3 `.array.json` record.
    #[must_use]
    pub fn to_v3(&self) -> ArrayMetadataV3 {
        ArrayMetadataV3 {
            attributes: self.attributes.clone(),
            chunk_grid: ChunkGridMetadataV3::new(self.chunk_shape.clone(), self.separator),
            chunk_memory_layout: self.order,
            compressor: self.compressor.as_ref().map(Into::into),
            data_type: self.dtype.to_string(),
            extensions: Vec::new(),
            fill_value: self.fill_value.clone(),
            shape: self.shape.clone(),
            additional_fields: AdditionalFields::new(),
        }
    }

    /// Create from a Zarr V2 `.zarray` record and the attributes of its `.zattrs` record.
    ///
    /// # Errors
    /// Returns [`MetadataError`] if the record is malformed.
    pub fn try_from_v2(metadata: ArrayMetadataV2, attributes: Attributes) -> Result<Self, MetadataError> {
        if !metadata.additional_fields.is_empty() {
            log::warn!(
                "ignoring unsupported array metadata fields: {:?}",
                metadata.additional_fields.keys().collect::<Vec<_>>()
            );
        }
        if metadata.filters.as_ref().is_some_and(|filters| !filters.is_empty()) {
            log::warn!("array filters are preserved but not applied");
        }
        Self::validated(Self {
            shape: metadata.shape,
            chunk_shape: metadata.chunks,
            dtype: metadata.dtype.parse()?,
            compressor: metadata.compressor.map(Into::into),
            fill_value: metadata.fill_value,
            order: metadata.order,
            separator: metadata.dimension_separator,
            attributes,
            filters: metadata.filters,
        })
    }

    /// Create from a Zarr V3 `.array.json` record.
    ///
    /// # Errors
    /// Returns [`MetadataError`] if the record is malformed.
    pub fn try_from_v3(metadata: ArrayMetadataV3) -> Result<Self, MetadataError> {
        if !metadata.extensions.is_empty() || !metadata.additional_fields.is_empty() {
            log::warn!("ignoring unsupported array metadata extensions and fields");
        }
        Self::validated(Self {
            shape: metadata.shape,
            chunk_shape: metadata.chunk_grid.chunk_shape,
            dtype: metadata.data_type.parse()?,
            compressor: metadata.compressor.map(Into::into),
            fill_value: metadata.fill_value,
            order: metadata.chunk_memory_layout,
            separator: metadata.chunk_grid.separator,
            attributes: metadata.attributes,
            filters: None,
        })
    }

    fn validated(self) -> Result<Self, MetadataError> {
        if self.shape.len() != self.chunk_shape.len() {
            return Err(MetadataError::RankMismatch {
                shape: self.shape.len(),
                chunk_shape: self.chunk_shape.len(),
            });
        }
        if global_config().validate_fill_value() {
            self.data_type().fill_value_from_metadata(&self.fill_value)?;
        }
        Ok(self)
    }

    /// Returns the data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.dtype.data_type()
    }
}

/// Group metadata.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct GroupMetadata {
    /// User-defined attributes.
    pub attributes: Attributes,
}

impl GroupMetadata {
    /// Create group metadata with `attributes`.
    #[must_use]
    pub fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }

    /// Encode the metadata as the group record of a metadata generation.
    ///
    /// The Zarr V2 group record does not hold attributes.
    #[must_use]
    pub fn encode(&self, version: ZarrVersion) -> serde_json::Value {
        let value = match version {
            ZarrVersion::V2 => serde_json::to_value(GroupMetadataV2::default()),
            ZarrVersion::V3 => serde_json::to_value(GroupMetadataV3 {
                attributes: self.attributes.clone(),
                extensions: Vec::new(),
            }),
        };
        value.unwrap_or_default()
    }

    /// Decode the metadata from the group record of a metadata generation.
    ///
    /// # Errors
    /// Returns [`MetadataError`] if the record is malformed.
    pub fn decode(version: ZarrVersion, value: serde_json::Value) -> Result<Self, MetadataError> {
        match version {
            ZarrVersion::V2 => {
                let _: GroupMetadataV2 = serde_json::from_value(value)?;
                Ok(Self::default())
            }
            ZarrVersion::V3 => {
                let metadata: GroupMetadataV3 = serde_json::from_value(value)?;
                if !metadata.extensions.is_empty() {
                    log::warn!("ignoring unsupported group metadata extensions");
                }
                Ok(Self::new(metadata.attributes))
            }
        }
    }
}

/// Serialize a metadata record to JSON bytes, indented if [`Config::pretty_metadata`](crate::config::Config::pretty_metadata) is enabled.
///
/// # Errors
/// Returns a [`serde_json::Error`] if serialization fails.
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, serde_json::Error> {
    let bytes = if global_config().pretty_metadata() {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    Ok(Bytes::from(bytes))
}
